mod account;
mod context;
mod dashboard;
mod packages;
mod route;
mod settings;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::context::AppContext;
use crate::packages::PackagesCommands;
use crate::route::{RouteArgs, RouteCommands};
use crate::settings::{DepotCommands, NotificationCommands};

#[derive(Debug, Parser)]
#[command(name = "kurye")]
#[command(about = "Courier delivery command line client")]
struct Cli {
    /// Print classified error statistics when the command finishes
    #[arg(long, global = true)]
    error_stats: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and save the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "KURYE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in courier
    Whoami {
        /// Fetch the profile from the backend instead of the saved copy
        #[arg(long)]
        refresh: bool,
    },
    /// Manage assigned packages
    Packages {
        #[command(subcommand)]
        command: PackagesCommands,
    },
    /// Show the optimized delivery route
    #[command(args_conflicts_with_subcommands = true)]
    Route {
        #[command(subcommand)]
        command: Option<RouteCommands>,
        #[command(flatten)]
        args: RouteArgs,
    },
    /// Ask the delivery assistant
    Chat { message: String },
    /// Current weather at the depot or a given city
    Weather {
        #[arg(long)]
        city: Option<String>,
    },
    /// Packages, statistics and weather at a glance
    Dashboard,
    /// Default depot used as the route start
    Depot {
        #[command(subcommand)]
        command: DepotCommands,
    },
    /// Notification preferences
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = kurye_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        println!("kurye ready; see `kurye --help`");
        return Ok(());
    };

    let mut ctx = AppContext::build(config)?;
    let result = dispatch(&mut ctx, command).await;
    if cli.error_stats {
        dashboard::print_error_stats(&ctx.feedback.stats());
    }
    result
}

async fn dispatch(ctx: &mut AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            account::run_login(ctx, &email, &password).await
        }
        Commands::Logout => account::run_logout(ctx),
        Commands::Whoami { refresh } => account::run_whoami(ctx, refresh).await,
        Commands::Packages { command } => {
            ctx.require_login()?;
            packages::run(ctx, command).await
        }
        Commands::Route { command, args } => {
            ctx.require_login()?;
            route::run(ctx, command, args).await
        }
        Commands::Chat { message } => {
            ctx.require_login()?;
            account::run_chat(ctx, &message).await
        }
        Commands::Weather { city } => dashboard::run_weather(ctx, city.as_deref()).await,
        Commands::Dashboard => {
            ctx.require_login()?;
            dashboard::run_dashboard(ctx).await
        }
        Commands::Depot { command } => settings::run_depot(ctx, command),
        Commands::Notifications { command } => settings::run_notifications(ctx, command),
    }
}
