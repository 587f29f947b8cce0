//! Route command handlers.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use kurye_core::storage::get_json;
use kurye_core::{validate_coordinates, DefaultDepot, StartingLocation, StorageKey};

use crate::context::AppContext;
use crate::packages::truncate;

#[derive(Debug, Subcommand)]
pub enum RouteCommands {
    /// List previously computed routes
    History,
}

/// Options for fetching today's (or a given day's) optimized route.
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Route date (YYYY-MM-DD); today when omitted
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long, requires = "start_lng", allow_negative_numbers = true)]
    pub start_lat: Option<f64>,
    #[arg(long, requires = "start_lat", allow_negative_numbers = true)]
    pub start_lng: Option<f64>,
    /// Label for the custom starting point
    #[arg(long, requires = "start_lat")]
    pub start_name: Option<String>,
    /// Start from the saved default depot
    #[arg(long, conflicts_with = "start_lat")]
    pub from_depot: bool,
}

pub(crate) async fn run(
    ctx: &AppContext,
    command: Option<RouteCommands>,
    args: RouteArgs,
) -> anyhow::Result<()> {
    match command {
        Some(RouteCommands::History) => run_history(ctx).await,
        None => run_route(ctx, args).await,
    }
}

fn starting_location(
    ctx: &AppContext,
    args: &RouteArgs,
) -> anyhow::Result<Option<StartingLocation>> {
    if args.from_depot {
        let depot = get_json::<DefaultDepot, _>(ctx.store(), StorageKey::DefaultDepot)?
            .ok_or_else(|| {
                anyhow::anyhow!("no default depot saved; run `kurye depot set` first")
            })?;
        return Ok(Some(StartingLocation {
            latitude: depot.latitude,
            longitude: depot.longitude,
            name: depot.name,
        }));
    }

    let (Some(latitude), Some(longitude)) = (args.start_lat, args.start_lng) else {
        return Ok(None);
    };
    let problems = validate_coordinates(latitude, longitude);
    if !problems.is_empty() {
        return Err(ctx.feedback.validation_failure(&problems, "route"));
    }
    Ok(Some(StartingLocation {
        latitude,
        longitude,
        name: args
            .start_name
            .clone()
            .unwrap_or_else(|| "Custom start".to_owned()),
    }))
}

async fn run_route(ctx: &AppContext, args: RouteArgs) -> anyhow::Result<()> {
    let start = starting_location(ctx, &args)?;
    let route = ctx
        .services()
        .routes
        .get_optimized_route(args.date, start.as_ref())
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "route"))?;

    if let Some(message) = &route.message {
        println!("{message}");
    }
    if route.stops.is_empty() {
        println!("no stops on this route");
        return Ok(());
    }

    if let Some(start) = &start {
        println!(
            "starting from {} ({:.5}, {:.5})",
            start.name, start.latitude, start.longitude
        );
    }
    println!("{:<5}{:<16}{:<10}{:<10}ADDRESS", "#", "KARGO ID", "KM", "ETA");
    for stop in &route.stops {
        let km = stop
            .distance_from_previous
            .map_or_else(|| "\u{2014}".to_owned(), |d| format!("{d:.1}"));
        println!(
            "{:<5}{:<16}{:<10}{:<10}{}",
            stop.sequence,
            stop.kargo_id,
            km,
            stop.estimated_arrival.as_deref().unwrap_or("\u{2014}"),
            truncate(&stop.address, 48)
        );
    }

    let region = route.region();
    println!();
    println!(
        "{} stops, {:.1} km, ~{} min",
        route.stops.len(),
        route.total_distance,
        route.estimated_duration
    );
    println!(
        "map region: centre {:.4}, {:.4} span {:.4} x {:.4}",
        region.latitude, region.longitude, region.latitude_delta, region.longitude_delta
    );
    Ok(())
}

async fn run_history(ctx: &AppContext) -> anyhow::Result<()> {
    let history = ctx
        .services()
        .routes
        .get_route_history()
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "route history"))?;

    if history.is_empty() {
        println!("no route history yet");
        return Ok(());
    }

    println!("{:<7}{:<13}{:<10}MINUTES", "ID", "DATE", "KM");
    for entry in &history {
        println!(
            "{:<7}{:<13}{:<10}{}",
            entry.id,
            entry
                .route_date
                .as_deref()
                .or(entry.created_at.as_deref())
                .unwrap_or("\u{2014}"),
            format!("{:.1}", entry.total_distance),
            entry.estimated_duration
        );
    }
    Ok(())
}
