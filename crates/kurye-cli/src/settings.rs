//! Locally stored preferences: the default depot and notification toggles.

use clap::{Subcommand, ValueEnum};
use kurye_core::storage::{get_json, set_json};
use kurye_core::{validate_coordinates, DefaultDepot, NotificationSettings, StorageKey};

use crate::context::AppContext;

#[derive(Debug, Subcommand)]
pub enum DepotCommands {
    /// Save the depot routes start from
    Set {
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Show the saved depot
    Show,
}

#[derive(Debug, Subcommand)]
pub enum NotificationCommands {
    Show,
    /// Turn one notification kind on or off
    Set { kind: NotificationKind, state: Switch },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotificationKind {
    Push,
    Email,
    Sms,
    OrderUpdates,
    RouteUpdates,
    Promotions,
    Sounds,
    Vibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

pub(crate) fn run_depot(ctx: &AppContext, command: DepotCommands) -> anyhow::Result<()> {
    match command {
        DepotCommands::Set { name, lat, lng } => {
            let problems = validate_coordinates(lat, lng);
            if !problems.is_empty() {
                return Err(ctx.feedback.validation_failure(&problems, "depot set"));
            }
            let depot = DefaultDepot {
                name,
                latitude: lat,
                longitude: lng,
            };
            set_json(ctx.store(), StorageKey::DefaultDepot, &depot)?;
            println!("default depot set to {}", depot.name);
        }
        DepotCommands::Show => {
            match get_json::<DefaultDepot, _>(ctx.store(), StorageKey::DefaultDepot)? {
                Some(depot) => println!(
                    "{} ({:.5}, {:.5})",
                    depot.name, depot.latitude, depot.longitude
                ),
                None => println!("no default depot saved"),
            }
        }
    }
    Ok(())
}

pub(crate) fn run_notifications(
    ctx: &AppContext,
    command: NotificationCommands,
) -> anyhow::Result<()> {
    let mut settings =
        get_json::<NotificationSettings, _>(ctx.store(), StorageKey::NotificationSettings)?
            .unwrap_or_default();

    if let NotificationCommands::Set { kind, state } = command {
        apply(&mut settings, kind, state == Switch::On);
        set_json(ctx.store(), StorageKey::NotificationSettings, &settings)?;
    }

    for (label, enabled) in rows(&settings) {
        println!("{label:<15}{}", if enabled { "on" } else { "off" });
    }
    Ok(())
}

pub(crate) fn apply(settings: &mut NotificationSettings, kind: NotificationKind, enabled: bool) {
    let slot = match kind {
        NotificationKind::Push => &mut settings.push_notifications,
        NotificationKind::Email => &mut settings.email_notifications,
        NotificationKind::Sms => &mut settings.sms_notifications,
        NotificationKind::OrderUpdates => &mut settings.order_updates,
        NotificationKind::RouteUpdates => &mut settings.route_updates,
        NotificationKind::Promotions => &mut settings.promotions,
        NotificationKind::Sounds => &mut settings.sounds,
        NotificationKind::Vibration => &mut settings.vibration,
    };
    *slot = enabled;
}

fn rows(s: &NotificationSettings) -> [(&'static str, bool); 8] {
    [
        ("push", s.push_notifications),
        ("email", s.email_notifications),
        ("sms", s.sms_notifications),
        ("order-updates", s.order_updates),
        ("route-updates", s.route_updates),
        ("promotions", s.promotions),
        ("sounds", s.sounds),
        ("vibration", s.vibration),
    ]
}
