//! Weather, the home dashboard, and error statistics.

use kurye_core::storage::get_json;
use kurye_core::{DefaultDepot, PackageStatus, StorageKey};
use kurye_diagnostics::ErrorStats;
use kurye_weather::{clean_city_name, WeatherReading};

use crate::context::AppContext;

fn saved_depot(ctx: &AppContext) -> anyhow::Result<Option<DefaultDepot>> {
    Ok(get_json::<DefaultDepot, _>(ctx.store(), StorageKey::DefaultDepot)?)
}

async fn depot_reading(ctx: &AppContext, depot: Option<&DefaultDepot>) -> WeatherReading {
    match depot {
        Some(d) => ctx.weather.current_by_coordinates(d.latitude, d.longitude).await,
        None => ctx.weather.depot_weather(None, None).await,
    }
}

pub(crate) async fn run_weather(ctx: &AppContext, city: Option<&str>) -> anyhow::Result<()> {
    let reading = match city {
        Some(city) => ctx.weather.current_by_city(&clean_city_name(city)).await,
        None => depot_reading(ctx, saved_depot(ctx)?.as_ref()).await,
    };
    print_weather(&reading);
    Ok(())
}

/// Loads the home screen's packages, statistics and weather concurrently.
pub(crate) async fn run_dashboard(ctx: &AppContext) -> anyhow::Result<()> {
    let depot = saved_depot(ctx)?;
    let packages = &ctx.services().packages;

    let (list, stats, weather) = futures::join!(
        packages.get_all_packages(),
        packages.get_delivery_stats(),
        depot_reading(ctx, depot.as_ref()),
    );
    let list = list.map_err(|e| ctx.feedback.api_failure(e, "dashboard"))?;
    let stats = stats.map_err(|e| ctx.feedback.api_failure(e, "dashboard"))?;

    if let Some(user) = &ctx.session.session().user {
        println!("{} \u{00b7} {}", ctx.config.app_name, user.full_name);
    }
    if let Some(depot) = &depot {
        println!("depot: {}", depot.name);
    }
    print_weather(&weather);
    println!();

    let open = list
        .iter()
        .filter(|p| matches!(p.status, PackageStatus::Pending | PackageStatus::InTransit))
        .count();
    println!(
        "{open} open of {} packages \u{00b7} {} delivered \u{00b7} {} failed \u{00b7} {:.1}% success",
        stats.total_packages, stats.delivered_packages, stats.failed_packages, stats.success_rate
    );
    Ok(())
}

fn print_weather(w: &WeatherReading) {
    println!(
        "{}, {}: {}\u{00b0}C (feels {}\u{00b0}C), {} [{}]",
        w.city, w.country, w.temperature, w.feels_like, w.description, w.icon
    );
    println!(
        "  humidity {}% \u{00b7} wind {} m/s \u{00b7} {}",
        w.humidity, w.wind_speed, w.condition
    );
}

pub(crate) fn print_error_stats(stats: &ErrorStats) {
    println!("errors this run: {}", stats.total);
    if stats.total == 0 {
        return;
    }
    for (category, count) in &stats.by_category {
        println!("  {:<12}{count}", category.to_string());
    }
    for (severity, count) in &stats.by_severity {
        println!("  {:<12}{count}", severity.to_string());
    }
    for record in &stats.recent {
        println!(
            "  {} [{}] {}: {}",
            record.timestamp.format("%H:%M:%S"),
            record.category,
            record.context,
            record.user_message
        );
    }
}
