//! Package command handlers.

use clap::Subcommand;
use futures::stream::{self, StreamExt, TryStreamExt};
use kurye_core::{
    validate_package_data, validate_scan, DeliveryStatusUpdate, DeliveryType, FailureReason,
    NewPackage, Package, PackageStatus,
};

use crate::context::AppContext;

const SHOW_CONCURRENCY: usize = 4;

/// Sub-commands available under `packages`.
#[derive(Debug, Subcommand)]
pub enum PackagesCommands {
    /// List assigned packages
    List {
        /// Only show packages in this status (pending, in_transit, delivered, failed)
        #[arg(long)]
        status: Option<PackageStatus>,
    },
    /// Show one or more packages by numeric ID
    Show {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Create a package by hand
    Add {
        #[arg(long)]
        kargo_id: String,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: Option<String>,
        /// standard, express or scheduled (label spellings accepted)
        #[arg(long, default_value = "standard", value_parser = parse_delivery_type)]
        delivery_type: DeliveryType,
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Delivery window start, e.g. 09:00
        #[arg(long)]
        window_start: Option<String>,
        #[arg(long)]
        window_end: Option<String>,
    },
    /// Create a package from a scanned label payload (JSON, or @file)
    Scan {
        payload: String,
        /// Validate and print the cleaned payload without creating anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Record a delivery outcome
    UpdateStatus {
        id: i64,
        status: PackageStatus,
        /// Required when status is failed
        #[arg(long)]
        reason: Option<FailureReason>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a package
    Delete { id: i64 },
    /// Show delivery statistics
    Stats,
}

fn parse_delivery_type(raw: &str) -> Result<DeliveryType, String> {
    Ok(DeliveryType::from_alias(raw))
}

pub(crate) async fn run(ctx: &AppContext, command: PackagesCommands) -> anyhow::Result<()> {
    match command {
        PackagesCommands::List { status } => run_list(ctx, status).await,
        PackagesCommands::Show { ids } => run_show(ctx, &ids).await,
        PackagesCommands::Add {
            kargo_id,
            recipient,
            address,
            phone,
            delivery_type,
            lat,
            lng,
            window_start,
            window_end,
        } => {
            let package = NewPackage {
                kargo_id,
                recipient_name: recipient,
                address,
                phone,
                delivery_type,
                time_window_start: window_start,
                time_window_end: window_end,
                latitude: lat,
                longitude: lng,
            };
            run_add(ctx, &package).await
        }
        PackagesCommands::Scan { payload, dry_run } => run_scan(ctx, &payload, dry_run).await,
        PackagesCommands::UpdateStatus {
            id,
            status,
            reason,
            notes,
        } => {
            let update = build_status_update(status, reason, notes)?;
            run_update_status(ctx, id, &update).await
        }
        PackagesCommands::Delete { id } => {
            let reply = ctx
                .services()
                .packages
                .delete_package(id)
                .await
                .map_err(|e| ctx.feedback.api_failure(e, "packages delete"))?;
            println!("{}", reply.message);
            Ok(())
        }
        PackagesCommands::Stats => run_stats(ctx).await,
    }
}

async fn run_list(ctx: &AppContext, status: Option<PackageStatus>) -> anyhow::Result<()> {
    let packages = ctx
        .services()
        .packages
        .get_all_packages()
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "packages list"))?;

    let shown: Vec<&Package> = packages
        .iter()
        .filter(|p| status.is_none_or(|s| p.status == s))
        .collect();

    if shown.is_empty() {
        println!(
            "no packages found{}",
            status.map(|s| format!(" with status {s}")).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{:<7}{:<16}{:<12}{:<11}{:<22}ADDRESS",
        "ID", "KARGO ID", "STATUS", "TYPE", "RECIPIENT"
    );
    for p in shown {
        println!(
            "{:<7}{:<16}{:<12}{:<11}{:<22}{}",
            p.id,
            p.kargo_id,
            p.status.to_string(),
            p.delivery_type.to_string(),
            truncate(&p.recipient_name, 20),
            truncate(&p.address, 40)
        );
    }
    Ok(())
}

/// Fetches the packages concurrently, printing them in the order requested.
async fn run_show(ctx: &AppContext, ids: &[i64]) -> anyhow::Result<()> {
    let service = &ctx.services().packages;
    let packages: Vec<Package> = stream::iter(ids.iter().copied())
        .map(|id| service.get_package_by_id(id))
        .buffered(SHOW_CONCURRENCY)
        .try_collect()
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "packages show"))?;

    for (i, p) in packages.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_package(p);
    }
    Ok(())
}

async fn run_add(ctx: &AppContext, package: &NewPackage) -> anyhow::Result<()> {
    let problems = validate_package_data(package);
    if !problems.is_empty() {
        return Err(ctx.feedback.validation_failure(&problems, "packages add"));
    }

    let created = ctx
        .services()
        .packages
        .create_package(package)
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "packages add"))?;
    println!("created package {} ({})", created.id, created.kargo_id);
    Ok(())
}

async fn run_scan(ctx: &AppContext, payload: &str, dry_run: bool) -> anyhow::Result<()> {
    let raw = match payload.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read scan payload from {path}: {e}"))?,
        None => payload.to_owned(),
    };

    let outcome = validate_scan(&raw).map_err(|e| ctx.feedback.scan_failure(e))?;
    for warning in &outcome.warnings {
        tracing::warn!(kargo_id = %outcome.payload.kargo_id, "{warning}");
    }

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&outcome.payload)?);
        return Ok(());
    }

    let created = ctx
        .services()
        .packages
        .create_package_from_scan(&outcome.payload)
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "packages scan"))?;
    println!(
        "created package {} ({}){}",
        created.id,
        created.kargo_id,
        if outcome.geocode_required {
            "; address will be geocoded"
        } else {
            ""
        }
    );
    Ok(())
}

/// Builds a status update from command-line arguments.
///
/// A failure reason with any other status is passed through so the client
/// rejects it with its own validation error.
pub(crate) fn build_status_update(
    status: PackageStatus,
    reason: Option<FailureReason>,
    notes: Option<String>,
) -> anyhow::Result<DeliveryStatusUpdate> {
    match (status, reason) {
        (PackageStatus::Failed, None) => {
            anyhow::bail!("--reason is required when marking a package failed")
        }
        (PackageStatus::Failed, Some(reason)) => Ok(DeliveryStatusUpdate::failed(reason, notes)),
        (PackageStatus::Delivered, None) => Ok(DeliveryStatusUpdate::delivered(notes)),
        (status, reason) => Ok(DeliveryStatusUpdate {
            status,
            notes,
            failure_reason: reason,
        }),
    }
}

async fn run_update_status(
    ctx: &AppContext,
    id: i64,
    update: &DeliveryStatusUpdate,
) -> anyhow::Result<()> {
    let package = ctx
        .services()
        .packages
        .update_delivery_status(id, update)
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "packages update-status"))?;
    println!("package {} is now {}", package.id, package.status);
    Ok(())
}

async fn run_stats(ctx: &AppContext) -> anyhow::Result<()> {
    let stats = ctx
        .services()
        .packages
        .get_delivery_stats()
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "packages stats"))?;

    println!("total:     {}", stats.total_packages);
    println!("delivered: {}", stats.delivered_packages);
    println!("failed:    {}", stats.failed_packages);
    println!("pending:   {}", stats.pending_packages);
    println!("success:   {:.1}%", stats.success_rate);
    Ok(())
}

fn print_package(p: &Package) {
    println!("Package {} \u{00b7} {}", p.id, p.kargo_id);
    println!("  recipient: {}", p.recipient_name);
    println!("  address:   {}", p.address);
    if let Some(phone) = &p.phone {
        println!("  phone:     {phone}");
    }
    println!("  type:      {}", p.delivery_type);
    println!("  status:    {}", p.status);
    if let (Some(start), Some(end)) = (&p.time_window_start, &p.time_window_end) {
        println!("  window:    {start}-{end}");
    }
    if let Some((lat, lng)) = p.coordinates() {
        println!("  location:  {lat:.5}, {lng:.5}");
    }
    if let Some(reason) = p.failure_reason {
        println!("  failure:   {reason:?}");
    }
    if let Some(at) = p.delivered_at {
        println!("  delivered: {}", at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(notes) = &p.delivery_notes {
        println!("  notes:     {notes}");
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_owned()
    }
}
