/**
 * Dashboard Sync Entry Point
 *
 * Runs the sync engine against a live dashboard endpoint with headless
 * backends, logging every delta it would push to a real page.
 */

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use powermason_dashboard::dashboard::config::Config;
    use powermason_dashboard::dashboard::reconcile::ChangeDetector;
    use powermason_dashboard::dashboard::render::headless::{
        HeadlessCalendar, HeadlessChart, HeadlessCounters, HeadlessMap,
    };
    use powermason_dashboard::dashboard::render::{LogIndicator, Surfaces};
    use powermason_dashboard::dashboard::{
        DashboardContext, HttpSnapshotClient, SyncConfig, SyncService,
    };
    use std::sync::Arc;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = Config::load()?;
    config.require_credentials()?;
    let app = config.app();
    tracing::info!("Polling {}", config.api_url());

    let map = HeadlessMap::new();
    let surfaces = Surfaces::new()
        .with_map(map.clone())
        .with_progress_chart(HeadlessChart::new("progress"))
        .with_budget_chart(HeadlessChart::new("budget"))
        .with_calendar(HeadlessCalendar::new())
        .with_counters(HeadlessCounters::dashboard());
    let context = DashboardContext::with_detector(
        surfaces,
        ChangeDetector::new(app.watch_fields.iter().cloned()),
    );

    let source = Arc::new(HttpSnapshotClient::new(app)?);
    let sync_config = SyncConfig::from(app);
    let interval = sync_config.poll_interval;
    let mut service = SyncService::new(sync_config, source, context, Arc::new(LogIndicator));
    service.start(interval).await;

    let mut report = tokio::time::interval(interval * 10);
    report.tick().await;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            _ = report.tick() => {
                let metrics = service.metrics().await;
                let state = service.state().await;
                tracing::info!(
                    "{} polls ({} ok, {} failed, {} applied), {} markers on map, status {}",
                    metrics.total_polls,
                    metrics.successful_polls,
                    metrics.failed_polls,
                    metrics.applied_polls,
                    map.attached_count(),
                    state.status
                );
            }
        }
    }

    tracing::info!("Shutting down");
    service.stop().await;
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("dashboard-sync requires the 'cli' feature to be enabled.");
    eprintln!("Run with: cargo run --bin dashboard-sync --features cli");
    std::process::exit(1);
}
