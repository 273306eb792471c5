use session_tracker::{ClientConfig, JsonObject, TrackerClient, TrackerError};

#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    env_logger::init();

    // Reads TRACKER_API_URL, TRACKER_REPORT_PATH and TRACKER_STORAGE_PATH. Without a storage
    // path the anonymous id only lives as long as this process.
    let config = ClientConfig::from_env()?;
    let client = TrackerClient::connect(&config)?;

    if let Some(previous) = client.get_cached_session() {
        println!("last session: {} ({:?})", previous.id, previous.created_at);
    }

    let mut metadata = JsonObject::new();
    metadata.insert("plan".into(), "free".into());
    metadata.insert("source".into(), "demo".into());

    let session = client.create_session_for_current_user(Some(&metadata)).await?;
    println!("session {} for visitor {}", session.id, session.anonymous_id);

    for kind in ["page_view", "click", "click"] {
        let event = client.log_event_for_session(&session.id, kind, None, None).await?;
        println!("logged {} ({})", event.event_type, event.id);
    }

    let report = client.get_latest_report().await?;
    println!(
        "report {}: {} sessions, {} events",
        report.id,
        report.data.total_sessions,
        report.total_events()
    );
    for (kind, count) in report.events_by_type() {
        println!("  {kind:<12} {count}");
    }

    Ok(())
}
