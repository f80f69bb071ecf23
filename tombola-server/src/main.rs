use std::collections::BTreeMap;

use tombola_server::orders::expiry;
use tombola_server::{Config, Store};
use tracing_subscriber::EnvFilter;

/// Maintenance entry point: open (and self-heal) the store, run one
/// expiry sweep, and log a status summary. The HTTP surface lives in a
/// separate deployment and drives the library directly.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Tombola maintenance starting");
    let config = Config::from_env();
    let store = Store::open(&config.db_path);

    let mut txn = store.begin().await?;
    let expired = expiry::expire_pending(
        txn.doc_mut(),
        chrono::Utc::now(),
        chrono::Duration::minutes(config.pending_ttl_minutes),
    );

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for order in &txn.doc().orders {
        let key = serde_json::to_value(order.status)?
            .as_str()
            .unwrap_or("UNKNOWN")
            .to_string();
        *by_status.entry(key).or_default() += 1;
    }
    let orders = txn.doc().orders.len();
    let tickets = txn.doc().tickets.len();
    let events = txn.doc().events.len();
    txn.commit()?;

    tracing::info!(
        db = %config.db_path.display(),
        events,
        orders,
        tickets,
        expired,
        "Store summary"
    );
    for (status, count) in by_status {
        tracing::info!(status = %status, count, "Orders by status");
    }
    Ok(())
}
