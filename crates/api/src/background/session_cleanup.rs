//! Hourly purge of dead refresh tokens.
//!
//! Revoked and expired rows can never be presented again, so they are
//! deleted rather than kept as history.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use velvet_db::repositories::SessionRepo;
use velvet_db::DbPool;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Run until `cancel` fires. The first sweep happens immediately.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Session cleanup job started"
    );
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = interval.tick() => sweep(&pool).await,
        }
    }
}

async fn sweep(pool: &DbPool) {
    match SessionRepo::cleanup_expired(pool).await {
        Ok(0) => tracing::debug!("Session cleanup: nothing to purge"),
        Ok(deleted) => tracing::info!(deleted, "Session cleanup: purged refresh tokens"),
        Err(e) => tracing::error!(error = %e, "Session cleanup failed"),
    }
}
