//! Waiting for the portal indexer to go idle.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Outcome of the indexer gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerStatus {
    /// The indexer reported idle; the run may proceed.
    Ready,
    /// The indexer was busy on every poll.
    NotReady,
}

/// Poll the indexer on a fixed schedule until it reports idle.
///
/// Before each poll the corresponding delay is slept. The first idle answer
/// returns `Ready`; if every poll reports indexing, `NotReady`.
///
/// # Arguments
/// * `is_indexing` - Produces one indexer poll per call
/// * `schedule` - Delay before each poll
///
/// # Returns
/// The gate status, or the first poll error.
pub async fn wait_for_indexer<F, Fut, E>(
    mut is_indexing: F,
    schedule: &[Duration],
) -> Result<IndexerStatus, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    for (attempt, delay) in schedule.iter().enumerate() {
        if !delay.is_zero() {
            info!("Waiting {}s before indexer check", delay.as_secs());
            tokio::time::sleep(*delay).await;
        }
        let indexing: bool = match is_indexing().await {
            Ok(indexing) => indexing,
            Err(e) => {
                warn!("Indexer check {} failed: {}", attempt + 1, e);
                return Err(e);
            }
        };
        if !indexing {
            return Ok(IndexerStatus::Ready);
        }
        info!("Indexer busy (check {} of {})", attempt + 1, schedule.len());
    }
    warn!("Indexer still running after {} checks", schedule.len());
    Ok(IndexerStatus::NotReady)
}
