//! The post-checkout sales tally.
//!
//! Cumulative sales counters live in the catalog; this module pushes the
//! per-product increments after an order is created. The tally is
//! best-effort with its own retry policy, decoupled from the checkout
//! caller — a lagging counter never invalidates a created order.

use std::time::Duration;

use catalog::CatalogLookup;
use common::ProductId;

const MAX_ATTEMPTS: u32 = 4;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

/// Runs the tally on a detached task.
pub(crate) fn spawn_tally<C>(catalog: C, tallies: Vec<(ProductId, u32)>)
where
    C: CatalogLookup + Send + Sync + 'static,
{
    tokio::spawn(async move {
        tally_with_retry(&catalog, &tallies).await;
    });
}

/// Applies each per-product increment, retrying with doubling backoff.
///
/// Exhausted retries are counted and logged, then dropped; the order the
/// tally belongs to is already durable.
pub async fn tally_with_retry<C: CatalogLookup>(catalog: &C, tallies: &[(ProductId, u32)]) {
    for (product_id, quantity) in tallies {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;
        loop {
            match catalog.record_sales(product_id, *quantity).await {
                Ok(()) => break,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::debug!(
                        error = %e,
                        %product_id,
                        attempt,
                        "sales tally failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    metrics::counter!("sales_tally_failures_total").increment(1);
                    tracing::error!(
                        error = %e,
                        %product_id,
                        attempts = MAX_ATTEMPTS,
                        "sales tally dropped after exhausting retries"
                    );
                    break;
                }
            }
        }
    }
}
