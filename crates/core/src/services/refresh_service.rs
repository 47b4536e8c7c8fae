use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::errors::CoreError;
use crate::models::holding::Holding;
use crate::models::refresh::{RefreshFailure, RefreshReport};
use crate::services::quote_service::QuoteService;

/// Waits between consecutive quote calls of a refresh run.
///
/// Injected so tests can observe pacing without sleeping.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, interval: Duration);
}

/// Real pacing: sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, interval: Duration) {
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
}

/// Cooperative cancellation for a refresh run.
///
/// Clones share the same flag. Cancelling wakes a run that is waiting on a quote or
/// on a pacing delay.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one pipeline run, before it is committed to the store.
#[derive(Debug, Clone, Default)]
pub struct RefreshOutcome {
    /// Copies of the processed holdings with their new (or preserved) prices,
    /// in snapshot order
    pub refreshed: Vec<Holding>,

    pub report: RefreshReport,

    /// Set when the run stopped before the end of the snapshot
    pub aborted: Option<CoreError>,
}

/// Re-quotes a snapshot of holdings one at a time, pacing the calls.
///
/// Strictly sequential: throughput is traded for staying under the provider's
/// request-rate ceiling. A failed quote never discards a holding's last-known price.
pub struct RefreshPipeline {
    pacer: Arc<dyn Pacer>,
    interval: Duration,
}

impl RefreshPipeline {
    pub fn new(pacer: Arc<dyn Pacer>, interval: Duration) -> Self {
        Self { pacer, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run over `snapshot` in order and return what was accumulated.
    pub async fn run(
        &self,
        quotes: &QuoteService,
        snapshot: &[Holding],
        cancel: &CancelToken,
    ) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::default();
        self.run_into(quotes, snapshot, cancel, &mut outcome).await;
        outcome
    }

    /// Run over `snapshot` in order, accumulating into `outcome` as it goes.
    ///
    /// 1. Quote the holding.
    /// 2. On success, carry the new price; on any failure, keep the old one and record it.
    /// 3. Pause for the pacing interval, except after the last holding.
    ///
    /// Cancellation stops the run at the next quote or pause and sets `aborted`.
    /// Results land in `outcome` as each holding is processed, so a caller that
    /// catches a panic from this future still holds everything processed before it.
    pub async fn run_into(
        &self,
        quotes: &QuoteService,
        snapshot: &[Holding],
        cancel: &CancelToken,
        outcome: &mut RefreshOutcome,
    ) {
        let total = snapshot.len();
        *outcome = RefreshOutcome {
            refreshed: Vec::with_capacity(total),
            report: RefreshReport {
                total,
                ..RefreshReport::default()
            },
            aborted: None,
        };

        info!(
            "Refreshing {total} holdings via {} ({}ms pacing)",
            quotes.provider_name(),
            self.interval.as_millis()
        );

        for (idx, holding) in snapshot.iter().enumerate() {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = quotes.fetch(&holding.symbol) => Some(result),
            };
            let Some(result) = fetched else {
                outcome.aborted = Some(CoreError::RefreshCancelled {
                    processed: idx,
                    total,
                });
                break;
            };

            let mut updated = holding.clone();
            match result {
                Ok(price) => {
                    updated.current_price = Some(price);
                    outcome.report.updated += 1;
                }
                Err(error) => {
                    debug!(
                        "Keeping previous price {:?} for {}",
                        holding.current_price, holding.symbol
                    );
                    outcome.report.failures.push(RefreshFailure {
                        holding_id: holding.id,
                        symbol: holding.symbol.clone(),
                        error,
                    });
                }
            }
            outcome.refreshed.push(updated);
            outcome.report.processed = idx + 1;

            if idx + 1 < total {
                let paced = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = self.pacer.pause(self.interval) => true,
                };
                if !paced {
                    outcome.aborted = Some(CoreError::RefreshCancelled {
                        processed: idx + 1,
                        total,
                    });
                    break;
                }
            }
        }

        info!(
            "Refresh finished: {} of {total} processed, {} updated, {} failed",
            outcome.report.processed,
            outcome.report.updated,
            outcome.report.failures.len()
        );
    }
}

impl std::fmt::Debug for RefreshPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshPipeline")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
