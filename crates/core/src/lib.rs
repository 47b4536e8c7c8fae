pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use futures::FutureExt;
use log::{debug, info, warn};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use errors::{CoreError, QuoteError};
use models::{
    analytics::PortfolioSummary,
    holding::{AddHoldingRequest, Holding},
    refresh::RefreshReport,
    settings::Settings,
    state::{PortfolioState, Status},
};
use providers::{alphavantage::AlphaVantageClient, traits::QuoteProvider};
use services::{
    analytics_service::AnalyticsService,
    holding_service::HoldingService,
    quote_service::QuoteService,
    refresh_service::{CancelToken, Pacer, RefreshOutcome, RefreshPipeline, TokioPacer},
};

/// Mutable state guarded by the store's mutex.
struct Inner {
    state: PortfolioState,
    /// Bumped by `clear_all`; an operation started under an older epoch must not commit.
    epoch: u64,
    /// Cancellation handle of the refresh run in flight, if any.
    active_refresh: Option<CancelToken>,
}

/// The single-flight slot. Dropping it returns the store to `Idle`,
/// so every exit path (errors, panics, dropped futures) releases it.
struct Flight<'a> {
    store: &'a PortfolioStore,
    epoch: u64,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut inner = self.store.lock();
        inner.state.status = Status::Idle;
        inner.active_refresh = None;
    }
}

/// Main entry point for the Stock Tracker core library.
/// Holds the holdings, the global status flags and the services that operate on them.
///
/// All operations take `&self`; share the store between UI handlers with an `Arc`.
/// At most one add or refresh runs at a time, others are rejected with
/// [`CoreError::Busy`].
#[must_use]
pub struct PortfolioStore {
    inner: Mutex<Inner>,
    quotes: QuoteService,
    pipeline: RefreshPipeline,
    holding_service: HoldingService,
    analytics_service: AnalyticsService,
}

impl std::fmt::Debug for PortfolioStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("PortfolioStore")
            .field("holdings", &inner.state.holdings.len())
            .field("status", &inner.state.status)
            .field("last_error", &inner.state.last_error)
            .field("quotes", &self.quotes)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl PortfolioStore {
    /// Create an empty store backed by Alpha Vantage.
    pub fn new(settings: &Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let client = AlphaVantageClient::new(settings);
        Ok(Self::with_provider(Arc::new(client), settings))
    }

    /// Create an empty store backed by any quote provider, pacing refreshes on the tokio timer.
    pub fn with_provider(provider: Arc<dyn QuoteProvider>, settings: &Settings) -> Self {
        Self::with_provider_and_pacer(provider, Arc::new(TokioPacer), settings)
    }

    /// Create an empty store with an explicit provider and pacer.
    pub fn with_provider_and_pacer(
        provider: Arc<dyn QuoteProvider>,
        pacer: Arc<dyn Pacer>,
        settings: &Settings,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: PortfolioState::default(),
                epoch: 0,
                active_refresh: None,
            }),
            quotes: QuoteService::new(provider, settings.request_timeout()),
            pipeline: RefreshPipeline::new(pacer, settings.pacing_interval()),
            holding_service: HoldingService::new(),
            analytics_service: AnalyticsService::new(),
        }
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Validate a request, quote its symbol and start tracking it.
    ///
    /// Invalid input is rejected before any network call. On any quote failure the
    /// holdings are left unchanged and `last_error` explains what happened.
    pub async fn add_holding(&self, request: AddHoldingRequest) -> Result<Holding, CoreError> {
        let request = match self.holding_service.validate_request(&request) {
            Ok(request) => request,
            Err(e) => {
                self.lock().state.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let flight = {
            let mut inner = self.lock();
            self.begin(&mut inner, None)?
        };
        debug!(
            "Adding {} x{} @ {}",
            request.symbol, request.quantity, request.purchase_price
        );

        let quote = AssertUnwindSafe(self.quotes.fetch(&request.symbol))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let reason = panic_message(panic.as_ref());
                warn!("Quote for {} aborted unexpectedly: {reason}", request.symbol);
                Err(QuoteError::Network(reason))
            });

        let mut inner = self.lock();
        if inner.epoch != flight.epoch {
            info!("Portfolio cleared while adding {}; discarding", request.symbol);
            return Err(CoreError::Cleared);
        }

        match quote {
            Ok(price) => {
                let holding = self.holding_service.create_holding(request, price);
                self.holding_service
                    .prepend(&mut inner.state.holdings, holding.clone());
                info!("Added {} ({}) at {price}", holding.symbol, holding.id);
                Ok(holding)
            }
            Err(e) => {
                let err = CoreError::from(e);
                inner.state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Remove every holding and the last error. Never fails, never touches the network.
    ///
    /// A refresh in flight is cancelled and an add in flight will not commit.
    pub fn clear_all(&self) {
        let mut inner = self.lock();
        inner.state.holdings.clear();
        inner.state.last_error = None;
        inner.epoch = inner.epoch.wrapping_add(1);
        if let Some(token) = inner.active_refresh.take() {
            token.cancel();
        }
        info!("Portfolio cleared");
    }

    /// Re-quote every holding, one at a time with the pacing interval in between.
    ///
    /// No-op on an empty portfolio. A holding whose quote fails keeps its previous
    /// price and is listed in the report; `last_error` is only set when the run as a
    /// whole fails, and even then the prices gathered so far are kept. A run stopped
    /// by `cancel_refresh` keeps its prices too but leaves `last_error` alone.
    pub async fn refresh_all(&self) -> Result<RefreshReport, CoreError> {
        let cancel = CancelToken::new();
        let (flight, snapshot) = {
            let mut inner = self.lock();
            if inner.state.holdings.is_empty() {
                return Ok(RefreshReport::default());
            }
            let flight = self.begin(&mut inner, Some(cancel.clone()))?;
            (flight, inner.state.holdings.clone())
        };

        let mut outcome = RefreshOutcome::default();
        let run = AssertUnwindSafe(self.pipeline.run_into(
            &self.quotes,
            &snapshot,
            &cancel,
            &mut outcome,
        ))
        .catch_unwind()
        .await;
        if let Err(panic) = run {
            let reason = panic_message(panic.as_ref());
            warn!("Refresh aborted unexpectedly: {reason}");
            outcome.aborted = Some(CoreError::RefreshFailed(reason));
        }

        let mut inner = self.lock();
        if inner.epoch != flight.epoch {
            info!("Portfolio cleared during refresh; discarding results");
            return Err(CoreError::Cleared);
        }

        let merged = self
            .holding_service
            .merge_refreshed(&mut inner.state.holdings, &outcome.refreshed);
        debug!("Committed {merged} refreshed holdings");

        match outcome.aborted {
            Some(err @ CoreError::RefreshCancelled { .. }) => Err(err),
            Some(err) => {
                inner.state.last_error = Some(err.to_string());
                Err(err)
            }
            None => Ok(outcome.report),
        }
    }

    /// Abort the refresh in flight, keeping the prices it already fetched.
    /// The refresh returns `RefreshCancelled` without recording a `last_error`.
    /// Returns `false` if no refresh is running.
    pub fn cancel_refresh(&self) -> bool {
        match &self.lock().active_refresh {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Stop tracking one holding.
    pub fn remove_holding(&self, id: Uuid) -> Result<Holding, CoreError> {
        let mut inner = self.lock();
        let removed = self.holding_service.remove(&mut inner.state.holdings, id)?;
        info!("Removed {} ({id})", removed.symbol);
        Ok(removed)
    }

    /// Clear the last error message without starting an operation.
    pub fn dismiss_error(&self) {
        self.lock().state.last_error = None;
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Snapshot of everything the UI renders.
    #[must_use]
    pub fn state(&self) -> PortfolioState {
        self.lock().state.clone()
    }

    /// All holdings, newest first.
    #[must_use]
    pub fn holdings(&self) -> Vec<Holding> {
        self.lock().state.holdings.clone()
    }

    #[must_use]
    pub fn get_holding(&self, id: Uuid) -> Option<Holding> {
        self.lock()
            .state
            .holdings
            .iter()
            .find(|h| h.id == id)
            .cloned()
    }

    /// All lots of one symbol (case-insensitive), newest first.
    #[must_use]
    pub fn holdings_for_symbol(&self, symbol: &str) -> Vec<Holding> {
        let symbol = HoldingService::normalize_symbol(symbol);
        self.lock()
            .state
            .holdings
            .iter()
            .filter(|h| h.symbol == symbol)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.lock().state.status
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status() == Status::Loading
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock().state.last_error.clone()
    }

    /// Portfolio-wide totals over the current holdings.
    #[must_use]
    pub fn summary(&self) -> PortfolioSummary {
        self.analytics_service.summarize(&self.lock().state.holdings)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the single-flight slot: `Loading`, error cleared.
    fn begin(
        &self,
        inner: &mut Inner,
        refresh: Option<CancelToken>,
    ) -> Result<Flight<'_>, CoreError> {
        if inner.state.status == Status::Loading {
            debug!("Rejecting operation: another one is in flight");
            return Err(CoreError::Busy);
        }
        inner.state.status = Status::Loading;
        inner.state.last_error = None;
        inner.active_refresh = refresh;
        Ok(Flight {
            store: self,
            epoch: inner.epoch,
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}
