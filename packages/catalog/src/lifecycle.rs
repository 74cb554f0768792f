//! Fetch lifecycle with stale-result suppression.
//!
//! Every fetch runs under a generation token. Starting a new fetch or
//! unmounting the consumer invalidates older tokens, and a completion
//! carrying an invalidated token is dropped instead of published. The
//! published state is observed through a [`tokio::sync::watch`] channel.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::formatter::{format_beneficiaries, BeneficiaryView};
use crate::services::{BeneficiaryQueryService, PartnerFundQueryService};
use crate::types::{CatalogFilter, PartnerFund};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

/// Marker for one in-flight fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What a completion did to the published state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Published,
    /// A newer fetch started or the consumer unmounted; nothing was published
    Superseded,
}

/// Published state of a fetch: `{data, loading, error}` plus bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSnapshot<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: FetchPhase,
    pub generation: u64,
}

impl<T: Default> Default for FetchSnapshot<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: None,
            phase: FetchPhase::Idle,
            generation: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Generation {
    current: u64,
    mounted: bool,
    settled: bool,
}

pub struct FetchController<T> {
    generation: Mutex<Generation>,
    state: watch::Sender<FetchSnapshot<T>>,
}

impl<T> FetchController<T>
where
    T: Clone + Default + Send + Sync,
{
    pub fn new() -> Self {
        let (state, _) = watch::channel(FetchSnapshot::default());
        Self {
            generation: Mutex::new(Generation::default()),
            state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Generation> {
        self.generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new generation. Mounts the consumer, sets `loading` and
    /// clears the error; previous data stays visible until replaced.
    pub fn begin(&self) -> GenerationToken {
        let mut generation = self.lock();
        generation.current += 1;
        generation.mounted = true;
        generation.settled = false;
        let current = generation.current;

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            state.phase = FetchPhase::Loading;
            state.generation = current;
        });
        debug!(generation = current, "Fetch started");
        GenerationToken(current)
    }

    pub fn is_current(&self, token: GenerationToken) -> bool {
        let generation = self.lock();
        generation.mounted && !generation.settled && generation.current == token.0
    }

    /// Publish a completion if its generation is still current. Each
    /// generation publishes at most once.
    pub fn publish<E: fmt::Display>(
        &self,
        token: GenerationToken,
        result: Result<T, E>,
    ) -> FetchOutcome {
        let mut generation = self.lock();
        if !generation.mounted || generation.settled || generation.current != token.0 {
            warn!(
                generation = token.0,
                current = generation.current,
                mounted = generation.mounted,
                "Discarding superseded fetch result"
            );
            return FetchOutcome::Superseded;
        }
        generation.settled = true;

        self.state.send_modify(|state| {
            state.loading = false;
            match result {
                Ok(data) => {
                    state.data = data;
                    state.error = None;
                    state.phase = FetchPhase::Success;
                }
                Err(e) => {
                    state.error = Some(e.to_string());
                    state.phase = FetchPhase::Failed;
                }
            }
        });
        FetchOutcome::Published
    }

    /// Begin a generation, await the fetch and publish its result
    pub async fn run<F, E>(&self, fetch: F) -> FetchOutcome
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let token = self.begin();
        let result = fetch.await;
        self.publish(token, result)
    }

    /// Invalidate the in-flight generation. Published state is left as it
    /// was and nothing is published until the next `begin`.
    pub fn unmount(&self) {
        let mut generation = self.lock();
        generation.current += 1;
        generation.mounted = false;
        debug!(generation = generation.current, "Fetch consumer unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FetchSnapshot<T> {
        self.state.borrow().clone()
    }
}

impl<T> Default for FetchController<T>
where
    T: Clone + Default + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Catalog listing that re-fetches when its filter changes
pub struct BeneficiaryFeed {
    service: BeneficiaryQueryService,
    controller: Arc<FetchController<Vec<BeneficiaryView>>>,
    filter: Mutex<Option<CatalogFilter>>,
}

impl BeneficiaryFeed {
    pub fn new(service: BeneficiaryQueryService) -> Self {
        Self {
            service,
            controller: Arc::new(FetchController::new()),
            filter: Mutex::new(None),
        }
    }

    pub fn controller(&self) -> Arc<FetchController<Vec<BeneficiaryView>>> {
        Arc::clone(&self.controller)
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot<Vec<BeneficiaryView>>> {
        self.controller.subscribe()
    }

    pub fn snapshot(&self) -> FetchSnapshot<Vec<BeneficiaryView>> {
        self.controller.snapshot()
    }

    fn lock_filter(&self) -> MutexGuard<'_, Option<CatalogFilter>> {
        self.filter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply a filter. Fetches on first use and whenever the filter differs
    /// from the last one; returns `None` when nothing was fetched.
    pub async fn set_filter(&self, filter: CatalogFilter) -> Option<FetchOutcome> {
        {
            let mut current = self.lock_filter();
            if current.as_ref() == Some(&filter) {
                return None;
            }
            *current = Some(filter.clone());
        }
        Some(self.load(filter).await)
    }

    /// Fetch again with the last filter, or the default one if none was set
    pub async fn refresh(&self) -> FetchOutcome {
        let filter = self
            .lock_filter()
            .get_or_insert_with(CatalogFilter::default)
            .clone();
        self.load(filter).await
    }

    pub fn unmount(&self) {
        self.lock_filter().take();
        self.controller.unmount();
    }

    async fn load(&self, filter: CatalogFilter) -> FetchOutcome {
        self.controller
            .run(async {
                self.service
                    .fetch_beneficiaries(&filter)
                    .await
                    .map(|records| format_beneficiaries(&records))
            })
            .await
    }
}

/// Partner fund listing; fetched once per mount
pub struct PartnerFundFeed {
    service: PartnerFundQueryService,
    controller: Arc<FetchController<Vec<PartnerFund>>>,
}

impl PartnerFundFeed {
    pub fn new(service: PartnerFundQueryService) -> Self {
        Self {
            service,
            controller: Arc::new(FetchController::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot<Vec<PartnerFund>>> {
        self.controller.subscribe()
    }

    pub fn snapshot(&self) -> FetchSnapshot<Vec<PartnerFund>> {
        self.controller.snapshot()
    }

    pub async fn mount(&self) -> FetchOutcome {
        self.controller
            .run(self.service.fetch_partner_funds())
            .await
    }

    pub fn unmount(&self) {
        self.controller.unmount();
    }
}
