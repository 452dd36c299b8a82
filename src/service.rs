//! Reconciliation of the remote catalog with the local store.
//!
//! `RecipeService` decides when to read the cache, when to fetch and when to
//! persist. Its current result is a [`Snapshot`]; every transition is
//! broadcast to subscribers in the order it happens.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::client::{CatalogSource, FetchError};
use crate::model::Recipe;
use crate::store::{RecipeStore, StoreError};

/// Snapshots buffered per subscriber before the oldest are dropped.
pub const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a ready result set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready(Origin),
    Failed(ServiceError),
}

/// Observable value: state, the records to render, and any non-fatal
/// persistence problem the UI should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: LoadState,
    pub recipes: Arc<[Recipe]>,
    pub warning: Option<StoreError>,
}

impl Snapshot {
    fn idle() -> Self {
        Self {
            state: LoadState::Idle,
            recipes: Arc::from(Vec::new()),
            warning: None,
        }
    }
}

pub struct RecipeService {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn RecipeStore>,
    current: Mutex<Snapshot>,
    // Held for the whole of a load or refresh: at most one in flight.
    flight: tokio::sync::Mutex<()>,
    events: broadcast::Sender<Snapshot>,
}

/// Puts a session left at `Loading` back to `Idle` when a load future is
/// dropped before the fetch resolves.
struct LoadingReset<'a>(&'a RecipeService);

impl Drop for LoadingReset<'_> {
    fn drop(&mut self) {
        self.0.publish_if(
            |s| s.state == LoadState::Loading,
            |s| s.state = LoadState::Idle,
        );
    }
}

/// Keep the first record for each id, preserving fetch order, so the exposed
/// set matches what the store persists.
fn dedupe_by_id(recipes: Vec<Recipe>) -> Vec<Recipe> {
    let fetched = recipes.len();
    let mut seen = HashSet::with_capacity(fetched);
    let unique: Vec<Recipe> = recipes
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if unique.len() < fetched {
        warn!(
            fetched,
            unique = unique.len(),
            "catalog contained duplicate ids; keeping first occurrence"
        );
    }
    unique
}

impl RecipeService {
    pub fn new(source: Arc<dyn CatalogSource>, store: Arc<dyn RecipeStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            source,
            store,
            current: Mutex::new(Snapshot::idle()),
            flight: tokio::sync::Mutex::new(()),
            events,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive every subsequent snapshot, in transition order.
    ///
    /// A receiver that falls more than [`EVENT_CAPACITY`] snapshots behind
    /// gets `RecvError::Lagged` and misses the skipped transitions; it should
    /// then resynchronize from [`RecipeService::snapshot`], which always holds
    /// the latest state.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.events.subscribe()
    }

    /// Detail lookup by id.
    pub async fn find(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
        Ok(self.store.find(id).await?.map(Recipe::from))
    }

    /// Serve cached records when any exist, otherwise fetch and persist.
    ///
    /// A call made while another load or refresh is running waits for it and
    /// returns its outcome without fetching again.
    pub async fn load(&self) -> Snapshot {
        let _flight = match self.flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("load already in flight; joining");
                let _joined = self.flight.lock().await;
                return self.snapshot();
            }
        };
        let current = self.snapshot();
        if matches!(current.state, LoadState::Ready(_)) {
            return current;
        }
        self.run_load().await
    }

    /// Drop every stored record and load again from the network.
    ///
    /// If the store cannot be cleared the prior result set stays visible and
    /// the failure is reported as a warning; no fetch is attempted.
    pub async fn refresh(&self) -> Snapshot {
        let _flight = self.flight.lock().await;
        if let Err(err) = self.store.clear_all().await {
            warn!(%err, "refresh could not clear local store");
            return self.publish(|s| s.warning = Some(err));
        }
        self.publish(|s| *s = Snapshot::idle());
        self.run_load().await
    }

    async fn run_load(&self) -> Snapshot {
        match self.store.is_empty().await {
            Ok(true) => {}
            Ok(false) => return self.load_from_cache().await,
            Err(err) => return self.fail(err.into()),
        }

        self.publish(|s| s.state = LoadState::Loading);
        let _reset = LoadingReset(self);

        match self.source.fetch_catalog().await {
            Ok(recipes) => {
                let recipes = dedupe_by_id(recipes);
                let warning = match self.store.insert_if_absent(&recipes).await {
                    Ok(inserted) => {
                        info!(fetched = recipes.len(), inserted, "catalog loaded from network");
                        None
                    }
                    Err(err) => {
                        warn!(%err, "fetched catalog could not be persisted");
                        Some(err)
                    }
                };
                let recipes: Arc<[Recipe]> = Arc::from(recipes);
                self.publish(|s| {
                    s.state = LoadState::Ready(Origin::Network);
                    s.recipes = recipes;
                    s.warning = warning;
                })
            }
            Err(err) => self.fail(err.into()),
        }
    }

    async fn load_from_cache(&self) -> Snapshot {
        match self.store.all().await {
            Ok(records) => {
                let recipes: Arc<[Recipe]> = records.into_iter().map(Recipe::from).collect();
                debug!(count = recipes.len(), "serving recipes from local store");
                self.publish(|s| {
                    s.state = LoadState::Ready(Origin::Cache);
                    s.recipes = recipes;
                    s.warning = None;
                })
            }
            Err(err) => self.fail(err.into()),
        }
    }

    /// Result set stays whatever was last known.
    fn fail(&self, err: ServiceError) -> Snapshot {
        warn!(%err, "recipe load failed");
        self.publish(|s| {
            s.state = LoadState::Failed(err);
            s.warning = None;
        })
    }

    fn publish(&self, update: impl FnOnce(&mut Snapshot)) -> Snapshot {
        self.publish_if(|_| true, update)
    }

    // The lock is held while sending so subscribers see transitions in order.
    fn publish_if(
        &self,
        applies: impl FnOnce(&Snapshot) -> bool,
        update: impl FnOnce(&mut Snapshot),
    ) -> Snapshot {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if applies(&current) {
            update(&mut current);
            debug!(state = ?current.state, recipes = current.recipes.len(), "state transition");
            let _ = self.events.send(current.clone());
        }
        current.clone()
    }
}
