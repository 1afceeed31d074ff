//! Patient store: the full fetched collection plus the active search query.
//!
//! `visible_patients` is never stored. It is recomputed from
//! `(all_patients, query)` on every read, so a refresh can never leave a
//! stale filtered copy behind. Subscribers receive a [`StoreChange`] after
//! every mutation and re-read whatever they render.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::backend::PatientBackend;
use crate::models::{Patient, PatientCard};
use crate::search::filter_patients;

/// Buffered change events per subscriber before lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Mutation notifications for observers of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    LoadStarted,
    Loaded { count: usize },
    LoadFailed,
    QueryChanged,
}

/// What a load did with its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Result replaced the collection.
    Applied { count: usize },
    /// Backend failed; the collection was cleared.
    Failed { reason: String },
    /// A newer load was issued before this one resolved; result dropped.
    Superseded,
}

/// What the list area shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "patients", rename_all = "snake_case")]
pub enum StoreView {
    Loading,
    /// Nothing to show: either nothing matched or the last load failed.
    Empty,
    Patients(Vec<PatientCard>),
}

struct StoreState {
    all_patients: Vec<Patient>,
    query: String,
    loading: bool,
}

pub struct PatientStore {
    backend: Arc<dyn PatientBackend>,
    state: Mutex<StoreState>,
    /// Ticket of the most recently issued load.
    latest_load: AtomicU64,
    changes: broadcast::Sender<StoreChange>,
}

impl PatientStore {
    /// Starts in the loading state with an empty collection, as before the
    /// first fetch resolves.
    pub fn new(backend: Arc<dyn PatientBackend>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            backend,
            state: Mutex::new(StoreState {
                all_patients: Vec::new(),
                query: String::new(),
                loading: true,
            }),
            latest_load: AtomicU64::new(0),
            changes,
        }
    }

    /// Fetch the full collection. Never fails: a backend error empties the
    /// collection and is logged. Only the newest issued load may write.
    ///
    /// `loading` is only true until the first load resolves; later loads
    /// keep the current list on screen while they run.
    pub async fn load(&self) -> LoadOutcome {
        let ticket = self.latest_load.fetch_add(1, Ordering::SeqCst) + 1;
        self.notify(StoreChange::LoadStarted);

        let result = self.backend.list_patients().await;

        let (outcome, change) = {
            let mut state = self.lock_state();
            if ticket != self.latest_load.load(Ordering::SeqCst) {
                tracing::debug!(ticket, "Discarding superseded patient load");
                return LoadOutcome::Superseded;
            }

            state.loading = false;
            match result {
                Ok(patients) => {
                    let count = patients.len();
                    state.all_patients = patients;
                    tracing::debug!(ticket, count, "Patients loaded");
                    (LoadOutcome::Applied { count }, StoreChange::Loaded { count })
                }
                Err(e) => {
                    tracing::warn!(ticket, error = %e, "Error fetching patients");
                    state.all_patients.clear();
                    (
                        LoadOutcome::Failed { reason: e.to_string() },
                        StoreChange::LoadFailed,
                    )
                }
            }
        };

        self.notify(change);
        outcome
    }

    /// Re-fetch after a successful insert. The active query is kept and
    /// applies to the new collection.
    pub async fn refresh(&self) -> LoadOutcome {
        tracing::debug!("Refreshing patients");
        self.load().await
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.lock_state().query = query.into();
        self.notify(StoreChange::QueryChanged);
    }

    pub fn query(&self) -> String {
        self.lock_state().query.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock_state().loading
    }

    pub fn all_patients(&self) -> Vec<Patient> {
        self.lock_state().all_patients.clone()
    }

    /// Patients matching the active query, in collection order.
    pub fn visible_patients(&self) -> Vec<Patient> {
        let state = self.lock_state();
        filter_patients(&state.all_patients, &state.query)
    }

    pub fn view(&self) -> StoreView {
        if self.is_loading() {
            return StoreView::Loading;
        }
        let visible = self.visible_patients();
        if visible.is_empty() {
            StoreView::Empty
        } else {
            StoreView::Patients(visible.iter().map(Patient::card).collect())
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: StoreChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    /// State is plain data; a panic mid-update cannot break an invariant
    /// that a later read relies on, so poisoning is ignored.
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
