// src/fetch.rs
//! Data-fetching state slots shared by the page and its components.
//!
//! `Query` is the read side: it fetches on first mount and again whenever its
//! dependencies change. `Mutation` is the triggered side. Both keep a single
//! `{data, loading, error}` slot and turn failures into an error string; no
//! caller ever sees an `Err`.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

/// Boxed future returned by fetch and mutation functions.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> FetchState<T> {
    fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Full error chain, e.g. "Failed to get papers: error sending request".
fn describe(err: &anyhow::Error) -> String {
    let msg = format!("{err:#}");
    if msg.is_empty() {
        "Unknown error".to_string()
    } else {
        msg
    }
}

// ------------------------------------------------------------
// Query (read hook)
// ------------------------------------------------------------

struct QuerySlot<T, D> {
    state: FetchState<T>,
    deps: Option<D>,
    generation: u64,
}

type FetchFn<D, T> = Arc<dyn Fn(D) -> FetchFuture<T> + Send + Sync>;

pub struct Query<T, D> {
    label: &'static str,
    fetch: FetchFn<D, T>,
    initial: Option<T>,
    slot: RwLock<QuerySlot<T, D>>,
}

impl<T, D> Query<T, D>
where
    T: Clone + Send + Sync + 'static,
    D: Clone + PartialEq + Send + Sync + 'static,
{
    /// `loading` starts out `true`: nothing has been fetched yet.
    pub fn new<F>(label: &'static str, initial: Option<T>, fetch: F) -> Self
    where
        F: Fn(D) -> FetchFuture<T> + Send + Sync + 'static,
    {
        let state = FetchState {
            data: initial.clone(),
            loading: true,
            error: None,
        };
        Self {
            label,
            fetch: Arc::new(fetch),
            initial,
            slot: RwLock::new(QuerySlot {
                state,
                deps: None,
                generation: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> FetchState<T> {
        read(&self.slot).state.clone()
    }

    /// Fetch on first mount or when `deps` differs from the last synced value.
    /// Returns whether a fetch was issued.
    pub async fn sync(&self, deps: D) -> bool {
        let generation = {
            let mut slot = write(&self.slot);
            if slot.deps.as_ref() == Some(&deps) {
                return false;
            }
            slot.deps = Some(deps.clone());
            Self::begin(&mut slot)
        };
        self.run(generation, deps).await;
        true
    }

    /// Re-issue the fetch with the last synced deps. No-op before the first `sync`.
    pub async fn refetch(&self) -> bool {
        let (generation, deps) = {
            let mut slot = write(&self.slot);
            let Some(deps) = slot.deps.clone() else {
                return false;
            };
            (Self::begin(&mut slot), deps)
        };
        self.run(generation, deps).await;
        true
    }

    fn begin(slot: &mut QuerySlot<T, D>) -> u64 {
        slot.generation += 1;
        slot.state.loading = true;
        slot.generation
    }

    async fn run(&self, generation: u64, deps: D) {
        let result = (self.fetch)(deps).await;

        let mut slot = write(&self.slot);
        if slot.generation != generation {
            debug!(
                target: "desk::fetch",
                query = self.label,
                stale = generation,
                latest = slot.generation,
                "discarding stale response"
            );
            return;
        }
        slot.state = match result {
            Ok(data) => FetchState {
                data: Some(data),
                loading: false,
                error: None,
            },
            Err(e) => {
                warn!(target: "desk::fetch", query = self.label, error = %format!("{e:#}"), "API error");
                FetchState {
                    data: self.initial.clone(),
                    loading: false,
                    error: Some(describe(&e)),
                }
            }
        };
    }
}

// ------------------------------------------------------------
// Mutation (triggered hook)
// ------------------------------------------------------------

type MutateFn<P, T> = Arc<dyn Fn(P) -> FetchFuture<T> + Send + Sync>;

pub struct Mutation<P, T> {
    label: &'static str,
    call: MutateFn<P, T>,
    slot: RwLock<FetchState<T>>,
}

impl<P, T> Mutation<P, T>
where
    P: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F>(label: &'static str, call: F) -> Self
    where
        F: Fn(P) -> FetchFuture<T> + Send + Sync + 'static,
    {
        Self {
            label,
            call: Arc::new(call),
            slot: RwLock::new(FetchState::idle()),
        }
    }

    pub fn snapshot(&self) -> FetchState<T> {
        read(&self.slot).clone()
    }

    pub fn is_loading(&self) -> bool {
        read(&self.slot).loading
    }

    pub fn error(&self) -> Option<String> {
        read(&self.slot).error.clone()
    }

    pub fn data(&self) -> Option<T> {
        read(&self.slot).data.clone()
    }

    /// Run the call. Concurrent calls are allowed; whichever completes last
    /// owns the slot.
    pub async fn mutate(&self, params: P) -> Option<T> {
        write(&self.slot).loading = true;

        let result = (self.call)(params).await;

        let mut slot = write(&self.slot);
        match result {
            Ok(data) => {
                *slot = FetchState {
                    data: Some(data.clone()),
                    loading: false,
                    error: None,
                };
                Some(data)
            }
            Err(e) => {
                warn!(target: "desk::fetch", mutation = self.label, error = %format!("{e:#}"), "API mutation error");
                *slot = FetchState {
                    data: None,
                    loading: false,
                    error: Some(describe(&e)),
                };
                None
            }
        }
    }

    pub fn reset(&self) {
        *write(&self.slot) = FetchState::idle();
    }
}
