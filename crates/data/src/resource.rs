//! Uniform query lifecycle: loading / data / error plus manual refetch.
//!
//! Every aggregation query is wrapped in a [`QueryResource`], which owns
//! the fetch pipeline and a single [`ResultState`] cell. Consumers read
//! the state snapshot and call [`QueryResource::refetch`] to re-run the
//! pipeline from the top.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_core::future::BoxFuture;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{DataError, DataResult};

/// Result container read by consumers.
///
/// Invariant: once a fetch has settled, exactly one of `data` or `error`
/// is set. While `loading` is true the previous `data`/`error` may still
/// be visible; both are overwritten on settle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultState<T> {
    pub data: Option<T>,
    pub error: Option<DataError>,
    pub loading: bool,
}

impl<T> ResultState<T> {
    /// Initial state: nothing fetched yet.
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }

    /// A fetch cycle has begun.
    pub fn start(&mut self) {
        self.loading = true;
    }

    /// The fetch settled with data.
    pub fn succeed(&mut self, value: T) {
        self.data = Some(value);
        self.error = None;
        self.loading = false;
    }

    /// The fetch settled with an error; any previous data is discarded.
    pub fn fail(&mut self, err: DataError) {
        self.data = None;
        self.error = Some(err);
        self.loading = false;
    }
}

impl<T> Default for ResultState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

type FetchFn<T> = dyn Fn() -> BoxFuture<'static, DataResult<T>> + Send + Sync;

/// One query's lifecycle driver.
///
/// Holds the fetch closure, the live [`ResultState`], and a request epoch.
/// Each `refetch` runs an independent pipeline; a completion whose epoch
/// is no longer current is discarded, so overlapping refetches cannot
/// clobber a newer result with a staler one.
pub struct QueryResource<T> {
    state: RwLock<ResultState<T>>,
    epoch: AtomicU64,
    fetch: Box<FetchFn<T>>,
}

impl<T: Clone> QueryResource<T> {
    /// Create a resource in the idle state; no fetch is issued until
    /// [`refetch`](Self::refetch) is called.
    pub fn new<F, Fut>(fetch: F) -> Arc<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DataResult<T>> + Send + 'static,
    {
        Arc::new(Self {
            state: RwLock::new(ResultState::idle()),
            epoch: AtomicU64::new(0),
            fetch: Box::new(move || -> BoxFuture<'static, DataResult<T>> { Box::pin(fetch()) }),
        })
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ResultState<T> {
        self.state.read().clone()
    }

    /// Run the fetch pipeline and commit the outcome.
    ///
    /// Commits only if no newer refetch started while this one was in
    /// flight; stale completions are dropped. Returns the state observed
    /// after this call settled (which may be a newer call's result).
    pub async fn refetch(&self) -> ResultState<T> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.write().start();

        let outcome = (self.fetch)().await;

        let mut state = self.state.write();
        if self.epoch.load(Ordering::SeqCst) == epoch {
            match outcome {
                Ok(value) => state.succeed(value),
                Err(err) => state.fail(err),
            }
        } else {
            debug!(epoch, "discarding stale fetch completion");
        }
        state.clone()
    }
}

impl<T> std::fmt::Debug for QueryResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResource")
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use tokio::sync::Notify;

    #[test]
    fn state_transitions() {
        let mut state: ResultState<u32> = ResultState::idle();
        assert!(!state.loading);
        assert!(state.data.is_none() && state.error.is_none());

        state.start();
        assert!(state.loading);

        state.succeed(7);
        assert_eq!(state.data, Some(7));
        assert!(state.error.is_none());
        assert!(!state.loading);

        state.start();
        state.fail(DataError::NotFound("row".to_string()));
        assert!(state.data.is_none());
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn refetch_commits_success_and_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let resource = QueryResource::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(vec![1, 2, 3])
                } else {
                    Err(DataError::RecordFetch("backend down".to_string()))
                }
            }
        });

        let state = resource.refetch().await;
        assert_eq!(state.data, Some(vec![1, 2, 3]));
        assert!(state.error.is_none());

        let state = resource.refetch().await;
        assert!(state.data.is_none());
        assert_eq!(
            state.error,
            Some(DataError::RecordFetch("backend down".to_string()))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resource_is_reusable_after_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let resource = QueryResource::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(DataError::RecordFetch("transient".to_string()))
                } else {
                    Ok(n)
                }
            }
        });

        assert!(resource.refetch().await.error.is_some());
        let state = resource.refetch().await;
        assert_eq!(state.data, Some(1));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        // First call blocks on the gate; second call completes immediately.
        // Releasing the gate afterwards must not overwrite the newer result.
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicU32::new(0));

        let gate_in = Arc::clone(&gate);
        let counter = Arc::clone(&calls);
        let resource = QueryResource::new(move || {
            let gate = Arc::clone(&gate_in);
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    gate.notified().await;
                    Ok("stale".to_string())
                } else {
                    Ok("fresh".to_string())
                }
            }
        });

        let slow = {
            let resource = Arc::clone(&resource);
            tokio::spawn(async move { resource.refetch().await })
        };
        // Let the slow fetch register its epoch before starting the fast one.
        tokio::task::yield_now().await;

        let state = resource.refetch().await;
        assert_eq!(state.data.as_deref(), Some("fresh"));

        gate.notify_one();
        slow.await.expect("slow refetch panicked");

        assert_eq!(resource.state().data.as_deref(), Some("fresh"));
    }
}
