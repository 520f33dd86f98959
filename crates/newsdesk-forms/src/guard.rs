//! The submission guard.
//!
//! [`SubmissionGuard`] wraps an async action with three protections:
//!
//! 1. **Debounce**: a call that starts less than the debounce window after the
//!    previous call started returns [`Outcome::Debounced`] without running.
//! 2. **Exclusivity**: [`submit`](SubmissionGuard::submit) returns
//!    [`Outcome::Blocked`] while an earlier call is still pending.
//! 3. **Supersession**: [`supersede`](SubmissionGuard::supersede) marks the
//!    pending call's token cancelled and runs anyway. When the earlier call
//!    settles, its result is discarded and reported as
//!    [`Outcome::Cancelled`].
//!
//! The debounce check runs first. A call arriving exactly at the window edge
//! is outside the window.
//!
//! Cancellation is logical: the superseded action keeps running, only its
//! result is ignored. The guard knows nothing about forms or the network.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use newsdesk_forms::guard::{Outcome, SubmissionGuard};
//!
//! # tokio_test_block_on(async {
//! let guard = SubmissionGuard::new(Duration::from_millis(300));
//! let first = guard.submit(|| async { Ok::<_, String>(1) }).await;
//! assert_eq!(first, Outcome::Succeeded(1));
//!
//! let second = guard.submit(|| async { Ok::<_, String>(2) }).await;
//! assert_eq!(second, Outcome::Debounced);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Result of a guarded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R, E> {
    /// Started too soon after the previous call; the action did not run.
    Debounced,
    /// Another call is still pending; the action did not run.
    Blocked,
    /// The action ran but was superseded or reset before it settled.
    Cancelled,
    /// The action resolved.
    Succeeded(R),
    /// The action rejected.
    Failed(E),
}

/// The non-result outcomes, which forms ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    Debounced,
    Blocked,
    Cancelled,
}

impl<R, E> Outcome<R, E> {
    /// The rejection, if the call did not settle normally.
    pub const fn rejection(&self) -> Option<GuardRejection> {
        match self {
            Self::Debounced => Some(GuardRejection::Debounced),
            Self::Blocked => Some(GuardRejection::Blocked),
            Self::Cancelled => Some(GuardRejection::Cancelled),
            Self::Succeeded(_) | Self::Failed(_) => None,
        }
    }
}

impl<R, E> From<GuardRejection> for Outcome<R, E> {
    fn from(rejection: GuardRejection) -> Self {
        match rejection {
            GuardRejection::Debounced => Self::Debounced,
            GuardRejection::Blocked => Self::Blocked,
            GuardRejection::Cancelled => Self::Cancelled,
        }
    }
}

/// Identifies one in-flight guarded call.
#[derive(Debug)]
pub struct SubmissionToken {
    id: u64,
    cancelled: AtomicBool,
}

impl SubmissionToken {
    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct GuardState {
    last_start: Option<Instant>,
    pending: Option<Arc<SubmissionToken>>,
}

/// Debounces, deduplicates, and cancels async actions.
#[derive(Debug)]
pub struct SubmissionGuard {
    debounce: Duration,
    next_id: AtomicU64,
    state: Mutex<GuardState>,
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SubmissionGuard {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            next_id: AtomicU64::new(1),
            state: Mutex::new(GuardState::default()),
        }
    }

    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Whether a call is pending.
    pub fn is_submitting(&self) -> bool {
        self.state
            .lock()
            .expect("submission guard lock poisoned")
            .pending
            .is_some()
    }

    /// Runs `action` unless debounced or another call is pending.
    pub async fn submit<F, Fut, R, E>(&self, action: F) -> Outcome<R, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.run(action, false).await
    }

    /// Runs `action` unless debounced, cancelling any pending call.
    pub async fn supersede<F, Fut, R, E>(&self, action: F) -> Outcome<R, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.run(action, true).await
    }

    /// Cancels any pending call and clears the debounce timer so the next
    /// call is admitted immediately.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("submission guard lock poisoned");
        if let Some(token) = state.pending.take() {
            token.cancel();
        }
        state.last_start = None;
    }

    async fn run<F, Fut, R, E>(&self, action: F, supersede: bool) -> Outcome<R, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let token = match self.begin(supersede) {
            Ok(token) => token,
            Err(rejection) => {
                tracing::debug!(?rejection, "guarded call rejected");
                return rejection.into();
            }
        };
        let flight = InFlight {
            guard: self,
            token: Arc::clone(&token),
        };
        let result = action().await;
        drop(flight);

        if token.is_cancelled() {
            tracing::debug!(token = token.id(), "guarded call settled after cancellation");
            return Outcome::Cancelled;
        }
        match result {
            Ok(value) => Outcome::Succeeded(value),
            Err(err) => Outcome::Failed(err),
        }
    }

    fn begin(&self, supersede: bool) -> Result<Arc<SubmissionToken>, GuardRejection> {
        let now = Instant::now();
        let mut state = self.state.lock().expect("submission guard lock poisoned");
        if let Some(last) = state.last_start {
            if now.duration_since(last) < self.debounce {
                return Err(GuardRejection::Debounced);
            }
        }
        if let Some(pending) = &state.pending {
            if !supersede {
                return Err(GuardRejection::Blocked);
            }
            pending.cancel();
        }
        let token = Arc::new(SubmissionToken {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            cancelled: AtomicBool::new(false),
        });
        state.pending = Some(Arc::clone(&token));
        state.last_start = Some(now);
        Ok(token)
    }

    fn release(&self, token: &Arc<SubmissionToken>) {
        let mut state = self.state.lock().expect("submission guard lock poisoned");
        if state
            .pending
            .as_ref()
            .is_some_and(|pending| Arc::ptr_eq(pending, token))
        {
            state.pending = None;
        }
    }
}

/// Clears the pending marker when a call settles or its future is dropped.
struct InFlight<'a> {
    guard: &'a SubmissionGuard,
    token: Arc<SubmissionToken>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.guard.release(&self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    type Out = Outcome<u32, String>;

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_second_is_debounced() {
        let guard = SubmissionGuard::default();
        let runs = AtomicUsize::new(0);
        let first: Out = guard
            .submit(|| async {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await;
        tokio::time::advance(Duration::from_millis(299)).await;
        let second: Out = guard
            .submit(|| async {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
            .await;
        assert_eq!(first, Outcome::Succeeded(1));
        assert_eq!(second, Outcome::Debounced);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_window_edge_is_not_debounced() {
        let guard = SubmissionGuard::default();
        let _: Out = guard.submit(|| async { Ok(1) }).await;
        tokio::time::advance(DEFAULT_DEBOUNCE).await;
        let at_edge: Out = guard.submit(|| async { Ok(2) }).await;
        assert_eq!(at_edge, Outcome::Succeeded(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_call_blocks_after_window() {
        let guard = Arc::new(SubmissionGuard::default());
        let (tx, rx) = oneshot::channel::<()>();
        let slow = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move {
                guard
                    .submit(|| async move {
                        rx.await.ok();
                        Ok::<u32, String>(1)
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(guard.is_submitting());

        let within: Out = guard.submit(|| async { Ok(2) }).await;
        assert_eq!(within, Outcome::Debounced);

        tokio::time::advance(Duration::from_millis(500)).await;
        let after: Out = guard.submit(|| async { Ok(3) }).await;
        assert_eq!(after, Outcome::Blocked);

        tx.send(()).unwrap();
        assert_eq!(slow.await.unwrap(), Outcome::Succeeded(1));
        assert!(!guard.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_supersede_cancels_pending_call() {
        let guard = Arc::new(SubmissionGuard::default());
        let (tx, rx) = oneshot::channel::<()>();
        let first = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move {
                guard
                    .supersede(|| async move {
                        rx.await.ok();
                        Ok::<u32, String>(1)
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(400)).await;

        let second: Out = guard.supersede(|| async { Err("boom".to_string()) }).await;
        assert_eq!(second, Outcome::Failed("boom".to_string()));

        tx.send(()).unwrap();
        assert_eq!(first.await.unwrap(), Outcome::Cancelled);
        assert!(!guard.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_releases_guard() {
        let guard = SubmissionGuard::default();
        let failed: Out = guard.submit(|| async { Err("offline".to_string()) }).await;
        assert_eq!(failed, Outcome::Failed("offline".to_string()));
        assert!(!guard.is_submitting());
        tokio::time::advance(DEFAULT_DEBOUNCE).await;
        let retry: Out = guard.submit(|| async { Ok(7) }).await;
        assert_eq!(retry, Outcome::Succeeded(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_unlocks_and_cancels() {
        let guard = Arc::new(SubmissionGuard::default());
        let (tx, rx) = oneshot::channel::<()>();
        let hung = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move {
                guard
                    .submit(|| async move {
                        rx.await.ok();
                        Ok::<u32, String>(1)
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        guard.reset();
        assert!(!guard.is_submitting());
        let immediate: Out = guard.submit(|| async { Ok(2) }).await;
        assert_eq!(immediate, Outcome::Succeeded(2));

        tx.send(()).unwrap();
        assert_eq!(hung.await.unwrap(), Outcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_call_releases_pending_marker() {
        let guard = SubmissionGuard::default();
        {
            let call = guard.submit(|| std::future::pending::<Result<u32, String>>());
            let timed_out = tokio::time::timeout(Duration::from_millis(10), call).await;
            assert!(timed_out.is_err());
        }
        assert!(!guard.is_submitting());
    }

    #[test]
    fn test_rejection_mapping() {
        assert_eq!(Out::Blocked.rejection(), Some(GuardRejection::Blocked));
        assert_eq!(Out::Succeeded(1).rejection(), None);
        assert_eq!(Out::from(GuardRejection::Cancelled), Outcome::Cancelled);
    }
}
