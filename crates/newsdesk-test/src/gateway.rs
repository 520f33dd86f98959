//! A [`PersistenceGateway`] that records calls and can be told to fail or
//! stall.
//!
//! [`RecordingGateway`] wraps a [`MemoryGateway`]. Every call is logged when
//! it starts, before any injected failure or hold applies, so a test can
//! tell "called and failed" apart from "never called".
//!
//! ## Example
//!
//! ```rust,no_run
//! use newsdesk_db::{Collection, PersistenceGateway, Row};
//! use newsdesk_test::gateway::{GatewayOp, RecordingGateway};
//!
//! # async fn demo() {
//! let gateway = RecordingGateway::new();
//! gateway.fail_next(newsdesk_core::NewsdeskError::Network("offline".into()));
//! assert!(gateway.insert_one(Collection::AdRequests, Row::new()).await.is_err());
//! assert_eq!(gateway.count_calls(GatewayOp::Insert, Collection::AdRequests), 1);
//! assert!(gateway.rows(Collection::AdRequests).is_empty());
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use newsdesk_core::{NewsdeskError, NewsdeskResult};
use newsdesk_db::{Collection, MemoryGateway, PersistenceGateway, Q, Query, Row};
use tokio::sync::watch;

/// Which gateway method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOp {
    Insert,
    Update,
    Select,
    Delete,
}

/// One logged call.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub op: GatewayOp,
    pub collection: Collection,
    /// Rows passed to `insert`, or the patch passed to `update`.
    pub rows: Vec<Row>,
}

type ErrorFactory = Arc<dyn Fn() -> NewsdeskError + Send + Sync>;

#[derive(Default)]
struct Failures {
    queued: VecDeque<NewsdeskError>,
    always: Option<ErrorFactory>,
}

/// In-memory gateway with a call log, failure injection, and a hold latch.
pub struct RecordingGateway {
    inner: MemoryGateway,
    calls: watch::Sender<Vec<GatewayCall>>,
    held: watch::Sender<bool>,
    failures: Mutex<Failures>,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            inner: MemoryGateway::new(),
            calls: watch::channel(Vec::new()).0,
            held: watch::channel(false).0,
            failures: Mutex::new(Failures::default()),
        }
    }

    /// The wrapped store, for seeding and inspection.
    pub const fn memory(&self) -> &MemoryGateway {
        &self.inner
    }

    /// Rows currently stored in `collection`.
    pub fn rows(&self, collection: Collection) -> Vec<Row> {
        self.inner.rows(collection)
    }

    /// Inserts rows without logging a call.
    pub fn seed(&self, collection: Collection, rows: impl IntoIterator<Item = Row>) {
        self.inner.seed(collection, rows);
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.borrow().clone()
    }

    /// How many calls of `op` hit `collection`.
    pub fn count_calls(&self, op: GatewayOp, collection: Collection) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.op == op && c.collection == collection)
            .count()
    }

    /// Waits until at least `n` calls have started.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.calls.subscribe();
        let _ = rx.wait_for(|calls| calls.len() >= n).await;
    }

    /// Makes the next call fail with `error`. Queued failures are used in
    /// order, one per call.
    pub fn fail_next(&self, error: NewsdeskError) {
        self.failures
            .lock()
            .expect("RecordingGateway lock poisoned")
            .queued
            .push_back(error);
    }

    /// Makes every call fail with an error built by `make`.
    pub fn fail_always<F>(&self, make: F)
    where
        F: Fn() -> NewsdeskError + Send + Sync + 'static,
    {
        self.failures
            .lock()
            .expect("RecordingGateway lock poisoned")
            .always = Some(Arc::new(make));
    }

    /// Clears every injected failure.
    pub fn heal(&self) {
        let mut failures = self.failures.lock().expect("RecordingGateway lock poisoned");
        failures.queued.clear();
        failures.always = None;
    }

    /// Stalls every call (after logging it) until [`release`](Self::release).
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    /// Lets held calls continue.
    pub fn release(&self) {
        self.held.send_replace(false);
    }

    async fn enter(&self, op: GatewayOp, collection: Collection, rows: Vec<Row>) -> NewsdeskResult<()> {
        self.calls.send_modify(|calls| {
            calls.push(GatewayCall {
                op,
                collection,
                rows,
            });
        });
        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        let mut failures = self.failures.lock().expect("RecordingGateway lock poisoned");
        if let Some(error) = failures.queued.pop_front() {
            return Err(error);
        }
        match &failures.always {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceGateway for RecordingGateway {
    async fn insert(&self, collection: Collection, records: Vec<Row>) -> NewsdeskResult<Vec<Row>> {
        self.enter(GatewayOp::Insert, collection, records.clone())
            .await?;
        self.inner.insert(collection, records).await
    }

    async fn update(&self, collection: Collection, filter: &Q, patch: Row) -> NewsdeskResult<()> {
        self.enter(GatewayOp::Update, collection, vec![patch.clone()])
            .await?;
        self.inner.update(collection, filter, patch).await
    }

    async fn select(&self, collection: Collection, query: &Query) -> NewsdeskResult<Vec<Row>> {
        self.enter(GatewayOp::Select, collection, Vec::new()).await?;
        self.inner.select(collection, query).await
    }

    async fn delete(&self, collection: Collection, filter: &Q) -> NewsdeskResult<()> {
        self.enter(GatewayOp::Delete, collection, Vec::new()).await?;
        self.inner.delete(collection, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fail_next_is_used_once() {
        let gateway = RecordingGateway::new();
        gateway.fail_next(NewsdeskError::Database("boom".into()));
        let first = gateway
            .insert_one(Collection::ServiceRequests, Row::new().with("email", "a@b.com"))
            .await;
        assert!(matches!(first, Err(NewsdeskError::Database(_))));
        gateway
            .insert_one(Collection::ServiceRequests, Row::new().with("email", "a@b.com"))
            .await
            .unwrap();
        assert_eq!(gateway.count_calls(GatewayOp::Insert, Collection::ServiceRequests), 2);
        assert_eq!(gateway.rows(Collection::ServiceRequests).len(), 1);
    }

    #[tokio::test]
    async fn test_fail_always_until_healed() {
        let gateway = RecordingGateway::new();
        gateway.fail_always(|| NewsdeskError::Network("offline".into()));
        assert!(gateway.select(Collection::Profiles, &Query::all()).await.is_err());
        assert!(gateway.select(Collection::Profiles, &Query::all()).await.is_err());
        gateway.heal();
        assert!(gateway.select(Collection::Profiles, &Query::all()).await.is_ok());
    }

    #[tokio::test]
    async fn test_hold_stalls_after_logging() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.hold();
        let task = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .insert_one(Collection::AdRequests, Row::new().with("sector", "media"))
                    .await
            })
        };
        gateway.wait_for_calls(1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());
        assert!(gateway.rows(Collection::AdRequests).is_empty());

        gateway.release();
        task.await.unwrap().unwrap();
        assert_eq!(gateway.rows(Collection::AdRequests).len(), 1);
    }
}
