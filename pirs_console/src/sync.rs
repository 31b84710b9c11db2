/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Polling synchronizer.
//!
//! Runs a fixed set of [`Fetcher`]s concurrently, once immediately and
//! then again `interval` after each cycle *completes* (cycles never
//! overlap). Results are joined field by field into a [`ViewSnapshot`]
//! published on a `watch` channel:
//!
//! - each field has exactly one owning fetcher; a failure only marks
//!   that field's error and keeps its previous value;
//! - a slow or failing fetcher never cancels the others, and nothing
//!   is retried before the next cycle;
//! - [`RefreshHandle::refresh_now`] wakes the loop early. Requests
//!   that arrive while a cycle is running coalesce into exactly one
//!   follow-up cycle.
//!
//! The loop runs in a [`ScheduledTask`], so [`Synchronizer::stop`] (or
//! dropping the synchronizer) ends it deterministically.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::Notify;
use tokio::sync::watch;

use crate::client::WarehouseApi;
use crate::error::ConsoleError;
use crate::error::Result;
use crate::payload::Subtree;
use crate::snapshot::Connectivity;
use crate::snapshot::FieldId;
use crate::snapshot::SnapshotUpdate;
use crate::snapshot::Stamp;
use crate::snapshot::ViewSnapshot;
use crate::task::ScheduledTask;

type FetchFuture = Pin<Box<dyn Future<Output = Result<SnapshotUpdate>> + Send>>;

/// One read, bound to the snapshot field it owns.
pub struct Fetcher {
    field: FieldId,
    fetch: Box<dyn Fn() -> FetchFuture + Send + Sync>,
}

impl Fetcher {
    pub fn new<F, Fut>(field: FieldId, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SnapshotUpdate>> + Send + 'static,
    {
        Self {
            field,
            fetch: Box::new(move || Box::pin(fetch())),
        }
    }

    pub fn field(&self) -> FieldId {
        self.field
    }
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher").field("field", &self.field).finish()
    }
}

/// Cloneable handle for requesting an early refresh.
#[derive(Debug, Clone, Default)]
pub struct RefreshHandle {
    notify: Arc<Notify>,
    requests: Arc<AtomicU64>,
}

impl RefreshHandle {
    /// Ask for a polling cycle as soon as the current one (if any)
    /// finishes.
    pub fn refresh_now(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Total refresh requests made through any clone of this handle.
    pub fn requested(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Owner of the polling loop.
#[derive(Debug)]
pub struct Synchronizer {
    snapshot: watch::Receiver<ViewSnapshot>,
    refresh: RefreshHandle,
    task: Option<ScheduledTask>,
}

impl Synchronizer {
    /// Start polling. The first cycle runs immediately.
    ///
    /// Fails with [`ConsoleError::DuplicateFieldOwner`] if two fetchers
    /// claim the same field, or [`ConsoleError::Config`] for a zero
    /// interval.
    pub fn start(fetchers: Vec<Fetcher>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ConsoleError::Config(
                "polling interval must be non-zero".to_string(),
            ));
        }
        let mut owners = HashSet::new();
        for fetcher in &fetchers {
            if !owners.insert(fetcher.field) {
                return Err(ConsoleError::DuplicateFieldOwner(fetcher.field));
            }
        }

        let (tx, rx) = watch::channel(ViewSnapshot::default());
        let refresh = RefreshHandle::default();
        let notify = Arc::clone(&refresh.notify);
        tracing::info!(
            fetchers = fetchers.len(),
            interval_ms = interval.as_millis() as u64,
            "starting synchronizer"
        );
        let task = ScheduledTask::spawn("synchronizer", move |mut signal| async move {
            let mut generation = 0u64;
            let mut seq = 0u64;
            loop {
                generation += 1;
                run_cycle(&fetchers, &tx, generation, &mut seq).await;
                tokio::select! {
                    _ = signal.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                    _ = notify.notified() => {
                        tracing::debug!(generation, "refresh requested");
                    }
                }
            }
        });

        Ok(Self {
            snapshot: rx,
            refresh,
            task: Some(task),
        })
    }

    /// Cancel polling. Idempotent. No snapshot is published afterwards.
    pub fn stop(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.cancel();
            tracing::info!("synchronizer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn refresh_now(&self) {
        self.refresh.refresh_now();
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshot.clone()
    }

    /// Copy of the latest snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.snapshot.borrow().connectivity
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_cycle(
    fetchers: &[Fetcher],
    tx: &watch::Sender<ViewSnapshot>,
    generation: u64,
    seq: &mut u64,
) {
    let started = Instant::now();
    let results = join_all(
        fetchers
            .iter()
            .map(|f| async move { (f.field, (f.fetch)().await) }),
    )
    .await;

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    tx.send_modify(|snap| {
        for (field, result) in results {
            *seq += 1;
            let stamp = Stamp::now(*seq);
            match result {
                Ok(update) if update.field() == field => {
                    snap.apply(update, stamp, generation);
                    succeeded += 1;
                }
                Ok(update) => {
                    let err = ConsoleError::FieldMismatch {
                        expected: field,
                        got: update.field(),
                    };
                    tracing::error!(%field, "dropping update: {}", err);
                    snap.record_error(field, stamp, err.to_string());
                    failed += 1;
                }
                Err(err) => {
                    tracing::debug!(%field, "fetch failed: {}", err);
                    snap.record_error(field, stamp, err.to_string());
                    failed += 1;
                }
            }
        }
        snap.generation = generation;
        snap.connectivity = Connectivity::from_counts(succeeded, failed);
    });
    tracing::debug!(
        generation,
        succeeded,
        failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "polling cycle complete"
    );
}

/// Wrap a single API read as a fetcher for `field`.
fn read<T, F, Fut>(
    field: FieldId,
    api: &Arc<dyn WarehouseApi>,
    call: F,
    wrap: fn(T) -> SnapshotUpdate,
) -> Fetcher
where
    F: Fn(Arc<dyn WarehouseApi>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: 'static,
{
    let api = Arc::clone(api);
    Fetcher::new(field, move || {
        let pending = call(Arc::clone(&api));
        async move { pending.await.map(wrap) }
    })
}

/// The stock fetcher set: every read endpoint, one per field.
///
/// `subtree` selects the BST filter; the latest value is read at the
/// start of every cycle.
pub fn standard_fetchers(
    api: Arc<dyn WarehouseApi>,
    subtree: watch::Receiver<Subtree>,
) -> Vec<Fetcher> {
    vec![
        read(
            FieldId::Summary,
            &api,
            |api| async move { api.dashboard_summary().await },
            SnapshotUpdate::Summary,
        ),
        read(
            FieldId::PriorityTop,
            &api,
            |api| async move { api.priority_top().await },
            SnapshotUpdate::PriorityTop,
        ),
        read(
            FieldId::Stability,
            &api,
            |api| async move { api.inventory_stability().await },
            SnapshotUpdate::Stability,
        ),
        read(
            FieldId::BstFilter,
            &api,
            move |api| {
                let subtree = *subtree.borrow();
                async move { api.bst_filter(subtree).await }
            },
            SnapshotUpdate::BstFilter,
        ),
        read(
            FieldId::AuditSequence,
            &api,
            |api| async move { api.audit_next().await },
            SnapshotUpdate::AuditSequence,
        ),
        read(
            FieldId::OrderHistory,
            &api,
            |api| async move { api.order_history().await },
            SnapshotUpdate::OrderHistory,
        ),
        read(
            FieldId::ShippingDashboard,
            &api,
            |api| async move { api.shipping_dashboard().await },
            SnapshotUpdate::ShippingDashboard,
        ),
        read(
            FieldId::ShippingHeap,
            &api,
            |api| async move { api.shipping_heap_state().await },
            SnapshotUpdate::ShippingHeap,
        ),
        read(
            FieldId::BstStructure,
            &api,
            |api| async move { api.bst_structure().await },
            SnapshotUpdate::BstStructure,
        ),
        read(
            FieldId::HashSet,
            &api,
            |api| async move { api.hashset_state().await },
            SnapshotUpdate::HashSet,
        ),
    ]
}
