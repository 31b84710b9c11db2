/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The view snapshot: latest successful read of every tracked resource.
//!
//! Each field is a [`FieldState`] holding the last good value and the
//! last error separately. Merging a new fetch result is a join:
//!
//! - a newer good value replaces an older one;
//! - an error only updates the error slot and never clears a value;
//! - an empty state (nothing fetched yet) is the identity.
//!
//! Ordering is by [`Stamp`]: the synchronizer's sequence number. The
//! wall-clock part is for display only, so a clock stepping backwards
//! never makes a newer fetch lose the join.

use std::cmp::Ordering;
use std::fmt;
use std::time::SystemTime;

use crate::payload::AuditSequence;
use crate::payload::BstFilterResult;
use crate::payload::BstStructure;
use crate::payload::DashboardSummary;
use crate::payload::HashSetState;
use crate::payload::HeapState;
use crate::payload::OrderRecord;
use crate::payload::PriorityItem;
use crate::payload::ShippingDashboard;
use crate::payload::StabilityItem;

/// A join-semilattice: `join` is commutative, associative and
/// idempotent.
pub trait JoinSemilattice {
    fn join(&self, other: &Self) -> Self;
}

/// Ordering key for fetch results.
///
/// Stamps order by `seq`, which the synchronizer increments for every
/// result it merges. `ts_micros` only breaks ties between stamps from
/// different sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stamp {
    /// Wall-clock timestamp in microseconds since UNIX epoch.
    pub ts_micros: u64,
    /// Monotonic merge order.
    pub seq: u64,
}

impl Ord for Stamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seq
            .cmp(&other.seq)
            .then(self.ts_micros.cmp(&other.ts_micros))
    }
}

impl PartialOrd for Stamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Stamp {
    /// A stamp for now with tie-breaker `seq`.
    pub fn now(seq: u64) -> Self {
        let ts_micros = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;
        Self { ts_micros, seq }
    }
}

/// A successfully fetched value.
#[derive(Clone, Debug, PartialEq)]
pub struct Ready<T> {
    pub stamp: Stamp,
    /// Polling cycle that produced the value.
    pub generation: u64,
    pub value: T,
}

/// A failed fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    pub stamp: Stamp,
    pub msg: String,
}

/// Per-field fetch state.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldState<T> {
    ready: Option<Ready<T>>,
    error: Option<Failure>,
}

impl<T> Default for FieldState<T> {
    fn default() -> Self {
        Self {
            ready: None,
            error: None,
        }
    }
}

impl<T> FieldState<T> {
    pub fn ready(stamp: Stamp, generation: u64, value: T) -> Self {
        Self {
            ready: Some(Ready {
                stamp,
                generation,
                value,
            }),
            error: None,
        }
    }

    pub fn failed(stamp: Stamp, msg: impl Into<String>) -> Self {
        Self {
            ready: None,
            error: Some(Failure {
                stamp,
                msg: msg.into(),
            }),
        }
    }

    /// The last good value, if any fetch ever succeeded.
    pub fn value(&self) -> Option<&T> {
        self.ready.as_ref().map(|r| &r.value)
    }

    pub fn last_ready(&self) -> Option<&Ready<T>> {
        self.ready.as_ref()
    }

    pub fn last_error(&self) -> Option<&Failure> {
        self.error.as_ref()
    }

    /// True when the most recent fetch of this field failed.
    pub fn is_failing(&self) -> bool {
        match (&self.ready, &self.error) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(r), Some(e)) => e.stamp > r.stamp,
        }
    }
}

fn newer<'a, X>(
    a: &'a Option<X>,
    b: &'a Option<X>,
    stamp: impl Fn(&X) -> Stamp,
) -> &'a Option<X> {
    match (a, b) {
        (None, _) => b,
        (_, None) => a,
        (Some(x), Some(y)) => {
            if stamp(y) > stamp(x) {
                b
            } else {
                a
            }
        }
    }
}

/// Join keeps the newer value and the newer error independently.
///
/// Stamps are unique per fetch within a process, so ties only arise
/// when joining a state with itself.
impl<T: Clone> JoinSemilattice for FieldState<T> {
    fn join(&self, other: &Self) -> Self {
        Self {
            ready: newer(&self.ready, &other.ready, |r| r.stamp).clone(),
            error: newer(&self.error, &other.error, |e| e.stamp).clone(),
        }
    }
}

/// Identifies one snapshot field. Each field has exactly one owning
/// fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    Summary,
    PriorityTop,
    Stability,
    BstFilter,
    AuditSequence,
    OrderHistory,
    ShippingDashboard,
    ShippingHeap,
    BstStructure,
    HashSet,
}

impl FieldId {
    pub const ALL: [FieldId; 10] = [
        FieldId::Summary,
        FieldId::PriorityTop,
        FieldId::Stability,
        FieldId::BstFilter,
        FieldId::AuditSequence,
        FieldId::OrderHistory,
        FieldId::ShippingDashboard,
        FieldId::ShippingHeap,
        FieldId::BstStructure,
        FieldId::HashSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Summary => "summary",
            FieldId::PriorityTop => "priority",
            FieldId::Stability => "stability",
            FieldId::BstFilter => "bst-filter",
            FieldId::AuditSequence => "audit",
            FieldId::OrderHistory => "orders",
            FieldId::ShippingDashboard => "shipping",
            FieldId::ShippingHeap => "shipping-heap",
            FieldId::BstStructure => "bst-structure",
            FieldId::HashSet => "hashset",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful fetch result, tagged by the field it replaces.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotUpdate {
    Summary(DashboardSummary),
    PriorityTop(PriorityItem),
    Stability(Vec<StabilityItem>),
    BstFilter(BstFilterResult),
    AuditSequence(AuditSequence),
    OrderHistory(Vec<OrderRecord>),
    ShippingDashboard(ShippingDashboard),
    ShippingHeap(HeapState),
    BstStructure(BstStructure),
    HashSet(HashSetState),
}

impl SnapshotUpdate {
    pub fn field(&self) -> FieldId {
        match self {
            SnapshotUpdate::Summary(_) => FieldId::Summary,
            SnapshotUpdate::PriorityTop(_) => FieldId::PriorityTop,
            SnapshotUpdate::Stability(_) => FieldId::Stability,
            SnapshotUpdate::BstFilter(_) => FieldId::BstFilter,
            SnapshotUpdate::AuditSequence(_) => FieldId::AuditSequence,
            SnapshotUpdate::OrderHistory(_) => FieldId::OrderHistory,
            SnapshotUpdate::ShippingDashboard(_) => FieldId::ShippingDashboard,
            SnapshotUpdate::ShippingHeap(_) => FieldId::ShippingHeap,
            SnapshotUpdate::BstStructure(_) => FieldId::BstStructure,
            SnapshotUpdate::HashSet(_) => FieldId::HashSet,
        }
    }
}

/// Overall reachability of the service, judged from the last cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connectivity {
    /// Every fetcher succeeded.
    Connected,
    /// Some fetchers failed; the rest of the view is live.
    Degraded,
    /// Every fetcher failed, or no cycle has completed yet.
    #[default]
    Disconnected,
}

impl Connectivity {
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) if succeeded > 0 => Connectivity::Connected,
            (0, _) => Connectivity::Disconnected,
            _ => Connectivity::Degraded,
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Connectivity::Connected => "connected",
            Connectivity::Degraded => "degraded",
            Connectivity::Disconnected => "disconnected",
        })
    }
}

/// Latest known state of every tracked resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    pub summary: FieldState<DashboardSummary>,
    pub priority: FieldState<PriorityItem>,
    pub stability: FieldState<Vec<StabilityItem>>,
    pub bst_filter: FieldState<BstFilterResult>,
    pub audit: FieldState<AuditSequence>,
    pub orders: FieldState<Vec<OrderRecord>>,
    pub shipping: FieldState<ShippingDashboard>,
    pub shipping_heap: FieldState<HeapState>,
    pub bst_structure: FieldState<BstStructure>,
    pub hashset: FieldState<HashSetState>,
    /// Number of completed polling cycles.
    pub generation: u64,
    pub connectivity: Connectivity,
}

impl ViewSnapshot {
    /// Join a successful fetch into its field.
    pub fn apply(&mut self, update: SnapshotUpdate, stamp: Stamp, generation: u64) {
        fn merge<T: Clone>(slot: &mut FieldState<T>, stamp: Stamp, generation: u64, value: T) {
            *slot = slot.join(&FieldState::ready(stamp, generation, value));
        }
        match update {
            SnapshotUpdate::Summary(v) => merge(&mut self.summary, stamp, generation, v),
            SnapshotUpdate::PriorityTop(v) => merge(&mut self.priority, stamp, generation, v),
            SnapshotUpdate::Stability(v) => merge(&mut self.stability, stamp, generation, v),
            SnapshotUpdate::BstFilter(v) => merge(&mut self.bst_filter, stamp, generation, v),
            SnapshotUpdate::AuditSequence(v) => merge(&mut self.audit, stamp, generation, v),
            SnapshotUpdate::OrderHistory(v) => merge(&mut self.orders, stamp, generation, v),
            SnapshotUpdate::ShippingDashboard(v) => {
                merge(&mut self.shipping, stamp, generation, v)
            }
            SnapshotUpdate::ShippingHeap(v) => merge(&mut self.shipping_heap, stamp, generation, v),
            SnapshotUpdate::BstStructure(v) => merge(&mut self.bst_structure, stamp, generation, v),
            SnapshotUpdate::HashSet(v) => merge(&mut self.hashset, stamp, generation, v),
        }
    }

    /// Record a failed fetch of `field`. The field's value is kept.
    pub fn record_error(&mut self, field: FieldId, stamp: Stamp, msg: impl Into<String>) {
        fn fail<T: Clone>(slot: &mut FieldState<T>, stamp: Stamp, msg: String) {
            *slot = slot.join(&FieldState::failed(stamp, msg));
        }
        let msg = msg.into();
        match field {
            FieldId::Summary => fail(&mut self.summary, stamp, msg),
            FieldId::PriorityTop => fail(&mut self.priority, stamp, msg),
            FieldId::Stability => fail(&mut self.stability, stamp, msg),
            FieldId::BstFilter => fail(&mut self.bst_filter, stamp, msg),
            FieldId::AuditSequence => fail(&mut self.audit, stamp, msg),
            FieldId::OrderHistory => fail(&mut self.orders, stamp, msg),
            FieldId::ShippingDashboard => fail(&mut self.shipping, stamp, msg),
            FieldId::ShippingHeap => fail(&mut self.shipping_heap, stamp, msg),
            FieldId::BstStructure => fail(&mut self.bst_structure, stamp, msg),
            FieldId::HashSet => fail(&mut self.hashset, stamp, msg),
        }
    }

    /// Fields whose latest fetch failed.
    pub fn failing_fields(&self) -> Vec<FieldId> {
        FieldId::ALL
            .into_iter()
            .filter(|f| self.is_failing(*f))
            .collect()
    }

    pub fn is_failing(&self, field: FieldId) -> bool {
        match field {
            FieldId::Summary => self.summary.is_failing(),
            FieldId::PriorityTop => self.priority.is_failing(),
            FieldId::Stability => self.stability.is_failing(),
            FieldId::BstFilter => self.bst_filter.is_failing(),
            FieldId::AuditSequence => self.audit.is_failing(),
            FieldId::OrderHistory => self.orders.is_failing(),
            FieldId::ShippingDashboard => self.shipping.is_failing(),
            FieldId::ShippingHeap => self.shipping_heap.is_failing(),
            FieldId::BstStructure => self.bst_structure.is_failing(),
            FieldId::HashSet => self.hashset.is_failing(),
        }
    }
}
