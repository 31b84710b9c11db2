/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Shipment triage: lane classification and order actions.
//!
//! [`classify`] is a total partition of the priority queue into
//! [`Lane`]s. [`TriageBoard`] layers optimistic local state on top of
//! the last authoritative classification, and [`TriageController`]
//! performs the writes, applying the [`DegradedWritePolicy`] when an
//! optional endpoint is missing.
//!
//! The service is always authoritative. Every action, successful or
//! not, ends with a refresh request so the next snapshot replaces the
//! optimistic view.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::client::WarehouseApi;
use crate::error::ConsoleError;
use crate::error::Result;
use crate::event_log::EventKind;
use crate::payload::Ack;
use crate::payload::NewOrder;
use crate::payload::NewProduct;
use crate::payload::OrderRecord;
use crate::payload::ShippingDashboard;
use crate::payload::StockUpdate;
use crate::payload::URGENT_DAYS;
use crate::sync::RefreshHandle;

/// Operational bucket of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Urgent and fully stocked: ship now.
    Express,
    /// Stock does not cover the order (or cannot be confirmed).
    Shortage,
    /// Stocked, not urgent.
    Standard,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Express, Lane::Shortage, Lane::Standard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Express => "express",
            Lane::Shortage => "shortage",
            Lane::Standard => "standard",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lane for a single order.
///
/// Shortage wins over urgency. Unknown availability is a shortage;
/// unknown `days_remaining` with stock available is standard.
pub fn lane_of(order: &OrderRecord) -> Lane {
    match order.stock_available() {
        Some(true) => {}
        Some(false) | None => return Lane::Shortage,
    }
    match order.days_remaining {
        Some(days) if days < URGENT_DAYS => Lane::Express,
        _ => Lane::Standard,
    }
}

/// The three lanes, each preserving input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lanes {
    pub express: Vec<OrderRecord>,
    pub shortage: Vec<OrderRecord>,
    pub standard: Vec<OrderRecord>,
}

impl Lanes {
    pub fn get(&self, lane: Lane) -> &[OrderRecord] {
        match lane {
            Lane::Express => &self.express,
            Lane::Shortage => &self.shortage,
            Lane::Standard => &self.standard,
        }
    }

    pub fn total(&self) -> usize {
        self.express.len() + self.shortage.len() + self.standard.len()
    }
}

/// Partition `orders` into lanes. Every order lands in exactly one.
pub fn classify<'a>(orders: impl IntoIterator<Item = &'a OrderRecord>) -> Lanes {
    let mut lanes = Lanes::default();
    for order in orders {
        let bucket = match lane_of(order) {
            Lane::Express => &mut lanes.express,
            Lane::Shortage => &mut lanes.shortage,
            Lane::Standard => &mut lanes.standard,
        };
        bucket.push(order.clone());
    }
    lanes
}

/// What to do when an optional write endpoint is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegradedWritePolicy {
    /// Partial dispatch falls back to a full dispatch; block is
    /// acknowledged locally without being persisted.
    #[default]
    Substitute,
    /// Report the missing endpoint as a rejection.
    Surface,
}

impl std::str::FromStr for DegradedWritePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "substitute" => Ok(DegradedWritePolicy::Substitute),
            "surface" => Ok(DegradedWritePolicy::Surface),
            other => Err(format!("unknown degraded-write policy: {}", other)),
        }
    }
}

/// A state-changing request against one order.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageAction {
    Dispatch,
    PartialDispatch { quantity: i64 },
    Block { reason: String },
}

impl TriageAction {
    /// Default reason used when an order is parked to wait for stock.
    pub const WAIT_REASON: &'static str = "Waiting for stock replenishment";

    pub fn wait() -> Self {
        TriageAction::Block {
            reason: Self::WAIT_REASON.to_string(),
        }
    }
}

/// Result of an order action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The service performed the action.
    Confirmed { message: String },
    /// A degraded fallback was performed instead.
    Substituted { message: String },
    /// Accepted locally only; nothing was persisted.
    SoftAcknowledged { message: String },
    Rejected { error: ConsoleError },
}

impl ActionOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ActionOutcome::Rejected { .. })
    }

    /// One-line text for the operator notice.
    pub fn notice(&self) -> String {
        match self {
            ActionOutcome::Confirmed { message } => message.clone(),
            ActionOutcome::Substituted { message } => message.clone(),
            ActionOutcome::SoftAcknowledged { message } => format!("{} (not persisted)", message),
            ActionOutcome::Rejected { error } => format!("Action failed: {}", error.log_summary()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    /// Hidden from every lane (dispatch, partial dispatch).
    Hidden,
    /// Moved to the local waiting list (block).
    Waiting,
}

#[derive(Debug, Clone)]
struct Pending {
    kind: PendingKind,
    order: OrderRecord,
    reason: Option<String>,
    /// The write finished; the next snapshot is authoritative.
    settled: bool,
    /// A block that was only acknowledged locally.
    soft: bool,
}

/// An entry in the waiting list.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitingEntry {
    pub order_id: String,
    pub item_name: Option<String>,
    pub qty: Option<i64>,
    pub reason: Option<String>,
    /// False for local-only entries (in-flight or soft-acknowledged).
    pub persisted: bool,
}

/// Last authoritative classification plus optimistic local changes.
#[derive(Debug, Default)]
pub struct TriageBoard {
    orders: Vec<OrderRecord>,
    service_waiting: Vec<WaitingEntry>,
    pending: HashMap<String, Pending>,
    lanes: Lanes,
}

impl TriageBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the board with a fresh shipping snapshot.
    ///
    /// Settled optimistic changes are dropped (the service now speaks
    /// for them). Soft-acknowledged blocks stay local until the order
    /// leaves the queue. In-flight actions keep their order hidden.
    pub fn apply_snapshot(&mut self, shipping: &ShippingDashboard) {
        let present: HashSet<&str> = shipping
            .priority_queue
            .iter()
            .map(|o| o.order_id.as_str())
            .collect();
        self.pending.retain(|id, p| {
            if !present.contains(id.as_str()) {
                return false;
            }
            !p.settled || p.soft
        });
        self.orders = shipping.priority_queue.clone();
        self.service_waiting = shipping
            .blocked_orders
            .iter()
            .map(|b| WaitingEntry {
                order_id: b.order_id.clone().unwrap_or_default(),
                item_name: b.item_name.clone(),
                qty: b.qty,
                reason: b.reason.clone(),
                persisted: true,
            })
            .collect();
        self.reclassify();
    }

    fn reclassify(&mut self) {
        let pending = &self.pending;
        self.lanes = classify(
            self.orders
                .iter()
                .filter(|o| !pending.contains_key(&o.order_id)),
        );
    }

    pub fn lanes(&self) -> &Lanes {
        &self.lanes
    }

    pub fn find(&self, order_id: &str) -> Option<&OrderRecord> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    /// Service-side blocked orders followed by local waiting entries.
    pub fn waiting(&self) -> Vec<WaitingEntry> {
        let mut out = self.service_waiting.clone();
        let mut local: Vec<&Pending> = self
            .pending
            .values()
            .filter(|p| p.kind == PendingKind::Waiting)
            .collect();
        local.sort_by(|a, b| a.order.order_id.cmp(&b.order.order_id));
        out.extend(local.into_iter().map(|p| WaitingEntry {
            order_id: p.order.order_id.clone(),
            item_name: p.order.item_name.clone(),
            qty: p.order.qty,
            reason: p.reason.clone(),
            persisted: false,
        }));
        out
    }

    pub fn is_pending(&self, order_id: &str) -> bool {
        self.pending.contains_key(order_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Apply the optimistic effect of `action`. Returns false (and does
    /// nothing) if the order is unknown or already has an action in
    /// flight.
    pub fn begin(&mut self, order_id: &str, action: &TriageAction) -> bool {
        if self.is_pending(order_id) {
            return false;
        }
        let Some(order) = self.find(order_id).cloned() else {
            return false;
        };
        let (kind, reason) = match action {
            TriageAction::Dispatch | TriageAction::PartialDispatch { .. } => {
                (PendingKind::Hidden, None)
            }
            TriageAction::Block { reason } => (PendingKind::Waiting, Some(reason.clone())),
        };
        self.pending.insert(
            order_id.to_string(),
            Pending {
                kind,
                order,
                reason,
                settled: false,
                soft: false,
            },
        );
        self.reclassify();
        true
    }

    /// Record how an action ended. A rejection restores the order
    /// immediately.
    pub fn finish(&mut self, order_id: &str, outcome: &ActionOutcome) {
        match outcome {
            ActionOutcome::Rejected { .. } => {
                self.pending.remove(order_id);
                self.reclassify();
            }
            ActionOutcome::SoftAcknowledged { .. } => {
                if let Some(p) = self.pending.get_mut(order_id) {
                    p.settled = true;
                    p.soft = true;
                }
            }
            ActionOutcome::Confirmed { .. } | ActionOutcome::Substituted { .. } => {
                if let Some(p) = self.pending.get_mut(order_id) {
                    p.settled = true;
                }
            }
        }
    }
}

/// Performs order actions against the service.
#[derive(Clone)]
pub struct TriageController {
    api: Arc<dyn WarehouseApi>,
    refresh: RefreshHandle,
    policy: DegradedWritePolicy,
}

impl fmt::Debug for TriageController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriageController")
            .field("policy", &self.policy)
            .finish()
    }
}

fn ack_message(ack: Ack, fallback: impl FnOnce() -> String) -> String {
    ack.message.unwrap_or_else(fallback)
}

impl TriageController {
    pub fn new(
        api: Arc<dyn WarehouseApi>,
        refresh: RefreshHandle,
        policy: DegradedWritePolicy,
    ) -> Self {
        Self {
            api,
            refresh,
            policy,
        }
    }

    pub fn policy(&self) -> DegradedWritePolicy {
        self.policy
    }

    /// Run `action` on `order_id`, then request a refresh.
    pub async fn perform(&self, order_id: &str, action: &TriageAction) -> ActionOutcome {
        let outcome = match action {
            TriageAction::Dispatch => self.dispatch(order_id).await,
            TriageAction::PartialDispatch { quantity } => {
                self.partial_dispatch(order_id, *quantity).await
            }
            TriageAction::Block { reason } => self.block(order_id, reason).await,
        };
        if let ActionOutcome::Rejected { error } = &outcome {
            tracing::info!(order_id, "action rejected: {}", error);
        }
        self.refresh.refresh_now();
        outcome
    }

    async fn dispatch(&self, order_id: &str) -> ActionOutcome {
        match self.api.dispatch(order_id).await {
            Ok(ack) => ActionOutcome::Confirmed {
                message: ack_message(ack, || format!("Order {} dispatched.", order_id)),
            },
            Err(error) => ActionOutcome::Rejected { error },
        }
    }

    async fn partial_dispatch(&self, order_id: &str, quantity: i64) -> ActionOutcome {
        if quantity <= 0 {
            return ActionOutcome::Rejected {
                error: ConsoleError::Invalid(format!(
                    "no stock available to ship for order {}",
                    order_id
                )),
            };
        }
        match self.api.partial_dispatch(order_id, quantity).await {
            Ok(ack) => ActionOutcome::Confirmed {
                message: ack_message(ack, || {
                    format!(
                        "Order {} partially shipped with {} units.",
                        order_id, quantity
                    )
                }),
            },
            Err(err) if err.is_unavailable() && self.policy == DegradedWritePolicy::Substitute => {
                self.api.log().record(
                    EventKind::Degraded,
                    format!(
                        "partial dispatch unavailable; dispatching order {} instead",
                        order_id
                    ),
                );
                match self.api.dispatch(order_id).await {
                    Ok(_) => ActionOutcome::Substituted {
                        message: format!(
                            "Order {} shipped with {} available units.",
                            order_id, quantity
                        ),
                    },
                    Err(error) => ActionOutcome::Rejected { error },
                }
            }
            Err(error) => ActionOutcome::Rejected { error },
        }
    }

    async fn block(&self, order_id: &str, reason: &str) -> ActionOutcome {
        match self.api.block(order_id, reason).await {
            Ok(ack) => ActionOutcome::Confirmed {
                message: ack_message(ack, || {
                    format!("Order {} moved to waiting queue.", order_id)
                }),
            },
            Err(err) if err.is_unavailable() && self.policy == DegradedWritePolicy::Substitute => {
                self.api.log().record(
                    EventKind::Degraded,
                    format!("block unavailable; order {} held locally", order_id),
                );
                ActionOutcome::SoftAcknowledged {
                    message: format!("Order {} is now in the waiting queue.", order_id),
                }
            }
            Err(error) => ActionOutcome::Rejected { error },
        }
    }
}

/// Catalogue and order-entry writes.
///
/// Rejections come back as errors to the caller; every call requests a
/// refresh either way.
#[derive(Clone)]
pub struct InventoryActions {
    api: Arc<dyn WarehouseApi>,
    refresh: RefreshHandle,
}

impl fmt::Debug for InventoryActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryActions").finish_non_exhaustive()
    }
}

impl InventoryActions {
    pub fn new(api: Arc<dyn WarehouseApi>, refresh: RefreshHandle) -> Self {
        Self { api, refresh }
    }

    fn settle(&self, result: Result<Ack>) -> Result<Ack> {
        self.refresh.refresh_now();
        result
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Ack> {
        if product.sku.trim().is_empty() {
            return Err(ConsoleError::Invalid("SKU must not be empty".to_string()));
        }
        let result = self.api.create_product(product).await;
        self.settle(result)
    }

    pub async fn update_stock(&self, sku: &str, new_stock: i64) -> Result<Ack> {
        if new_stock < 0 {
            return Err(ConsoleError::Invalid(format!(
                "stock for {} cannot be negative",
                sku
            )));
        }
        let result = self.api.update_stock(sku, &StockUpdate { new_stock }).await;
        self.settle(result)
    }

    pub async fn delete_product(&self, sku: &str) -> Result<Ack> {
        let result = self.api.delete_product(sku).await;
        self.settle(result)
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Ack> {
        if order.qty_requested <= 0 {
            return Err(ConsoleError::Invalid(
                "order quantity must be positive".to_string(),
            ));
        }
        let result = self.api.create_order(order).await;
        self.settle(result)
    }
}
