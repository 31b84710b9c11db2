/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Wire payloads exchanged with the inventory service.
//!
//! Field names match the service's JSON exactly. Every field the
//! service may omit is an `Option`: a missing field means "unknown",
//! never zero. Extra fields are ignored.

use std::borrow::Cow;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::graph::StructureGraph;

/// `GET /dashboard/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_sku_count: Option<u64>,
    #[serde(default)]
    pub critical_stock_alert: Option<u64>,
}

/// `GET /priority/top`.
///
/// The service returns `{}` when nothing needs reordering; that decodes
/// to an item with every field `None` (see [`PriorityItem::is_empty`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub current_stock: Option<i64>,
    #[serde(default)]
    pub days_remaining: Option<f64>,
    #[serde(default)]
    pub lead_time: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl PriorityItem {
    /// True when the service reported no priority item at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.sku.is_none() && self.days_remaining.is_none()
    }

    /// True when the item is predicted to stock out within a week.
    pub fn is_urgent(&self) -> bool {
        self.days_remaining.is_some_and(|d| d < URGENT_DAYS)
    }
}

/// Days-remaining threshold below which an item or order is urgent.
pub const URGENT_DAYS: f64 = 7.0;

/// Days-remaining threshold below which stock is merely "warning".
pub const WARNING_DAYS: f64 = 30.0;

/// One row of `GET /inventory/stability` (BST in-order traversal).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StabilityItem {
    pub sku: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stock_hint: Option<i64>,
    #[serde(default)]
    pub days_remaining: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl StabilityItem {
    /// Display band for this item.
    pub fn band(&self) -> StabilityBand {
        StabilityBand::from_days(self.days_remaining)
    }
}

/// Display banding for inventory stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityBand {
    Critical,
    Warning,
    Stable,
    Unknown,
}

impl StabilityBand {
    pub fn from_days(days: Option<f64>) -> Self {
        match days {
            None => StabilityBand::Unknown,
            Some(d) if d < URGENT_DAYS => StabilityBand::Critical,
            Some(d) if d < WARNING_DAYS => StabilityBand::Warning,
            Some(_) => StabilityBand::Stable,
        }
    }
}

/// The `subtree` query parameter of `GET /inventory/bst-filter`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtree {
    #[default]
    All,
    Left,
    Root,
    Right,
}

impl Subtree {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subtree::All => "all",
            Subtree::Left => "left",
            Subtree::Root => "root",
            Subtree::Right => "right",
        }
    }

    /// The next filter in `all → left → root → right → all` order.
    pub fn next(self) -> Self {
        match self {
            Subtree::All => Subtree::Left,
            Subtree::Left => Subtree::Root,
            Subtree::Root => Subtree::Right,
            Subtree::Right => Subtree::All,
        }
    }
}

impl fmt::Display for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Subtree {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Subtree::All),
            "left" => Ok(Subtree::Left),
            "root" => Ok(Subtree::Root),
            "right" => Ok(Subtree::Right),
            other => Err(format!("unknown subtree filter: {}", other)),
        }
    }
}

/// Root descriptor returned alongside BST filter results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BstRootInfo {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub days_remaining: Option<f64>,
}

/// `GET /inventory/bst-filter?subtree=...`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BstFilterResult {
    #[serde(default)]
    pub items: Vec<StabilityItem>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub root: Option<BstRootInfo>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub filter: Option<Subtree>,
}

/// `GET /audit/next`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSequence {
    #[serde(default)]
    pub audit_sequence: Vec<String>,
}

/// An order as owned by the service.
///
/// The core only reads and re-partitions these; it never writes a
/// derived status back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    #[serde(default, alias = "item_sku")]
    pub sku: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default, alias = "qty_requested")]
    pub qty: Option<i64>,
    #[serde(default)]
    pub current_stock: Option<i64>,
    #[serde(default)]
    pub days_remaining: Option<f64>,
    #[serde(default, alias = "customer_tier")]
    pub tier: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    /// Set by the shipping dashboard; absent on order history rows.
    #[serde(default)]
    pub stock_available: Option<bool>,
    #[serde(default)]
    pub priority_score: Option<f64>,
    #[serde(default)]
    pub priority_reason: Option<String>,
}

impl OrderRecord {
    /// Whether stock covers the requested quantity.
    ///
    /// Uses the service's explicit flag when present, otherwise
    /// compares `current_stock` against `qty` when both are known.
    /// `None` means availability is unknown.
    pub fn stock_available(&self) -> Option<bool> {
        if let Some(flag) = self.stock_available {
            return Some(flag);
        }
        match (self.current_stock, self.qty) {
            (Some(stock), Some(qty)) => Some(stock >= qty),
            _ => None,
        }
    }

    /// Quantity that can ship right now (`min(stock, qty)`, floored at 0).
    pub fn shippable_qty(&self) -> Option<i64> {
        match (self.current_stock, self.qty) {
            (Some(stock), Some(qty)) => Some(stock.min(qty).max(0)),
            (Some(stock), None) => Some(stock.max(0)),
            _ => None,
        }
    }

    /// VIP customers are tier 2 and above.
    pub fn is_vip(&self) -> bool {
        self.tier.is_some_and(|t| t > 1)
    }
}

/// One entry of the aggregated pick list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PickListEntry {
    #[serde(default, alias = "item_sku")]
    pub sku: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default, alias = "total_qty")]
    pub qty: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An order parked in the service's blocked queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockedOrder {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub qty: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// `GET /shipping/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingDashboard {
    #[serde(default)]
    pub priority_queue: Vec<OrderRecord>,
    #[serde(default)]
    pub pick_list: Vec<PickListEntry>,
    #[serde(default)]
    pub blocked_orders: Vec<BlockedOrder>,
    #[serde(default)]
    pub queue_count: Option<u64>,
}

/// `GET /debug/shipping-heap-state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeapState {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub tree: StructureGraph,
    #[serde(default)]
    pub raw_array: Vec<Map<String, Value>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub complexity: Map<String, Value>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl HeapState {
    /// The graph to lay out. When the service sent only the raw array,
    /// the implicit-index graph is rebuilt from it.
    pub fn structure(&self) -> Cow<'_, StructureGraph> {
        if !self.tree.is_empty() || self.raw_array.is_empty() {
            return Cow::Borrowed(&self.tree);
        }
        let labels = self.raw_array.iter().enumerate().map(|(i, entry)| {
            ["order_id", "sku", "label"]
                .iter()
                .find_map(|key| entry.get(*key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", i))
        });
        Cow::Owned(StructureGraph::heap_from_labels(labels))
    }
}

/// `GET /debug/bst-structure`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BstStructure {
    #[serde(default)]
    pub tree: StructureGraph,
    #[serde(default)]
    pub in_order_path: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub complexity: Map<String, Value>,
}

/// A single bucket of the blocked-lot hash set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashBucket {
    pub index: usize,
    #[serde(default)]
    pub items: Vec<String>,
}

/// `GET /debug/hashset-state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashSetState {
    #[serde(default)]
    pub blocked_lots: Vec<String>,
    #[serde(default)]
    pub buckets: Vec<HashBucket>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub complexity: Map<String, Value>,
}

/// `POST /products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub current_stock: i64,
    pub lead_time_days: i64,
    pub unit_cost: f64,
}

/// `PUT /products/{sku}/stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub new_stock: i64,
}

/// `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub sku: String,
    pub qty_requested: i64,
    pub customer_tier: i64,
    pub customer: String,
}

/// `POST /orders/{id}/partial-dispatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialDispatchRequest {
    pub quantity: i64,
}

/// `POST /orders/{id}/block`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRequest {
    pub reason: String,
}

/// Acknowledgement body returned by write endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Error body returned by the service (`{"detail": ...}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) detail: Option<Value>,
}

impl ErrorBody {
    /// Render `detail` as text; validation errors carry a list, plain
    /// errors a string.
    pub(crate) fn detail_text(&self) -> Option<String> {
        match &self.detail {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}
