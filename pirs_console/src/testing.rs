/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! In-memory [`WarehouseApi`] for unit tests.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::WarehouseApi;
use crate::error::ConsoleError;
use crate::error::Result;
use crate::event_log::LogSink;
use crate::payload::Ack;
use crate::payload::AuditSequence;
use crate::payload::BstFilterResult;
use crate::payload::BstStructure;
use crate::payload::DashboardSummary;
use crate::payload::HashSetState;
use crate::payload::HeapState;
use crate::payload::NewOrder;
use crate::payload::NewProduct;
use crate::payload::OrderRecord;
use crate::payload::PriorityItem;
use crate::payload::ShippingDashboard;
use crate::payload::StabilityItem;
use crate::payload::StockUpdate;
use crate::payload::Subtree;

#[derive(Default)]
struct FakeState {
    audit: Vec<String>,
    stability: Vec<StabilityItem>,
    shipping: ShippingDashboard,
    failing_reads: HashSet<String>,
    fail_all: bool,
    write_errors: HashMap<String, ConsoleError>,
    calls: Vec<String>,
}

/// Serves canned reads and records every call. Reads and writes can be
/// made to fail by method name.
#[derive(Default)]
pub(crate) struct FakeApi {
    log: LogSink,
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub(crate) fn set_audit(&self, skus: Vec<&str>) {
        self.state.lock().unwrap().audit = skus.into_iter().map(String::from).collect();
    }

    pub(crate) fn set_stability(&self, skus: Vec<&str>) {
        self.state.lock().unwrap().stability = skus
            .into_iter()
            .map(|sku| StabilityItem {
                sku: sku.to_string(),
                ..Default::default()
            })
            .collect();
    }

    pub(crate) fn set_shipping(&self, shipping: ShippingDashboard) {
        self.state.lock().unwrap().shipping = shipping;
    }

    pub(crate) fn fail_read(&self, method: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_reads
            .insert(method.to_string());
    }

    pub(crate) fn fail_all_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_all = fail;
    }

    pub(crate) fn fail_write(&self, method: &str, err: ConsoleError) {
        self.state
            .lock()
            .unwrap()
            .write_errors
            .insert(method.to_string(), err);
    }

    /// Every call so far, as `"method arg..."`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn reads_of(&self, method: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.split(' ').next() == Some(method))
            .collect()
    }

    fn read<T>(&self, call: String, value: impl FnOnce(&FakeState) -> T) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        let method = call.split(' ').next().unwrap_or_default().to_string();
        state.calls.push(call);
        if state.fail_all || state.failing_reads.contains(&method) {
            return Err(ConsoleError::Connectivity(format!(
                "{}: connection refused",
                method
            )));
        }
        Ok(value(&state))
    }

    fn write(&self, call: String) -> Result<Ack> {
        let mut state = self.state.lock().unwrap();
        let method = call.split(' ').next().unwrap_or_default().to_string();
        state.calls.push(call.clone());
        match state.write_errors.get(&method) {
            Some(err) => Err(err.clone()),
            None => Ok(Ack {
                message: Some(format!("{} ok", call)),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl WarehouseApi for FakeApi {
    async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        self.read("dashboard_summary".into(), |_| DashboardSummary::default())
    }

    async fn priority_top(&self) -> Result<PriorityItem> {
        self.read("priority_top".into(), |_| PriorityItem::default())
    }

    async fn inventory_stability(&self) -> Result<Vec<StabilityItem>> {
        self.read("inventory_stability".into(), |s| s.stability.clone())
    }

    async fn bst_filter(&self, subtree: Subtree) -> Result<BstFilterResult> {
        self.read(format!("bst_filter {}", subtree), |_| {
            BstFilterResult::default()
        })
    }

    async fn audit_next(&self) -> Result<AuditSequence> {
        self.read("audit_next".into(), |s| AuditSequence {
            audit_sequence: s.audit.clone(),
        })
    }

    async fn order_history(&self) -> Result<Vec<OrderRecord>> {
        self.read("order_history".into(), |_| Vec::new())
    }

    async fn shipping_dashboard(&self) -> Result<ShippingDashboard> {
        self.read("shipping_dashboard".into(), |s| s.shipping.clone())
    }

    async fn shipping_heap_state(&self) -> Result<HeapState> {
        self.read("shipping_heap_state".into(), |_| HeapState::default())
    }

    async fn hashset_state(&self) -> Result<HashSetState> {
        self.read("hashset_state".into(), |_| HashSetState::default())
    }

    async fn bst_structure(&self) -> Result<BstStructure> {
        self.read("bst_structure".into(), |_| BstStructure::default())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Ack> {
        self.write(format!("create_product {}", product.sku))
    }

    async fn update_stock(&self, sku: &str, update: &StockUpdate) -> Result<Ack> {
        self.write(format!("update_stock {} {}", sku, update.new_stock))
    }

    async fn delete_product(&self, sku: &str) -> Result<Ack> {
        self.write(format!("delete_product {}", sku))
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Ack> {
        self.write(format!("create_order {} {}", order.sku, order.qty_requested))
    }

    async fn dispatch(&self, order_id: &str) -> Result<Ack> {
        self.write(format!("dispatch {}", order_id))
    }

    async fn partial_dispatch(&self, order_id: &str, quantity: i64) -> Result<Ack> {
        self.write(format!("partial_dispatch {} {}", order_id, quantity))
    }

    async fn block(&self, order_id: &str, reason: &str) -> Result<Ack> {
        self.write(format!("block {} {}", order_id, reason))
    }

    fn log(&self) -> &LogSink {
        &self.log
    }
}
