/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! HTTP access to the inventory service.
//!
//! [`WarehouseApi`] is the seam: the synchronizer and controllers only
//! see the trait, so tests drive them with in-memory fakes.
//! [`InventoryClient`] is the `reqwest` implementation and the only
//! outbound HTTP path in the crate.
//!
//! Every request is recorded in the [`LogSink`] the client was built
//! with: the request line first (`API` for GET, the method name
//! otherwise), then `SUCCESS` or `ERROR` once the response settles.
//! Callers still receive the error; logging never swallows it.
//!
//! Route-missing answers (404 with the framework's default
//! `"Not Found"` detail, 405, 501) become
//! [`ConsoleError::Unavailable`], so degraded-write fallbacks can tell
//! them apart from a 404 about a missing order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ConsoleError;
use crate::error::Result;
use crate::event_log::EventKind;
use crate::event_log::LogSink;
use crate::payload::Ack;
use crate::payload::AuditSequence;
use crate::payload::BlockRequest;
use crate::payload::BstFilterResult;
use crate::payload::BstStructure;
use crate::payload::DashboardSummary;
use crate::payload::ErrorBody;
use crate::payload::HashSetState;
use crate::payload::HeapState;
use crate::payload::NewOrder;
use crate::payload::NewProduct;
use crate::payload::OrderRecord;
use crate::payload::PartialDispatchRequest;
use crate::payload::PriorityItem;
use crate::payload::ShippingDashboard;
use crate::payload::StabilityItem;
use crate::payload::StockUpdate;
use crate::payload::Subtree;

/// Default service root.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Detail string the service framework uses when no route matches.
const ROUTE_MISSING_DETAIL: &str = "Not Found";

/// Read and write operations of the inventory service.
#[async_trait]
pub trait WarehouseApi: Send + Sync {
    async fn dashboard_summary(&self) -> Result<DashboardSummary>;
    async fn priority_top(&self) -> Result<PriorityItem>;
    async fn inventory_stability(&self) -> Result<Vec<StabilityItem>>;
    async fn bst_filter(&self, subtree: Subtree) -> Result<BstFilterResult>;
    async fn audit_next(&self) -> Result<AuditSequence>;
    async fn order_history(&self) -> Result<Vec<OrderRecord>>;
    async fn shipping_dashboard(&self) -> Result<ShippingDashboard>;
    async fn shipping_heap_state(&self) -> Result<HeapState>;
    async fn hashset_state(&self) -> Result<HashSetState>;
    async fn bst_structure(&self) -> Result<BstStructure>;

    async fn create_product(&self, product: &NewProduct) -> Result<Ack>;
    async fn update_stock(&self, sku: &str, update: &StockUpdate) -> Result<Ack>;
    async fn delete_product(&self, sku: &str) -> Result<Ack>;
    async fn create_order(&self, order: &NewOrder) -> Result<Ack>;
    async fn dispatch(&self, order_id: &str) -> Result<Ack>;
    async fn partial_dispatch(&self, order_id: &str, quantity: i64) -> Result<Ack>;
    async fn block(&self, order_id: &str, reason: &str) -> Result<Ack>;

    /// The activity log this API records into.
    fn log(&self) -> &LogSink;
}

/// `reqwest`-backed [`WarehouseApi`].
#[derive(Debug, Clone)]
pub struct InventoryClient {
    http: reqwest::Client,
    base_url: String,
    log: LogSink,
}

impl InventoryClient {
    /// Build a client rooted at `base_url` (for example
    /// `http://127.0.0.1:8000/api`). A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>, timeout: Duration, log: LogSink) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsoleError::Config(format!("http client: {}", e)))?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http,
            base_url,
            log,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let endpoint = format!("{} {}", method, path);
        self.log.record(EventKind::for_method(&method), endpoint.clone());
        let result = self.execute(method, path, body).await;
        match &result {
            Ok(_) => self.log.record(EventKind::Success, endpoint),
            Err(err) => self
                .log
                .record(EventKind::Error, format!("{} failed: {}", endpoint, err.log_summary())),
        }
        result
    }

    async fn execute<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let text = resp.text().await.unwrap_or_default();
        Err(status_error(&method, path, status, &text))
    }
}

/// Map a non-success response onto the error taxonomy.
fn status_error(method: &Method, path: &str, status: StatusCode, body: &str) -> ConsoleError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail_text());
    let route_missing = if status == StatusCode::NOT_FOUND {
        detail
            .as_deref()
            .is_none_or(|d| d == ROUTE_MISSING_DETAIL)
    } else {
        status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
    };
    if route_missing {
        return ConsoleError::Unavailable {
            endpoint: format!("{} {}", method, path),
        };
    }
    ConsoleError::Status {
        status: status.as_u16(),
        detail: detail.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        }),
    }
}

fn segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[async_trait]
impl WarehouseApi for InventoryClient {
    async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        self.get("/dashboard/summary").await
    }

    async fn priority_top(&self) -> Result<PriorityItem> {
        self.get("/priority/top").await
    }

    async fn inventory_stability(&self) -> Result<Vec<StabilityItem>> {
        self.get("/inventory/stability").await
    }

    async fn bst_filter(&self, subtree: Subtree) -> Result<BstFilterResult> {
        self.get(&format!("/inventory/bst-filter?subtree={}", subtree))
            .await
    }

    async fn audit_next(&self) -> Result<AuditSequence> {
        self.get("/audit/next").await
    }

    async fn order_history(&self) -> Result<Vec<OrderRecord>> {
        self.get("/orders/history").await
    }

    async fn shipping_dashboard(&self) -> Result<ShippingDashboard> {
        self.get("/shipping/dashboard").await
    }

    async fn shipping_heap_state(&self) -> Result<HeapState> {
        self.get("/debug/shipping-heap-state").await
    }

    async fn hashset_state(&self) -> Result<HashSetState> {
        self.get("/debug/hashset-state").await
    }

    async fn bst_structure(&self) -> Result<BstStructure> {
        self.get("/debug/bst-structure").await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Ack> {
        self.send(Method::POST, "/products", Some(product)).await
    }

    async fn update_stock(&self, sku: &str, update: &StockUpdate) -> Result<Ack> {
        let path = format!("/products/{}/stock", segment(sku));
        self.send(Method::PUT, &path, Some(update)).await
    }

    async fn delete_product(&self, sku: &str) -> Result<Ack> {
        let path = format!("/products/{}", segment(sku));
        self.send::<Ack, ()>(Method::DELETE, &path, None).await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Ack> {
        self.send(Method::POST, "/orders", Some(order)).await
    }

    async fn dispatch(&self, order_id: &str) -> Result<Ack> {
        let path = format!("/orders/{}/dispatch", segment(order_id));
        self.send::<Ack, ()>(Method::POST, &path, None).await
    }

    async fn partial_dispatch(&self, order_id: &str, quantity: i64) -> Result<Ack> {
        let path = format!("/orders/{}/partial-dispatch", segment(order_id));
        let body = PartialDispatchRequest { quantity };
        self.send(Method::POST, &path, Some(&body)).await
    }

    async fn block(&self, order_id: &str, reason: &str) -> Result<Ack> {
        let path = format!("/orders/{}/block", segment(order_id));
        let body = BlockRequest {
            reason: reason.to_string(),
        };
        self.send(Method::POST, &path, Some(&body)).await
    }

    fn log(&self) -> &LogSink {
        &self.log
    }
}
