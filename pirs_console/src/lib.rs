/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Operator console engine for the PIRS warehouse inventory service.
//!
//! The service computes priority scores, stability forecasts and stock
//! allocation. This crate is the client side: it polls the service,
//! keeps a consistent view of what it read, and drives the operator's
//! actions back into it.
//!
//! 1. `client`: the only outbound HTTP path. Every request and response
//!    is recorded in an explicitly owned [`LogSink`].
//! 2. `sync`: concurrent polling of every read endpoint into one
//!    [`ViewSnapshot`], merged field by field with join semantics.
//! 3. `triage`: lane classification of the shipping queue, plus
//!    dispatch / partial-dispatch / block with optimistic local state.
//! 4. `layout`: pure node/edge graph to 2D coordinates for heap and BST
//!    snapshots.
//! 5. `rotation`: the cyclic audit pointer and its auto-advance timer.
//!
//! Timers are [`ScheduledTask`]s with a single owner; dropping the owner
//! cancels them.

pub mod client;
pub mod config;
pub mod error;
pub mod event_log;
pub mod graph;
pub mod layout;
pub mod payload;
pub mod rotation;
pub mod snapshot;
pub mod sync;
pub mod task;
pub mod telemetry;
pub mod triage;

#[cfg(test)]
pub(crate) mod testing;

pub use client::InventoryClient;
pub use client::WarehouseApi;
pub use config::ConsoleConfig;
pub use error::ConsoleError;
pub use error::ErrorClass;
pub use error::Result;
pub use event_log::EventKind;
pub use event_log::LogSink;
pub use graph::StructureGraph;
pub use layout::Layout;
pub use layout::LayoutMode;
pub use rotation::RotationScheduler;
pub use snapshot::Connectivity;
pub use snapshot::ViewSnapshot;
pub use sync::RefreshHandle;
pub use sync::Synchronizer;
pub use task::ScheduledTask;
pub use triage::ActionOutcome;
pub use triage::DegradedWritePolicy;
pub use triage::Lane;
pub use triage::TriageBoard;
pub use triage::TriageController;
