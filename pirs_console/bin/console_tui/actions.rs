/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use pirs_console::payload::Subtree;
use pirs_console::triage::TriageAction;

/// Result of handling a key event.
#[derive(Debug, PartialEq)]
pub(crate) enum KeyResult {
    /// Nothing for the engine to do.
    None,
    /// Run an order action against the service.
    Act {
        order_id: String,
        action: TriageAction,
    },
    /// Set the on-hand stock of a SKU.
    UpdateStock {
        sku: String,
        new_stock: i64,
    },
    /// Poll now instead of waiting for the next cycle.
    Refresh,
    /// The BST filter changed; the next poll reads it.
    SubtreeChanged(Subtree),
    AdvanceRotation,
    ToggleRotation,
    ClearLog,
}
