/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Integration tests that exercise multiple modules together (App +
//! board + cursor + render). Per-module unit tests live in each
//! module's own `#[cfg(test)] mod tests` block.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use pirs_console::ConsoleConfig;
use pirs_console::ConsoleError;
use pirs_console::Lane;
use pirs_console::LayoutMode;
use pirs_console::ViewSnapshot;
use pirs_console::payload::Ack;
use pirs_console::payload::BstFilterResult;
use pirs_console::payload::OrderRecord;
use pirs_console::payload::PickListEntry;
use pirs_console::payload::ShippingDashboard;
use pirs_console::payload::Subtree;
use pirs_console::snapshot::SnapshotUpdate;
use pirs_console::snapshot::Stamp;
use pirs_console::triage::ActionOutcome;
use pirs_console::triage::TriageAction;
use ratatui::Terminal;
use ratatui::backend::TestBackend;

use super::*;
use crate::render::ui;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn order(id: &str, days: f64, stock: i64, qty: i64) -> OrderRecord {
    OrderRecord {
        order_id: id.to_string(),
        sku: Some(format!("SKU-{}", id)),
        item_name: Some(format!("item-{}", id)),
        qty: Some(qty),
        current_stock: Some(stock),
        days_remaining: Some(days),
        ..Default::default()
    }
}

fn snapshot_with(orders: Vec<OrderRecord>, seq: u64) -> ViewSnapshot {
    let mut snapshot = ViewSnapshot::default();
    snapshot.apply(
        SnapshotUpdate::ShippingDashboard(ShippingDashboard {
            priority_queue: orders,
            ..Default::default()
        }),
        Stamp::now(seq),
        seq,
    );
    snapshot
}

/// An express order, a shortage order and a standard order.
fn app_with_orders() -> App {
    let mut app = App::new(&ConsoleConfig::default());
    app.apply_snapshot(snapshot_with(
        vec![
            order("1", 2.0, 10, 5),
            order("2", 20.0, 3, 5),
            order("3", 30.0, 10, 5),
        ],
        1,
    ));
    app
}

// Empty app has empty lanes and no selection.
#[test]
fn empty_app_has_no_selection() {
    let mut app = App::new(&ConsoleConfig::default());
    assert_eq!(app.board.lanes().total(), 0);
    assert!(app.selected_order().is_none());
    assert_eq!(app.on_key(key(KeyCode::Char('d'))), KeyResult::None);
    assert_eq!(app.cursor(Lane::Express).rows(), 0);
}

// Snapshot orders land in their lanes and cursors follow.
#[test]
fn apply_snapshot_classifies_lanes() {
    let app = app_with_orders();
    let lanes = app.board.lanes();
    assert_eq!(lanes.get(Lane::Express)[0].order_id, "1");
    assert_eq!(lanes.get(Lane::Shortage)[0].order_id, "2");
    assert_eq!(lanes.get(Lane::Standard)[0].order_id, "3");
    for lane in Lane::ALL {
        assert_eq!(app.cursor(lane).rows(), 1);
    }
}

// Dispatch and partial dispatch target the selected order.
#[test]
fn order_keys_act_on_selection() {
    let mut app = app_with_orders();
    assert_eq!(
        app.on_key(key(KeyCode::Char('d'))),
        KeyResult::Act {
            order_id: "1".into(),
            action: TriageAction::Dispatch,
        }
    );

    app.on_key(key(KeyCode::Tab));
    assert_eq!(app.focus, Lane::Shortage);
    assert_eq!(
        app.on_key(key(KeyCode::Char('p'))),
        KeyResult::Act {
            order_id: "2".into(),
            action: TriageAction::PartialDispatch { quantity: 3 },
        }
    );
    assert_eq!(
        app.on_key(key(KeyCode::Char('b'))),
        KeyResult::Act {
            order_id: "2".into(),
            action: TriageAction::wait(),
        }
    );
}

// Lane focus wraps in both directions.
#[test]
fn lane_navigation_wraps() {
    let mut app = App::new(&ConsoleConfig::default());
    app.on_key(key(KeyCode::BackTab));
    assert_eq!(app.focus, Lane::Standard);
    app.on_key(key(KeyCode::Char('l')));
    assert_eq!(app.focus, Lane::Express);
    app.on_key(key(KeyCode::Right));
    app.on_key(key(KeyCode::Right));
    app.on_key(key(KeyCode::Right));
    assert_eq!(app.focus, Lane::Express);
}

// A rejected action restores the order and raises an error notice.
#[test]
fn rejected_action_restores_order() {
    let mut app = app_with_orders();
    assert!(app.begin_action("1", &TriageAction::Dispatch));
    assert!(app.board.lanes().get(Lane::Express).is_empty());
    assert_eq!(app.in_flight, 1);
    assert_eq!(app.cursor(Lane::Express).rows(), 0);

    // Second action on the same order is refused.
    assert!(!app.begin_action("1", &TriageAction::Dispatch));
    assert!(app.notice.as_ref().is_some_and(|n| n.is_error));

    app.finish_action(
        "1",
        &ActionOutcome::Rejected {
            error: ConsoleError::Invalid("nope".into()),
        },
    );
    assert_eq!(app.in_flight, 0);
    assert_eq!(app.board.lanes().get(Lane::Express)[0].order_id, "1");
    let notice = app.notice.clone().unwrap();
    assert!(notice.is_error);
    assert!(notice.text.starts_with("Action failed"));

    // Esc dismisses it.
    app.on_key(key(KeyCode::Esc));
    assert!(app.notice.is_none());
}

// A re-published snapshot with the same shipping stamp keeps optimistic state.
#[test]
fn same_shipping_stamp_keeps_pending_state() {
    let mut app = app_with_orders();
    assert!(app.begin_action("3", &TriageAction::Dispatch));
    app.finish_action(
        "3",
        &ActionOutcome::Confirmed {
            message: "ok".into(),
        },
    );
    assert!(!app.notice.as_ref().unwrap().is_error);

    let same = app.snapshot.clone();
    app.apply_snapshot(same);
    assert!(app.board.lanes().get(Lane::Standard).is_empty());

    // The service no longer lists it: settled for good.
    app.apply_snapshot(snapshot_with(
        vec![order("1", 2.0, 10, 5), order("2", 20.0, 3, 5)],
        2,
    ));
    assert!(!app.board.is_pending("3"));
    assert_eq!(app.board.lanes().total(), 2);
}

// `f` flips the structure mode, `n` cycles the subtree.
#[test]
fn structure_keys() {
    let mut app = App::new(&ConsoleConfig::default());
    assert_eq!(app.layout_mode, LayoutMode::Heap);
    app.on_key(key(KeyCode::Char('f')));
    assert_eq!(app.layout_mode, LayoutMode::Bst);
    app.on_key(key(KeyCode::Char('f')));
    assert_eq!(app.layout_mode, LayoutMode::Heap);

    assert_eq!(app.subtree, Subtree::All);
    assert_eq!(
        app.on_key(key(KeyCode::Char('n'))),
        KeyResult::SubtreeChanged(Subtree::Left)
    );
    assert_eq!(app.subtree, Subtree::Left);
}

// Control keys map to engine requests; q and Ctrl-C quit.
#[test]
fn control_keys() {
    let mut app = App::new(&ConsoleConfig::default());
    assert_eq!(app.on_key(key(KeyCode::Char('r'))), KeyResult::Refresh);
    assert_eq!(app.on_key(key(KeyCode::Char('t'))), KeyResult::ToggleRotation);
    assert_eq!(app.on_key(key(KeyCode::Char('a'))), KeyResult::AdvanceRotation);
    assert_eq!(app.on_key(key(KeyCode::Char('x'))), KeyResult::ClearLog);
    assert!(!app.should_quit);
    app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
}

fn screen_text(app: &App, width: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, 48)).unwrap();
    terminal.draw(|frame| ui(frame, app)).unwrap();
    let buffer = terminal.backend().buffer().clone();
    buffer.content().iter().map(|c| c.symbol()).collect()
}

// The full frame renders with data and without.
#[test]
fn ui_renders_lanes() {
    for app in [App::new(&ConsoleConfig::default()), app_with_orders()] {
        let mut terminal = Terminal::new(TestBackend::new(140, 48)).unwrap();
        terminal.draw(|frame| ui(frame, &app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Express"));
        assert!(text.contains("Waiting"));
    }
}

// Finished actions come back over the outcome channel and settle the board.
#[tokio::test]
async fn outcome_channel_delivers_finished_actions() {
    let mut app = app_with_orders();
    let (tx, mut rx) = outcome_channel();
    assert!(app.begin_action("1", &TriageAction::Dispatch));

    tx.send((
        "1".to_string(),
        ActionOutcome::Rejected {
            error: ConsoleError::Invalid("nope".into()),
        },
    ))
    .unwrap();
    let (order_id, outcome) = rx.recv().await.unwrap();
    app.finish_action(&order_id, &outcome);

    assert_eq!(app.in_flight, 0);
    assert_eq!(app.board.lanes().get(Lane::Express)[0].order_id, "1");
    assert!(app.notice.as_ref().is_some_and(|n| n.is_error));
}

// `+` and `-` ask for a stock change on the selected order's SKU.
#[test]
fn stock_keys_adjust_selected_sku() {
    let mut app = app_with_orders();
    assert_eq!(
        app.on_key(key(KeyCode::Char('+'))),
        KeyResult::UpdateStock {
            sku: "SKU-1".into(),
            new_stock: 11,
        }
    );
    assert_eq!(
        app.on_key(key(KeyCode::Char('-'))),
        KeyResult::UpdateStock {
            sku: "SKU-1".into(),
            new_stock: 9,
        }
    );

    // Stock never goes below zero.
    let mut empty = App::new(&ConsoleConfig::default());
    empty.apply_snapshot(snapshot_with(vec![order("4", 2.0, 0, 5)], 1));
    empty.on_key(key(KeyCode::Tab));
    assert_eq!(empty.focus, Lane::Shortage);
    assert_eq!(empty.on_key(key(KeyCode::Char('-'))), KeyResult::None);
    assert!(empty.notice.is_none());

    // An order without a SKU cannot be restocked.
    let mut bare = App::new(&ConsoleConfig::default());
    bare.apply_snapshot(snapshot_with(
        vec![OrderRecord {
            sku: None,
            ..order("5", 2.0, 10, 5)
        }],
        1,
    ));
    assert_eq!(bare.on_key(key(KeyCode::Char('+'))), KeyResult::None);
    assert!(bare.notice.as_ref().is_some_and(|n| n.is_error));
}

// Finished stock writes report through the stock channel as a notice.
#[tokio::test]
async fn stock_updates_report_a_notice() {
    let mut app = app_with_orders();
    let (tx, mut rx) = stock_channel();
    app.in_flight = 2;

    tx.send(("SKU-1".to_string(), Ok(Ack::default()))).unwrap();
    tx.send((
        "SKU-2".to_string(),
        Err(ConsoleError::Status {
            status: 404,
            detail: "Product not found".into(),
        }),
    ))
    .unwrap();

    let (sku, result) = rx.recv().await.unwrap();
    app.finish_stock_update(&sku, &result);
    let notice = app.notice.clone().unwrap();
    assert!(!notice.is_error);
    assert_eq!(notice.text, "Stock for SKU-1 updated");

    let (sku, result) = rx.recv().await.unwrap();
    app.finish_stock_update(&sku, &result);
    let notice = app.notice.clone().unwrap();
    assert!(notice.is_error);
    assert!(notice.text.contains("SKU-2"));
    assert!(notice.text.contains("Product not found"));
    assert_eq!(app.in_flight, 0);
}

// Order history and the pick list each get a pane.
#[test]
fn ui_renders_history_and_pick_list() {
    let mut app = app_with_orders();
    let mut snapshot = app.snapshot.clone();
    snapshot.apply(
        SnapshotUpdate::OrderHistory(vec![
            OrderRecord {
                status: Some("SHIPPED".into()),
                ..order("7", 2.0, 10, 5)
            },
            OrderRecord {
                status: Some("PENDING".into()),
                ..order("8", 2.0, 10, 5)
            },
        ]),
        Stamp::now(2),
        2,
    );
    snapshot.apply(
        SnapshotUpdate::ShippingDashboard(ShippingDashboard {
            priority_queue: vec![order("1", 2.0, 10, 5)],
            pick_list: vec![PickListEntry {
                sku: Some("SKU-9".into()),
                item_name: Some("Widget".into()),
                qty: Some(4),
                ..Default::default()
            }],
            ..Default::default()
        }),
        Stamp::now(3),
        3,
    );
    app.apply_snapshot(snapshot);

    let text = screen_text(&app, 160);
    assert!(text.contains("Order History (2, 1 shipped)"));
    assert!(text.contains("SHIPPED"));
    assert!(text.contains("Pick List (1)"));
    assert!(text.contains("SKU-9 Widget x4"));
}

// Stability is labelled with the filter its items were read for, and
// the BST drawing carries no filter tag.
#[test]
fn stability_title_follows_the_result_filter() {
    let mut app = App::new(&ConsoleConfig::default());
    assert_eq!(
        app.on_key(key(KeyCode::Char('n'))),
        KeyResult::SubtreeChanged(Subtree::Left)
    );
    app.on_key(key(KeyCode::Char('f')));
    assert_eq!(app.layout_mode, LayoutMode::Bst);

    // Nothing read yet.
    let text = screen_text(&app, 160);
    assert!(text.contains("Stability [?] (0)"));
    assert!(text.contains("Inventory BST (0)"));
    assert!(!text.contains("[left]"));

    // The result still holds the previous filter.
    let mut snapshot = ViewSnapshot::default();
    snapshot.apply(
        SnapshotUpdate::BstFilter(BstFilterResult {
            filter: Some(Subtree::All),
            ..Default::default()
        }),
        Stamp::now(1),
        1,
    );
    app.apply_snapshot(snapshot);
    let text = screen_text(&app, 160);
    assert!(text.contains("Stability [all] (0)"));
    assert!(!text.contains("[left]"));
}
