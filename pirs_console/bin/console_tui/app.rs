/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use futures::StreamExt;
use pirs_console::ConsoleConfig;
use pirs_console::InventoryClient;
use pirs_console::Lane;
use pirs_console::Layout;
use pirs_console::LayoutMode;
use pirs_console::LogSink;
use pirs_console::RotationScheduler;
use pirs_console::StructureGraph;
use pirs_console::Synchronizer;
use pirs_console::TriageBoard;
use pirs_console::TriageController;
use pirs_console::ViewSnapshot;
use pirs_console::WarehouseApi;
use pirs_console::event_log::EventRecord;
use pirs_console::layout::layout;
use pirs_console::payload::Ack;
use pirs_console::payload::OrderRecord;
use pirs_console::payload::Subtree;
use pirs_console::rotation::RotationState;
use pirs_console::snapshot::Stamp;
use pirs_console::sync::standard_fetchers;
use pirs_console::triage::ActionOutcome;
use pirs_console::triage::InventoryActions;
use pirs_console::triage::TriageAction;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio::sync::watch;

use crate::LaneCursor;
use crate::KeyResult;
use crate::Theme;
use crate::format_interval;
use crate::render::ui;

/// Redraw period when nothing else happens (keeps the log pane live).
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

/// Finished order actions, reported back to the event loop.
pub(crate) type OutcomeSender = mpsc::UnboundedSender<(String, ActionOutcome)>;
pub(crate) type OutcomeReceiver = mpsc::UnboundedReceiver<(String, ActionOutcome)>;

pub(crate) fn outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::unbounded_channel::<(String, ActionOutcome)>()
}

/// Finished stock writes, keyed by SKU.
pub(crate) type StockSender = mpsc::UnboundedSender<(String, pirs_console::Result<Ack>)>;
pub(crate) type StockReceiver = mpsc::UnboundedReceiver<(String, pirs_console::Result<Ack>)>;

pub(crate) fn stock_channel() -> (StockSender, StockReceiver) {
    mpsc::unbounded_channel::<(String, pirs_console::Result<Ack>)>()
}

/// Where spawned writes report back to the event loop.
pub(crate) struct Completions {
    pub(crate) outcomes: OutcomeSender,
    pub(crate) stock: StockSender,
}

/// A transient, dismissible message under the header.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Notice {
    pub(crate) text: String,
    pub(crate) is_error: bool,
}

fn lane_index(lane: Lane) -> usize {
    match lane {
        Lane::Express => 0,
        Lane::Shortage => 1,
        Lane::Standard => 2,
    }
}

fn next_lane(lane: Lane) -> Lane {
    Lane::ALL[(lane_index(lane) + 1) % Lane::ALL.len()]
}

fn prev_lane(lane: Lane) -> Lane {
    Lane::ALL[(lane_index(lane) + Lane::ALL.len() - 1) % Lane::ALL.len()]
}

/// Render-side state of the console.
///
/// `App` never talks to the service. It holds copies of what the
/// engine published (snapshot, rotation, activity log) plus purely
/// local UI state, and turns keys into [`KeyResult`]s for the event
/// loop to execute.
pub(crate) struct App {
    pub(crate) base_url: String,
    pub(crate) refresh_interval_label: String,
    pub(crate) should_quit: bool,

    pub(crate) snapshot: ViewSnapshot,
    /// Lanes plus optimistic action state.
    pub(crate) board: TriageBoard,
    /// Stamp of the shipping read the board was last built from.
    shipping_stamp: Option<Stamp>,
    pub(crate) focus: Lane,
    cursors: [LaneCursor; 3],

    pub(crate) layout_mode: LayoutMode,
    pub(crate) structure_graph: StructureGraph,
    pub(crate) structure: Layout,
    pub(crate) subtree: Subtree,

    pub(crate) rotation: RotationState,
    pub(crate) events: Vec<EventRecord>,
    log_seq: Option<u64>,

    pub(crate) notice: Option<Notice>,
    pub(crate) in_flight: usize,
    pub(crate) theme: Theme,
}

impl App {
    pub(crate) fn new(config: &ConsoleConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            refresh_interval_label: format_interval(config.refresh_interval),
            should_quit: false,
            snapshot: ViewSnapshot::default(),
            board: TriageBoard::new(),
            shipping_stamp: None,
            focus: Lane::Express,
            cursors: Default::default(),
            layout_mode: LayoutMode::default(),
            structure_graph: StructureGraph::default(),
            structure: Layout::default(),
            subtree: config.subtree,
            rotation: RotationState::default(),
            events: Vec::new(),
            log_seq: None,
            notice: None,
            in_flight: 0,
            theme: Theme::default(),
        }
    }

    pub(crate) fn cursor(&self, lane: Lane) -> &LaneCursor {
        &self.cursors[lane_index(lane)]
    }

    fn cursor_mut(&mut self, lane: Lane) -> &mut LaneCursor {
        &mut self.cursors[lane_index(lane)]
    }

    pub(crate) fn selected_order(&self) -> Option<&OrderRecord> {
        self.board
            .lanes()
            .get(self.focus)
            .get(self.cursor(self.focus).selected())
    }

    /// Take a newly published snapshot.
    ///
    /// The board is only rebuilt when the shipping read itself is new,
    /// so a cycle where shipping failed does not settle optimistic
    /// state.
    pub(crate) fn apply_snapshot(&mut self, snapshot: ViewSnapshot) {
        let stamp = snapshot.shipping.last_ready().map(|r| r.stamp);
        if stamp != self.shipping_stamp {
            if let Some(shipping) = snapshot.shipping.value() {
                self.board.apply_snapshot(shipping);
            }
            self.shipping_stamp = stamp;
        }
        self.snapshot = snapshot;
        self.sync_cursors();
        self.rebuild_structure();
    }

    fn sync_cursors(&mut self) {
        for lane in Lane::ALL {
            let len = self.board.lanes().get(lane).len();
            self.cursor_mut(lane).resize(len);
        }
    }

    pub(crate) fn rebuild_structure(&mut self) {
        self.structure_graph = match self.layout_mode {
            LayoutMode::Heap => self
                .snapshot
                .shipping_heap
                .value()
                .map(|h| h.structure().into_owned())
                .unwrap_or_default(),
            LayoutMode::Bst => self
                .snapshot
                .bst_structure
                .value()
                .map(|b| b.tree.clone())
                .unwrap_or_default(),
        };
        self.structure = layout(&self.structure_graph, self.layout_mode);
    }

    /// Re-copy the activity log if it changed.
    pub(crate) fn sync_log(&mut self, log: &LogSink) {
        let seq = log.last_seq();
        if seq != self.log_seq {
            self.events = log.snapshot();
            self.log_seq = seq;
        }
    }

    /// Apply the optimistic effect of an action. False if the order
    /// already has one in flight.
    pub(crate) fn begin_action(&mut self, order_id: &str, action: &TriageAction) -> bool {
        if !self.board.begin(order_id, action) {
            self.notice = Some(Notice {
                text: format!("Order {} is busy or gone", order_id),
                is_error: true,
            });
            return false;
        }
        self.in_flight += 1;
        self.sync_cursors();
        true
    }

    pub(crate) fn finish_action(&mut self, order_id: &str, outcome: &ActionOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.board.finish(order_id, outcome);
        self.sync_cursors();
        self.notice = Some(Notice {
            text: outcome.notice(),
            is_error: outcome.is_rejected(),
        });
    }

    /// Report a finished stock write. The new level shows up with the
    /// refresh the write requested.
    pub(crate) fn finish_stock_update(&mut self, sku: &str, result: &pirs_console::Result<Ack>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.notice = Some(match result {
            Ok(ack) => Notice {
                text: ack
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Stock for {} updated", sku)),
                is_error: false,
            },
            Err(err) => Notice {
                text: format!("Stock update for {} failed: {}", sku, err),
                is_error: true,
            },
        });
    }

    /// Nudge the stock of the selected order's SKU by `delta`, never
    /// below zero.
    fn stock_adjust(&mut self, delta: i64) -> KeyResult {
        let Some(order) = self.selected_order() else {
            return KeyResult::None;
        };
        let order_id = order.order_id.clone();
        let Some((sku, stock)) = order.sku.clone().zip(order.current_stock) else {
            self.notice = Some(Notice {
                text: format!("Order {} has no SKU or stock level", order_id),
                is_error: true,
            });
            return KeyResult::None;
        };
        let new_stock = (stock + delta).max(0);
        if new_stock == stock {
            return KeyResult::None;
        }
        KeyResult::UpdateStock { sku, new_stock }
    }

    fn order_action(&self, action: TriageAction) -> KeyResult {
        match self.selected_order() {
            Some(order) => KeyResult::Act {
                order_id: order.order_id.clone(),
                action,
            },
            None => KeyResult::None,
        }
    }

    /// Handle a single keypress and update in-memory UI state.
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> KeyResult {
        if key.kind != KeyEventKind::Press {
            return KeyResult::None;
        }
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                KeyResult::None
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                KeyResult::None
            }
            KeyCode::Esc => {
                self.notice = None;
                KeyResult::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor_mut(self.focus).up();
                KeyResult::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor_mut(self.focus).down();
                KeyResult::None
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.cursor_mut(self.focus).first();
                KeyResult::None
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.cursor_mut(self.focus).last();
                KeyResult::None
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                self.focus = prev_lane(self.focus);
                KeyResult::None
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                self.focus = next_lane(self.focus);
                KeyResult::None
            }
            KeyCode::Char('d') => self.order_action(TriageAction::Dispatch),
            KeyCode::Char('p') => {
                // Ship what is on hand; zero or unknown stock is
                // rejected by the controller.
                let quantity = self
                    .selected_order()
                    .and_then(OrderRecord::shippable_qty)
                    .unwrap_or(0);
                self.order_action(TriageAction::PartialDispatch { quantity })
            }
            KeyCode::Char('b') => self.order_action(TriageAction::wait()),
            KeyCode::Char('+') | KeyCode::Char('=') => self.stock_adjust(1),
            KeyCode::Char('-') => self.stock_adjust(-1),
            KeyCode::Char('f') => {
                self.layout_mode = self.layout_mode.toggle();
                self.rebuild_structure();
                KeyResult::None
            }
            KeyCode::Char('n') => {
                self.subtree = self.subtree.next();
                KeyResult::SubtreeChanged(self.subtree)
            }
            KeyCode::Char('t') => KeyResult::ToggleRotation,
            KeyCode::Char('a') => KeyResult::AdvanceRotation,
            KeyCode::Char('r') => KeyResult::Refresh,
            KeyCode::Char('x') => KeyResult::ClearLog,
            _ => KeyResult::None,
        }
    }
}

/// Everything that talks to the service or owns a timer.
pub(crate) struct Engine {
    pub(crate) log: LogSink,
    pub(crate) sync: Synchronizer,
    pub(crate) rotation: RotationScheduler,
    pub(crate) triage: TriageController,
    pub(crate) inventory: InventoryActions,
    subtree: watch::Sender<Subtree>,
}

impl Engine {
    /// Build the client and start polling. Must run inside a tokio
    /// runtime.
    pub(crate) fn start(config: &ConsoleConfig, log: LogSink) -> pirs_console::Result<Self> {
        let client = InventoryClient::new(config.base_url.clone(), config.request_timeout, log)?;
        let api: Arc<dyn WarehouseApi> = Arc::new(client);
        let (subtree, subtree_rx) = watch::channel(config.subtree);
        let sync = Synchronizer::start(
            standard_fetchers(Arc::clone(&api), subtree_rx),
            config.refresh_interval,
        )?;
        let rotation = RotationScheduler::new(config.rotation_interval)?;
        let triage = TriageController::new(
            Arc::clone(&api),
            sync.refresh_handle(),
            config.degraded_writes,
        );
        let inventory = InventoryActions::new(Arc::clone(&api), sync.refresh_handle());
        Ok(Self {
            log: api.log().clone(),
            sync,
            rotation,
            triage,
            inventory,
            subtree,
        })
    }

    /// Execute what a keypress asked for. Writes run on their own task
    /// and report back through `completions`.
    fn handle(&mut self, app: &mut App, result: KeyResult, completions: &Completions) {
        match result {
            KeyResult::None => {}
            KeyResult::Act { order_id, action } => {
                if app.begin_action(&order_id, &action) {
                    let triage = self.triage.clone();
                    let tx = completions.outcomes.clone();
                    tokio::spawn(async move {
                        let outcome = triage.perform(&order_id, &action).await;
                        let _ = tx.send((order_id, outcome));
                    });
                }
            }
            KeyResult::UpdateStock { sku, new_stock } => {
                app.in_flight += 1;
                let inventory = self.inventory.clone();
                let tx = completions.stock.clone();
                tokio::spawn(async move {
                    let result = inventory.update_stock(&sku, new_stock).await;
                    let _ = tx.send((sku, result));
                });
            }
            KeyResult::Refresh => self.sync.refresh_now(),
            KeyResult::SubtreeChanged(subtree) => {
                self.subtree.send_replace(subtree);
                self.sync.refresh_now();
            }
            KeyResult::AdvanceRotation => self.rotation.advance(),
            KeyResult::ToggleRotation => {
                self.rotation.toggle();
            }
            KeyResult::ClearLog => self.log.clear(),
        }
    }

    /// Stop every timer and close the log. Idempotent.
    pub(crate) fn shutdown(&mut self) {
        self.sync.stop();
        self.rotation.shutdown();
        self.log.close();
    }
}

/// Drive the main event loop.
///
/// Redraws on every wakeup: a new snapshot, a rotation tick, a finished
/// action, a key, or the redraw timer.
pub(crate) async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    engine: &mut Engine,
) -> io::Result<()> {
    let mut snapshots = engine.sync.subscribe();
    let mut rotation = engine.rotation.subscribe();
    let (outcome_tx, mut outcomes) = outcome_channel();
    let (stock_tx, mut stock_updates) = stock_channel();
    let completions = Completions {
        outcomes: outcome_tx,
        stock: stock_tx,
    };
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    let mut events = EventStream::new();

    app.rotation = rotation.borrow_and_update().clone();

    loop {
        app.sync_log(&engine.log);
        terminal.draw(|frame| ui(frame, &app))?;

        tokio::select! {
            _ = redraw.tick() => {}
            Ok(()) = snapshots.changed() => {
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(audit) = snapshot.audit.value() {
                    engine.rotation.set_sequence(audit.audit_sequence.clone());
                }
                app.apply_snapshot(snapshot);
            }
            Ok(()) = rotation.changed() => {
                app.rotation = rotation.borrow_and_update().clone();
            }
            Some((order_id, outcome)) = outcomes.recv() => {
                app.finish_action(&order_id, &outcome);
            }
            Some((sku, result)) = stock_updates.recv() => {
                app.finish_stock_update(&sku, &result);
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        let result = app.on_key(key);
                        engine.handle(&mut app, result, &completions);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::warn!("terminal event error: {}", err);
                    }
                    None => break,
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
