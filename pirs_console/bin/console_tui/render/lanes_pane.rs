/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use pirs_console::Lane;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;

use crate::App;
use crate::format::UNKNOWN;
use crate::format_count;
use crate::format_order_row;
use crate::render::orders_pane::render_order_history;

fn lane_title(app: &App, lane: Lane) -> &'static str {
    let l = &app.theme.labels;
    match lane {
        Lane::Express => l.pane_express,
        Lane::Shortage => l.pane_shortage,
        Lane::Standard => l.pane_standard,
    }
}

/// Render the three triage lanes, then the waiting list beside the
/// order history (left pane).
///
/// Only the focused lane shows a selection; its border is highlighted.
pub(crate) fn render_lanes(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    for (lane, chunk) in Lane::ALL.into_iter().zip(chunks.iter()) {
        render_lane(frame, *chunk, app, lane);
    }
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);
    render_waiting(frame, bottom[0], app);
    render_order_history(frame, bottom[1], app);
}

fn render_lane(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App, lane: Lane) {
    let s = &app.theme.scheme;
    let orders = app.board.lanes().get(lane);
    let focused = app.focus == lane;
    let cursor = app.cursor(lane);
    let lane_style = s.lane_style(lane);

    let items: Vec<ListItem> = if orders.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            app.theme.labels.empty_lane,
            s.muted,
        )))]
    } else {
        orders
            .iter()
            .enumerate()
            .map(|(i, order)| {
                let selected = focused && i == cursor.selected();
                let (marker, style) = if selected {
                    (
                        app.theme.labels.selection_caret,
                        s.stat_selection.add_modifier(Modifier::BOLD),
                    )
                } else {
                    ("  ", lane_style)
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{}{}", marker, format_order_row(order)),
                    style,
                )))
            })
            .collect()
    };

    let block = Block::default()
        .title(Span::styled(
            format!("{} ({})", lane_title(app, lane), orders.len()),
            lane_style,
        ))
        .borders(Borders::ALL)
        .border_style(if focused { s.border_focused } else { s.border });

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default());
    let mut state = ListState::default().with_selected(focused.then(|| cursor.selected()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_waiting(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let s = &app.theme.scheme;
    let l = &app.theme.labels;
    let waiting = app.board.waiting();

    let items: Vec<ListItem> = if waiting.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(l.empty_lane, s.muted)))]
    } else {
        waiting
            .iter()
            .map(|entry| {
                let mut spans = vec![Span::styled(
                    format!(
                        "  {} {} qty {} {}",
                        if entry.order_id.is_empty() {
                            UNKNOWN
                        } else {
                            entry.order_id.as_str()
                        },
                        entry.item_name.as_deref().unwrap_or(UNKNOWN),
                        format_count(entry.qty),
                        entry.reason.as_deref().unwrap_or(""),
                    ),
                    s.stat_label,
                )];
                if !entry.persisted {
                    spans.push(Span::styled(l.not_persisted, s.warning));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let block = Block::default()
        .title(format!("{} ({})", l.pane_waiting, waiting.len()))
        .borders(Borders::ALL)
        .border_style(s.border);
    frame.render_widget(List::new(items).block(block), area);
}
