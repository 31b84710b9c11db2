/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use pirs_console::payload::OrderRecord;
use pirs_console::payload::PickListEntry;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;

use crate::App;
use crate::format::UNKNOWN;
use crate::format_count;
use crate::theme::ColorScheme;
use crate::truncate;

fn status_style(scheme: &ColorScheme, status: Option<&str>) -> Style {
    match status {
        Some("SHIPPED") => scheme.success,
        Some("BLOCKED") => scheme.error,
        Some("PENDING") => scheme.warning,
        _ => scheme.stat_label,
    }
}

fn history_line(scheme: &ColorScheme, order: &OrderRecord) -> Line<'static> {
    let item = order
        .item_name
        .as_deref()
        .or(order.sku.as_deref())
        .unwrap_or(UNKNOWN);
    let status = order.status.as_deref();
    Line::from(vec![
        Span::styled(
            format!(
                "{} {} x{} ",
                order.order_id,
                truncate(item, 14),
                format_count(order.qty)
            ),
            scheme.stat_label,
        ),
        Span::styled(
            status.unwrap_or(UNKNOWN).to_string(),
            status_style(scheme, status),
        ),
    ])
}

/// Every order the service knows about, in service order, with its
/// recorded status.
pub(crate) fn render_order_history(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let s = &app.theme.scheme;
    let l = &app.theme.labels;
    let orders: &[OrderRecord] = app
        .snapshot
        .orders
        .value()
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = if orders.is_empty() {
        vec![Line::from(Span::styled(l.no_data, s.muted))]
    } else {
        orders
            .iter()
            .take(visible)
            .map(|order| history_line(s, order))
            .collect()
    };
    let shipped = orders
        .iter()
        .filter(|o| o.status.as_deref() == Some("SHIPPED"))
        .count();

    let block = Block::default()
        .title(format!(
            "{} ({}, {} shipped)",
            l.pane_history,
            orders.len(),
            shipped
        ))
        .borders(Borders::ALL)
        .border_style(s.border);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn pick_line(entry: &PickListEntry) -> String {
    format!(
        "{} {} x{}",
        entry.sku.as_deref().unwrap_or(UNKNOWN),
        truncate(entry.item_name.as_deref().unwrap_or(""), 16),
        format_count(entry.qty)
    )
}

/// Quantities to pull per SKU for the current shipping queue.
pub(crate) fn render_pick_list(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let s = &app.theme.scheme;
    let l = &app.theme.labels;
    let picks: &[PickListEntry] = app
        .snapshot
        .shipping
        .value()
        .map(|d| d.pick_list.as_slice())
        .unwrap_or(&[]);

    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = if picks.is_empty() {
        vec![Line::from(Span::styled(l.empty_lane, s.muted))]
    } else {
        picks
            .iter()
            .take(visible)
            .map(|entry| Line::from(Span::styled(pick_line(entry), s.stat_value)))
            .collect()
    };

    let block = Block::default()
        .title(format!("{} ({})", l.pane_picks, picks.len()))
        .borders(Borders::ALL)
        .border_style(s.border);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
