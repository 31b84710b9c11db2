/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use pirs_console::payload::StabilityItem;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;

use crate::App;
use crate::format::UNKNOWN;
use crate::format_days;
use crate::render::orders_pane::render_pick_list;
use crate::truncate;

/// Entries shown by the audit rotation widget.
const ROTATION_WINDOW: usize = 3;

/// Render the right-bottom widgets: audit rotation and blocked lots
/// side by side, stability beside the pick list, then the activity
/// log.
pub(crate) fn render_side_pane(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(ROTATION_WINDOW as u16 + 3),
            Constraint::Length(7),
            Constraint::Min(4),
        ])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    render_rotation(frame, top[0], app);
    render_blocked_lots(frame, top[1], app);
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);
    render_stability(frame, middle[0], app);
    render_pick_list(frame, middle[1], app);
    render_activity(frame, rows[2], app);
}

fn render_rotation(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let s = &app.theme.scheme;
    let l = &app.theme.labels;
    let rotation = &app.rotation;

    let mode = if rotation.is_auto_advancing {
        l.rotation_on
    } else {
        l.rotation_off
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(mode, s.stat_timing),
        Span::styled(l.separator, s.stat_label),
        Span::styled(
            if rotation.is_empty() {
                "0/0".to_string()
            } else {
                format!("{}/{}", rotation.current_index + 1, rotation.len())
            },
            s.stat_value,
        ),
    ])];
    for (i, sku) in rotation.upcoming(ROTATION_WINDOW).into_iter().enumerate() {
        lines.push(if i == 0 {
            Line::from(Span::styled(
                format!("{}{}", l.selection_caret, sku),
                s.stat_selection.add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(format!("  {}", sku), s.muted))
        });
    }

    let block = Block::default()
        .title(l.pane_rotation)
        .borders(Borders::ALL)
        .border_style(s.border);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_blocked_lots(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let s = &app.theme.scheme;
    let l = &app.theme.labels;
    let text = match app.snapshot.hashset.value() {
        Some(gate) if gate.blocked_lots.is_empty() => Line::from(Span::styled("none", s.success)),
        Some(gate) => Line::from(Span::styled(gate.blocked_lots.join(", "), s.error)),
        None => Line::from(Span::styled(l.no_data, s.muted)),
    };
    let buckets = app
        .snapshot
        .hashset
        .value()
        .map(|g| g.buckets.len())
        .unwrap_or(0);
    let block = Block::default()
        .title(format!("{} [{} buckets]", l.pane_gate, buckets))
        .borders(Borders::ALL)
        .border_style(s.border);
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

/// Items of the current BST filter, or the full stability list if
/// the filter has not been read yet.
fn render_stability(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let s = &app.theme.scheme;
    let l = &app.theme.labels;
    let items: &[StabilityItem] = match app.snapshot.bst_filter.value() {
        Some(filtered) => &filtered.items,
        None => app
            .snapshot
            .stability
            .value()
            .map(Vec::as_slice)
            .unwrap_or(&[]),
    };

    // Label with the filter the shown result was read for, which can
    // lag the one just selected.
    let filter = app
        .snapshot
        .bst_filter
        .value()
        .and_then(|r| r.filter)
        .map_or(UNKNOWN, |f| f.as_str());

    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = if items.is_empty() {
        vec![Line::from(Span::styled(l.no_data, s.muted))]
    } else {
        items
            .iter()
            .take(visible)
            .map(|item| {
                Line::from(Span::styled(
                    format!(
                        "{} {} {}",
                        item.sku,
                        truncate(item.name.as_deref().unwrap_or(""), 20),
                        format_days(item.days_remaining)
                    ),
                    s.band_style(item.band()),
                ))
            })
            .collect()
    };

    let block = Block::default()
        .title(format!("{} [{}] ({})", l.pane_stability, filter, items.len()))
        .borders(Borders::ALL)
        .border_style(s.border);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// The newest records that fit, oldest at the top.
fn render_activity(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let s = &app.theme.scheme;
    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.events.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .events
        .iter()
        .skip(skip)
        .map(|record| {
            Line::from(vec![
                Span::styled(format!("{} ", record.time_label()), s.muted),
                Span::styled(
                    format!("[{}] ", record.kind),
                    s.event_style(record.kind),
                ),
                Span::styled(record.message.clone(), s.stat_label),
            ])
        })
        .collect();

    let block = Block::default()
        .title(format!("{} ({})", app.theme.labels.pane_activity, app.events.len()))
        .borders(Borders::ALL)
        .border_style(s.border);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
