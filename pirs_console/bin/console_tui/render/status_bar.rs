/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;

use crate::App;
use crate::format_count;
use crate::format_priority;
use crate::theme::ColorScheme;
use crate::theme::Labels;

/// Render the top status/header bar.
///
/// Line 1: app name, service URL, connectivity, refresh interval.
/// Line 2: dashboard summary and the top priority item.
/// Line 3: the current notice, or which reads are failing.
pub(crate) fn render_header(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let l = &app.theme.labels;
    let s = &app.theme.scheme;
    let snapshot = &app.snapshot;

    // Line 1: pirs-console • URL • connected • ⟳ 5s
    let mut line1 = vec![
        Span::styled(l.app_name, s.app_name),
        Span::styled(l.separator, s.stat_label),
        Span::styled(&app.base_url, s.stat_url),
        Span::styled(l.separator, s.stat_label),
        Span::styled(
            snapshot.connectivity.to_string(),
            s.connectivity_style(snapshot.connectivity),
        ),
        Span::styled(l.separator, s.stat_label),
        Span::styled(l.refresh_icon, s.stat_timing),
        Span::styled(&app.refresh_interval_label, s.stat_timing),
    ];
    if app.in_flight > 0 {
        line1.extend([
            Span::styled(l.separator, s.stat_label),
            Span::styled(l.in_flight, s.stat_label),
            Span::styled(app.in_flight.to_string(), s.stat_selection),
        ]);
    }

    // Line 2: SKUs: 42 • critical: 3 • top: Widget (SKU-1) 2.0d
    let summary = snapshot.summary.value();
    let mut line2 = vec![
        Span::styled(l.skus, s.stat_label),
        Span::styled(
            format_count(summary.and_then(|v| v.total_sku_count)),
            s.stat_value,
        ),
        Span::styled(l.separator, s.stat_label),
        Span::styled(l.critical, s.stat_label),
        Span::styled(
            format_count(summary.and_then(|v| v.critical_stock_alert)),
            s.error,
        ),
    ];
    if let Some(top) = snapshot.priority.value().and_then(format_priority) {
        let urgent = snapshot.priority.value().is_some_and(|p| p.is_urgent());
        line2.extend([
            Span::styled(l.separator, s.stat_label),
            Span::styled(l.top_priority, s.stat_label),
            Span::styled(top, if urgent { s.error } else { s.stat_value }),
        ]);
    }

    // Line 3: notice wins over the failing-field summary.
    let line3 = if let Some(notice) = &app.notice {
        Line::from(Span::styled(
            notice.text.clone(),
            if notice.is_error { s.error } else { s.success },
        ))
    } else {
        let failing = snapshot.failing_fields();
        if failing.is_empty() {
            Line::default()
        } else {
            let names: Vec<&str> = failing.iter().map(|f| f.as_str()).collect();
            Line::from(Span::styled(
                format!("stale: {}", names.join(", ")),
                s.warning,
            ))
        }
    };

    let header = Paragraph::new(vec![Line::from(line1), Line::from(line2), line3]).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(s.border),
    );
    frame.render_widget(header, area);
}

/// Render the bottom help bar showing the keyboard shortcuts.
pub(crate) fn render_footer(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    scheme: &ColorScheme,
    labels: &Labels,
) {
    let footer = Paragraph::new(labels.footer_help_text)
        .style(scheme.footer_help)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}
