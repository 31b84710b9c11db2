/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use pirs_console::LayoutMode;
use pirs_console::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::canvas::Canvas;
use ratatui::widgets::canvas::Line as CanvasLine;

use crate::App;
use crate::truncate;

/// Widest node label drawn on the canvas.
const LABEL_WIDTH: usize = 10;

/// Render the structure drawing (right top).
///
/// Positions come straight from the layout engine; the canvas is
/// scaled to the layout extent, with y flipped because canvas y grows
/// upwards.
pub(crate) fn render_structure(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let s = &app.theme.scheme;
    let l = &app.theme.labels;
    let title = match app.layout_mode {
        LayoutMode::Heap => format!("{} ({})", l.pane_heap, app.structure.len()),
        LayoutMode::Bst => format!("{} ({})", l.pane_bst, app.structure.len()),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(s.border);

    if app.structure.is_empty() {
        let placeholder = Paragraph::new(l.no_data).style(s.muted).block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let (width, height) = app.structure.extent();
    let flip = |p: Position| (p.x, height - p.y);
    let graph = &app.structure_graph;
    let root = graph.root().map(|n| n.id.clone());

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for (_, from, to) in app.structure.edges_with_positions(graph) {
                let (x1, y1) = flip(from);
                let (x2, y2) = flip(to);
                ctx.draw(&CanvasLine::new(x1, y1, x2, y2, s.edge));
            }
            ctx.layer();
            for placement in app.structure.placements() {
                let label = graph
                    .node(&placement.id)
                    .map(|n| n.display_label())
                    .unwrap_or(placement.id.as_str());
                let color = if root.as_ref() == Some(&placement.id) {
                    s.node_root
                } else {
                    s.node
                };
                let (x, y) = flip(placement.position);
                ctx.print(
                    x,
                    y,
                    Span::styled(truncate(label, LABEL_WIDTH), Style::default().fg(color)),
                );
            }
        });
    frame.render_widget(canvas, area);
}
