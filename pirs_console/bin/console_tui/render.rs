/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

pub mod lanes_pane;
pub mod orders_pane;
pub mod side_pane;
pub mod status_bar;
pub mod structure_pane;

use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;

use self::lanes_pane::render_lanes;
use self::side_pane::render_side_pane;
use self::status_bar::render_footer;
use self::status_bar::render_header;
use self::structure_pane::render_structure;
use crate::App;

/// Render a full frame of the console.
///
/// Splits the screen into header/body/footer regions and delegates to
/// the corresponding render helpers.
pub(crate) fn ui(frame: &mut ratatui::Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(2),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_body(frame, chunks[1], app);
    render_footer(frame, chunks[2], &app.theme.scheme, &app.theme.labels);
}

/// Lanes on the left; structure drawing over the side widgets on the
/// right.
pub(crate) fn render_body(frame: &mut ratatui::Frame<'_>, area: ratatui::layout::Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    render_lanes(frame, columns[0], app);
    render_structure(frame, right[0], app);
    render_side_pane(frame, right[1], app);
}
