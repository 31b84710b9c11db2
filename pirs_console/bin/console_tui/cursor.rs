/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

/// Selected row of one triage lane.
///
/// `selected` always indexes a row, or is 0 for an empty lane. Lanes
/// are rebuilt on every shipping read, so the row count is pushed in
/// through [`LaneCursor::resize`] rather than owned here.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LaneCursor {
    selected: usize,
    rows: usize,
}

impl LaneCursor {
    pub(crate) fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub(crate) fn down(&mut self) {
        self.selected = (self.selected + 1).min(self.last_row());
    }

    pub(crate) fn first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn last(&mut self) {
        self.selected = self.last_row();
    }

    /// Keep the selection on the same index when it still exists,
    /// otherwise on the new last row.
    pub(crate) fn resize(&mut self, rows: usize) {
        self.rows = rows;
        self.selected = self.selected.min(self.last_row());
    }

    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    #[cfg(test)]
    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    fn last_row(&self) -> usize {
        self.rows.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_rows(rows: usize) -> LaneCursor {
        let mut cursor = LaneCursor::default();
        cursor.resize(rows);
        cursor
    }

    #[test]
    fn empty_lane_stays_at_zero() {
        let mut cursor = with_rows(0);
        cursor.down();
        cursor.last();
        cursor.up();
        assert_eq!(cursor.selected(), 0);
    }

    #[test]
    fn movement_is_clamped_to_the_lane() {
        let mut cursor = with_rows(3);
        cursor.down();
        cursor.down();
        cursor.down();
        assert_eq!(cursor.selected(), 2);
        cursor.first();
        cursor.up();
        assert_eq!(cursor.selected(), 0);
        cursor.last();
        assert_eq!(cursor.selected(), 2);
    }

    #[test]
    fn shrinking_lane_pulls_selection_back() {
        let mut cursor = with_rows(5);
        cursor.last();
        cursor.resize(2);
        assert_eq!(cursor.selected(), 1);
        cursor.resize(0);
        assert_eq!(cursor.selected(), 0);
        assert_eq!(cursor.rows(), 0);
    }
}
