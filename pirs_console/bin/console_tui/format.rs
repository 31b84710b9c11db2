/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::time::Duration;

use pirs_console::payload::OrderRecord;
use pirs_console::payload::PriorityItem;

/// Placeholder for a field the service did not report.
pub(crate) const UNKNOWN: &str = "?";

/// Human-readable interval (e.g. "5s", "1500ms").
pub(crate) fn format_interval(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 && ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}

pub(crate) fn format_days(days: Option<f64>) -> String {
    match days {
        Some(d) => format!("{:.1}d", d),
        None => UNKNOWN.to_string(),
    }
}

pub(crate) fn format_count<T: ToString>(n: Option<T>) -> String {
    n.map(|n| n.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// One lane row: id, item, requested/stock, days left, VIP tag.
pub(crate) fn format_order_row(order: &OrderRecord) -> String {
    let item = order
        .item_name
        .as_deref()
        .or(order.sku.as_deref())
        .unwrap_or(UNKNOWN);
    let mut row = format!(
        "{} {} qty {}/{} {}",
        order.order_id,
        truncate(item, 18),
        format_count(order.qty),
        format_count(order.current_stock),
        format_days(order.days_remaining),
    );
    if order.is_vip() {
        row.push_str(" VIP");
    }
    row
}

/// "Name (SKU) 3.0d" for the header, or `None` when there is no
/// priority item.
pub(crate) fn format_priority(item: &PriorityItem) -> Option<String> {
    if item.is_empty() {
        return None;
    }
    let name = item.name.as_deref().unwrap_or(UNKNOWN);
    Some(match &item.sku {
        Some(sku) => format!("{} ({}) {}", name, sku, format_days(item.days_remaining)),
        None => format!("{} {}", name, format_days(item.days_remaining)),
    })
}

/// Cut `s` to at most `width` chars, marking the cut with `…`.
pub(crate) fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_labels() {
        assert_eq!(format_interval(Duration::from_secs(5)), "5s");
        assert_eq!(format_interval(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_interval(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn missing_values_render_as_unknown() {
        assert_eq!(format_days(None), "?");
        assert_eq!(format_count::<i64>(None), "?");
        let row = format_order_row(&OrderRecord {
            order_id: "ORD-7".into(),
            ..Default::default()
        });
        assert_eq!(row, "ORD-7 ? qty ?/? ?");
    }

    #[test]
    fn vip_orders_are_tagged() {
        let row = format_order_row(&OrderRecord {
            order_id: "ORD-1".into(),
            item_name: Some("Widget".into()),
            qty: Some(5),
            current_stock: Some(9),
            days_remaining: Some(3.3),
            tier: Some(2),
            ..Default::default()
        });
        assert_eq!(row, "ORD-1 Widget qty 5/9 3.3d VIP");
    }

    #[test]
    fn truncate_marks_the_cut() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
