/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pirs_console::ConsoleConfig;
use pirs_console::EventKind;
use pirs_console::Lane;
use pirs_console::config::parse_addr;
use pirs_console::payload::StabilityBand;
use pirs_console::payload::Subtree;
use pirs_console::snapshot::Connectivity;
use pirs_console::triage::DegradedWritePolicy;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;

/// Command-line arguments for the console.
#[derive(Debug, Parser)]
#[command(
    name = "pirs-console",
    about = "Operator console for the PIRS inventory service"
)]
pub(crate) struct Args {
    /// Service address (e.g., 127.0.0.1:8000 or http://host:8000/api)
    #[arg(long, short, env = "PIRS_CONSOLE_ADDR", default_value = "127.0.0.1:8000")]
    pub(crate) addr: String,

    /// Polling interval in milliseconds
    #[arg(long, env = "PIRS_CONSOLE_REFRESH_MS", default_value_t = 5000)]
    pub(crate) refresh_ms: u64,

    /// Audit rotation interval in milliseconds
    #[arg(long, env = "PIRS_CONSOLE_ROTATION_MS", default_value_t = 2000)]
    pub(crate) rotation_ms: u64,

    /// Number of activity records kept
    #[arg(long, env = "PIRS_CONSOLE_LOG_CAPACITY", default_value_t = 100)]
    pub(crate) log_capacity: usize,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "PIRS_CONSOLE_TIMEOUT_MS", default_value_t = 10000)]
    pub(crate) timeout_ms: u64,

    /// Write diagnostic logs to this file
    #[arg(long, env = "PIRS_CONSOLE_LOG_FILE")]
    pub(crate) log_file: Option<PathBuf>,

    /// Initial BST subtree filter (all, left, root, right)
    #[arg(long, env = "PIRS_CONSOLE_SUBTREE", default_value = "all")]
    pub(crate) subtree: Subtree,

    /// Behavior when an optional write endpoint is missing (substitute, surface)
    #[arg(long, env = "PIRS_CONSOLE_DEGRADED_WRITES", default_value = "substitute")]
    pub(crate) degraded_writes: DegradedWritePolicy,
}

impl Args {
    pub(crate) fn into_config(self) -> anyhow::Result<ConsoleConfig> {
        let base_url = parse_addr(&self.addr).context("invalid --addr")?;
        let config = ConsoleConfig {
            base_url,
            refresh_interval: Duration::from_millis(self.refresh_ms),
            rotation_interval: Duration::from_millis(self.rotation_ms),
            event_log_capacity: self.log_capacity,
            request_timeout: Duration::from_millis(self.timeout_ms),
            log_file: self.log_file,
            subtree: self.subtree,
            degraded_writes: self.degraded_writes,
        };
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// All user-visible text in the console.
pub(crate) struct Labels {
    pub(crate) app_name: &'static str,

    pub(crate) separator: &'static str,
    pub(crate) selection_caret: &'static str,
    pub(crate) refresh_icon: &'static str,
    pub(crate) no_data: &'static str,
    pub(crate) empty_lane: &'static str,

    // Header
    pub(crate) skus: &'static str,
    pub(crate) critical: &'static str,
    pub(crate) top_priority: &'static str,
    pub(crate) in_flight: &'static str,

    // Pane titles
    pub(crate) pane_express: &'static str,
    pub(crate) pane_shortage: &'static str,
    pub(crate) pane_standard: &'static str,
    pub(crate) pane_waiting: &'static str,
    pub(crate) pane_history: &'static str,
    pub(crate) pane_picks: &'static str,
    pub(crate) pane_heap: &'static str,
    pub(crate) pane_bst: &'static str,
    pub(crate) pane_rotation: &'static str,
    pub(crate) pane_stability: &'static str,
    pub(crate) pane_gate: &'static str,
    pub(crate) pane_activity: &'static str,

    pub(crate) rotation_on: &'static str,
    pub(crate) rotation_off: &'static str,
    pub(crate) not_persisted: &'static str,

    pub(crate) footer_help_text: &'static str,
}

impl Labels {
    pub(crate) fn en() -> Self {
        Self {
            app_name: "pirs-console",
            separator: " • ",
            selection_caret: "▸ ",
            refresh_icon: "⟳ ",
            no_data: "Waiting for data",
            empty_lane: "(empty)",
            skus: "SKUs: ",
            critical: "critical: ",
            top_priority: "top: ",
            in_flight: "in flight: ",
            pane_express: "Express",
            pane_shortage: "Shortage",
            pane_standard: "Standard",
            pane_waiting: "Waiting",
            pane_history: "Order History",
            pane_picks: "Pick List",
            pane_heap: "Shipping Heap",
            pane_bst: "Inventory BST",
            pane_rotation: "Audit Rotation",
            pane_stability: "Stability",
            pane_gate: "Blocked Lots",
            pane_activity: "Activity",
            rotation_on: "auto",
            rotation_off: "manual",
            not_persisted: " (local)",
            footer_help_text: "q: quit | j/k: move | h/l/Tab: lane | d: dispatch | p: partial | b: wait | +/-: stock | f: heap/bst | n: subtree | t/a: rotation | r: refresh | x: clear log | Esc: dismiss",
        }
    }
}

/// Color scheme for the console (Nord palette).
pub(crate) struct ColorScheme {
    pub(crate) app_name: Style,
    pub(crate) border: Style,
    pub(crate) border_focused: Style,
    pub(crate) footer_help: Style,

    pub(crate) error: Style,
    pub(crate) warning: Style,
    pub(crate) success: Style,
    pub(crate) info: Style,
    pub(crate) muted: Style,

    pub(crate) stat_timing: Style,
    pub(crate) stat_url: Style,
    pub(crate) stat_label: Style,
    pub(crate) stat_value: Style,
    pub(crate) stat_selection: Style,

    pub(crate) lane_express: Style,
    pub(crate) lane_shortage: Style,
    pub(crate) lane_standard: Style,

    pub(crate) node: Color,
    pub(crate) node_root: Color,
    pub(crate) edge: Color,
}

impl ColorScheme {
    /// Nord color scheme (https://www.nordtheme.com/).
    pub(crate) fn nord() -> Self {
        let polar3 = Color::Rgb(76, 86, 106); // #4C566A
        let snow0 = Color::Rgb(216, 222, 233); // #D8DEE9
        let snow2 = Color::Rgb(236, 239, 244); // #ECEFF4
        let frost_teal = Color::Rgb(143, 188, 187); // #8FBCBB
        let frost_cyan = Color::Rgb(136, 192, 208); // #88C0D0
        let frost_blue = Color::Rgb(129, 161, 193); // #81A1C1
        let aurora_red = Color::Rgb(191, 97, 106); // #BF616A
        let aurora_orange = Color::Rgb(208, 135, 112); // #D08770
        let aurora_yellow = Color::Rgb(235, 203, 139); // #EBCB8B
        let aurora_green = Color::Rgb(163, 190, 140); // #A3BE8C
        let aurora_purple = Color::Rgb(180, 142, 173); // #B48EAD

        Self {
            app_name: Style::default().fg(frost_cyan).add_modifier(Modifier::BOLD),
            border: Style::default().fg(polar3),
            border_focused: Style::default().fg(frost_cyan),
            footer_help: Style::default().fg(polar3),

            error: Style::default().fg(aurora_red),
            warning: Style::default().fg(aurora_orange),
            success: Style::default().fg(aurora_green),
            info: Style::default().fg(frost_cyan),
            muted: Style::default().fg(polar3),

            stat_timing: Style::default().fg(aurora_yellow),
            stat_url: Style::default().fg(polar3),
            stat_label: Style::default().fg(snow0),
            stat_value: Style::default().fg(snow2).add_modifier(Modifier::BOLD),
            stat_selection: Style::default().fg(aurora_purple),

            lane_express: Style::default().fg(aurora_red),
            lane_shortage: Style::default().fg(aurora_orange),
            lane_standard: Style::default().fg(aurora_green),

            node: frost_blue,
            node_root: frost_teal,
            edge: polar3,
        }
    }

    pub(crate) fn lane_style(&self, lane: Lane) -> Style {
        match lane {
            Lane::Express => self.lane_express,
            Lane::Shortage => self.lane_shortage,
            Lane::Standard => self.lane_standard,
        }
    }

    pub(crate) fn event_style(&self, kind: EventKind) -> Style {
        match kind {
            EventKind::System | EventKind::Info => self.info,
            EventKind::Api => self.stat_label,
            EventKind::Post | EventKind::Put | EventKind::Delete => self.stat_timing,
            EventKind::Success => self.success,
            EventKind::Error => self.error,
            EventKind::Degraded => self.warning,
        }
    }

    pub(crate) fn band_style(&self, band: StabilityBand) -> Style {
        match band {
            StabilityBand::Critical => self.error,
            StabilityBand::Warning => self.warning,
            StabilityBand::Stable => self.success,
            StabilityBand::Unknown => self.muted,
        }
    }

    pub(crate) fn connectivity_style(&self, connectivity: Connectivity) -> Style {
        match connectivity {
            Connectivity::Connected => self.success,
            Connectivity::Degraded => self.warning,
            Connectivity::Disconnected => self.error,
        }
    }
}

/// Colors + text.
pub(crate) struct Theme {
    pub(crate) scheme: ColorScheme,
    pub(crate) labels: Labels,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            scheme: ColorScheme::nord(),
            labels: Labels::en(),
        }
    }
}
