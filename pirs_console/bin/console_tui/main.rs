/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Terminal console for the PIRS inventory service.
//!
//! A thin ratatui renderer over the `pirs_console` engine. The left
//! pane shows the shipping queue split into express / shortage /
//! standard lanes plus the waiting list and order history; the right
//! pane draws the shipping heap or the inventory BST, the audit
//! rotation, stability with the pick list, and the activity log.
//!
//! Invariants:
//! - **Engine owns I/O**: `App` only holds copies of published state;
//!   every request goes through `Engine`, whose client records it in
//!   the activity log.
//! - **Optimistic, then authoritative**: an action hides (or parks)
//!   its order at once; the next shipping read replaces that view.
//! - **Teardown is total**: on exit the synchronizer and the rotation
//!   timer are cancelled and the log sink is closed before the
//!   terminal is restored.
//!
//! ```bash
//! # Terminal 1: the inventory service on :8000
//! # Terminal 2:
//! cargo run --bin pirs-console -- --addr 127.0.0.1:8000
//! ```

mod actions;
mod app;
mod cursor;
mod format;
mod render;
mod theme;

use std::io;
use std::io::IsTerminal;
use std::time::Duration;

pub(crate) use actions::*;
use anyhow::Context;
pub(crate) use app::*;
use clap::Parser;
use crossterm::ExecutableCommand;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
pub(crate) use cursor::*;
pub(crate) use format::*;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use pirs_console::LogSink;
use pirs_console::telemetry::DEFAULT_DIRECTIVE;
use pirs_console::telemetry::init_file_logging;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
pub(crate) use theme::*;

// Terminal setup / teardown

/// Put the terminal into "TUI mode".
///
/// Enables raw mode, switches to the alternate screen, and clears it,
/// returning a `ratatui::Terminal` backed by crossterm.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Restore the terminal back to normal shell mode.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// Main loop

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    if let Some(path) = &config.log_file {
        init_file_logging(path, DEFAULT_DIRECTIVE).context("failed to set up logging")?;
    }

    if !io::stdout().is_terminal() {
        eprintln!("This console requires a real terminal.");
        return Ok(());
    }

    let log = LogSink::with_banner(config.event_log_capacity, &config.base_url);
    let mut engine = Engine::start(&config, log).context("failed to start console engine")?;
    let mut app = App::new(&config);

    // Spinner on stderr until the first polling cycle lands (or the
    // request timeout passes), before the alternate screen takes over.
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    spinner.set_message(format!(
        "{} - Connecting to {} ...",
        app.theme.labels.app_name, app.base_url
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let mut snapshots = engine.sync.subscribe();
    if tokio::time::timeout(config.request_timeout, snapshots.changed())
        .await
        .is_err()
    {
        tracing::warn!("first polling cycle did not finish before the timeout");
    }
    app.apply_snapshot(snapshots.borrow_and_update().clone());
    spinner.finish_and_clear();

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, app, &mut engine).await;
    engine.shutdown();
    restore_terminal(&mut terminal)?;
    result?;
    Ok(())
}

#[cfg(test)]
mod tests;
