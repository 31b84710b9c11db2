/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Diagnostic logging setup.
//!
//! The terminal belongs to the TUI, so `tracing` output goes to a file.
//! The filter comes from `PIRS_LOG` when set, otherwise from the
//! caller's default directive.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::ConsoleError;
use crate::error::Result;

/// Environment variable holding the `tracing` filter.
pub const LOG_ENV: &str = "PIRS_LOG";

/// Default filter when `PIRS_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "info";

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install a global subscriber appending to `path`.
///
/// Returns false if a global subscriber was already installed, in
/// which case nothing changes.
pub fn init_file_logging(path: &Path, default_directive: &str) -> Result<bool> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ConsoleError::Config(format!("log file {}: {}", path.display(), e)))?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(path = %path.display(), "file logging initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_path_is_a_config_error() {
        let err = init_file_logging(Path::new("/nonexistent-dir/pirs.log"), "info").unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
    }
}
