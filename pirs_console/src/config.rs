/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Console configuration.
//!
//! [`ConsoleConfig`] is what the engine consumes. The binary builds it
//! from command-line flags (with `PIRS_CONSOLE_*` environment
//! fallbacks); it can also be deserialized from JSON, with every field
//! optional. Durations are written as milliseconds.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::client::DEFAULT_BASE_URL;
use crate::error::ConsoleError;
use crate::error::Result;
use crate::event_log::DEFAULT_CAPACITY;
use crate::payload::Subtree;
use crate::triage::DegradedWritePolicy;

/// Default polling period of the synchronizer.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Default audit rotation period.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(2);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Path prefix appended to a bare `host:port` address.
const API_PREFIX: &str = "/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Service root, including the `/api` prefix.
    pub base_url: String,
    #[serde(with = "duration_ms", rename = "refresh_interval_ms")]
    pub refresh_interval: Duration,
    #[serde(with = "duration_ms", rename = "rotation_interval_ms")]
    pub rotation_interval: Duration,
    pub event_log_capacity: usize,
    #[serde(with = "duration_ms", rename = "request_timeout_ms")]
    pub request_timeout: Duration,
    /// Diagnostic log file. `None` disables file logging.
    pub log_file: Option<PathBuf>,
    /// Initial BST subtree filter.
    pub subtree: Subtree,
    pub degraded_writes: DegradedWritePolicy,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            event_log_capacity: DEFAULT_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            log_file: None,
            subtree: Subtree::default(),
            degraded_writes: DegradedWritePolicy::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConsoleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            return Err(ConsoleError::Config(
                "refresh interval must be positive".to_string(),
            ));
        }
        if self.rotation_interval.is_zero() {
            return Err(ConsoleError::Config(
                "rotation interval must be positive".to_string(),
            ));
        }
        if self.event_log_capacity == 0 {
            return Err(ConsoleError::Config(
                "event log capacity must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConsoleError::Config(
                "request timeout must be positive".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConsoleError::Config(format!(
                "base url must be http(s): {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Normalize a service address into a base URL.
///
/// `host:port` becomes `http://host:port/api`. An address with a scheme
/// keeps it; a path, if given, is kept as is. Trailing slashes are
/// dropped.
pub fn parse_addr(addr: &str) -> Result<String> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(ConsoleError::Config("empty service address".to_string()));
    }
    let (scheme, rest) = match addr.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", addr),
    };
    let rest = rest.trim_end_matches('/');
    if scheme != "http" && scheme != "https" {
        return Err(ConsoleError::Config(format!(
            "unsupported scheme: {}",
            scheme
        )));
    }
    if rest.is_empty() {
        return Err(ConsoleError::Config(format!("missing host: {}", addr)));
    }
    if rest.contains('/') {
        Ok(format!("{}://{}", scheme, rest))
    } else {
        Ok(format!("{}://{}{}", scheme, rest, API_PREFIX))
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ConsoleConfig::default();
        config.validate().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert_eq!(config.rotation_interval, Duration::from_secs(2));
        assert_eq!(config.event_log_capacity, 100);
    }

    #[test]
    fn zero_values_are_rejected() {
        let mut config = ConsoleConfig {
            refresh_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.refresh_interval = Duration::from_secs(1);
        config.rotation_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.rotation_interval = Duration::from_secs(1);
        config.event_log_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_fields_are_optional() {
        let config = ConsoleConfig::from_json(
            r#"{"refresh_interval_ms": 1500, "degraded_writes": "surface", "subtree": "left"}"#,
        )
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_millis(1500));
        assert_eq!(config.degraded_writes, DegradedWritePolicy::Surface);
        assert_eq!(config.subtree, Subtree::Left);
        assert_eq!(config.rotation_interval, DEFAULT_ROTATION_INTERVAL);

        assert!(ConsoleConfig::from_json(r#"{"event_log_capacity": 0}"#).is_err());
    }

    #[test]
    fn parse_addr_forms() {
        assert_eq!(
            parse_addr("127.0.0.1:8000").unwrap(),
            "http://127.0.0.1:8000/api"
        );
        assert_eq!(
            parse_addr("https://pirs.example:443/").unwrap(),
            "https://pirs.example:443/api"
        );
        assert_eq!(
            parse_addr("http://localhost:9000/v2/api").unwrap(),
            "http://localhost:9000/v2/api"
        );
        assert!(parse_addr("").is_err());
        assert!(parse_addr("ftp://host").is_err());
        assert!(parse_addr("http://").is_err());
    }
}
