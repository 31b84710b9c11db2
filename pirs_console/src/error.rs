/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Error taxonomy for the console engine.
//!
//! Every failure that crosses a module boundary is a [`ConsoleError`].
//! Callers that need to decide *what to do* about a failure (retain a
//! snapshot field, surface a notice, substitute a fallback write) ask
//! for its [`ErrorClass`] rather than matching variants directly.

use crate::snapshot::FieldId;

/// The result type used throughout the engine.
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Errors produced by the console engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConsoleError {
    /// The service could not be reached (transport error, timeout,
    /// connection refused).
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// The `detail` field of the error body, or the canonical
        /// reason phrase when the body carried none.
        detail: String,
    },

    /// The service reported that the endpoint itself does not exist.
    #[error("endpoint unavailable: {endpoint}")]
    Unavailable {
        /// `METHOD /path` of the missing endpoint.
        endpoint: String,
    },

    /// A response body did not match the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Two fetchers claimed the same snapshot field.
    #[error("snapshot field {0} already has an owning fetcher")]
    DuplicateFieldOwner(FieldId),

    /// A fetcher produced an update for a field it does not own.
    #[error("fetcher for {expected} produced an update for {got}")]
    FieldMismatch {
        /// The field the fetcher was registered for.
        expected: FieldId,
        /// The field the produced update targets.
        got: FieldId,
    },

    /// An action was requested with arguments the service would
    /// reject anyway (for example a zero partial-dispatch quantity).
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// How a failure should be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Endpoint unreachable: log, keep previous data, carry on.
    Connectivity,
    /// Write rejected: surface to the initiating action, do not retry.
    Validation,
    /// Optional endpoint missing: substitute a fallback.
    Degraded,
    /// A bug or misconfiguration on the client side.
    Internal,
}

impl ConsoleError {
    /// Classify this error onto the handling taxonomy.
    pub fn class(&self) -> ErrorClass {
        match self {
            ConsoleError::Connectivity(_) => ErrorClass::Connectivity,
            // 5xx means the service is up but failing; treat it like an
            // outage for read purposes.
            ConsoleError::Status { status, .. } if *status >= 500 => ErrorClass::Connectivity,
            ConsoleError::Status { .. } => ErrorClass::Validation,
            ConsoleError::Unavailable { .. } => ErrorClass::Degraded,
            ConsoleError::Decode(_) | ConsoleError::Invalid(_) => ErrorClass::Validation,
            ConsoleError::DuplicateFieldOwner(_)
            | ConsoleError::FieldMismatch { .. }
            | ConsoleError::Config(_) => ErrorClass::Internal,
        }
    }

    /// Returns true if the service said the endpoint does not exist.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ConsoleError::Unavailable { .. })
    }

    /// Short text for the activity log: the status code when there is
    /// one, otherwise the underlying message.
    pub fn log_summary(&self) -> String {
        match self {
            ConsoleError::Status { status, detail } => format!("{} {}", status, detail),
            ConsoleError::Unavailable { endpoint } => format!("{} not available", endpoint),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConsoleError::Decode(err.to_string())
        } else {
            ConsoleError::Connectivity(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Decode(err.to_string())
    }
}
