/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Bounded activity log.
//!
//! [`EventLog`] is a fixed-capacity FIFO: appending past capacity
//! evicts the oldest record. [`LogSink`] is the shared handle that the
//! client and controllers write through. It is constructed explicitly
//! and passed to whatever issues requests; there is no global sink.
//!
//! Every record is mirrored to `tracing` under the
//! `pirs_console::activity` target.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use chrono::DateTime;
use chrono::Local;

/// Default number of records retained.
pub const DEFAULT_CAPACITY: usize = 100;

/// Category of an activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    System,
    Info,
    /// An outbound GET.
    Api,
    Post,
    Put,
    Delete,
    Success,
    Error,
    /// A fallback was used because an optional endpoint is missing.
    Degraded,
}

impl EventKind {
    /// Kind recorded for an outbound request with `method`.
    pub fn for_method(method: &reqwest::Method) -> Self {
        if method == reqwest::Method::POST {
            EventKind::Post
        } else if method == reqwest::Method::PUT {
            EventKind::Put
        } else if method == reqwest::Method::DELETE {
            EventKind::Delete
        } else {
            EventKind::Api
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::System => "SYSTEM",
            EventKind::Info => "INFO",
            EventKind::Api => "API",
            EventKind::Post => "POST",
            EventKind::Put => "PUT",
            EventKind::Delete => "DELETE",
            EventKind::Success => "SUCCESS",
            EventKind::Error => "ERROR",
            EventKind::Degraded => "DEGRADED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Monotonic per-log sequence number, starting at 0. Not reset by
    /// `clear()`.
    pub seq: u64,
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
    pub message: String,
}

impl EventRecord {
    /// `HH:MM:SS` wall-clock time.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Fixed-capacity FIFO of [`EventRecord`]s.
#[derive(Debug)]
pub struct EventLog {
    records: VecDeque<EventRecord>,
    capacity: usize,
    next_seq: u64,
}

impl EventLog {
    /// A log holding at most `capacity` records (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    /// Append a record stamped now, evicting the oldest if full.
    pub fn record(&mut self, kind: EventKind, message: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(EventRecord {
            seq,
            timestamp: Local::now(),
            kind,
            message: message.into(),
        });
        seq
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    /// Sequence number of the newest record, if any.
    pub fn last_seq(&self) -> Option<u64> {
        self.records.back().map(|r| r.seq)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Shared, cloneable handle to an [`EventLog`].
///
/// After [`LogSink::close`] every clone silently drops further
/// records; `snapshot()` still returns what was kept.
#[derive(Debug, Clone)]
pub struct LogSink {
    log: Arc<Mutex<EventLog>>,
    closed: Arc<AtomicBool>,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: Arc::new(Mutex::new(EventLog::new(capacity))),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A sink that has already recorded the startup lines.
    pub fn with_banner(capacity: usize, base_url: &str) -> Self {
        let sink = Self::new(capacity);
        sink.record(EventKind::System, "Live terminal ready. Monitoring API calls...");
        sink.record(EventKind::Info, format!("Backend API: {}", base_url));
        sink
    }

    fn lock(&self) -> MutexGuard<'_, EventLog> {
        // A panic while holding the lock cannot leave the deque in a
        // torn state, so poisoning is ignored.
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a record. No-op once the sink is closed.
    pub fn record(&self, kind: EventKind, message: impl Into<String>) {
        if self.is_closed() {
            return;
        }
        let message = message.into();
        match kind {
            EventKind::Error => {
                tracing::warn!(target: "pirs_console::activity", kind = %kind, "{}", message)
            }
            EventKind::Degraded => {
                tracing::info!(target: "pirs_console::activity", kind = %kind, "{}", message)
            }
            _ => tracing::debug!(target: "pirs_console::activity", kind = %kind, "{}", message),
        }
        self.lock().record(kind, message);
    }

    /// Remove every record. No-op once the sink is closed.
    pub fn clear(&self) {
        if self.is_closed() {
            return;
        }
        self.lock().clear();
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Copy of the retained records, oldest first.
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sequence number of the newest record; renderers compare this to
    /// decide whether to re-copy the log.
    pub fn last_seq(&self) -> Option<u64> {
        self.lock().last_seq()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut log = EventLog::new(100);
        for i in 0..250 {
            log.record(EventKind::Info, format!("event {}", i));
        }
        assert_eq!(log.len(), 100);
        let messages: Vec<&str> = log.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages.first(), Some(&"event 150"));
        assert_eq!(messages.last(), Some(&"event 249"));
        let seqs: Vec<u64> = log.iter().map(|r| r.seq).collect();
        assert!(seqs.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut log = EventLog::new(0);
        log.record(EventKind::Info, "a");
        log.record(EventKind::Info, "b");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.iter().next().map(|r| r.message.as_str()), Some("b"));
    }

    #[test]
    fn clear_keeps_sequence_moving() {
        let mut log = EventLog::default();
        log.record(EventKind::Api, "GET /audit/next");
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.record(EventKind::Success, "ok"), 1);
    }

    #[test]
    fn method_kinds() {
        assert_eq!(EventKind::for_method(&reqwest::Method::GET), EventKind::Api);
        assert_eq!(EventKind::for_method(&reqwest::Method::POST), EventKind::Post);
        assert_eq!(EventKind::for_method(&reqwest::Method::PUT), EventKind::Put);
        assert_eq!(
            EventKind::for_method(&reqwest::Method::DELETE),
            EventKind::Delete
        );
        assert_eq!(EventKind::Degraded.to_string(), "DEGRADED");
    }

    #[test]
    fn banner_lines() {
        let sink = LogSink::with_banner(10, "http://127.0.0.1:8000/api");
        let records = sink.snapshot();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, EventKind::System);
        assert_eq!(records[1].message, "Backend API: http://127.0.0.1:8000/api");
        assert_eq!(records[1].time_label().len(), 8);
    }

    #[test]
    fn closed_sink_ignores_records() {
        let sink = LogSink::new(10);
        let clone = sink.clone();
        sink.record(EventKind::Info, "before");
        sink.close();
        clone.record(EventKind::Info, "after");
        clone.clear();
        assert!(clone.is_closed());
        let records = sink.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "before");
    }

    #[traced_test]
    #[test]
    fn records_are_mirrored_to_tracing() {
        let sink = LogSink::new(10);
        sink.record(EventKind::Error, "GET /audit/next failed: 500");
        assert!(logs_contain("GET /audit/next failed: 500"));
    }
}
