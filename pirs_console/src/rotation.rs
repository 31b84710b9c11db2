/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Circular audit rotation.
//!
//! [`RotationState`] is a pointer over a cyclic sequence of SKUs.
//! [`RotationScheduler`] owns the state behind a `watch` channel and,
//! while running, advances it on a fixed interval from a
//! [`ScheduledTask`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::ConsoleError;
use crate::error::Result;
use crate::task::ScheduledTask;

/// Pointer into a cyclic sequence.
///
/// `current_index < sequence.len()` whenever the sequence is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationState {
    pub sequence: Vec<String>,
    pub current_index: usize,
    pub is_auto_advancing: bool,
}

impl RotationState {
    pub fn new(sequence: Vec<String>) -> Self {
        Self {
            sequence,
            ..Default::default()
        }
    }

    /// Move one step forward, wrapping at the end. Returns false (and
    /// does nothing) when the sequence is empty.
    pub fn advance(&mut self) -> bool {
        if self.sequence.is_empty() {
            return false;
        }
        self.current_index = (self.current_index + 1) % self.sequence.len();
        true
    }

    /// Replace the sequence, keeping the pointer modulo the new length.
    pub fn set_sequence(&mut self, sequence: Vec<String>) {
        self.current_index = match sequence.len() {
            0 => 0,
            len => self.current_index % len,
        };
        self.sequence = sequence;
    }

    pub fn current(&self) -> Option<&str> {
        self.sequence.get(self.current_index).map(String::as_str)
    }

    /// The next `n` entries starting at the pointer, wrapping. Shorter
    /// sequences repeat.
    pub fn upcoming(&self, n: usize) -> Vec<&str> {
        if self.sequence.is_empty() {
            return Vec::new();
        }
        let len = self.sequence.len();
        (0..n)
            .map(|k| self.sequence[(self.current_index + k) % len].as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Owner of a [`RotationState`] and its auto-advance timer.
///
/// The timer only exists while running. Toggling to idle, calling
/// [`RotationScheduler::shutdown`], or dropping the scheduler cancels
/// it.
#[derive(Debug)]
pub struct RotationScheduler {
    state: Arc<watch::Sender<RotationState>>,
    interval: Duration,
    ticker: Option<ScheduledTask>,
}

impl RotationScheduler {
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ConsoleError::Config(
                "rotation interval must be positive".to_string(),
            ));
        }
        let (tx, _) = watch::channel(RotationState::default());
        Ok(Self {
            state: Arc::new(tx),
            interval,
            ticker: None,
        })
    }

    /// Receiver that observes every change, including timer ticks.
    pub fn subscribe(&self) -> watch::Receiver<RotationState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RotationState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn advance(&self) {
        self.state.send_if_modified(RotationState::advance);
    }

    pub fn set_sequence(&self, sequence: Vec<String>) {
        self.state.send_if_modified(|st| {
            if st.sequence == sequence {
                return false;
            }
            st.set_sequence(sequence);
            true
        });
    }

    /// Flip between idle and running. Returns true if now running.
    pub fn toggle(&mut self) -> bool {
        if self.ticker.is_some() {
            self.stop_ticker();
            false
        } else {
            let state = Arc::clone(&self.state);
            self.ticker = Some(ScheduledTask::every(
                "audit_rotation",
                self.interval,
                move || {
                    state.send_if_modified(RotationState::advance);
                    async {}
                },
            ));
            self.state.send_modify(|st| st.is_auto_advancing = true);
            tracing::debug!(interval = ?self.interval, "audit rotation started");
            true
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
            self.state.send_modify(|st| st.is_auto_advancing = false);
            tracing::debug!("audit rotation stopped");
        }
    }

    /// Stop the timer. The scheduler can be restarted with `toggle`.
    pub fn shutdown(&mut self) {
        self.stop_ticker();
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
