/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Cancellable background tasks with a single owner.
//!
//! A [`ScheduledTask`] pairs a tokio `JoinHandle` with a shutdown
//! signal. Dropping the handle aborts the task, so a timer can never
//! outlive the component that started it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

/// Receiving side of a task's shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested or the owning handle is
    /// gone.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Owning handle to a spawned background task.
#[derive(Debug)]
pub struct ScheduledTask {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Spawn `body`, handing it the shutdown signal it should observe.
    /// The task runs inside a `scheduled_task` span parented to the
    /// caller's current span.
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(ShutdownSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let span = tracing::info_span!("scheduled_task", task = name);
        let handle = tokio::spawn(body(ShutdownSignal { rx }).instrument(span));
        tracing::debug!(task = name, "scheduled task started");
        Self {
            name,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Run `tick` every `period`, first after one full period, until
    /// cancelled. Ticks that fall behind are skipped, not bunched.
    pub fn every<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let first = tokio::time::Instant::now() + period;
        Self::spawn(name, move |mut signal| async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = signal.cancelled() => break,
                    _ = interval.tick() => tick().await,
                }
            }
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Signal shutdown and abort immediately. Idempotent.
    pub fn cancel(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(task = self.name, "scheduled task cancelled");
        }
    }

    /// Signal shutdown and wait for the task to observe it.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    tracing::error!(task = self.name, "scheduled task panicked");
                }
            }
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn counting_task(period: Duration) -> (ScheduledTask, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let task = ScheduledTask::every("counter", period, move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, count)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (_task, count) = counting_task(Duration::from_secs(2));
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        for expected in 1..=3 {
            tokio::time::advance(Duration::from_secs(2)).await;
            settle().await;
            assert_eq!(count.load(Ordering::SeqCst), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let (mut task, count) = counting_task(Duration::from_secs(2));
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        task.cancel();
        task.cancel();
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticks() {
        let (task, count) = counting_task(Duration::from_secs(2));
        drop(task);
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_is_observed_by_body() {
        let observed = Arc::new(AtomicUsize::new(0));
        let o = Arc::clone(&observed);
        let task = ScheduledTask::spawn("waiter", move |mut signal| async move {
            signal.cancelled().await;
            o.store(1, Ordering::SeqCst);
        });
        task.shutdown().await;
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }
}
