// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Elapsed-time notifier.
//!
//! A timer runs on its own task but never calls anyone from it: each firing
//! becomes a [`TimerNotice`] sent to the single consumer that owns the
//! dispatch context (the daemon's main loop).

use hz_core::Clock;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One firing of a timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerNotice {
    /// 1 for the first firing
    pub seq: u64,
    /// Elapsed time the timer was asked for, cumulative since start
    pub requested: Duration,
    /// Elapsed time that actually passed since start
    pub actual: Duration,
    /// Wall-clock reading at the firing
    pub clock_ms: u64,
}

impl TimerNotice {
    /// How late this firing was
    pub fn drift(&self) -> Duration {
        self.actual.saturating_sub(self.requested)
    }
}

pub struct Timer {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Timer {
    /// Start a timer firing every `period` (or once, if `repeat` is false).
    ///
    /// Firings are scheduled on a fixed cadence from the start, so a late
    /// firing does not push later ones back. The timer ends by itself when
    /// the receiver is dropped.
    pub fn start<C: Clock>(
        period: Duration,
        repeat: bool,
        clock: C,
        notices: mpsc::Sender<TimerNotice>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut requested = Duration::ZERO;
            let mut seq = 0u64;
            loop {
                requested += period;
                tokio::select! {
                    biased;
                    _ = stop_rx.wait_for(|stopped| *stopped) => break,
                    _ = tokio::time::sleep_until(started + requested) => {}
                }

                seq += 1;
                let notice = TimerNotice {
                    seq,
                    requested,
                    actual: started.elapsed(),
                    clock_ms: clock.epoch_ms(),
                };
                if notices.send(notice).await.is_err() {
                    break;
                }
                if !repeat {
                    break;
                }
            }
            tracing::debug!(fired = seq, "timer finished");
        });
        Self { stop_tx, handle }
    }

    /// Stop future firings; a notice already sent stays in the channel
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
