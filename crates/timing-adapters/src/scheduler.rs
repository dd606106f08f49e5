//! Tick schedulers.
//!
//! [`TokioTickScheduler`] drives real sessions: one spawned task per running
//! timer, pushing [`Tick`]s into a channel the host drains. Cancelling the
//! handle aborts the task. Ticks already queued may still arrive; the session
//! drops them by generation.
//!
//! [`ManualTickScheduler`] never ticks on its own and only records what was
//! started and cancelled.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use domains::ports::{Tick, TickScheduler, TimerHandle};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

pub struct TokioTickScheduler {
    ticks: mpsc::UnboundedSender<Tick>,
    interval: Duration,
    runtime: Handle,
}

impl TokioTickScheduler {
    /// Returns the scheduler and the receiving end the host loop reads from.
    pub fn new(interval: Duration, runtime: Handle) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (ticks, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            ticks,
            interval: interval.max(Duration::from_millis(1)),
            runtime,
        };
        (scheduler, rx)
    }
}

impl TickScheduler for TokioTickScheduler {
    fn start(&self, generation: u64, offset: Duration) -> TimerHandle {
        let tx = self.ticks.clone();
        let interval = self.interval;
        let task = self.runtime.spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick resolves immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let tick = Tick {
                    generation,
                    elapsed: offset + started.elapsed(),
                };
                if tx.send(tick).is_err() {
                    break;
                }
            }
        });
        trace!(generation, ?offset, "timer started");
        let abort = task.abort_handle();
        TimerHandle::new(generation, move || {
            abort.abort();
            trace!(generation, "timer cancelled");
        })
    }
}

#[derive(Debug, Default)]
struct ManualLog {
    started: Vec<(u64, Duration)>,
    cancelled: Vec<u64>,
}

/// Records timer starts and cancellations; the caller produces ticks itself.
#[derive(Debug, Clone, Default)]
pub struct ManualTickScheduler {
    log: Arc<Mutex<ManualLog>>,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(generation, offset)` passed to `start`, in order.
    pub fn started(&self) -> Vec<(u64, Duration)> {
        self.lock().started.clone()
    }

    pub fn cancelled(&self) -> Vec<u64> {
        self.lock().cancelled.clone()
    }

    /// The most recently started generation that has not been cancelled.
    pub fn live_generation(&self) -> Option<u64> {
        let log = self.lock();
        log.started
            .last()
            .map(|(generation, _)| *generation)
            .filter(|generation| !log.cancelled.contains(generation))
    }

    /// A tick for the live timer at `elapsed`, if one is running.
    pub fn tick_at(&self, elapsed: Duration) -> Option<Tick> {
        self.live_generation().map(|generation| Tick { generation, elapsed })
    }

    fn lock(&self) -> MutexGuard<'_, ManualLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TickScheduler for ManualTickScheduler {
    fn start(&self, generation: u64, offset: Duration) -> TimerHandle {
        self.lock().started.push((generation, offset));
        let log = self.log.clone();
        TimerHandle::new(generation, move || {
            log.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .cancelled
                .push(generation);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_carry_generation_and_offset() {
        let (scheduler, mut rx) = TokioTickScheduler::new(Duration::from_millis(16), Handle::current());
        let _handle = scheduler.start(4, Duration::from_millis(1000));

        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.generation, 4);
        assert!(tick.elapsed >= Duration::from_millis(1016));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_stops_ticking() {
        let (scheduler, mut rx) = TokioTickScheduler::new(Duration::from_millis(16), Handle::current());
        let mut handle = scheduler.start(1, Duration::ZERO);
        rx.recv().await.unwrap();

        handle.cancel();
        tokio::task::yield_now().await;
        while rx.try_recv().is_ok() {}

        let next = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert!(next.is_err(), "no ticks after cancel");
    }

    #[test]
    fn manual_scheduler_tracks_live_generation() {
        let scheduler = ManualTickScheduler::new();
        let mut first = scheduler.start(1, Duration::ZERO);
        assert_eq!(scheduler.live_generation(), Some(1));
        first.cancel();
        assert_eq!(scheduler.live_generation(), None);
        assert_eq!(scheduler.tick_at(Duration::from_millis(5)), None);

        let _second = scheduler.start(2, Duration::from_millis(250));
        assert_eq!(
            scheduler.tick_at(Duration::from_millis(300)),
            Some(Tick { generation: 2, elapsed: Duration::from_millis(300) })
        );
        assert_eq!(scheduler.started(), vec![(1, Duration::ZERO), (2, Duration::from_millis(250))]);
        assert_eq!(scheduler.cancelled(), vec![1]);
    }
}
