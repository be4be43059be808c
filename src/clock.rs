//! Cancelable repeating ticker that drives frame playback.
//!
//! A thin state machine over a spawned tokio interval task: `Stopped` until
//! [`PlaybackClock::start`], `Running` until [`PlaybackClock::stop`]. Tests
//! drive it with tokio's paused virtual clock instead of wall time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Callback invoked once per tick.
pub type TickFn = Arc<dyn Fn() + Send + Sync>;

fn lock_gate(gate: &Mutex<u64>) -> MutexGuard<'_, u64> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Timed, cancelable repeating ticker.
///
/// Invariant: at most one ticker task exists per clock at any time. Starting
/// while already running is a no-op, as is stopping while stopped.
pub struct PlaybackClock {
    interval: Duration,
    task: Option<JoinHandle<()>>,
    callback: Option<TickFn>,
    /// Ticker generation. Each start bumps it and the spawned task only
    /// ticks while holding this lock with its own generation still current;
    /// `stop` bumps it under the same lock, so an in-flight tick finishes
    /// before `stop` returns and none starts afterward. Aborting the task
    /// alone cannot give that guarantee on a multi-threaded runtime: abort
    /// only lands at the next await point, after the current callback has
    /// already run.
    generation: Arc<Mutex<u64>>,
}

impl PlaybackClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: None,
            callback: None,
            generation: Arc::new(Mutex::new(0)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Begin ticking, invoking `tick` once per interval.
    ///
    /// The first tick fires one full interval after start, not immediately.
    /// No-op if already running.
    pub fn start(&mut self, tick: TickFn) {
        if self.task.is_some() {
            return;
        }
        self.callback = Some(tick.clone());
        let my_generation = {
            let mut generation = lock_gate(&self.generation);
            *generation += 1;
            *generation
        };

        let interval = self.interval;
        let gate = self.generation.clone();
        let handle = tokio::spawn(async move {
            let first = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(first, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // No await while the lock is held; the critical section is
                // one callback invocation.
                let current = lock_gate(&gate);
                if *current != my_generation {
                    break;
                }
                tick();
            }
        });
        self.task = Some(handle);
        debug!(interval_ms = interval.as_millis() as u64, "playback clock started");
    }

    /// Cancel the ticker. Bumping the generation waits out any tick already
    /// in flight and invalidates the task, so once this returns no callback
    /// invocation can happen. No-op if already stopped.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            *lock_gate(&self.generation) += 1;
            debug!("playback clock stopped");
        }
    }

    /// Change the tick interval.
    ///
    /// While running, the ticker is restarted on the new cadence so no
    /// partial old-interval wait carries over. While stopped, the new
    /// interval takes effect on the next start.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
        if self.task.is_some() {
            let callback = self.callback.clone();
            self.stop();
            if let Some(cb) = callback {
                self.start(cb);
            }
        }
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_tick(counter: Arc<AtomicUsize>) -> TickFn {
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut clock = PlaybackClock::new(Duration::from_millis(500));
        clock.start(counting_tick(counter.clone()));

        tokio::time::sleep(Duration::from_millis(1250)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_interval_elapses() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut clock = PlaybackClock::new(Duration::from_millis(500));
        clock.start(counting_tick(counter.clone()));

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_a_single_ticker() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut clock = PlaybackClock::new(Duration::from_millis(500));
        clock.start(counting_tick(counter.clone()));
        clock.start(counting_tick(counter.clone()));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_late_ticks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut clock = PlaybackClock::new(Duration::from_millis(500));
        clock.start(counting_tick(counter.clone()));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        clock.stop();
        let at_stop = counter.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(counter.load(Ordering::SeqCst), at_stop);
        assert!(!clock.is_running());
    }

    // Real time on purpose: worker threads let a tick be mid-callback when
    // stop is called, which the paused current-thread runtime cannot do.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_on_multithread_runtime_is_immediate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut clock = PlaybackClock::new(Duration::from_millis(5));
        clock.start(counting_tick(counter.clone()));

        tokio::time::sleep(Duration::from_millis(40)).await;
        clock.stop();
        let at_stop = counter.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), at_stop);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn restart_does_not_revive_the_previous_ticker() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut clock = PlaybackClock::new(Duration::from_millis(5));
        clock.start(counting_tick(counter.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A stale task from before the restart must not tick again, even
        // though the clock as a whole is running.
        clock.stop();
        let at_stop = counter.load(Ordering::SeqCst);
        let idle = Arc::new(AtomicUsize::new(0));
        clock.start(counting_tick(idle.clone()));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), at_stop);
        assert!(idle.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_while_running_restarts_cadence() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut clock = PlaybackClock::new(Duration::from_millis(1000));
        clock.start(counting_tick(counter.clone()));

        tokio::time::sleep(Duration::from_millis(900)).await;
        clock.set_interval(Duration::from_millis(250));
        assert!(clock.is_running());

        // The 900ms already waited on the old cadence is discarded; ticks
        // now land every 250ms from the restart.
        tokio::time::sleep(Duration::from_millis(1050)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_while_stopped_applies_on_next_start() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut clock = PlaybackClock::new(Duration::from_millis(1000));
        clock.set_interval(Duration::from_millis(200));
        assert!(!clock.is_running());

        clock.start(counting_tick(counter.clone()));
        tokio::time::sleep(Duration::from_millis(450)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
