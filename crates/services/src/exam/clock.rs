use std::time::Duration;

use exam_core::time::{Countdown, TickOutcome};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

/// A one-second tick emitted by an `ExamClock` ticker.
///
/// `generation` identifies the countdown that produced the tick; ticks from
/// an earlier `start` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub generation: u64,
}

/// Exam countdown plus the background task that drives it.
///
/// A manual clock never spawns a task; callers feed it `current_tick()`
/// themselves. A clock built `with_ticker` spawns one tokio task per `start`
/// and aborts it on `stop`, restart and drop, so at most one tick source is
/// alive at a time.
pub struct ExamClock {
    countdown: Countdown,
    generation: u64,
    period: Duration,
    ticks: Option<UnboundedSender<ClockTick>>,
    ticker: Option<JoinHandle<()>>,
}

impl ExamClock {
    #[must_use]
    pub fn manual() -> Self {
        Self {
            countdown: Countdown::new(),
            generation: 0,
            period: Duration::from_secs(1),
            ticks: None,
            ticker: None,
        }
    }

    /// Clock that sends a `ClockTick` to `ticks` every second while running.
    #[must_use]
    pub fn with_ticker(ticks: UnboundedSender<ClockTick>) -> Self {
        let mut clock = Self::manual();
        clock.ticks = Some(ticks);
        clock
    }

    /// Begin a new countdown, stopping any previous one first.
    ///
    /// Returns the generation of the new countdown.
    ///
    /// # Panics
    ///
    /// With a ticker attached, panics when called outside a tokio runtime.
    pub fn start(&mut self, total_secs: u32) -> u64 {
        self.stop();
        self.generation += 1;
        self.countdown.start(total_secs);
        if self.countdown.is_running() {
            self.spawn_ticker();
        }
        debug!(generation = self.generation, total_secs, "clock started");
        self.generation
    }

    /// Restart from the remaining time, e.g. after a failed submission.
    pub fn resume(&mut self) -> u64 {
        let remaining = self.countdown.remaining();
        self.start(remaining)
    }

    /// Idempotent; no tick is applied after this returns.
    pub fn stop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            trace!(generation = self.generation, "ticker aborted");
        }
        self.countdown.stop();
    }

    /// Apply a tick. Stale or post-stop ticks are `Idle`.
    pub fn on_tick(&mut self, tick: ClockTick) -> TickOutcome {
        if tick.generation != self.generation {
            return TickOutcome::Idle;
        }
        let outcome = self.countdown.tick();
        if outcome == TickOutcome::Expired {
            self.stop();
        }
        outcome
    }

    /// Tick for the current countdown, for manual driving.
    #[must_use]
    pub fn current_tick(&self) -> ClockTick {
        ClockTick {
            generation: self.generation,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.countdown.is_running()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn spawn_ticker(&mut self) {
        let Some(tx) = self.ticks.clone() else {
            return;
        };
        let tick = self.current_tick();
        let period = self.period;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(tick).is_err() {
                    break;
                }
            }
        }));
    }
}

impl Drop for ExamClock {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn stale_generation_is_ignored() {
        let mut clock = ExamClock::manual();
        clock.start(5);
        let old = clock.current_tick();
        clock.start(5);
        assert_eq!(clock.on_tick(old), TickOutcome::Idle);
        assert_eq!(clock.remaining(), 5);
        assert_eq!(clock.on_tick(clock.current_tick()), TickOutcome::Running(4));
    }

    #[test]
    fn no_tick_applies_after_stop() {
        let mut clock = ExamClock::manual();
        clock.start(3);
        clock.stop();
        clock.stop();
        assert_eq!(clock.on_tick(clock.current_tick()), TickOutcome::Idle);
        assert_eq!(clock.remaining(), 3);
    }

    #[test]
    fn resume_continues_from_remaining() {
        let mut clock = ExamClock::manual();
        clock.start(3);
        clock.on_tick(clock.current_tick());
        clock.stop();
        clock.resume();
        assert!(clock.is_running());
        assert_eq!(clock.remaining(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_leaves_a_single_tick_source() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = ExamClock::with_ticker(tx);
        clock.start(60);
        let latest = clock.start(60);

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let mut received = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            received.push(tick);
        }
        assert_eq!(received.len(), 3);
        assert!(received.iter().all(|t| t.generation == latest));

        clock.stop();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }
}
