use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

//
// ─── EXAM COUNTDOWN ────────────────────────────────────────────────────────────
//

/// Fixed time allowance per question, in seconds.
pub const SECONDS_PER_QUESTION: u32 = 45;

/// Total exam duration for `question_count` questions.
#[must_use]
pub fn exam_duration_secs(question_count: usize) -> u32 {
    u32::try_from(question_count)
        .unwrap_or(u32::MAX)
        .saturating_mul(SECONDS_PER_QUESTION)
}

/// Outcome of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running(u32),
    Expired,
    Idle,
}

/// One-second countdown state.
///
/// `Expired` is reported exactly once; afterwards the countdown is stopped and
/// further ticks are `Idle` until the next `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    running: bool,
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin counting down from `total_secs`, replacing any running countdown.
    pub fn start(&mut self, total_secs: u32) {
        self.stop();
        self.remaining = total_secs;
        self.running = total_secs > 0;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return TickOutcome::Expired;
        }
        TickOutcome::Running(self.remaining)
    }

    /// Idempotent; keeps the remaining time.
    pub fn stop(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Formats seconds as `HH:MM:SS`.
#[must_use]
pub fn format_hms(secs: u32) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_45_seconds_per_question() {
        for n in [1usize, 2, 10, 200] {
            assert_eq!(exam_duration_secs(n), 45 * u32::try_from(n).unwrap());
        }
        assert_eq!(exam_duration_secs(0), 0);
    }

    #[test]
    fn expires_exactly_once() {
        let mut countdown = Countdown::new();
        countdown.start(3);
        assert_eq!(countdown.tick(), TickOutcome::Running(2));
        assert_eq!(countdown.tick(), TickOutcome::Running(1));
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::Idle);
        assert_eq!(countdown.tick(), TickOutcome::Idle);
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn stop_is_idempotent_and_freezes_time() {
        let mut countdown = Countdown::new();
        countdown.start(10);
        countdown.tick();
        countdown.stop();
        countdown.stop();
        assert_eq!(countdown.tick(), TickOutcome::Idle);
        assert_eq!(countdown.remaining(), 9);
    }

    #[test]
    fn restart_replaces_previous_countdown() {
        let mut countdown = Countdown::new();
        countdown.start(2);
        countdown.tick();
        countdown.start(5);
        assert_eq!(countdown.remaining(), 5);
        assert_eq!(countdown.tick(), TickOutcome::Running(4));
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(90), "00:01:30");
        assert_eq!(format_hms(3 * 3600 + 5), "03:00:05");
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(5));
    }
}
