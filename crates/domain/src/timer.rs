use chrono::{DateTime, Utc};

use crate::Workout;

impl Workout {
    /// Starts the timer. On a running workout this resets the running baseline.
    pub fn start_timer(&mut self, now: DateTime<Utc>) {
        self.start_time = Some(now);
        self.is_paused = false;
    }

    /// Folds the running interval into `elapsed_seconds`. No-op if already paused.
    pub fn pause_timer(&mut self, now: DateTime<Utc>) {
        if let Some(start_time) = self.start_time.take() {
            self.elapsed_seconds += whole_seconds_between(start_time, now);
            self.is_paused = true;
        }
    }

    /// Restarts a paused timer. No-op if the timer is running.
    pub fn resume_timer(&mut self, now: DateTime<Utc>) {
        if self.start_time.is_none() {
            self.start_timer(now);
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    /// Total time spent unpaused. Does not modify the workout.
    #[must_use]
    pub fn elapsed_seconds_at(&self, now: DateTime<Utc>) -> u64 {
        self.elapsed_seconds
            + self
                .start_time
                .map_or(0, |start_time| whole_seconds_between(start_time, now))
    }
}

fn whole_seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from(end.signed_duration_since(start).num_milliseconds() / 1000).unwrap_or(0)
}

/// Countdown between sets, advanced by one second per tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestTimer {
    state: RestState,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum RestState {
    #[default]
    Idle,
    Counting(u32),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestTick {
    Idle,
    Remaining(u32),
    Complete,
}

impl RestTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a countdown, replacing any running one.
    pub fn start(&mut self, seconds: u32) {
        self.state = RestState::Counting(seconds);
    }

    pub fn stop(&mut self) {
        self.state = RestState::Idle;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, RestState::Counting(_))
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == RestState::Complete
    }

    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        match self.state {
            RestState::Counting(remaining) => Some(remaining),
            RestState::Idle | RestState::Complete => None,
        }
    }

    /// Advances the countdown by one second.
    ///
    /// `Complete` is returned exactly once, on the tick that reaches zero. The timer stays
    /// complete until it is started or stopped again.
    pub fn tick(&mut self) -> RestTick {
        match self.state {
            RestState::Idle | RestState::Complete => RestTick::Idle,
            RestState::Counting(remaining) if remaining <= 1 => {
                self.state = RestState::Complete;
                RestTick::Complete
            }
            RestState::Counting(remaining) => {
                self.state = RestState::Counting(remaining - 1);
                RestTick::Remaining(remaining - 1)
            }
        }
    }
}
