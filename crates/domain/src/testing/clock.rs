use std::cell::Cell;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::Clock;

/// Clock that only moves when told to. Starts at 2024-03-01 08:00:00 UTC.
pub struct ManualClock(Cell<DateTime<Utc>>);

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self(Cell::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        ))
    }

    pub fn advance_ms(&self, milliseconds: i64) {
        self.0.set(self.0.get() + Duration::milliseconds(milliseconds));
    }

    pub fn advance(&self, seconds: i64) {
        self.advance_ms(seconds * 1000);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}
