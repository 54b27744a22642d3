use chrono::{DateTime, Utc};

/// Source of wall clock time.
///
/// Everything that depends on the current time reads it through this trait, so that a
/// manual clock can be injected for testing.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (*self).now()
    }
}

impl<C: Clock> Clock for std::rc::Rc<C> {
    fn now(&self) -> DateTime<Utc> {
        self.as_ref().now()
    }
}

/// Renders a number of seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours.
#[must_use]
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::testing::ManualClock;

    use super::*;

    #[rstest]
    #[case(0, "00:00")]
    #[case(9, "00:09")]
    #[case(61, "01:01")]
    #[case(3600, "60:00")]
    #[case(6005, "100:05")]
    fn test_format_clock(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(format_clock(seconds), expected);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        let start = clock.now_ms();
        clock.advance(2);
        clock.advance_ms(500);
        assert_eq!(clock.now_ms() - start, 2500);
        assert_eq!((&clock).now_ms() - start, 2500);
    }
}
