use crate::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub record: UserRecord,
    pub source: RecordSource,
}

impl Reconciliation {
    /// The remote copy is outdated and has to be overwritten with the result.
    #[must_use]
    pub fn requires_push(&self) -> bool {
        self.source == RecordSource::Local
    }
}

/// Chooses between the cached and the remote copy of a user record.
///
/// The whole record with the strictly greater `updated_at` wins, ties go to the remote copy.
/// Changes made on the losing side are discarded. The result is stamped with `now_ms` so
/// that it supersedes both copies.
#[must_use]
pub fn reconcile(local: Option<UserRecord>, remote: UserRecord, now_ms: i64) -> Reconciliation {
    let (mut record, source) = match local {
        Some(local) if local.updated_at > remote.updated_at => (local, RecordSource::Local),
        _ => (remote, RecordSource::Remote),
    };
    record.touch(now_ms);
    Reconciliation { record, source }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::Workout;

    use super::*;

    fn record(name: &str, updated_at: i64) -> UserRecord {
        let mut record = UserRecord::new("hash".to_string());
        let mut workout = Workout::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        workout.name = name.to_string();
        record.workouts.push(workout);
        record.updated_at = updated_at;
        record
    }

    #[rstest]
    #[case(Some(100), 50, RecordSource::Local, "local")]
    #[case(Some(50), 100, RecordSource::Remote, "remote")]
    #[case(Some(100), 100, RecordSource::Remote, "remote")]
    #[case(None, 100, RecordSource::Remote, "remote")]
    fn test_reconcile(
        #[case] local: Option<i64>,
        #[case] remote: i64,
        #[case] source: RecordSource,
        #[case] content: &str,
    ) {
        let result = reconcile(
            local.map(|updated_at| record("local", updated_at)),
            record("remote", remote),
            1_000,
        );
        assert_eq!(result.source, source);
        assert_eq!(result.record.workouts[0].name, content);
        assert_eq!(result.record.updated_at, 1_000);
        assert_eq!(result.requires_push(), source == RecordSource::Local);
    }

    #[test]
    fn test_reconcile_restamp_is_monotonic() {
        let result = reconcile(Some(record("local", 5_000)), record("remote", 10), 1_000);
        assert_eq!(result.record.updated_at, 5_001);
    }

    #[test]
    fn test_reconcile_discards_losing_side() {
        let mut remote = record("remote", 50);
        remote.workouts.push(record("other", 0).workouts.remove(0));
        let result = reconcile(Some(record("local", 100)), remote, 1_000);
        assert_eq!(result.record.workouts.len(), 1);
    }
}
