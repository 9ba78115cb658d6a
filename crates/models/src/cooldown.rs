use crate::request_type::RequestType;
use chrono::{DateTime, Duration, Utc};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Cooldown state of a single request type at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownStatus {
    /// When the type can be requested again, if it is currently blocked
    pub blocked_until: Option<DateTime<Utc>>,
    /// Time left until the type unblocks, zero when not blocked
    pub remaining: Duration,
}

impl CooldownStatus {
    pub fn ready() -> Self {
        Self {
            blocked_until: None,
            remaining: Duration::zero(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked_until.is_some()
    }
}

/// A submission refused because its request type is still cooling down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownRejection {
    pub request_type: RequestType,
    pub blocked_until: DateTime<Utc>,
    pub remaining: Duration,
}

impl Display for CooldownRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Please wait {} before requesting \"{}\" again",
            format_remaining(self.remaining),
            self.request_type.label()
        )
    }
}

impl std::error::Error for CooldownRejection {}

/// Tracks, for one table, the soonest time each request type may be sent
/// again.
///
/// The tracker holds no clock: every query takes `now`, and callers drive
/// [`CooldownTracker::refresh`] from a once-per-second tick while
/// [`CooldownTracker::is_active`] is true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownTracker {
    blocked_until: BTreeMap<RequestType, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the tracker from the newest request of each type
    ///
    /// # Arguments
    /// * `latest` - pairs of request type and the creation time of a request
    ///   of that type; when a type appears more than once the newest wins
    pub fn from_latest<I>(latest: I) -> Self
    where
        I: IntoIterator<Item = (RequestType, DateTime<Utc>)>,
    {
        let mut tracker = Self::new();
        for (request_type, created_at) in latest {
            tracker.record(request_type, created_at);
        }
        tracker
    }

    /// Starts the cooldown window for a request submitted at `submitted_at`.
    ///
    /// Called optimistically right after a successful submission, without
    /// waiting for the record to come back from the server.
    pub fn record(&mut self, request_type: RequestType, submitted_at: DateTime<Utc>) {
        let until = submitted_at + request_type.cooldown();

        self.blocked_until
            .entry(request_type)
            .and_modify(|current| {
                if until > *current {
                    *current = until;
                }
            })
            .or_insert(until);
    }

    /// Drops every entry whose expiry has passed. Returns whether anything
    /// was cleared.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        let before = self.blocked_until.len();
        self.blocked_until.retain(|_, until| now < *until);
        before != self.blocked_until.len()
    }

    pub fn status(&self, request_type: RequestType, now: DateTime<Utc>) -> CooldownStatus {
        match self.blocked_until.get(&request_type) {
            Some(&until) if now < until => CooldownStatus {
                blocked_until: Some(until),
                remaining: until - now,
            },
            _ => CooldownStatus::ready(),
        }
    }

    /// Status of every request type
    pub fn snapshot(&self, now: DateTime<Utc>) -> BTreeMap<RequestType, CooldownStatus> {
        RequestType::all()
            .into_iter()
            .map(|request_type| (request_type, self.status(request_type, now)))
            .collect()
    }

    /// Refuses a submission while its type is blocked
    pub fn check(
        &self,
        request_type: RequestType,
        now: DateTime<Utc>,
    ) -> Result<(), CooldownRejection> {
        match self.status(request_type, now) {
            CooldownStatus {
                blocked_until: Some(blocked_until),
                remaining,
            } => Err(CooldownRejection {
                request_type,
                blocked_until,
                remaining,
            }),
            _ => Ok(()),
        }
    }

    /// Whether any type is still blocked, i.e. whether the tick must keep
    /// running
    pub fn is_active(&self) -> bool {
        !self.blocked_until.is_empty()
    }
}

/// Formats a countdown as `9m 05s`, or `42s` under a minute
pub fn format_remaining(remaining: Duration) -> String {
    let seconds = remaining.num_seconds().max(0);

    if seconds >= 60 {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 19, minute, second).unwrap()
    }

    #[test]
    fn test_toilet_request_five_minutes_ago_blocks_for_ten() {
        let tracker = CooldownTracker::from_latest([(RequestType::ToiletClean, at(0, 0))]);
        let now = at(5, 0);

        let rejection = tracker.check(RequestType::ToiletClean, now).unwrap_err();
        assert_eq!(rejection.remaining, Duration::minutes(10));
        assert_eq!(rejection.blocked_until, at(15, 0));
        assert_eq!(
            rejection.to_string(),
            "Please wait 10m 00s before requesting \"Toilet Issue\" again"
        );

        // Other types are unaffected
        assert!(tracker.check(RequestType::TableClean, now).is_ok());
    }

    #[test]
    fn test_remaining_strictly_decreases_then_clears() {
        let mut tracker = CooldownTracker::from_latest([(RequestType::RequestSauces, at(0, 0))]);
        let mut previous = Duration::MAX;

        for second in 0..180 {
            let now = at(0, 0) + Duration::seconds(second);
            tracker.refresh(now);
            let status = tracker.status(RequestType::RequestSauces, now);

            assert!(status.is_blocked());
            assert!(status.remaining < previous);
            assert!(status.remaining > Duration::zero());
            previous = status.remaining;
        }

        // The entry clears exactly when the expiry passes
        let expiry = at(3, 0);
        assert!(tracker.refresh(expiry));
        assert!(!tracker.is_active());
        assert_eq!(
            tracker.status(RequestType::RequestSauces, expiry),
            CooldownStatus::ready()
        );
    }

    #[test]
    fn test_refresh_keeps_unexpired_entries() {
        let mut tracker = CooldownTracker::from_latest([
            (RequestType::RequestSauces, at(0, 0)),
            (RequestType::ToiletClean, at(0, 0)),
        ]);

        assert!(tracker.refresh(at(4, 0)));
        assert!(tracker.is_active());
        assert!(tracker.status(RequestType::ToiletClean, at(4, 0)).is_blocked());
        assert!(!tracker.refresh(at(4, 1)));
    }

    #[test]
    fn test_from_latest_uses_newest_request() {
        let tracker = CooldownTracker::from_latest([
            (RequestType::TableClean, at(8, 0)),
            (RequestType::TableClean, at(1, 0)),
        ]);

        let status = tracker.status(RequestType::TableClean, at(9, 0));
        assert_eq!(status.blocked_until, Some(at(18, 0)));
    }

    #[test]
    fn test_record_is_optimistic() {
        let mut tracker = CooldownTracker::new();
        assert!(tracker.check(RequestType::ReadyToOrder, at(0, 0)).is_ok());
        assert!(!tracker.is_active());

        tracker.record(RequestType::ReadyToOrder, at(0, 0));

        assert!(tracker.is_active());
        assert!(tracker.check(RequestType::ReadyToOrder, at(0, 1)).is_err());
        assert!(tracker.check(RequestType::ReadyToOrder, at(10, 0)).is_ok());
    }

    #[test]
    fn test_snapshot_covers_every_type() {
        let tracker = CooldownTracker::from_latest([(RequestType::ReplaceCutlery, at(0, 0))]);
        let snapshot = tracker.snapshot(at(1, 30));

        assert_eq!(snapshot.len(), RequestType::all().len());
        assert_eq!(
            snapshot[&RequestType::ReplaceCutlery].remaining,
            Duration::seconds(210)
        );
        assert!(!snapshot[&RequestType::TableClean].is_blocked());
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::seconds(599)), "9m 59s");
        assert_eq!(format_remaining(Duration::seconds(60)), "1m 00s");
        assert_eq!(format_remaining(Duration::seconds(42)), "42s");
        assert_eq!(format_remaining(Duration::seconds(-3)), "0s");
    }
}
