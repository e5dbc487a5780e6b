use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// The delivery day a run ingests, pinned to the market's local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDay {
    date: NaiveDate,
    timezone: Tz,
}

impl TargetDay {
    pub fn new(date: NaiveDate, timezone: Tz) -> Self {
        Self { date, timezone }
    }

    /// Resolves the local calendar day following `now`.
    pub fn tomorrow(now: DateTime<Utc>, timezone: Tz) -> Result<Self, TimeWindowError> {
        let today = now.with_timezone(&timezone).date_naive();
        let date = today
            .checked_add_days(Days::new(1))
            .ok_or(TimeWindowError::DateOverflow(today))?;
        Ok(Self { date, timezone })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Local midnight-to-midnight span of the day.
    ///
    /// Both bounds are resolved through the zone rules, so the span is 23 or
    /// 25 hours on daylight-saving transition days.
    pub fn window(&self) -> Result<TimeWindow, TimeWindowError> {
        let next = self
            .date
            .checked_add_days(Days::new(1))
            .ok_or(TimeWindowError::DateOverflow(self.date))?;

        Ok(TimeWindow {
            start: local_midnight(self.date, self.timezone)?,
            end: local_midnight(next, self.timezone)?,
        })
    }

    pub fn contains<Z: TimeZone>(&self, instant: &DateTime<Z>) -> bool {
        instant.with_timezone(&self.timezone).date_naive() == self.date
    }
}

impl fmt::Display for TargetDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.date, self.timezone.name())
    }
}

/// Half-open interval `[start, end)` of zone-aware instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl TimeWindow {
    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }

    pub fn hours(&self) -> i64 {
        self.duration().num_hours()
    }

    pub fn contains<Z: TimeZone>(&self, instant: &DateTime<Z>) -> bool {
        let instant = instant.with_timezone(&Utc);
        instant >= self.start && instant < self.end
    }
}

fn local_midnight(date: NaiveDate, timezone: Tz) -> Result<DateTime<Tz>, TimeWindowError> {
    timezone
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or(TimeWindowError::NonexistentMidnight(date))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeWindowError {
    #[error("Calendar overflow after {0}")]
    DateOverflow(NaiveDate),
    #[error("Local midnight does not exist on {0}")]
    NonexistentMidnight(NaiveDate),
}
