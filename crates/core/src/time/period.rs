use anyhow::{bail, Context};
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_DAY: i64 = 86_400_000;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Dashboard reporting range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Range {
    Today,
    Week,
    #[default]
    Month,
}

impl Range {
    pub fn as_str(self) -> &'static str {
        match self {
            Range::Today => "today",
            Range::Week => "week",
            Range::Month => "month",
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Range {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(Range::Today),
            "week" => Ok(Range::Week),
            "month" => Ok(Range::Month),
            other => bail!("unknown range {other:?} (expected today, week or month)"),
        }
    }
}

/// The `[start, now)` window a dashboard reports over, with the day counts
/// used for pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow {
    pub range: Range,
    pub start: NaiveDateTime,
    pub now: NaiveDateTime,
    pub total_days: i64,
    pub days_elapsed: i64,
    /// Never negative. Use [`PeriodWindow::pace_divisor`] when dividing.
    pub days_remaining: i64,
}

impl PeriodWindow {
    pub fn resolve(range: Range, now: NaiveDateTime) -> Self {
        let start = start_date(range, now);
        let total_days = total_days(range, now);

        let elapsed_ms = (now - start).num_milliseconds().max(0);
        let days_elapsed = (elapsed_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
        let days_remaining = (total_days - days_elapsed).max(0);

        Self {
            range,
            start,
            now,
            total_days,
            days_elapsed,
            days_remaining,
        }
    }

    /// Half-open `[start, now)`.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant < self.now
    }

    pub fn pace_divisor(&self) -> f64 {
        self.days_remaining.max(1) as f64
    }

    pub fn elapsed_divisor(&self) -> f64 {
        self.days_elapsed.max(1) as f64
    }
}

pub fn start_date(range: Range, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    let day = match range {
        Range::Today => today,
        Range::Week => today - Duration::days(i64::from(today.weekday().num_days_from_monday())),
        Range::Month => today.with_day(1).unwrap_or(today),
    };
    day.and_time(NaiveTime::MIN)
}

pub fn total_days(range: Range, now: NaiveDateTime) -> i64 {
    match range {
        Range::Today => 1,
        Range::Week => 7,
        Range::Month => days_in_month(now.date()),
    }
}

fn days_in_month(date: NaiveDate) -> i64 {
    let first = date.with_day(1).unwrap_or(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days(),
        None => 31,
    }
}

/// Key of the monthly Target rows that apply at `now`, e.g. `"march-2026"`.
pub fn period_key(now: NaiveDateTime) -> String {
    let month = MONTH_NAMES[now.month0() as usize];
    format!("{month}-{:04}", now.year())
}

/// Parses a stored date or timestamp into wall-clock time at `offset`.
///
/// Offset-carrying timestamps are converted; naive timestamps and bare dates
/// are taken as already local. Returns `None` for anything unparseable so the
/// record drops out of every range instead of failing the whole aggregation.
pub fn parse_instant(raw: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&offset).naive_local());
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

pub fn offset_from_minutes(minutes: i32) -> anyhow::Result<FixedOffset> {
    FixedOffset::east_opt(minutes * 60)
        .with_context(|| format!("invalid UTC offset: {minutes} minutes"))
}

/// Evaluation instant for a run: an explicit `--now`/`?now=` value, or the
/// wall clock at `offset`.
pub fn resolve_now(
    now_arg: Option<&str>,
    now_utc: DateTime<Utc>,
    offset: FixedOffset,
) -> anyhow::Result<NaiveDateTime> {
    match now_arg.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_instant(s, offset).with_context(|| format!("invalid evaluation time: {s}")),
        None => Ok(now_utc.with_timezone(&offset).naive_local()),
    }
}
