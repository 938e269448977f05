//! Weekly opening hours and the open/closed decision.
//!
//! A schedule maps day-of-week (1 = Monday .. 7 = Sunday) to an opening
//! window. Days without an entry are closed. A closing time of `00:00`
//! means "until the end of the day".

use std::collections::BTreeMap;

use chrono::{Datelike, FixedOffset, NaiveTime};
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

/// English weekday names indexed by `day - 1`.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Format hint shown whenever staff has to type a schedule.
pub const SCHEDULE_FORMAT: &str =
    "Day of the week (1-7) - Start Time (HH.MM) - End Time (HH.MM)";

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpeningHours {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl OpeningHours {
    pub fn new(opens_at: NaiveTime, closes_at: NaiveTime) -> Self {
        Self { opens_at, closes_at }
    }

    /// Closing time with `00:00` read as `23:59:59` of the same day.
    pub fn effective_close(&self) -> NaiveTime {
        if self.closes_at == NaiveTime::default() {
            NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(self.closes_at)
        } else {
            self.closes_at
        }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.opens_at <= time && time <= self.effective_close()
    }
}

/// Day of week (1..=7) to opening hours.
pub type Schedule = BTreeMap<u8, OpeningHours>;

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Decides whether a schedule is open at a given instant, evaluated in the
/// place's local offset.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityGate {
    offset: FixedOffset,
}

impl AvailabilityGate {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// An empty schedule is always closed.
    pub fn is_open(&self, schedule: &Schedule, at: Timestamp) -> bool {
        let local = at.with_timezone(&self.offset);
        let day = local.weekday().number_from_monday() as u8;
        schedule
            .get(&day)
            .is_some_and(|hours| hours.contains(local.time()))
    }
}

// ---------------------------------------------------------------------------
// Text forms
// ---------------------------------------------------------------------------

/// One line per working day, e.g. `Monday: 09:00 - 18:00`.
pub fn describe(schedule: &Schedule) -> String {
    schedule
        .iter()
        .filter_map(|(day, hours)| {
            let name = WEEKDAY_NAMES.get(usize::from(*day).checked_sub(1)?)?;
            Some(format!(
                "{name}: {} - {}\n",
                hours.opens_at.format("%H:%M"),
                hours.closes_at.format("%H:%M")
            ))
        })
        .collect()
}

/// Notice sent when a client opens a restaurant that is currently closed.
pub fn closed_notice(schedule: &Schedule) -> String {
    format!(
        "Currently restaurant doesn't work.\nWorking hours:\n{}",
        describe(schedule)
    )
}

/// Parse staff input, one day per line: `1 - 09.00 - 18.00`.
///
/// Spaces are ignored, blank lines are skipped, and a later line for the
/// same day replaces an earlier one.
pub fn parse_schedule(input: &str) -> Result<Schedule, CoreError> {
    let mut schedule = Schedule::new();

    for line in input.lines() {
        let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            continue;
        }

        let fields: Vec<&str> = compact.split('-').collect();
        let [day, opens, closes] = fields.as_slice() else {
            return Err(CoreError::Validation(format!(
                "line '{line}' must contain 3 values"
            )));
        };

        let day: u8 = day
            .parse()
            .ok()
            .filter(|d| (1..=7).contains(d))
            .ok_or_else(|| CoreError::Validation(format!("invalid day of the week '{day}'")))?;

        schedule.insert(
            day,
            OpeningHours::new(parse_clock(opens)?, parse_clock(closes)?),
        );
    }

    if schedule.is_empty() {
        return Err(CoreError::Validation("schedule is empty".into()));
    }
    Ok(schedule)
}

/// `HH.MM` or a bare `HH`.
fn parse_clock(value: &str) -> Result<NaiveTime, CoreError> {
    let invalid = || CoreError::Validation(format!("invalid time '{value}'"));

    let mut parts = value.split('.');
    let hour: u32 = parts
        .next()
        .and_then(|h| h.parse().ok())
        .ok_or_else(invalid)?;
    let minute: u32 = match parts.next() {
        Some(m) => m.parse().map_err(|_| invalid())?,
        None => 0,
    };
    if parts.next().is_some() {
        return Err(invalid());
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
