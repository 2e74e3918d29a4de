//! # Business Calendar
//!
//! Accumulates durations only inside business windows: selected weekdays,
//! a daily `[open, close)` window in a fixed UTC offset, and a holiday
//! list. Used for policies with `business_hours_only`.
//!
//! The walk goes day by day from the start instant. On each business day
//! it consumes the part of the window at or after the cursor; once the
//! remaining duration fits, the deadline is the point inside that window.
//! A duration that exactly fills a window ends at `close`, not at the next
//! day's `open`.
//!
//! Overnight windows (`close <= open`) are not supported.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
    Weekday,
};
use thiserror::Error;

use workix_core::Timestamp;

/// Consecutive days without a business window after which the walk gives up.
const MAX_IDLE_DAYS: u32 = 400;

/// Errors from calendar construction and arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("business window must open before it closes: open {open}, close {close}")]
    InvalidWindow { open: NaiveTime, close: NaiveTime },

    #[error("business calendar has no workdays")]
    NoWorkdays,

    #[error("UTC offset out of range: {minutes} minutes")]
    InvalidOffset { minutes: i32 },

    /// More than a year of consecutive days without a business window
    /// (every remaining workday is a holiday).
    #[error("no business day found after {from}")]
    NoBusinessDays { from: NaiveDate },

    #[error("deadline arithmetic overflowed")]
    Overflow,
}

/// A weekly business-hours calendar in a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
    /// Indexed by `Weekday::num_days_from_monday`.
    workdays: [bool; 7],
    open: NaiveTime,
    close: NaiveTime,
    holidays: BTreeSet<NaiveDate>,
}

impl BusinessCalendar {
    pub fn new(
        utc_offset_minutes: i32,
        workdays: &[Weekday],
        open: NaiveTime,
        close: NaiveTime,
    ) -> Result<Self, CalendarError> {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(CalendarError::InvalidOffset {
                minutes: utc_offset_minutes,
            })?;
        if open >= close {
            return Err(CalendarError::InvalidWindow { open, close });
        }
        if workdays.is_empty() {
            return Err(CalendarError::NoWorkdays);
        }
        let mut days = [false; 7];
        for day in workdays {
            days[day.num_days_from_monday() as usize] = true;
        }
        Ok(Self {
            offset,
            workdays: days,
            open,
            close,
            holidays: BTreeSet::new(),
        })
    }

    /// Monday to Friday, 09:00 to 17:00 UTC.
    pub fn standard() -> Self {
        Self {
            offset: Utc.fix(),
            workdays: [true, true, true, true, true, false, false],
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            holidays: BTreeSet::new(),
        }
    }

    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(holidays);
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Whether `date` (local) has a business window.
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.workdays[date.weekday().num_days_from_monday() as usize]
            && !self.holidays.contains(&date)
    }

    /// Whether the instant falls inside a business window.
    pub fn is_open_at(&self, at: Timestamp) -> bool {
        let local = self.to_local(at);
        self.is_business_day(local.date()) && local.time() >= self.open && local.time() < self.close
    }

    /// `start` plus `duration` of business time.
    ///
    /// A zero duration returns `start` unchanged, even outside business hours.
    pub fn add_business_duration(
        &self,
        start: Timestamp,
        duration: Duration,
    ) -> Result<Timestamp, CalendarError> {
        let mut remaining = i64::try_from(duration.as_secs()).map_err(|_| CalendarError::Overflow)?;
        if remaining == 0 {
            return Ok(start);
        }

        let mut cursor = self.to_local(start);
        let mut idle_days = 0u32;
        loop {
            let date = cursor.date();
            if self.is_business_day(date) {
                let window_open = date.and_time(self.open);
                let window_close = date.and_time(self.close);
                let from = cursor.max(window_open);
                if from < window_close {
                    let available = (window_close - from).num_seconds();
                    if remaining <= available {
                        let local = from
                            .checked_add_signed(chrono::Duration::seconds(remaining))
                            .ok_or(CalendarError::Overflow)?;
                        return self.to_utc(local);
                    }
                    remaining -= available;
                    idle_days = 0;
                }
            }

            idle_days += 1;
            if idle_days > MAX_IDLE_DAYS {
                return Err(CalendarError::NoBusinessDays { from: date });
            }
            let next = date.succ_opt().ok_or(CalendarError::Overflow)?;
            cursor = next.and_time(NaiveTime::MIN);
        }
    }

    fn to_local(&self, at: Timestamp) -> NaiveDateTime {
        at.as_datetime().with_timezone(&self.offset).naive_local()
    }

    fn to_utc(&self, local: NaiveDateTime) -> Result<Timestamp, CalendarError> {
        let dt: DateTime<FixedOffset> = self
            .offset
            .from_local_datetime(&local)
            .single()
            .ok_or(CalendarError::Overflow)?;
        Ok(Timestamp::from_utc(dt.with_timezone(&Utc)))
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::standard()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2026-03-06 is a Friday.

    #[test]
    fn test_friday_afternoon_rolls_into_monday() {
        let cal = BusinessCalendar::standard();
        let due = cal
            .add_business_duration(ts("2026-03-06T15:00:00Z"), 8 * HOUR)
            .unwrap();
        assert_eq!(due, ts("2026-03-09T15:00:00Z"));
    }

    #[test]
    fn test_filling_monday_window_ends_at_close() {
        let cal = BusinessCalendar::standard();
        let due = cal
            .add_business_duration(ts("2026-03-06T15:00:00Z"), 10 * HOUR)
            .unwrap();
        assert_eq!(due, ts("2026-03-09T17:00:00Z"));
    }

    #[test]
    fn test_exact_window_fill_stays_same_day() {
        let cal = BusinessCalendar::standard();
        let due = cal
            .add_business_duration(ts("2026-03-04T09:00:00Z"), 8 * HOUR)
            .unwrap();
        assert_eq!(due, ts("2026-03-04T17:00:00Z"));
    }

    #[test]
    fn test_start_before_open_waits_for_open() {
        let cal = BusinessCalendar::standard();
        let due = cal
            .add_business_duration(ts("2026-03-04T06:30:00Z"), HOUR)
            .unwrap();
        assert_eq!(due, ts("2026-03-04T10:00:00Z"));
    }

    #[test]
    fn test_start_on_weekend() {
        let cal = BusinessCalendar::standard();
        let due = cal
            .add_business_duration(ts("2026-03-07T11:00:00Z"), 2 * HOUR)
            .unwrap();
        assert_eq!(due, ts("2026-03-09T11:00:00Z"));
    }

    #[test]
    fn test_holiday_is_skipped() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let cal = BusinessCalendar::standard().with_holidays([monday]);
        let due = cal
            .add_business_duration(ts("2026-03-06T15:00:00Z"), 8 * HOUR)
            .unwrap();
        assert_eq!(due, ts("2026-03-10T15:00:00Z"));
    }

    #[test]
    fn test_utc_offset_shifts_window() {
        // 09:00-17:00 at UTC+05:00 is 04:00-12:00 UTC.
        let cal = BusinessCalendar::new(
            300,
            &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            hm(9, 0),
            hm(17, 0),
        )
        .unwrap();
        let due = cal
            .add_business_duration(ts("2026-03-04T03:00:00Z"), 2 * HOUR)
            .unwrap();
        assert_eq!(due, ts("2026-03-04T06:00:00Z"));
        assert!(cal.is_open_at(ts("2026-03-04T11:59:59Z")));
        assert!(!cal.is_open_at(ts("2026-03-04T12:00:00Z")));
    }

    #[test]
    fn test_zero_duration_returns_start() {
        let cal = BusinessCalendar::standard();
        let start = ts("2026-03-07T23:00:00Z");
        assert_eq!(cal.add_business_duration(start, Duration::ZERO).unwrap(), start);
    }

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            BusinessCalendar::new(0, &[Weekday::Mon], hm(17, 0), hm(9, 0)).unwrap_err(),
            CalendarError::InvalidWindow {
                open: hm(17, 0),
                close: hm(9, 0)
            }
        );
        assert_eq!(
            BusinessCalendar::new(0, &[], hm(9, 0), hm(17, 0)).unwrap_err(),
            CalendarError::NoWorkdays
        );
        assert!(matches!(
            BusinessCalendar::new(24 * 60, &[Weekday::Mon], hm(9, 0), hm(17, 0)),
            Err(CalendarError::InvalidOffset { .. })
        ));
    }

    #[test]
    fn test_all_holidays_gives_up() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let holidays = start.iter_days().take(500);
        let cal = BusinessCalendar::standard().with_holidays(holidays);
        assert!(matches!(
            cal.add_business_duration(ts("2026-03-02T10:00:00Z"), HOUR),
            Err(CalendarError::NoBusinessDays { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_business_deadline_is_monotonic(
            start_offset in 0i64..(60 * 24 * 3600),
            a in 0u64..(200 * 3600),
            b in 0u64..(200 * 3600),
        ) {
            let cal = BusinessCalendar::standard();
            let start = Timestamp::from_epoch_secs(ts("2026-01-01T00:00:00Z").epoch_secs() + start_offset).unwrap();
            let (short, long) = if a <= b { (a, b) } else { (b, a) };
            let d1 = cal.add_business_duration(start, Duration::from_secs(short)).unwrap();
            let d2 = cal.add_business_duration(start, Duration::from_secs(long)).unwrap();
            prop_assert!(d1 <= d2);
            prop_assert!(d1 >= start);
        }

        #[test]
        fn prop_business_deadline_never_earlier_than_calendar(
            start_offset in 0i64..(60 * 24 * 3600),
            secs in 0u64..(100 * 3600),
        ) {
            let cal = BusinessCalendar::standard();
            let start = Timestamp::from_epoch_secs(ts("2026-01-01T00:00:00Z").epoch_secs() + start_offset).unwrap();
            let business = cal.add_business_duration(start, Duration::from_secs(secs)).unwrap();
            let wall = start.checked_add(Duration::from_secs(secs)).unwrap();
            prop_assert!(business >= wall);
        }
    }
}
