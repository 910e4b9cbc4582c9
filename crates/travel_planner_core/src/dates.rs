//! crates/travel_planner_core/src/dates.rs
//!
//! Date arithmetic between the form's start/end dates, the night count and
//! the per-day labels. Dates are ISO `YYYY-MM-DD` strings; anything that does
//! not parse yields `None` instead of an error.

use chrono::{Days, NaiveDate};
use crate::domain::TripInputs;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn tomorrow(today: NaiveDate) -> NaiveDate {
    today.succ_opt().unwrap_or(today)
}

pub fn date_after_days(start: &str, days: u32) -> Option<String> {
    parse_date(start)?
        .checked_add_days(Days::new(u64::from(days)))
        .map(format_date)
}

/// Whole nights between two dates, never less than one.
pub fn nights_between(start: &str, end: &str) -> Option<u32> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    let days = (end - start).num_days().unsigned_abs();
    Some(u32::try_from(days).unwrap_or(u32::MAX).max(1))
}

/// The resolved dates of a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSchedule {
    pub start_date: String,
    pub end_date: String,
    pub nights: u32,
}

impl TripSchedule {
    /// The default form dates: tomorrow, for two nights.
    pub fn default_from(today: NaiveDate) -> Self {
        let start = tomorrow(today);
        let end = start.checked_add_days(Days::new(2)).unwrap_or(start);
        Self {
            start_date: format_date(start),
            end_date: format_date(end),
            nights: 2,
        }
    }

    /// Reconciles a start/end pair the way the form does: a start date on or
    /// after the end date pushes the end date to the following day.
    pub fn reconcile(start: &str, end: Option<&str>, today: NaiveDate) -> Self {
        let Some(start_date) = parse_date(start) else {
            return Self::default_from(today);
        };
        let end_date = end
            .and_then(parse_date)
            .filter(|end| *end > start_date)
            .unwrap_or_else(|| tomorrow(start_date));
        let nights = u32::try_from((end_date - start_date).num_days())
            .unwrap_or(1)
            .max(1);

        Self {
            start_date: format_date(start_date),
            end_date: format_date(end_date),
            nights,
        }
    }

    /// Rebuilds the schedule of a restored history entry.
    ///
    /// The stored night count is used when present; otherwise it is derived
    /// from the restored plan's day count. Nights are then recomputed from the
    /// resulting start/end delta.
    pub fn restored(inputs: &TripInputs, day_count: usize, today: NaiveDate) -> Self {
        let start = inputs
            .start_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or_else(|| tomorrow(today));
        let hint = if inputs.nights > 0 {
            inputs.nights
        } else {
            u32::try_from(day_count.saturating_sub(1)).unwrap_or(1).max(1)
        };
        let end = start
            .checked_add_days(Days::new(u64::from(hint)))
            .unwrap_or(start);
        let start_date = format_date(start);
        let end_date = format_date(end);
        let nights = nights_between(&start_date, &end_date).unwrap_or(hint);

        Self {
            start_date,
            end_date,
            nights,
        }
    }
}

/// The calendar label of a 1-based plan day, e.g. `May 2 (Thu)`.
pub fn day_label(start_date: Option<&str>, day: u32) -> Option<String> {
    let start = parse_date(start_date?)?;
    let date = start.checked_add_days(Days::new(u64::from(day.saturating_sub(1))))?;
    Some(date.format("%b %-d (%a)").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()
    }

    #[test]
    fn nights_between_is_symmetric_and_at_least_one() {
        assert_eq!(nights_between("2024-05-01", "2024-05-03"), Some(2));
        assert_eq!(nights_between("2024-05-03", "2024-05-01"), Some(2));
        assert_eq!(nights_between("2024-05-01", "2024-05-01"), Some(1));
        assert_eq!(nights_between("garbage", "2024-05-01"), None);
    }

    #[test]
    fn reconcile_pushes_end_after_start() {
        let schedule = TripSchedule::reconcile("2024-05-05", Some("2024-05-03"), today());
        assert_eq!(schedule.end_date, "2024-05-06");
        assert_eq!(schedule.nights, 1);

        let schedule = TripSchedule::reconcile("2024-05-01", Some("2024-05-04"), today());
        assert_eq!(schedule.nights, 3);
    }

    #[test]
    fn reconcile_with_bad_start_uses_defaults() {
        let schedule = TripSchedule::reconcile("not a date", None, today());
        assert_eq!(schedule, TripSchedule::default_from(today()));
        assert_eq!(schedule.start_date, "2024-04-21");
        assert_eq!(schedule.end_date, "2024-04-23");
    }

    #[test]
    fn restore_derives_nights_from_day_count_when_absent() {
        let inputs = TripInputs {
            origin: "Tokyo".into(),
            destination: "Kyoto".into(),
            nights: 0,
            start_date: Some("2024-05-01".into()),
            ..Default::default()
        };
        let schedule = TripSchedule::restored(&inputs, 3, today());

        assert_eq!(schedule.end_date, "2024-05-03");
        assert_eq!(schedule.nights, 2);
    }

    #[test]
    fn restore_without_start_date_starts_tomorrow() {
        let inputs = TripInputs {
            nights: 4,
            ..Default::default()
        };
        let schedule = TripSchedule::restored(&inputs, 0, today());

        assert_eq!(schedule.start_date, "2024-04-21");
        assert_eq!(schedule.end_date, "2024-04-25");
        assert_eq!(schedule.nights, 4);
    }

    #[test]
    fn day_labels_are_guarded() {
        assert_eq!(day_label(Some("2024-05-01"), 2).as_deref(), Some("May 2 (Thu)"));
        assert_eq!(day_label(Some("2024-05-01"), 0).as_deref(), Some("May 1 (Wed)"));
        assert_eq!(day_label(Some("05/01/2024"), 1), None);
        assert_eq!(day_label(None, 1), None);
    }

    #[test]
    fn date_after_days_adds_calendar_days() {
        assert_eq!(date_after_days("2024-02-28", 2).as_deref(), Some("2024-03-01"));
        assert_eq!(date_after_days("", 2), None);
    }
}
