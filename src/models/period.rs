use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Reporting window and its comparison window. All four bounds are
/// inclusive calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub previous_period_start: NaiveDate,
    pub previous_period_end: NaiveDate,
}

impl ReportPeriod {
    /// Builds a period from explicit bounds, rejecting malformed windows.
    pub fn new(
        period_start: NaiveDate,
        period_end: NaiveDate,
        previous_period_start: NaiveDate,
        previous_period_end: NaiveDate,
        max_period_days: i64,
    ) -> Result<Self> {
        check_window("period", period_start, period_end, max_period_days)?;
        check_window(
            "previous period",
            previous_period_start,
            previous_period_end,
            max_period_days,
        )?;

        if previous_period_end >= period_start {
            return Err(AppError::InvalidPeriod(format!(
                "previous period must end before {} (got {})",
                period_start, previous_period_end
            )));
        }

        Ok(Self {
            period_start,
            period_end,
            previous_period_start,
            previous_period_end,
        })
    }

    /// Builds a period whose comparison window has the same length and ends
    /// the day before `period_start`.
    pub fn with_preceding_window(
        period_start: NaiveDate,
        period_end: NaiveDate,
        max_period_days: i64,
    ) -> Result<Self> {
        check_window("period", period_start, period_end, max_period_days)?;

        let length = (period_end - period_start).num_days();
        let previous_period_end = day_before(period_start)?;
        let previous_period_start = previous_period_end
            .checked_sub_signed(Duration::days(length))
            .ok_or_else(|| out_of_range(period_start))?;

        Self::new(
            period_start,
            period_end,
            previous_period_start,
            previous_period_end,
            max_period_days,
        )
    }

    /// The given calendar month compared against the month before it.
    pub fn for_month(year: i32, month: u32) -> Result<Self> {
        let (start, end) = month_bounds(year, month).ok_or_else(|| {
            AppError::InvalidPeriod(format!("{}-{:02} is not a valid month", year, month))
        })?;
        let previous_end = day_before(start)?;
        let previous_start = NaiveDate::from_ymd_opt(previous_end.year(), previous_end.month(), 1)
            .ok_or_else(|| AppError::InvalidPeriod("previous month is out of range".to_string()))?;

        Ok(Self {
            period_start: start,
            period_end: end,
            previous_period_start: previous_start,
            previous_period_end: previous_end,
        })
    }

    /// The last calendar month that has fully elapsed on `today`.
    pub fn last_complete_month(today: NaiveDate) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
            .ok_or_else(|| out_of_range(today))?;
        let last_month_day = day_before(first)?;
        Self::for_month(last_month_day.year(), last_month_day.month())
    }

    pub fn days_in_period(&self) -> i64 {
        (self.period_end - self.period_start).num_days() + 1
    }

    pub fn days_in_previous_period(&self) -> i64 {
        (self.previous_period_end - self.previous_period_start).num_days() + 1
    }

    /// Half-open `[start, end)` bounds of the current window, for timestamp
    /// comparisons in queries.
    pub fn current_range(&self) -> (NaiveDate, NaiveDate) {
        (self.period_start, day_after(self.period_end))
    }

    /// Half-open `[start, end)` bounds of the comparison window.
    pub fn previous_range(&self) -> (NaiveDate, NaiveDate) {
        (self.previous_period_start, day_after(self.previous_period_end))
    }
}

fn out_of_range(date: NaiveDate) -> AppError {
    AppError::InvalidPeriod(format!("{} is outside the supported date range", date))
}

fn day_before(date: NaiveDate) -> Result<NaiveDate> {
    date.pred_opt().ok_or_else(|| out_of_range(date))
}

/// Exclusive upper bound for `date`, saturating at `NaiveDate::MAX`.
fn day_after(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}

fn check_window(label: &str, start: NaiveDate, end: NaiveDate, max_days: i64) -> Result<()> {
    if start.pred_opt().is_none() {
        return Err(out_of_range(start));
    }
    if end.succ_opt().is_none() {
        return Err(out_of_range(end));
    }
    if end < start {
        return Err(AppError::InvalidPeriod(format!(
            "{} end {} is before its start {}",
            label, end, start
        )));
    }
    let days = (end - start).num_days() + 1;
    if days > max_days {
        return Err(AppError::InvalidPeriod(format!(
            "{} spans {} days (maximum {})",
            label, days, max_days
        )));
    }
    Ok(())
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_for_month_rolls_back_over_year() {
        let period = ReportPeriod::for_month(2026, 1).unwrap();
        assert_eq!(period.period_start, date(2026, 1, 1));
        assert_eq!(period.period_end, date(2026, 1, 31));
        assert_eq!(period.previous_period_start, date(2025, 12, 1));
        assert_eq!(period.previous_period_end, date(2025, 12, 31));
    }

    #[test]
    fn test_for_month_rejects_month_13() {
        assert!(matches!(
            ReportPeriod::for_month(2026, 13),
            Err(AppError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_last_complete_month() {
        let period = ReportPeriod::last_complete_month(date(2026, 10, 18)).unwrap();
        assert_eq!(period.period_start, date(2026, 9, 1));
        assert_eq!(period.period_end, date(2026, 9, 30));
        assert_eq!(period.days_in_period(), 30);
        assert_eq!(period.previous_period_start, date(2026, 8, 1));
        assert_eq!(period.days_in_previous_period(), 31);
    }

    #[test]
    fn test_preceding_window_has_same_length() {
        let period =
            ReportPeriod::with_preceding_window(date(2026, 9, 11), date(2026, 9, 20), 366).unwrap();
        assert_eq!(period.previous_period_end, date(2026, 9, 10));
        assert_eq!(period.previous_period_start, date(2026, 9, 1));
        assert_eq!(period.days_in_period(), period.days_in_previous_period());
    }

    #[test]
    fn test_single_day_period() {
        let period =
            ReportPeriod::with_preceding_window(date(2026, 9, 1), date(2026, 9, 1), 366).unwrap();
        assert_eq!(period.days_in_period(), 1);
        assert_eq!(period.previous_period_start, date(2026, 8, 31));
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let err = ReportPeriod::with_preceding_window(date(2026, 9, 30), date(2026, 9, 1), 366)
            .unwrap_err();
        assert!(err.to_string().contains("before its start"));
    }

    #[test]
    fn test_overlapping_previous_period_is_rejected() {
        let err = ReportPeriod::new(
            date(2026, 9, 1),
            date(2026, 9, 30),
            date(2026, 8, 15),
            date(2026, 9, 1),
            366,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidPeriod(_)));
    }

    #[test]
    fn test_overlong_period_is_rejected() {
        let err = ReportPeriod::with_preceding_window(date(2024, 1, 1), date(2026, 1, 1), 366)
            .unwrap_err();
        assert!(err.to_string().contains("maximum 366"));
    }

    #[test]
    fn test_calendar_edges_are_rejected() {
        let min = NaiveDate::MIN;
        let max = NaiveDate::MAX;

        for result in [
            ReportPeriod::with_preceding_window(min, min, 366),
            ReportPeriod::with_preceding_window(min.succ_opt().unwrap(), min.succ_opt().unwrap(), 366),
            ReportPeriod::with_preceding_window(max, max, 366),
            ReportPeriod::new(date(2026, 9, 1), max, date(2026, 8, 1), date(2026, 8, 31), i64::MAX),
            ReportPeriod::last_complete_month(min),
        ] {
            assert!(matches!(result, Err(AppError::InvalidPeriod(_))), "{:?}", result);
        }
    }

    #[test]
    fn test_window_next_to_max_keeps_exclusive_bound() {
        let end = NaiveDate::MAX.pred_opt().unwrap();
        let period = ReportPeriod::with_preceding_window(end, end, 366).unwrap();
        assert_eq!(period.current_range(), (end, NaiveDate::MAX));
    }

    #[test]
    fn test_ranges_are_half_open() {
        let period = ReportPeriod::for_month(2026, 9).unwrap();
        assert_eq!(period.current_range(), (date(2026, 9, 1), date(2026, 10, 1)));
        assert_eq!(period.previous_range(), (date(2026, 8, 1), date(2026, 9, 1)));
    }

    #[test]
    fn test_serializes_camel_case() {
        let period = ReportPeriod::for_month(2026, 9).unwrap();
        let json = serde_json::to_value(period).unwrap();
        assert_eq!(json["periodStart"], "2026-09-01");
        assert_eq!(json["previousPeriodEnd"], "2026-08-31");
    }
}
