//! Working-day arithmetic. Pure functions over `NaiveDate`, so there is no
//! time-of-day or zone to normalise away.

use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::AppError;

/// Company holidays relevant to a date range.
#[derive(Debug, Clone, Default)]
pub struct HolidaySet {
    dates: HashSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    fn len(&self) -> usize {
        self.dates.len()
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_working_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !is_weekend(date) && !holidays.contains(date)
}

/// Count of Mon–Fri non-holiday days in `[start, end]`, inclusive.
///
/// The result is in full-day units; half-day timing is applied by the
/// caller.
pub fn working_days(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &HolidaySet,
) -> Result<f64, AppError> {
    if end < start {
        return Err(AppError::validation(
            "end date cannot be before start date",
        ));
    }

    let mut count: u32 = 0;
    let mut day = start;
    while day <= end {
        if is_working_day(day, holidays) {
            count += 1;
        }
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }

    tracing::debug!(%start, %end, holidays = holidays.len(), count, "Working days calculated");
    Ok(f64::from(count))
}

/// First and last calendar day of a month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn full_week_has_five_working_days() {
        // Mon 2026-01-05 .. Sun 2026-01-11
        let n = working_days(d(2026, 1, 5), d(2026, 1, 11), &HolidaySet::default()).unwrap();
        assert_eq!(n, 5.0);
    }

    #[test]
    fn holiday_inside_five_weekdays_leaves_four() {
        let holidays = HolidaySet::new([d(2026, 1, 7)]);
        let n = working_days(d(2026, 1, 5), d(2026, 1, 9), &holidays).unwrap();
        assert_eq!(n, 4.0);
    }

    #[test]
    fn single_day_range_is_one_or_zero() {
        let none = HolidaySet::default();
        assert_eq!(working_days(d(2026, 1, 5), d(2026, 1, 5), &none).unwrap(), 1.0);
        // Saturday
        assert_eq!(working_days(d(2026, 1, 10), d(2026, 1, 10), &none).unwrap(), 0.0);
        let holiday = HolidaySet::new([d(2026, 1, 5)]);
        assert_eq!(working_days(d(2026, 1, 5), d(2026, 1, 5), &holiday).unwrap(), 0.0);
    }

    #[test]
    fn weekend_only_range_is_zero() {
        let n = working_days(d(2026, 1, 10), d(2026, 1, 11), &HolidaySet::default()).unwrap();
        assert_eq!(n, 0.0);
    }

    #[test]
    fn holiday_on_weekend_is_not_double_counted() {
        let holidays = HolidaySet::new([d(2026, 1, 10)]);
        let n = working_days(d(2026, 1, 5), d(2026, 1, 11), &holidays).unwrap();
        assert_eq!(n, 5.0);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = working_days(d(2026, 1, 9), d(2026, 1, 5), &HolidaySet::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn month_bounds_handle_lengths_and_december() {
        assert_eq!(month_bounds(2026, 1), Some((d(2026, 1, 1), d(2026, 1, 31))));
        assert_eq!(month_bounds(2028, 2), Some((d(2028, 2, 1), d(2028, 2, 29))));
        assert_eq!(month_bounds(2026, 12), Some((d(2026, 12, 1), d(2026, 12, 31))));
        assert_eq!(month_bounds(2026, 13), None);
        assert_eq!(month_bounds(2026, 0), None);
    }

    fn date_in_2026() -> impl Strategy<Value = NaiveDate> {
        (0u64..365).prop_map(|offset| d(2026, 1, 1) + Days::new(offset))
    }

    proptest! {
        #[test]
        fn count_matches_brute_force_classification(
            start in date_in_2026(),
            len in 0u64..60,
            holiday_offsets in proptest::collection::vec(0u64..60, 0..8),
        ) {
            let end = start + Days::new(len);
            let holidays = HolidaySet::new(holiday_offsets.iter().map(|o| start + Days::new(*o)));
            let expected = start
                .iter_days()
                .take_while(|day| *day <= end)
                .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
                .filter(|day| !holidays.contains(*day))
                .count();
            prop_assert_eq!(working_days(start, end, &holidays).unwrap(), expected as f64);
        }

        #[test]
        fn count_never_exceeds_calendar_days(start in date_in_2026(), len in 0u64..400) {
            let end = start + Days::new(len);
            let n = working_days(start, end, &HolidaySet::default()).unwrap();
            prop_assert!(n <= (len + 1) as f64);
        }
    }
}
