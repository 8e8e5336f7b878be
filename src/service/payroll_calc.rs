//! Month-end settlement: unpaid absence clipped to the payroll month, and
//! the deduction it produces.

use chrono::NaiveDate;

use crate::error::AppError;
use crate::model::leave::Leave;
use crate::service::calendar::{self, HolidaySet};

/// Inclusive calendar bounds of a payroll month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayPeriod {
    pub month: u32,
    pub year: i32,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl PayPeriod {
    pub fn new(month: u32, year: i32) -> Result<Self, AppError> {
        if !(1..=12).contains(&month) {
            return Err(AppError::validation("month must be between 1 and 12"));
        }
        let (first_day, last_day) = calendar::month_bounds(year, month)
            .ok_or_else(|| AppError::validation(format!("year {year} is out of range")))?;
        Ok(Self {
            month,
            year,
            first_day,
            last_day,
        })
    }

    /// Intersection of `[start, end]` with this month, if any.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let overlap_start = start.max(self.first_day);
        let overlap_end = end.min(self.last_day);
        (overlap_start <= overlap_end).then_some((overlap_start, overlap_end))
    }

    /// A period is in the future when it starts after the month containing `today`.
    pub fn is_after(&self, today: NaiveDate) -> bool {
        use chrono::Datelike;
        (self.year, self.month) > (today.year(), today.month())
    }
}

/// Unpaid absence inside `period`, recounted from each leave's clipped
/// window rather than its stored `days`, since one leave may straddle two
/// payroll months. Callers pass only APPROVED leave of unpaid types.
pub fn absent_days(
    leaves: &[Leave],
    period: &PayPeriod,
    holidays: &HolidaySet,
) -> Result<f64, AppError> {
    let mut total = 0.0;
    for leave in leaves {
        let Some((start, end)) = period.clip(leave.start_date, leave.end_date) else {
            continue;
        };
        let days = calendar::working_days(start, end, holidays)? * leave.timing().day_factor();
        tracing::debug!(
            leave_id = leave.id,
            %start,
            %end,
            days,
            "Unpaid leave counted for payroll"
        );
        total += days;
    }
    Ok(total)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub deduction: f64,
    pub net: f64,
}

/// `basic / working_days_per_month * absent_days`, capped at the basic
/// salary and rounded to cents.
pub fn settle(basic_salary: f64, working_days_per_month: i32, absent_days: f64) -> Settlement {
    let per_day = if working_days_per_month > 0 {
        basic_salary / f64::from(working_days_per_month)
    } else {
        0.0
    };
    let deduction = round_cents((per_day * absent_days).min(basic_salary).max(0.0));
    Settlement {
        deduction,
        net: round_cents(basic_salary - deduction),
    }
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave::{LeaveStatus, LeaveTiming};
    use chrono::{TimeZone, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn leave(id: u64, start: NaiveDate, end: NaiveDate, timing: LeaveTiming) -> Leave {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Leave {
            id,
            employee_id: 7,
            leave_type_id: 3,
            leave_timing_id: timing.id(),
            start_date: start,
            end_date: end,
            days: 99.0,
            reason: "unpaid personal leave".into(),
            status: LeaveStatus::Approved,
            applied_by: 7,
            approved_by: Some(1),
            created_at: at,
            updated_at: at,
        }
    }

    fn absent_in(leaves: &[Leave], month: u32, year: i32, holidays: &HolidaySet) -> f64 {
        absent_days(leaves, &PayPeriod::new(month, year).unwrap(), holidays).unwrap()
    }

    #[test]
    fn leave_straddling_months_is_split_by_clipping() {
        // Fri 2027-01-29 .. Tue 2027-02-02
        let l = leave(1, d(2027, 1, 29), d(2027, 2, 2), LeaveTiming::FullDay);
        let none = HolidaySet::default();
        let jan = absent_in(std::slice::from_ref(&l), 1, 2027, &none);
        let feb = absent_in(std::slice::from_ref(&l), 2, 2027, &none);
        // January: Fri 29 (30/31 are a weekend). February: Mon 1, Tue 2.
        assert_eq!(jan, 1.0);
        assert_eq!(feb, 2.0);
    }

    #[test]
    fn jan_30_to_feb_2_counts_each_side_in_its_own_month() {
        // 2026-01-30 is a Friday, 2026-01-31 a Saturday, 2026-02-02 a Monday.
        let l = leave(1, d(2026, 1, 30), d(2026, 2, 2), LeaveTiming::FullDay);
        let none = HolidaySet::default();
        let jan = absent_in(std::slice::from_ref(&l), 1, 2026, &none);
        let feb = absent_in(std::slice::from_ref(&l), 2, 2026, &none);
        assert_eq!(jan, 1.0);
        assert_eq!(feb, 1.0);
    }

    #[test]
    fn stored_days_are_ignored_in_favour_of_recount() {
        let l = leave(1, d(2026, 3, 2), d(2026, 3, 6), LeaveTiming::FullDay);
        let holidays = HolidaySet::new([d(2026, 3, 4)]);
        let n = absent_days(&[l], &PayPeriod::new(3, 2026).unwrap(), &holidays).unwrap();
        assert_eq!(n, 4.0);
    }

    #[test]
    fn leaves_outside_the_month_contribute_nothing() {
        let l = leave(1, d(2026, 4, 6), d(2026, 4, 7), LeaveTiming::FullDay);
        let n = absent_in(&[l], 3, 2026, &HolidaySet::default());
        assert_eq!(n, 0.0);
    }

    #[test]
    fn multiple_leaves_sum_and_half_days_count_half() {
        let leaves = [
            leave(1, d(2026, 3, 2), d(2026, 3, 3), LeaveTiming::FullDay),
            leave(2, d(2026, 3, 10), d(2026, 3, 10), LeaveTiming::FirstHalf),
        ];
        let n = absent_in(&leaves, 3, 2026, &HolidaySet::default());
        assert_eq!(n, 2.5);
    }

    #[test]
    fn settlement_follows_daily_rate() {
        let s = settle(44000.0, 22, 2.0);
        assert_eq!(s.deduction, 4000.0);
        assert_eq!(s.net, 40000.0);

        let none = settle(50000.0, 22, 0.0);
        assert_eq!(none.deduction, 0.0);
        assert_eq!(none.net, 50000.0);
    }

    #[test]
    fn settlement_rounds_to_cents() {
        let s = settle(10000.0, 22, 1.0);
        assert_eq!(s.deduction, 454.55);
        assert_eq!(s.net, 9545.45);
    }

    #[test]
    fn deduction_never_exceeds_basic_salary() {
        let s = settle(22000.0, 20, 23.0);
        assert_eq!(s.deduction, 22000.0);
        assert_eq!(s.net, 0.0);
    }

    #[test]
    fn period_rejects_invalid_month_and_detects_future() {
        assert!(PayPeriod::new(0, 2026).is_err());
        assert!(PayPeriod::new(13, 2026).is_err());
        let today = d(2026, 10, 17);
        assert!(!PayPeriod::new(10, 2026).unwrap().is_after(today));
        assert!(!PayPeriod::new(12, 2025).unwrap().is_after(today));
        assert!(PayPeriod::new(11, 2026).unwrap().is_after(today));
        assert!(PayPeriod::new(1, 2027).unwrap().is_after(today));
    }

    #[test]
    fn out_of_range_year_is_not_reported_as_a_bad_month() {
        let err = PayPeriod::new(6, 300_000).unwrap_err();
        assert_eq!(err.to_string(), "year 300000 is out of range");
        let err = PayPeriod::new(13, 2026).unwrap_err();
        assert_eq!(err.to_string(), "month must be between 1 and 12");
    }
}
