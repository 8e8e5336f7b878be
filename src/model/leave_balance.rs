use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Yearly quota ledger for one (employee, leave type, year).
///
/// `closing` always equals `opening + accrued + adjusted - used`; every
/// mutation goes through the methods below, which move `closing` in step
/// with the field they touch.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalance {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub year: i32,
    pub opening: f64,
    pub accrued: f64,
    pub used: f64,
    pub adjusted: f64,
    pub closing: f64,
}

impl LeaveBalance {
    /// Fresh balance with `opening = closing = entitlement`. The id is
    /// assigned on insert.
    pub fn seeded(employee_id: u64, leave_type_id: u64, year: i32, entitlement: i32) -> Self {
        let entitlement = f64::from(entitlement.max(0));
        Self {
            id: 0,
            employee_id,
            leave_type_id,
            year,
            opening: entitlement,
            accrued: 0.0,
            used: 0.0,
            adjusted: 0.0,
            closing: entitlement,
        }
    }

    pub fn is_consistent(&self) -> bool {
        (self.opening + self.accrued + self.adjusted - self.used - self.closing).abs() < 1e-9
    }

    /// Availability check: `closing >= days`.
    pub fn ensure_available(&self, days: f64) -> Result<(), AppError> {
        if self.closing >= days {
            Ok(())
        } else {
            Err(AppError::InsufficientBalance {
                available: self.closing,
                requested: days,
            })
        }
    }

    /// Consume `days` on final approval. The availability check runs again
    /// here against the locked row.
    pub fn deduct(&mut self, days: f64) -> Result<(), AppError> {
        self.ensure_available(days)?;
        self.used += days;
        self.closing -= days;
        Ok(())
    }

    /// Give back `days` previously deducted. Not bounded by the entitlement.
    pub fn restore(&mut self, days: f64) {
        self.used -= days;
        self.closing += days;
    }

    /// Manual credit (positive) or debit (negative).
    pub fn adjust(&mut self, quantity: f64) -> Result<(), AppError> {
        if self.closing + quantity < 0.0 {
            return Err(AppError::InsufficientBalance {
                available: self.closing,
                requested: -quantity,
            });
        }
        self.adjusted += quantity;
        self.closing += quantity;
        Ok(())
    }
}

/// Balance joined with its leave type name for display.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalanceView {
    pub leave_type_id: u64,
    pub leave_type: String,
    pub is_paid: bool,
    pub year: i32,
    pub opening: f64,
    pub accrued: f64,
    pub used: f64,
    pub adjusted: f64,
    pub closing: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveAdjustmentInput {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    /// Defaults to the current year.
    #[schema(example = 2026)]
    pub year: Option<i32>,
    /// Days to credit (positive) or debit (negative).
    #[schema(example = 2.0)]
    pub quantity: f64,
    #[schema(example = "Carry-over from previous year")]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn balance(entitlement: i32) -> LeaveBalance {
        LeaveBalance::seeded(7, 1, 2026, entitlement)
    }

    #[test]
    fn seeding_sets_opening_and_closing_to_entitlement() {
        let b = balance(12);
        assert_eq!(b.opening, 12.0);
        assert_eq!(b.closing, 12.0);
        assert_eq!(b.used, 0.0);
        assert_eq!(b.accrued, 0.0);
        assert_eq!(b.adjusted, 0.0);
        assert!(b.is_consistent());
    }

    #[test]
    fn deduct_moves_used_and_closing() {
        let mut b = balance(10);
        b.deduct(3.5).unwrap();
        assert_eq!(b.used, 3.5);
        assert_eq!(b.closing, 6.5);
        assert!(b.is_consistent());
    }

    #[test]
    fn deduct_beyond_closing_is_rejected_without_mutation() {
        let mut b = balance(2);
        let before = b.clone();
        let err = b.deduct(3.0).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientBalance { available, requested }
                if available == 2.0 && requested == 3.0
        ));
        assert_eq!(b, before);
    }

    #[test]
    fn deduct_then_restore_is_identity_on_closing() {
        let mut b = balance(15);
        let before = b.closing;
        b.deduct(4.0).unwrap();
        b.restore(4.0);
        assert_eq!(b.closing, before);
        assert_eq!(b.used, 0.0);
    }

    #[test]
    fn adjustment_cannot_drive_closing_negative() {
        let mut b = balance(1);
        assert!(b.adjust(-2.0).is_err());
        b.adjust(-1.0).unwrap();
        assert_eq!(b.closing, 0.0);
        assert_eq!(b.adjusted, -1.0);
        b.adjust(2.5).unwrap();
        assert_eq!(b.closing, 2.5);
        assert!(b.is_consistent());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Deduct(u8),
        Restore(u8),
        Adjust(i8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..=10).prop_map(Op::Deduct),
            (0u8..=10).prop_map(Op::Restore),
            (-5i8..=5).prop_map(Op::Adjust),
        ]
    }

    proptest! {
        #[test]
        fn ledger_identity_holds_after_any_sequence(
            entitlement in 0i32..40,
            ops in proptest::collection::vec(op(), 0..40),
        ) {
            let mut b = balance(entitlement);
            for op in ops {
                match op {
                    Op::Deduct(halves) => { let _ = b.deduct(f64::from(halves) / 2.0); }
                    Op::Restore(halves) => b.restore(f64::from(halves) / 2.0),
                    Op::Adjust(halves) => { let _ = b.adjust(f64::from(halves) / 2.0); }
                }
                prop_assert!(b.is_consistent());
            }
        }

        #[test]
        fn successful_deduct_never_leaves_negative_closing(
            entitlement in 0i32..20,
            days in proptest::collection::vec(0u8..=12, 0..20),
        ) {
            let mut b = balance(entitlement);
            for d in days {
                let _ = b.deduct(f64::from(d));
                prop_assert!(b.closing >= 0.0);
            }
        }
    }
}
