use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PayrollStatus {
    Preview,
    Finalized,
}

impl TryFrom<String> for PayrollStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PayslipStatus {
    Active,
    Withdrawn,
}

impl TryFrom<String> for PayslipStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct PayrollRun {
    pub id: u64,
    pub month: u32,
    pub year: i32,
    #[sqlx(try_from = "String")]
    pub status: PayrollStatus,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub finalized_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Payslip {
    pub id: u64,
    pub payroll_run_id: u64,
    pub employee_id: u64,
    pub basic_salary: f64,
    pub working_days: i32,
    pub absent_days: f64,
    pub deduction_amount: f64,
    pub net_salary: f64,
    #[sqlx(try_from = "String")]
    pub status: PayslipStatus,
    pub withdrawn_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub withdrawal_reason: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// One employee's settlement for a month, before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayslipDraft {
    pub employee_id: u64,
    pub employee: String,
    pub basic_salary: f64,
    pub working_days: i32,
    pub absent_days: f64,
    pub deduction_amount: f64,
    pub net_salary: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayrollRunRequest {
    #[schema(example = 1)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayrollPreview {
    pub payroll_run_id: u64,
    pub month: u32,
    pub year: i32,
    #[schema(value_type = String, example = "PREVIEW")]
    pub status: PayrollStatus,
    pub total_payroll: f64,
    pub total_deductions: f64,
    pub payslips: Vec<PayslipDraft>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayslipWithdrawInput {
    #[schema(example = "Issued to the wrong bank account")]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn payroll_status_strings() {
        assert_eq!(PayrollStatus::Preview.to_string(), "PREVIEW");
        assert_eq!(PayrollStatus::from_str("FINALIZED").unwrap(), PayrollStatus::Finalized);
        assert_eq!(PayslipStatus::Withdrawn.as_ref(), "WITHDRAWN");
    }
}
