use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Persisted leave status. The string forms are stored verbatim in
/// `leaves.status` and are case-significant.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    #[serde(rename = "Pending")]
    #[strum(serialize = "Pending")]
    Pending,
    ManagerApproved,
    ManagerRejected,
    Approved,
    Rejected,
    Cancelled,
    WithdrawalPending,
    Withdrawn,
}

impl TryFrom<String> for LeaveStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Outcome of a review step.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Approved,
    Rejected,
}

/// Position of a leave in its lifecycle.
///
/// Two-tier review is explicit: a manager's decision is `ManagerReviewed`,
/// an admin's binding one is `Finalized`. Only `Finalized(Approved)` holds
/// a balance deduction; `WithdrawalRequested` still does until it becomes
/// `Withdrawn`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LeaveState {
    Requested,
    ManagerReviewed(Outcome),
    Finalized(Outcome),
    WithdrawalRequested,
    Withdrawn,
    Cancelled,
}

impl LeaveState {
    /// Whether the ledger currently carries this leave's days as used.
    pub fn holds_balance(&self) -> bool {
        matches!(
            self,
            LeaveState::Finalized(Outcome::Approved) | LeaveState::WithdrawalRequested
        )
    }
}

impl From<LeaveStatus> for LeaveState {
    fn from(status: LeaveStatus) -> Self {
        match status {
            LeaveStatus::Pending => LeaveState::Requested,
            LeaveStatus::ManagerApproved => LeaveState::ManagerReviewed(Outcome::Approved),
            LeaveStatus::ManagerRejected => LeaveState::ManagerReviewed(Outcome::Rejected),
            LeaveStatus::Approved => LeaveState::Finalized(Outcome::Approved),
            LeaveStatus::Rejected => LeaveState::Finalized(Outcome::Rejected),
            LeaveStatus::Cancelled => LeaveState::Cancelled,
            LeaveStatus::WithdrawalPending => LeaveState::WithdrawalRequested,
            LeaveStatus::Withdrawn => LeaveState::Withdrawn,
        }
    }
}

impl From<LeaveState> for LeaveStatus {
    fn from(state: LeaveState) -> Self {
        match state {
            LeaveState::Requested => LeaveStatus::Pending,
            LeaveState::ManagerReviewed(Outcome::Approved) => LeaveStatus::ManagerApproved,
            LeaveState::ManagerReviewed(Outcome::Rejected) => LeaveStatus::ManagerRejected,
            LeaveState::Finalized(Outcome::Approved) => LeaveStatus::Approved,
            LeaveState::Finalized(Outcome::Rejected) => LeaveStatus::Rejected,
            LeaveState::Cancelled => LeaveStatus::Cancelled,
            LeaveState::WithdrawalRequested => LeaveStatus::WithdrawalPending,
            LeaveState::Withdrawn => LeaveStatus::Withdrawn,
        }
    }
}

/// Reviewer decision from `{"action": "APPROVE" | "REJECT"}`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LeaveAction {
    Approve,
    Reject,
}

impl From<LeaveAction> for Outcome {
    fn from(action: LeaveAction) -> Self {
        match action {
            LeaveAction::Approve => Outcome::Approved,
            LeaveAction::Reject => Outcome::Rejected,
        }
    }
}

/// Part of the day a leave covers. Ids match the `leave_timings` table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveTiming {
    FirstHalf = 1,
    SecondHalf = 2,
    FullDay = 3,
}

impl LeaveTiming {
    pub const ALL: [LeaveTiming; 3] = [
        LeaveTiming::FirstHalf,
        LeaveTiming::SecondHalf,
        LeaveTiming::FullDay,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(LeaveTiming::FirstHalf),
            2 => Some(LeaveTiming::SecondHalf),
            3 => Some(LeaveTiming::FullDay),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Multiplier applied to a working-day count.
    pub fn day_factor(&self) -> f64 {
        match self {
            LeaveTiming::FullDay => 1.0,
            LeaveTiming::FirstHalf | LeaveTiming::SecondHalf => 0.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeaveTiming::FirstHalf => "First Half",
            LeaveTiming::SecondHalf => "Second Half",
            LeaveTiming::FullDay => "Full Day",
        }
    }
}

impl Default for LeaveTiming {
    fn default() -> Self {
        LeaveTiming::FullDay
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Leave {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = 3)]
    pub leave_timing_id: u8,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 4.0)]
    pub days: f64,
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    pub applied_by: u64,
    pub approved_by: Option<u64>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl Leave {
    pub fn state(&self) -> LeaveState {
        self.status.into()
    }

    pub fn timing(&self) -> LeaveTiming {
        LeaveTiming::from_id(self.leave_timing_id).unwrap_or_default()
    }
}

/// Leave row joined with its type name, as returned to list views.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct LeaveView {
    pub id: u64,
    pub employee_id: u64,
    pub employee: String,
    #[serde(skip_serializing)]
    pub manager_id: Option<u64>,
    pub leave_type: String,
    pub is_paid: bool,
    pub leave_timing_id: u8,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub days: f64,
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    pub approved_by: Option<u64>,
    #[schema(format = "date-time", value_type = String)]
    pub applied_at: DateTime<Utc>,
}

/// An existing Pending/APPROVED leave that blocks a new request.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct OverlappingLeave {
    pub id: u64,
    pub leave_type: String,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
}

impl fmt::Display for OverlappingLeave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Leave overlaps with existing {} leave #{} from {} to {} (status: {})",
            self.leave_type, self.id, self.start_date, self.end_date, self.status
        )
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveApplyInput {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    /// 1 = first half, 2 = second half, 3 = full day (default).
    #[schema(example = 3)]
    pub leave_timing_id: Option<u8>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family function out of town")]
    pub reason: String,
}

/// Leave recorded on an employee's behalf, approved on creation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveAdminAddInput {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = 3)]
    pub leave_timing_id: Option<u8>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Sick leave reported by phone")]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveActionInput {
    #[schema(example = "APPROVE")]
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveTimingOption {
    #[schema(example = 3)]
    pub id: u8,
    #[schema(example = "Full Day")]
    pub name: &'static str,
    #[schema(example = 1.0)]
    pub day_factor: f64,
}

impl From<LeaveTiming> for LeaveTimingOption {
    fn from(timing: LeaveTiming) -> Self {
        Self {
            id: timing.id(),
            name: timing.label(),
            day_factor: timing.day_factor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ALL_STATUSES: [LeaveStatus; 8] = [
        LeaveStatus::Pending,
        LeaveStatus::ManagerApproved,
        LeaveStatus::ManagerRejected,
        LeaveStatus::Approved,
        LeaveStatus::Rejected,
        LeaveStatus::Cancelled,
        LeaveStatus::WithdrawalPending,
        LeaveStatus::Withdrawn,
    ];

    #[test]
    fn status_strings_match_stored_values() {
        let stored: Vec<String> = ALL_STATUSES.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            stored,
            vec![
                "Pending",
                "MANAGER_APPROVED",
                "MANAGER_REJECTED",
                "APPROVED",
                "REJECTED",
                "CANCELLED",
                "WITHDRAWAL_PENDING",
                "WITHDRAWN",
            ]
        );
    }

    #[test]
    fn status_parsing_is_case_significant() {
        assert_eq!(LeaveStatus::from_str("Pending").unwrap(), LeaveStatus::Pending);
        assert!(LeaveStatus::from_str("PENDING").is_err());
        assert!(LeaveStatus::from_str("approved").is_err());
        assert_eq!(
            LeaveStatus::try_from("WITHDRAWAL_PENDING".to_string()).unwrap(),
            LeaveStatus::WithdrawalPending
        );
    }

    #[test]
    fn status_json_matches_stored_values() {
        assert_eq!(
            serde_json::to_string(&LeaveStatus::Pending).unwrap(),
            "\"Pending\""
        );
        assert_eq!(
            serde_json::to_string(&LeaveStatus::ManagerApproved).unwrap(),
            "\"MANAGER_APPROVED\""
        );
    }

    #[test]
    fn state_mapping_is_a_bijection() {
        for status in ALL_STATUSES {
            let state: LeaveState = status.into();
            assert_eq!(LeaveStatus::from(state), status);
        }
    }

    #[test]
    fn only_approved_and_withdrawal_pending_hold_balance() {
        let holding: Vec<LeaveStatus> = ALL_STATUSES
            .into_iter()
            .filter(|s| LeaveState::from(*s).holds_balance())
            .collect();
        assert_eq!(
            holding,
            vec![LeaveStatus::Approved, LeaveStatus::WithdrawalPending]
        );
    }

    #[test]
    fn action_is_case_insensitive() {
        assert_eq!(LeaveAction::from_str("approve").unwrap(), LeaveAction::Approve);
        assert_eq!(LeaveAction::from_str("Reject").unwrap(), LeaveAction::Reject);
        assert_eq!(LeaveAction::from_str("APPROVE").unwrap(), LeaveAction::Approve);
        assert!(LeaveAction::from_str("maybe").is_err());
        assert_eq!(LeaveAction::Approve.to_string(), "APPROVE");
    }

    #[test]
    fn timing_defaults_to_full_day() {
        assert_eq!(LeaveTiming::default(), LeaveTiming::FullDay);
        assert_eq!(LeaveTiming::from_id(1), Some(LeaveTiming::FirstHalf));
        assert_eq!(LeaveTiming::from_id(4), None);
        assert_eq!(LeaveTiming::SecondHalf.day_factor(), 0.5);
        assert_eq!(LeaveTiming::FullDay.day_factor(), 1.0);
    }
}
