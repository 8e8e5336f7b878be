//! Leave lifecycle rules: who may move a leave from which state to which.
//!
//! Everything here is pure. The workflow layer loads the locked rows and a
//! settings snapshot, asks these functions for a decision, then persists it.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::AppError;
use crate::model::employee::EmployeeRecord;
use crate::model::leave::{
    LeaveAction, LeaveState, LeaveStatus, LeaveTiming, OverlappingLeave, Outcome,
};
use crate::model::role::Role;
use crate::model::settings::CompanySettings;
use crate::service::calendar::{self, HolidaySet};

pub const REASON_MIN_CHARS: usize = 10;
pub const REASON_MAX_CHARS: usize = 500;
/// Longest range a single leave record may cover, in calendar days.
pub const MAX_SPAN_DAYS: i64 = 366;

/// Statuses whose dates block a new request by the same employee.
pub const BLOCKING_STATUSES: [LeaveStatus; 2] = [LeaveStatus::Pending, LeaveStatus::Approved];

/// The authenticated employee performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub employee_id: u64,
    pub role: Role,
}

/// Leave request input after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub timing: LeaveTiming,
    pub reason: String,
}

/// Result of a review decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewDecision {
    pub next: LeaveState,
    /// Final approval: re-check and deduct the balance.
    pub deduct: bool,
}

/// Result of a withdrawal decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalDecision {
    pub next: LeaveState,
    pub restore: bool,
}

pub fn validate_reason(reason: &str) -> Result<String, AppError> {
    let trimmed = reason.trim();
    let len = trimmed.chars().count();
    if !(REASON_MIN_CHARS..=REASON_MAX_CHARS).contains(&len) {
        return Err(AppError::validation(format!(
            "reason must be between {REASON_MIN_CHARS} and {REASON_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Checks on a request made by the employee themselves. `grace` widens
/// "not in the past" to tolerate clients a few hours behind UTC.
pub fn validate_request(
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_timing_id: Option<u8>,
    reason: &str,
    now: DateTime<Utc>,
    grace: Duration,
) -> Result<ValidatedRequest, AppError> {
    let request = validate_shape(start_date, end_date, leave_timing_id, reason)?;
    ensure_not_in_past(start_date, now, grace)?;
    Ok(request)
}

/// Reason, timing and date-order checks shared by every way of recording
/// leave. Leave added on someone's behalf may lie in the past.
pub fn validate_shape(
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_timing_id: Option<u8>,
    reason: &str,
) -> Result<ValidatedRequest, AppError> {
    let reason = validate_reason(reason)?;

    let timing = match leave_timing_id {
        None => LeaveTiming::default(),
        Some(id) => LeaveTiming::from_id(id)
            .ok_or_else(|| AppError::validation(format!("invalid leave_timing_id {id}")))?,
    };

    if end_date < start_date {
        return Err(AppError::validation(
            "end date cannot be before start date",
        ));
    }
    if (end_date - start_date).num_days() >= MAX_SPAN_DAYS {
        return Err(AppError::validation(format!(
            "a single leave cannot span more than {MAX_SPAN_DAYS} days"
        )));
    }
    if timing != LeaveTiming::FullDay && start_date != end_date {
        return Err(AppError::validation(
            "half-day leave must start and end on the same day",
        ));
    }

    Ok(ValidatedRequest {
        start_date,
        end_date,
        timing,
        reason,
    })
}

pub fn ensure_not_in_past(
    start_date: NaiveDate,
    now: DateTime<Utc>,
    grace: Duration,
) -> Result<(), AppError> {
    let start_at = start_date.and_time(NaiveTime::MIN).and_utc();
    if start_at < now - grace {
        return Err(AppError::validation("start date cannot be in the past"));
    }
    Ok(())
}

/// Whether `existing` holds any of the days in `[start, end]`. Both ranges
/// are inclusive; only Pending and APPROVED leave block.
pub fn conflicts_with(existing: &OverlappingLeave, start: NaiveDate, end: NaiveDate) -> bool {
    BLOCKING_STATUSES.contains(&existing.status)
        && existing.start_date <= end
        && existing.end_date >= start
}

/// First leave among `candidates` that blocks `[start, end]`.
pub fn first_conflict(
    candidates: Vec<OverlappingLeave>,
    start: NaiveDate,
    end: NaiveDate,
) -> Option<OverlappingLeave> {
    candidates
        .into_iter()
        .find(|existing| conflicts_with(existing, start, end))
}

/// Days a request consumes: working days scaled by the timing factor.
/// A request that covers no working day is rejected.
pub fn leave_days(
    start: NaiveDate,
    end: NaiveDate,
    timing: LeaveTiming,
    holidays: &HolidaySet,
) -> Result<f64, AppError> {
    let working = calendar::working_days(start, end, holidays)?;
    if working <= 0.0 {
        return Err(AppError::validation(
            "leave must include at least one working day",
        ));
    }
    Ok(working * timing.day_factor())
}

/// Approve/reject on a leave owned by `owner`.
pub fn review(
    current: LeaveState,
    owner: &EmployeeRecord,
    actor: Actor,
    action: LeaveAction,
    settings: &CompanySettings,
) -> Result<ReviewDecision, AppError> {
    if actor.employee_id == owner.id {
        return Err(AppError::forbidden(
            "You cannot approve or reject your own leave",
        ));
    }

    let outcome = Outcome::from(action);
    match actor.role {
        Role::Employee => Err(AppError::forbidden(
            "Employees cannot approve or reject leave",
        )),
        Role::Manager => {
            ensure_manager_may_act(owner, actor, settings)?;
            if current != LeaveState::Requested {
                return Err(wrong_status(current, "managers can only act on Pending leave"));
            }
            Ok(ReviewDecision {
                next: LeaveState::ManagerReviewed(outcome),
                deduct: false,
            })
        }
        Role::Admin | Role::Superadmin => match (current, outcome) {
            (LeaveState::ManagerReviewed(Outcome::Rejected), Outcome::Approved) => Err(
                wrong_status(current, "a manager-rejected leave can only be finalized as rejected"),
            ),
            (LeaveState::Requested | LeaveState::ManagerReviewed(_), _) => Ok(ReviewDecision {
                next: LeaveState::Finalized(outcome),
                deduct: outcome == Outcome::Approved,
            }),
            _ => Err(wrong_status(
                current,
                "only Pending, MANAGER_APPROVED or MANAGER_REJECTED leave can be actioned",
            )),
        },
    }
}

/// Cancel a not-yet-approved leave. Nothing has been deducted yet, so
/// there is no balance effect.
pub fn cancel(current: LeaveState, owner_id: u64, actor: Actor) -> Result<LeaveState, AppError> {
    if actor.employee_id != owner_id && !actor.role.is_admin_level() {
        return Err(AppError::forbidden(
            "You can only cancel your own leave",
        ));
    }

    match current {
        LeaveState::Requested | LeaveState::ManagerReviewed(_) => Ok(LeaveState::Cancelled),
        LeaveState::Finalized(Outcome::Approved) => Err(AppError::conflict(
            "Leave is already approved and cannot be cancelled; request a withdrawal instead",
        )),
        LeaveState::Finalized(Outcome::Rejected) => Err(AppError::conflict(
            "Leave is already rejected and cannot be cancelled",
        )),
        LeaveState::Cancelled => Err(AppError::conflict("Leave is already cancelled")),
        LeaveState::Withdrawn => Err(AppError::conflict(
            "Leave is already withdrawn and cannot be cancelled",
        )),
        LeaveState::WithdrawalRequested => Err(AppError::conflict(
            "Leave has a pending withdrawal and cannot be cancelled",
        )),
    }
}

/// Withdraw an approved leave. A manager only requests it; an admin
/// finalizes it and the balance is restored.
pub fn withdraw(
    current: LeaveState,
    owner: &EmployeeRecord,
    actor: Actor,
    settings: &CompanySettings,
) -> Result<WithdrawalDecision, AppError> {
    if actor.employee_id == owner.id {
        return Err(AppError::forbidden("You cannot withdraw your own leave"));
    }

    match actor.role {
        Role::Employee => Err(AppError::forbidden("Employees cannot withdraw leave")),
        Role::Manager => {
            ensure_manager_may_act(owner, actor, settings)?;
            if current != LeaveState::Finalized(Outcome::Approved) {
                return Err(wrong_status(current, "only APPROVED leave can be withdrawn"));
            }
            Ok(WithdrawalDecision {
                next: LeaveState::WithdrawalRequested,
                restore: false,
            })
        }
        Role::Admin | Role::Superadmin => match current {
            LeaveState::Finalized(Outcome::Approved) | LeaveState::WithdrawalRequested => {
                Ok(WithdrawalDecision {
                    next: LeaveState::Withdrawn,
                    restore: true,
                })
            }
            _ => Err(wrong_status(
                current,
                "only APPROVED or WITHDRAWAL_PENDING leave can be withdrawn",
            )),
        },
    }
}

/// Recording an already-approved leave on someone else's behalf.
pub fn authorize_direct_add(
    target: &EmployeeRecord,
    actor: Actor,
    settings: &CompanySettings,
) -> Result<(), AppError> {
    if actor.employee_id == target.id {
        return Err(AppError::forbidden(
            "Use the regular application to request your own leave",
        ));
    }
    match actor.role {
        Role::Employee => Err(AppError::forbidden(
            "Employees cannot add leave for others",
        )),
        Role::Manager => ensure_manager_may_act(target, actor, settings),
        Role::Admin | Role::Superadmin => Ok(()),
    }
}

fn ensure_manager_may_act(
    owner: &EmployeeRecord,
    actor: Actor,
    settings: &CompanySettings,
) -> Result<(), AppError> {
    if !settings.allow_manager_add_leave {
        return Err(AppError::forbidden(
            "Manager permission to act on leave is disabled",
        ));
    }
    if !owner.reports_to(actor.employee_id) {
        return Err(AppError::forbidden(
            "You can only act on leave of your direct reports",
        ));
    }
    Ok(())
}

fn wrong_status(current: LeaveState, rule: &str) -> AppError {
    AppError::conflict(format!(
        "Leave is {}; {rule}",
        LeaveStatus::from(current)
    ))
}
