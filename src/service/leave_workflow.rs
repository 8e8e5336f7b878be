//! Transactional leave lifecycle.
//!
//! Each operation opens one transaction, locks the rows it decides on, asks
//! `leave_policy` for the transition, then writes status, ledger and audit
//! together. Returning early with `?` drops the transaction, which rolls it
//! back. Notices are handed back to the caller for dispatch after commit.

use chrono::{Datelike, Duration, Utc};
use serde_json::json;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::model::employee::EmployeeRecord;
use crate::model::leave::{
    Leave, LeaveAction, LeaveAdminAddInput, LeaveApplyInput, LeaveStatus, LeaveView,
};
use crate::model::leave_type::LeaveType;
use crate::model::role::Role;
use crate::repository::leave::{LeaveScope, NewLeave};
use crate::repository::{
    audit, employee as employee_repo, holiday as holiday_repo, leave as leave_repo,
    leave_type as leave_type_repo, settings as settings_repo,
};
use crate::service::leave_policy::{self, Actor, ValidatedRequest};
use crate::service::ledger;
use crate::utils::notification::Notice;

/// A committed change plus the notices it produced.
#[derive(Debug)]
pub struct LeaveChange {
    pub leave: Leave,
    pub notices: Vec<Notice>,
}

#[instrument(skip(pool, input), fields(employee_id = actor.employee_id))]
pub async fn apply(
    pool: &MySqlPool,
    actor: Actor,
    input: LeaveApplyInput,
    grace: Duration,
) -> AppResult<LeaveChange> {
    let request = leave_policy::validate_request(
        input.start_date,
        input.end_date,
        input.leave_timing_id,
        &input.reason,
        Utc::now(),
        grace,
    )?;

    let mut tx = pool.begin().await?;

    let employee = load_employee(&mut *tx, actor.employee_id).await?;
    if !employee.is_active() {
        return Err(AppError::forbidden(
            "Only active employees can apply for leave",
        ));
    }
    let leave_type = load_leave_type(&mut *tx, input.leave_type_id).await?;
    let days = count_days(&mut *tx, &request).await?;
    ensure_no_overlap(&mut *tx, employee.id, &request).await?;

    // Informational check; nothing is deducted until final approval.
    let balance =
        ledger::fetch_or_create(&mut *tx, employee.id, &leave_type, request.start_date.year())
            .await?;
    balance.ensure_available(days)?;

    let id = leave_repo::insert(
        &mut *tx,
        &NewLeave {
            employee_id: employee.id,
            leave_type_id: leave_type.id,
            leave_timing_id: request.timing.id(),
            start_date: request.start_date,
            end_date: request.end_date,
            days,
            reason: &request.reason,
            status: LeaveStatus::Pending,
            applied_by: actor.employee_id,
            approved_by: None,
        },
    )
    .await?;

    audit::add_log(
        &mut *tx,
        actor.employee_id,
        audit::COMPONENT_LEAVE,
        "apply",
        Some(id),
        json!({
            "leave_type_id": leave_type.id,
            "start_date": request.start_date,
            "end_date": request.end_date,
            "days": days,
        }),
    )
    .await?;

    let leave = reload(&mut *tx, id).await?;
    let mut notices = Vec::new();
    if let Some(manager_id) = employee.manager_id {
        if let Some(manager) = employee_repo::find(&mut *tx, manager_id).await? {
            notices.push(Notice::new(
                manager.email,
                "Leave request awaiting review",
                format!(
                    "{} applied for {} day(s) of {} from {} to {}.",
                    employee.full_name, days, leave_type.name, leave.start_date, leave.end_date
                ),
            ));
        }
    }

    tx.commit().await?;
    tracing::info!(leave_id = id, days, "Leave applied");

    Ok(LeaveChange { leave, notices })
}

/// Record an approved leave for someone else. The balance is checked and
/// deducted in the same transaction.
#[instrument(
    skip(pool, input),
    fields(actor_id = actor.employee_id, employee_id = input.employee_id)
)]
pub async fn admin_add(
    pool: &MySqlPool,
    actor: Actor,
    input: LeaveAdminAddInput,
) -> AppResult<LeaveChange> {
    let request = leave_policy::validate_shape(
        input.start_date,
        input.end_date,
        input.leave_timing_id,
        &input.reason,
    )?;

    let mut tx = pool.begin().await?;

    let settings = settings_repo::load(&mut *tx).await?;
    let employee = load_employee(&mut *tx, input.employee_id).await?;
    leave_policy::authorize_direct_add(&employee, actor, &settings)?;
    if !employee.is_active() {
        return Err(AppError::validation("Employee is not active"));
    }

    let leave_type = load_leave_type(&mut *tx, input.leave_type_id).await?;
    let days = count_days(&mut *tx, &request).await?;
    ensure_no_overlap(&mut *tx, employee.id, &request).await?;

    ledger::deduct(
        &mut *tx,
        employee.id,
        &leave_type,
        request.start_date.year(),
        days,
    )
    .await?;

    let id = leave_repo::insert(
        &mut *tx,
        &NewLeave {
            employee_id: employee.id,
            leave_type_id: leave_type.id,
            leave_timing_id: request.timing.id(),
            start_date: request.start_date,
            end_date: request.end_date,
            days,
            reason: &request.reason,
            status: LeaveStatus::Approved,
            applied_by: actor.employee_id,
            approved_by: Some(actor.employee_id),
        },
    )
    .await?;

    audit::add_log(
        &mut *tx,
        actor.employee_id,
        audit::COMPONENT_LEAVE,
        "admin_add",
        Some(id),
        json!({
            "employee_id": employee.id,
            "leave_type_id": leave_type.id,
            "start_date": request.start_date,
            "end_date": request.end_date,
            "days": days,
        }),
    )
    .await?;

    let leave = reload(&mut *tx, id).await?;
    tx.commit().await?;
    tracing::info!(leave_id = id, days, "Leave added on behalf of employee");

    let notices = vec![Notice::new(
        employee.email,
        "Leave recorded",
        format!(
            "{} day(s) of {} from {} to {} were recorded as approved leave.",
            days, leave_type.name, leave.start_date, leave.end_date
        ),
    )];
    Ok(LeaveChange { leave, notices })
}

/// Approve or reject. Final approval re-checks and deducts the balance on
/// the locked ledger row.
#[instrument(skip(pool), fields(actor_id = actor.employee_id))]
pub async fn review(
    pool: &MySqlPool,
    actor: Actor,
    leave_id: u64,
    action: LeaveAction,
) -> AppResult<LeaveChange> {
    let mut tx = pool.begin().await?;

    let leave = lock_leave(&mut *tx, leave_id).await?;
    let owner = load_employee(&mut *tx, leave.employee_id).await?;
    let settings = settings_repo::load(&mut *tx).await?;

    let decision = leave_policy::review(leave.state(), &owner, actor, action, &settings)?;

    if decision.deduct {
        let leave_type = load_leave_type(&mut *tx, leave.leave_type_id).await?;
        ledger::deduct(
            &mut *tx,
            owner.id,
            &leave_type,
            leave.start_date.year(),
            leave.days,
        )
        .await?;
    }

    let next = LeaveStatus::from(decision.next);
    swap_status(&mut *tx, &leave, next, Some(actor.employee_id)).await?;

    audit::add_log(
        &mut *tx,
        actor.employee_id,
        audit::COMPONENT_LEAVE,
        &action.to_string().to_lowercase(),
        Some(leave.id),
        json!({ "from": leave.status, "to": next, "days": leave.days }),
    )
    .await?;

    let updated = reload(&mut *tx, leave.id).await?;
    tx.commit().await?;
    tracing::info!(leave_id = leave.id, from = %leave.status, to = %next, "Leave reviewed");

    let notices = vec![Notice::new(
        owner.email,
        format!("Leave {}", next),
        format!(
            "Your leave from {} to {} is now {}.",
            updated.start_date, updated.end_date, next
        ),
    )];
    Ok(LeaveChange {
        leave: updated,
        notices,
    })
}

#[instrument(skip(pool), fields(actor_id = actor.employee_id))]
pub async fn cancel(pool: &MySqlPool, actor: Actor, leave_id: u64) -> AppResult<LeaveChange> {
    let mut tx = pool.begin().await?;

    let leave = lock_leave(&mut *tx, leave_id).await?;
    let next = LeaveStatus::from(leave_policy::cancel(
        leave.state(),
        leave.employee_id,
        actor,
    )?);
    swap_status(&mut *tx, &leave, next, None).await?;

    audit::add_log(
        &mut *tx,
        actor.employee_id,
        audit::COMPONENT_LEAVE,
        "cancel",
        Some(leave.id),
        json!({ "from": leave.status, "to": next }),
    )
    .await?;

    let mut notices = Vec::new();
    if actor.employee_id != leave.employee_id {
        let owner = load_employee(&mut *tx, leave.employee_id).await?;
        notices.push(Notice::new(
            owner.email,
            "Leave cancelled",
            format!(
                "Your leave from {} to {} was cancelled.",
                leave.start_date, leave.end_date
            ),
        ));
    }

    let updated = reload(&mut *tx, leave.id).await?;
    tx.commit().await?;
    tracing::info!(leave_id = leave.id, from = %leave.status, "Leave cancelled");

    Ok(LeaveChange {
        leave: updated,
        notices,
    })
}

/// Withdraw an approved leave. A manager's withdrawal is only a request;
/// an admin's is final and returns the days to the ledger.
#[instrument(skip(pool), fields(actor_id = actor.employee_id))]
pub async fn withdraw(pool: &MySqlPool, actor: Actor, leave_id: u64) -> AppResult<LeaveChange> {
    let mut tx = pool.begin().await?;

    let leave = lock_leave(&mut *tx, leave_id).await?;
    let owner = load_employee(&mut *tx, leave.employee_id).await?;
    let settings = settings_repo::load(&mut *tx).await?;

    let decision = leave_policy::withdraw(leave.state(), &owner, actor, &settings)?;

    if decision.restore {
        ledger::restore(
            &mut *tx,
            owner.id,
            leave.leave_type_id,
            leave.start_date.year(),
            leave.days,
        )
        .await?;
    }

    let next = LeaveStatus::from(decision.next);
    swap_status(&mut *tx, &leave, next, Some(actor.employee_id)).await?;

    let audit_action = if decision.restore {
        "withdraw"
    } else {
        "withdrawal_request"
    };
    audit::add_log(
        &mut *tx,
        actor.employee_id,
        audit::COMPONENT_LEAVE,
        audit_action,
        Some(leave.id),
        json!({ "from": leave.status, "to": next, "days": leave.days }),
    )
    .await?;

    let updated = reload(&mut *tx, leave.id).await?;
    tx.commit().await?;
    tracing::info!(
        leave_id = leave.id,
        from = %leave.status,
        to = %next,
        "Leave withdrawal processed"
    );

    let notices = vec![Notice::new(
        owner.email,
        format!("Leave {}", next),
        format!(
            "Your approved leave from {} to {} is now {}.",
            updated.start_date, updated.end_date, next
        ),
    )];
    Ok(LeaveChange {
        leave: updated,
        notices,
    })
}

/// Which leaves an actor may see.
pub fn scope_for(actor: Actor) -> LeaveScope {
    match actor.role {
        Role::Superadmin | Role::Admin => LeaveScope::All,
        Role::Manager => LeaveScope::Team(actor.employee_id),
        Role::Employee => LeaveScope::Own(actor.employee_id),
    }
}

pub fn can_view(actor: Actor, view: &LeaveView) -> bool {
    match scope_for(actor) {
        LeaveScope::All => true,
        LeaveScope::Own(id) => view.employee_id == id,
        LeaveScope::Team(id) => view.employee_id == id || view.manager_id == Some(id),
    }
}

pub async fn list(
    pool: &MySqlPool,
    actor: Actor,
    status: Option<LeaveStatus>,
    page: u64,
    per_page: u64,
) -> AppResult<(Vec<LeaveView>, i64)> {
    let mut conn = pool.acquire().await?;
    let result = leave_repo::list_views(&mut conn, scope_for(actor), status, page, per_page).await?;
    Ok(result)
}

pub async fn get(pool: &MySqlPool, actor: Actor, leave_id: u64) -> AppResult<LeaveView> {
    let mut conn = pool.acquire().await?;
    let view = leave_repo::find_view(&mut conn, leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave not found"))?;
    if !can_view(actor, &view) {
        return Err(AppError::forbidden("You are not allowed to view this leave"));
    }
    Ok(view)
}

async fn load_employee(conn: &mut MySqlConnection, id: u64) -> AppResult<EmployeeRecord> {
    employee_repo::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

async fn load_leave_type(conn: &mut MySqlConnection, id: u64) -> AppResult<LeaveType> {
    leave_type_repo::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave type not found"))
}

async fn lock_leave(conn: &mut MySqlConnection, id: u64) -> AppResult<Leave> {
    leave_repo::lock(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave not found"))
}

async fn reload(conn: &mut MySqlConnection, id: u64) -> AppResult<Leave> {
    leave_repo::find(conn, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("leave {id} vanished inside its transaction")))
}

async fn count_days(conn: &mut MySqlConnection, request: &ValidatedRequest) -> AppResult<f64> {
    let holidays = holiday_repo::between(conn, request.start_date, request.end_date).await?;
    leave_policy::leave_days(request.start_date, request.end_date, request.timing, &holidays)
}

async fn ensure_no_overlap(
    conn: &mut MySqlConnection,
    employee_id: u64,
    request: &ValidatedRequest,
) -> AppResult<()> {
    let existing =
        leave_repo::find_overlapping(conn, employee_id, request.start_date, request.end_date)
            .await?;
    match leave_policy::first_conflict(existing, request.start_date, request.end_date) {
        Some(conflict) => Err(AppError::Overlap(conflict)),
        None => Ok(()),
    }
}

/// The row is already locked; the guarded update still refuses to move a
/// leave that is no longer in the status the decision was made on.
async fn swap_status(
    conn: &mut MySqlConnection,
    leave: &Leave,
    next: LeaveStatus,
    acted_by: Option<u64>,
) -> AppResult<()> {
    if !leave_repo::transition(conn, leave.id, leave.status, next, acted_by).await? {
        return Err(AppError::conflict(format!(
            "Leave #{} is no longer {}",
            leave.id, leave.status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn view(employee_id: u64, manager_id: Option<u64>) -> LeaveView {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        LeaveView {
            id: 1,
            employee_id,
            employee: "Ravi Kumar".into(),
            manager_id,
            leave_type: "Casual Leave".into(),
            is_paid: true,
            leave_timing_id: 3,
            start_date: date,
            end_date: date,
            days: 1.0,
            reason: "family function".into(),
            status: LeaveStatus::Pending,
            approved_by: None,
            applied_at: Utc::now(),
        }
    }

    fn actor(employee_id: u64, role: Role) -> Actor {
        Actor { employee_id, role }
    }

    #[test]
    fn scope_follows_role() {
        assert_eq!(scope_for(actor(1, Role::Superadmin)), LeaveScope::All);
        assert_eq!(scope_for(actor(1, Role::Admin)), LeaveScope::All);
        assert_eq!(scope_for(actor(7, Role::Manager)), LeaveScope::Team(7));
        assert_eq!(scope_for(actor(9, Role::Employee)), LeaveScope::Own(9));
    }

    #[test]
    fn managers_see_own_and_direct_reports_only() {
        let manager = actor(7, Role::Manager);
        assert!(can_view(manager, &view(7, Some(1))));
        assert!(can_view(manager, &view(20, Some(7))));
        assert!(!can_view(manager, &view(21, Some(8))));
    }

    #[test]
    fn employees_see_only_their_own_leave() {
        let employee = actor(20, Role::Employee);
        assert!(can_view(employee, &view(20, Some(7))));
        assert!(!can_view(employee, &view(21, Some(7))));
        assert!(can_view(actor(1, Role::Admin), &view(21, Some(7))));
    }
}
