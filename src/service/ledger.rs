//! Balance ledger operations. Each one runs on the caller's transaction and
//! works on a row locked with `FOR UPDATE`, so check-then-write cannot race
//! another approval of the same (employee, type, year).

use sqlx::MySqlConnection;

use crate::error::{AppError, AppResult};
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_type::LeaveType;
use crate::repository::balance as balance_repo;

/// Current balance for the year. Not-yet-seeded balances are a 404.
pub async fn get_balance(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
) -> AppResult<LeaveBalance> {
    balance_repo::find(conn, employee_id, leave_type_id, year)
        .await?
        .ok_or_else(|| AppError::not_found("Leave balance not found for this year"))
}

/// Locked balance row, seeding it from the type's entitlement on first use.
/// Concurrent first requests both hit the unique key; only one row is
/// created and both end up reading it.
pub async fn fetch_or_create(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type: &LeaveType,
    year: i32,
) -> AppResult<LeaveBalance> {
    if let Some(balance) = balance_repo::lock(conn, employee_id, leave_type.id, year).await? {
        return Ok(balance);
    }

    let seed = LeaveBalance::seeded(
        employee_id,
        leave_type.id,
        year,
        leave_type.default_entitlement,
    );
    balance_repo::insert_if_absent(conn, &seed).await?;
    tracing::info!(
        employee_id,
        leave_type_id = leave_type.id,
        year,
        entitlement = leave_type.default_entitlement,
        "Leave balance seeded"
    );

    balance_repo::lock(conn, employee_id, leave_type.id, year)
        .await?
        .ok_or_else(|| AppError::Internal("leave balance missing after seeding".into()))
}

/// Authoritative availability check plus deduction, on final approval.
pub async fn deduct(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type: &LeaveType,
    year: i32,
    days: f64,
) -> AppResult<LeaveBalance> {
    let mut balance = fetch_or_create(conn, employee_id, leave_type, year).await?;
    balance.deduct(days)?;
    balance_repo::save(conn, &balance).await?;
    tracing::info!(
        employee_id,
        leave_type_id = leave_type.id,
        year,
        days,
        closing = balance.closing,
        "Leave balance deducted"
    );
    Ok(balance)
}

/// Inverse of [`deduct`], on a finalized withdrawal.
pub async fn restore(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
    days: f64,
) -> AppResult<LeaveBalance> {
    let mut balance = balance_repo::lock(conn, employee_id, leave_type_id, year)
        .await?
        .ok_or_else(|| AppError::conflict("No leave balance to restore for this year"))?;
    balance.restore(days);
    balance_repo::save(conn, &balance).await?;
    tracing::info!(
        employee_id,
        leave_type_id,
        year,
        days,
        closing = balance.closing,
        "Leave balance restored"
    );
    Ok(balance)
}

/// Manual credit or debit, recorded in `leave_adjustments`.
pub async fn adjust(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type: &LeaveType,
    year: i32,
    quantity: f64,
    reason: &str,
    adjusted_by: u64,
) -> AppResult<LeaveBalance> {
    let mut balance = fetch_or_create(conn, employee_id, leave_type, year).await?;
    balance.adjust(quantity)?;
    balance_repo::save(conn, &balance).await?;
    balance_repo::insert_adjustment(
        conn,
        employee_id,
        leave_type.id,
        year,
        quantity,
        reason,
        adjusted_by,
    )
    .await?;
    Ok(balance)
}
