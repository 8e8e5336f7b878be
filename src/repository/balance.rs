use sqlx::MySqlConnection;

use crate::model::leave_balance::{LeaveBalance, LeaveBalanceView};

const BALANCE_COLUMNS: &str =
    "id, employee_id, leave_type_id, year, opening, accrued, used, adjusted, closing";

pub async fn find(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
) -> Result<Option<LeaveBalance>, sqlx::Error> {
    let sql = format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE employee_id = ? AND leave_type_id = ? AND year = ?"
    );
    sqlx::query_as::<_, LeaveBalance>(&sql)
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .fetch_optional(&mut *conn)
        .await
}

/// Same as [`find`] but holds a row lock until the transaction ends.
pub async fn lock(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
) -> Result<Option<LeaveBalance>, sqlx::Error> {
    let sql = format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE employee_id = ? AND leave_type_id = ? AND year = ? FOR UPDATE"
    );
    sqlx::query_as::<_, LeaveBalance>(&sql)
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .fetch_optional(&mut *conn)
        .await
}

/// Seed a balance unless one already exists. The unique key on
/// (employee_id, leave_type_id, year) makes concurrent seeding a no-op
/// for the loser instead of a second row.
pub async fn insert_if_absent(
    conn: &mut MySqlConnection,
    seed: &LeaveBalance,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO leave_balances
            (employee_id, leave_type_id, year, opening, accrued, used, adjusted, closing)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE id = id
        "#,
    )
    .bind(seed.employee_id)
    .bind(seed.leave_type_id)
    .bind(seed.year)
    .bind(seed.opening)
    .bind(seed.accrued)
    .bind(seed.used)
    .bind(seed.adjusted)
    .bind(seed.closing)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Persist the mutable ledger fields of a locked balance.
pub async fn save(conn: &mut MySqlConnection, balance: &LeaveBalance) -> Result<(), sqlx::Error> {
    debug_assert!(balance.is_consistent(), "ledger identity broken: {balance:?}");
    sqlx::query(
        r#"
        UPDATE leave_balances
        SET accrued = ?, used = ?, adjusted = ?, closing = ?
        WHERE id = ?
        "#,
    )
    .bind(balance.accrued)
    .bind(balance.used)
    .bind(balance.adjusted)
    .bind(balance.closing)
    .bind(balance.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn list_for_employee(
    conn: &mut MySqlConnection,
    employee_id: u64,
    year: i32,
) -> Result<Vec<LeaveBalanceView>, sqlx::Error> {
    sqlx::query_as::<_, LeaveBalanceView>(
        r#"
        SELECT b.leave_type_id, lt.name AS leave_type, lt.is_paid, b.year,
               b.opening, b.accrued, b.used, b.adjusted, b.closing
        FROM leave_balances b
        JOIN leave_types lt ON lt.id = b.leave_type_id
        WHERE b.employee_id = ? AND b.year = ?
        ORDER BY lt.id
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_adjustment(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
    quantity: f64,
    reason: &str,
    created_by: u64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_adjustments
            (employee_id, leave_type_id, year, quantity, reason, created_by)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(leave_type_id)
    .bind(year)
    .bind(quantity)
    .bind(reason)
    .bind(created_by)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_id())
}
