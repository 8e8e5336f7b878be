use sqlx::MySqlConnection;

use crate::model::leave_type::{LeaveType, LeaveTypeInput};

pub async fn find(conn: &mut MySqlConnection, id: u64) -> Result<Option<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, is_paid, default_entitlement FROM leave_types WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn list(conn: &mut MySqlConnection) -> Result<Vec<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, is_paid, default_entitlement FROM leave_types ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert(
    conn: &mut MySqlConnection,
    input: &LeaveTypeInput,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_types (name, is_paid, default_entitlement)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(input.name.trim())
    .bind(input.is_paid)
    .bind(input.default_entitlement)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_id())
}

pub async fn update(
    conn: &mut MySqlConnection,
    id: u64,
    input: &LeaveTypeInput,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leave_types
        SET name = ?, is_paid = ?, default_entitlement = ?
        WHERE id = ?
        "#,
    )
    .bind(input.name.trim())
    .bind(input.is_paid)
    .bind(input.default_entitlement)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Leave and balance rows that reference the type.
pub async fn usage_count(conn: &mut MySqlConnection, id: u64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT (SELECT COUNT(*) FROM leaves WHERE leave_type_id = ?)
             + (SELECT COUNT(*) FROM leave_balances WHERE leave_type_id = ?)
        "#,
    )
    .bind(id)
    .bind(id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn delete(conn: &mut MySqlConnection, id: u64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM leave_types WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
