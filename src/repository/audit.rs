use serde_json::Value;
use sqlx::MySqlConnection;

pub const COMPONENT_LEAVE: &str = "leave";
pub const COMPONENT_LEAVE_TYPE: &str = "leave-type";
pub const COMPONENT_LEAVE_BALANCE: &str = "leave-balance";
pub const COMPONENT_HOLIDAY: &str = "holiday";
pub const COMPONENT_PAYROLL: &str = "payroll";

/// Append an audit entry inside the caller's transaction.
pub async fn add_log(
    conn: &mut MySqlConnection,
    actor_id: u64,
    component: &str,
    action: &str,
    entity_id: Option<u64>,
    metadata: Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (actor_id, component, action, entity_id, metadata)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(actor_id)
    .bind(component)
    .bind(action)
    .bind(entity_id)
    .bind(metadata.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
