use sqlx::MySqlConnection;

use crate::model::employee::EmployeeRecord;

const EMPLOYEE_SELECT: &str = r#"
    SELECT e.id, e.full_name, e.email, r.type AS role, e.manager_id,
           e.salary, e.status, e.deleted
    FROM employees e
    JOIN roles r ON r.id = e.role_id
"#;

/// Live lookup; the manager relation is never cached.
pub async fn find(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> Result<Option<EmployeeRecord>, sqlx::Error> {
    let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
    sqlx::query_as::<_, EmployeeRecord>(&sql)
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await
}

/// Employees included in a payroll run.
pub async fn list_payable(conn: &mut MySqlConnection) -> Result<Vec<EmployeeRecord>, sqlx::Error> {
    let sql = format!(
        "{EMPLOYEE_SELECT} WHERE e.deleted = FALSE AND e.status = 'active' AND e.salary > 0 ORDER BY e.id"
    );
    sqlx::query_as::<_, EmployeeRecord>(&sql)
        .fetch_all(&mut *conn)
        .await
}
