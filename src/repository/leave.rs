use chrono::NaiveDate;
use sqlx::MySqlConnection;

use crate::model::leave::{Leave, LeaveStatus, LeaveView, OverlappingLeave};
use crate::service::leave_policy::BLOCKING_STATUSES;

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type_id, leave_timing_id, start_date, end_date, \
     days, reason, status, applied_by, approved_by, created_at, updated_at";

const LEAVE_VIEW_SELECT: &str = r#"
    SELECT l.id, l.employee_id, e.full_name AS employee, e.manager_id,
           lt.name AS leave_type, lt.is_paid, l.leave_timing_id,
           l.start_date, l.end_date, l.days, l.reason, l.status,
           l.approved_by, l.created_at AS applied_at
    FROM leaves l
    JOIN employees e ON e.id = l.employee_id
    JOIN leave_types lt ON lt.id = l.leave_type_id
"#;

pub async fn find(conn: &mut MySqlConnection, id: u64) -> Result<Option<Leave>, sqlx::Error> {
    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = ?");
    sqlx::query_as::<_, Leave>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Read a leave and hold its row lock until the transaction ends, so
/// concurrent actions on the same leave serialize.
pub async fn lock(conn: &mut MySqlConnection, id: u64) -> Result<Option<Leave>, sqlx::Error> {
    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, Leave>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Leave of the employee in a blocking status intersecting `[start, end]`.
/// Mirrors `leave_policy::conflicts_with`.
pub async fn find_overlapping(
    conn: &mut MySqlConnection,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<OverlappingLeave>, sqlx::Error> {
    sqlx::query_as::<_, OverlappingLeave>(
        r#"
        SELECT l.id, lt.name AS leave_type, l.start_date, l.end_date, l.status
        FROM leaves l
        JOIN leave_types lt ON lt.id = l.leave_type_id
        WHERE l.employee_id = ?
          AND l.status IN (?, ?)
          AND l.start_date <= ?
          AND l.end_date >= ?
        ORDER BY l.start_date
        FOR UPDATE
        "#,
    )
    .bind(employee_id)
    .bind(BLOCKING_STATUSES[0].as_ref())
    .bind(BLOCKING_STATUSES[1].as_ref())
    .bind(end)
    .bind(start)
    .fetch_all(&mut *conn)
    .await
}

pub struct NewLeave<'a> {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub leave_timing_id: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: f64,
    pub reason: &'a str,
    pub status: LeaveStatus,
    pub applied_by: u64,
    pub approved_by: Option<u64>,
}

pub async fn insert(conn: &mut MySqlConnection, leave: &NewLeave<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (employee_id, leave_type_id, leave_timing_id, start_date, end_date,
             days, reason, status, applied_by, approved_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(leave.employee_id)
    .bind(leave.leave_type_id)
    .bind(leave.leave_timing_id)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(leave.days)
    .bind(leave.reason)
    .bind(leave.status.as_ref())
    .bind(leave.applied_by)
    .bind(leave.approved_by)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_id())
}

/// Compare-and-swap on status. Returns false when the row is no longer in
/// `from`, which callers report as a status conflict.
pub async fn transition(
    conn: &mut MySqlConnection,
    id: u64,
    from: LeaveStatus,
    to: LeaveStatus,
    acted_by: Option<u64>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET status = ?, approved_by = COALESCE(?, approved_by)
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(to.as_ref())
    .bind(acted_by)
    .bind(id)
    .bind(from.as_ref())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// APPROVED leave of unpaid types for one employee intersecting `[first, last]`.
pub async fn approved_unpaid_between(
    conn: &mut MySqlConnection,
    employee_id: u64,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<Vec<Leave>, sqlx::Error> {
    sqlx::query_as::<_, Leave>(
        r#"
        SELECT l.id, l.employee_id, l.leave_type_id, l.leave_timing_id, l.start_date,
               l.end_date, l.days, l.reason, l.status, l.applied_by, l.approved_by,
               l.created_at, l.updated_at
        FROM leaves l
        JOIN leave_types lt ON lt.id = l.leave_type_id
        WHERE l.employee_id = ?
          AND l.status = ?
          AND lt.is_paid = FALSE
          AND l.start_date <= ?
          AND l.end_date >= ?
        ORDER BY l.start_date
        "#,
    )
    .bind(employee_id)
    .bind(LeaveStatus::Approved.as_ref())
    .bind(last)
    .bind(first)
    .fetch_all(&mut *conn)
    .await
}

pub async fn find_view(
    conn: &mut MySqlConnection,
    id: u64,
) -> Result<Option<LeaveView>, sqlx::Error> {
    let sql = format!("{LEAVE_VIEW_SELECT} WHERE l.id = ?");
    sqlx::query_as::<_, LeaveView>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Which leaves a caller may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveScope {
    All,
    Own(u64),
    /// The manager's own leave plus their direct reports'.
    Team(u64),
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

pub async fn list_views(
    conn: &mut MySqlConnection,
    scope: LeaveScope,
    status: Option<LeaveStatus>,
    page: u64,
    per_page: u64,
) -> Result<(Vec<LeaveView>, i64), sqlx::Error> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    match scope {
        LeaveScope::All => {}
        LeaveScope::Own(employee_id) => {
            where_sql.push_str(" AND l.employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }
        LeaveScope::Team(manager_id) => {
            where_sql.push_str(" AND (e.manager_id = ? OR l.employee_id = ?)");
            args.push(FilterValue::U64(manager_id));
            args.push(FilterValue::U64(manager_id));
        }
    }

    let status_str = status.map(|s| s.to_string());
    if let Some(status) = status_str.as_deref() {
        where_sql.push_str(" AND l.status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM leaves l JOIN employees e ON e.id = l.employee_id{where_sql}"
    );
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }
    let total = count_q.fetch_one(&mut *conn).await?;

    let data_sql = format!(
        "{LEAVE_VIEW_SELECT}{where_sql} ORDER BY l.created_at DESC, l.id DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, LeaveView>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }
    let offset = page.saturating_sub(1) * per_page;
    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

    Ok((rows, total))
}
