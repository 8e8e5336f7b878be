use sqlx::MySqlConnection;

use crate::model::payroll::{PayrollRun, PayrollStatus, Payslip, PayslipDraft, PayslipStatus};

const RUN_COLUMNS: &str = "id, month, year, status, created_at, finalized_at";

const PAYSLIP_COLUMNS: &str = "id, payroll_run_id, employee_id, basic_salary, working_days, \
     absent_days, deduction_amount, net_salary, status, withdrawn_by, withdrawn_at, \
     withdrawal_reason, created_at";

pub async fn lock_run_for_period(
    conn: &mut MySqlConnection,
    month: u32,
    year: i32,
) -> Result<Option<PayrollRun>, sqlx::Error> {
    let sql =
        format!("SELECT {RUN_COLUMNS} FROM payroll_runs WHERE month = ? AND year = ? FOR UPDATE");
    sqlx::query_as::<_, PayrollRun>(&sql)
        .bind(month)
        .bind(year)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn lock_run(
    conn: &mut MySqlConnection,
    id: u64,
) -> Result<Option<PayrollRun>, sqlx::Error> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM payroll_runs WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, PayrollRun>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn insert_run(
    conn: &mut MySqlConnection,
    month: u32,
    year: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO payroll_runs (month, year, status) VALUES (?, ?, ?)")
        .bind(month)
        .bind(year)
        .bind(PayrollStatus::Preview.as_ref())
        .execute(&mut *conn)
        .await?;
    Ok(result.last_insert_id())
}

/// One-way PREVIEW -> FINALIZED. Returns false if the run was already finalized.
pub async fn mark_finalized(conn: &mut MySqlConnection, id: u64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payroll_runs SET status = ?, finalized_at = CURRENT_TIMESTAMP WHERE id = ? AND status = ?",
    )
    .bind(PayrollStatus::Finalized.as_ref())
    .bind(id)
    .bind(PayrollStatus::Preview.as_ref())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn insert_payslip(
    conn: &mut MySqlConnection,
    payroll_run_id: u64,
    draft: &PayslipDraft,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO payslips
            (payroll_run_id, employee_id, basic_salary, working_days, absent_days,
             deduction_amount, net_salary, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payroll_run_id)
    .bind(draft.employee_id)
    .bind(draft.basic_salary)
    .bind(draft.working_days)
    .bind(draft.absent_days)
    .bind(draft.deduction_amount)
    .bind(draft.net_salary)
    .bind(PayslipStatus::Active.as_ref())
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_id())
}

/// Payslips of finalized runs, newest period first. `employee_id` narrows
/// the list to one employee.
pub async fn list_payslips(
    conn: &mut MySqlConnection,
    employee_id: Option<u64>,
) -> Result<Vec<Payslip>, sqlx::Error> {
    let mut sql = String::from(
        r#"
        SELECT p.id, p.payroll_run_id, p.employee_id, p.basic_salary, p.working_days,
               p.absent_days, p.deduction_amount, p.net_salary, p.status, p.withdrawn_by,
               p.withdrawn_at, p.withdrawal_reason, p.created_at
        FROM payslips p
        JOIN payroll_runs r ON r.id = p.payroll_run_id
        WHERE r.status = ?
        "#,
    );
    if employee_id.is_some() {
        sql.push_str(" AND p.employee_id = ?");
    }
    sql.push_str(" ORDER BY r.year DESC, r.month DESC, p.employee_id");

    let mut query = sqlx::query_as::<_, Payslip>(&sql).bind(PayrollStatus::Finalized.as_ref());
    if let Some(employee_id) = employee_id {
        query = query.bind(employee_id);
    }
    query.fetch_all(&mut *conn).await
}

pub async fn lock_payslip(
    conn: &mut MySqlConnection,
    id: u64,
) -> Result<Option<Payslip>, sqlx::Error> {
    let sql = format!("SELECT {PAYSLIP_COLUMNS} FROM payslips WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, Payslip>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Marks an ACTIVE payslip WITHDRAWN; amounts are left untouched.
pub async fn withdraw_payslip(
    conn: &mut MySqlConnection,
    id: u64,
    withdrawn_by: u64,
    reason: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE payslips
        SET status = ?, withdrawn_by = ?, withdrawn_at = CURRENT_TIMESTAMP, withdrawal_reason = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(PayslipStatus::Withdrawn.as_ref())
    .bind(withdrawn_by)
    .bind(reason)
    .bind(id)
    .bind(PayslipStatus::Active.as_ref())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
