//! Payroll runs: preview and finalize both recompute every payslip from
//! persisted APPROVED leave; finalize never reuses preview numbers.

use chrono::Utc;
use serde_json::json;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::model::payroll::{
    PayrollPreview, PayrollRun, PayrollRunRequest, PayrollStatus, Payslip, PayslipDraft,
    PayslipStatus,
};
use crate::model::settings::CompanySettings;
use crate::repository::{
    audit, employee as employee_repo, holiday as holiday_repo, leave as leave_repo,
    payroll as payroll_repo, settings as settings_repo,
};
use crate::service::payroll_calc::{self, PayPeriod};
use crate::utils::notification::Notice;

pub struct FinalizedPayroll {
    pub summary: PayrollPreview,
    pub notices: Vec<Notice>,
}

struct ComputedPayslip {
    draft: PayslipDraft,
    email: String,
}

/// Compute payslips for a month without persisting them. Creates the
/// PREVIEW run on first use.
#[instrument(skip(pool))]
pub async fn preview(
    pool: &MySqlPool,
    actor_id: u64,
    request: PayrollRunRequest,
) -> AppResult<PayrollPreview> {
    let period = PayPeriod::new(request.month, request.year)?;
    if period.is_after(Utc::now().date_naive()) {
        return Err(AppError::validation(
            "Cannot run payroll for a future period",
        ));
    }

    let mut tx = pool.begin().await?;

    let existing = payroll_repo::lock_run_for_period(&mut *tx, period.month, period.year).await?;
    let run_id = match existing {
        Some(run) if run.status == PayrollStatus::Finalized => {
            return Err(AppError::conflict(format!(
                "Payroll for {:02}/{} is already finalized",
                period.month, period.year
            )));
        }
        Some(run) => run.id,
        None => payroll_repo::insert_run(&mut *tx, period.month, period.year).await?,
    };

    let settings = settings_repo::load(&mut *tx).await?;
    let computed = compute(&mut *tx, &period, &settings).await?;

    audit::add_log(
        &mut *tx,
        actor_id,
        audit::COMPONENT_PAYROLL,
        "preview",
        Some(run_id),
        json!({ "month": period.month, "year": period.year, "employees": computed.len() }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        run_id,
        month = period.month,
        year = period.year,
        employees = computed.len(),
        "Payroll previewed"
    );
    let drafts = computed.into_iter().map(|c| c.draft).collect();
    Ok(summarize(run_id, &period, PayrollStatus::Preview, drafts))
}

/// Recompute, persist payslips and flip the run to FINALIZED, all in one
/// transaction. A failure for any employee aborts the whole run.
#[instrument(skip(pool))]
pub async fn finalize(pool: &MySqlPool, actor_id: u64, run_id: u64) -> AppResult<FinalizedPayroll> {
    let mut tx = pool.begin().await?;

    let run = payroll_repo::lock_run(&mut *tx, run_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payroll run not found"))?;
    ensure_not_finalized(&run)?;

    let period = PayPeriod::new(run.month, run.year)?;
    let settings = settings_repo::load(&mut *tx).await?;
    let computed = compute(&mut *tx, &period, &settings).await?;

    for payslip in &computed {
        payroll_repo::insert_payslip(&mut *tx, run.id, &payslip.draft).await?;
    }
    if !payroll_repo::mark_finalized(&mut *tx, run.id).await? {
        return Err(AppError::conflict("Payroll run is already finalized"));
    }

    audit::add_log(
        &mut *tx,
        actor_id,
        audit::COMPONENT_PAYROLL,
        "finalize",
        Some(run.id),
        json!({ "month": run.month, "year": run.year, "payslips": computed.len() }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        run_id = run.id,
        month = run.month,
        year = run.year,
        payslips = computed.len(),
        "Payroll finalized"
    );

    let mut notices = Vec::with_capacity(computed.len());
    let mut drafts = Vec::with_capacity(computed.len());
    for ComputedPayslip { draft, email } in computed {
        notices.push(Notice::new(
            email,
            format!("Payslip for {:02}/{}", period.month, period.year),
            format!(
                "Net salary {:.2} (basic {:.2}, deduction {:.2} for {} unpaid day(s)).",
                draft.net_salary, draft.basic_salary, draft.deduction_amount, draft.absent_days
            ),
        ));
        drafts.push(draft);
    }

    Ok(FinalizedPayroll {
        summary: summarize(run.id, &period, PayrollStatus::Finalized, drafts),
        notices,
    })
}

/// Unpaid absence for one employee in one month.
pub async fn absent_days_for(
    conn: &mut MySqlConnection,
    employee_id: u64,
    period: &PayPeriod,
) -> AppResult<f64> {
    let holidays = holiday_repo::between(conn, period.first_day, period.last_day).await?;
    let leaves =
        leave_repo::approved_unpaid_between(conn, employee_id, period.first_day, period.last_day)
            .await?;
    payroll_calc::absent_days(&leaves, period, &holidays)
}

/// Finalized payslips, optionally narrowed to one employee.
pub async fn list_payslips(pool: &MySqlPool, employee_id: Option<u64>) -> AppResult<Vec<Payslip>> {
    let mut conn = pool.acquire().await?;
    Ok(payroll_repo::list_payslips(&mut conn, employee_id).await?)
}

/// Mark an issued payslip WITHDRAWN. The amounts stay as they were.
#[instrument(skip(pool, reason))]
pub async fn withdraw_payslip(
    pool: &MySqlPool,
    actor_id: u64,
    payslip_id: u64,
    reason: &str,
) -> AppResult<Payslip> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("withdrawal reason is required"));
    }

    let mut tx = pool.begin().await?;

    let payslip = payroll_repo::lock_payslip(&mut *tx, payslip_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payslip not found"))?;
    if payslip.status == PayslipStatus::Withdrawn {
        return Err(AppError::conflict("Payslip is already withdrawn"));
    }
    if !payroll_repo::withdraw_payslip(&mut *tx, payslip.id, actor_id, reason).await? {
        return Err(AppError::conflict("Payslip is already withdrawn"));
    }

    audit::add_log(
        &mut *tx,
        actor_id,
        audit::COMPONENT_PAYROLL,
        "withdraw_payslip",
        Some(payslip.id),
        json!({ "employee_id": payslip.employee_id, "reason": reason }),
    )
    .await?;

    let updated = payroll_repo::lock_payslip(&mut *tx, payslip.id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!("payslip {payslip_id} vanished inside its transaction"))
        })?;
    tx.commit().await?;

    tracing::info!(payslip_id, employee_id = payslip.employee_id, "Payslip withdrawn");
    Ok(updated)
}

fn ensure_not_finalized(run: &PayrollRun) -> AppResult<()> {
    if run.status == PayrollStatus::Finalized {
        return Err(AppError::conflict(format!(
            "Payroll for {:02}/{} is already finalized",
            run.month, run.year
        )));
    }
    Ok(())
}

async fn compute(
    conn: &mut MySqlConnection,
    period: &PayPeriod,
    settings: &CompanySettings,
) -> AppResult<Vec<ComputedPayslip>> {
    let working_days = settings.working_days_per_month();
    let employees = employee_repo::list_payable(conn).await?;

    let mut computed = Vec::with_capacity(employees.len());
    for employee in employees {
        let absent = absent_days_for(conn, employee.id, period).await?;
        let settlement = payroll_calc::settle(employee.salary, working_days, absent);
        computed.push(ComputedPayslip {
            draft: PayslipDraft {
                employee_id: employee.id,
                employee: employee.full_name,
                basic_salary: employee.salary,
                working_days,
                absent_days: absent,
                deduction_amount: settlement.deduction,
                net_salary: settlement.net,
            },
            email: employee.email,
        });
    }
    Ok(computed)
}

fn summarize(
    run_id: u64,
    period: &PayPeriod,
    status: PayrollStatus,
    payslips: Vec<PayslipDraft>,
) -> PayrollPreview {
    let total_payroll = payroll_calc::round_cents(payslips.iter().map(|p| p.net_salary).sum());
    let total_deductions =
        payroll_calc::round_cents(payslips.iter().map(|p| p.deduction_amount).sum());
    PayrollPreview {
        payroll_run_id: run_id,
        month: period.month,
        year: period.year,
        status,
        total_payroll,
        total_deductions,
        payslips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(employee_id: u64, net: f64, deduction: f64) -> PayslipDraft {
        PayslipDraft {
            employee_id,
            employee: format!("Employee {employee_id}"),
            basic_salary: net + deduction,
            working_days: 22,
            absent_days: 0.0,
            deduction_amount: deduction,
            net_salary: net,
        }
    }

    #[test]
    fn summary_totals_net_and_deductions() {
        let period = PayPeriod::new(3, 2026).unwrap();
        let summary = summarize(
            5,
            &period,
            PayrollStatus::Preview,
            vec![draft(1, 40000.0, 4000.0), draft(2, 9545.45, 454.55)],
        );
        assert_eq!(summary.payroll_run_id, 5);
        assert_eq!(summary.total_payroll, 49545.45);
        assert_eq!(summary.total_deductions, 4454.55);
        assert_eq!(summary.payslips.len(), 2);
    }

    #[test]
    fn finalized_runs_refuse_a_second_finalize() {
        let run = PayrollRun {
            id: 1,
            month: 1,
            year: 2026,
            status: PayrollStatus::Finalized,
            created_at: Utc::now(),
            finalized_at: Some(Utc::now()),
        };
        let err = ensure_not_finalized(&run).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "Payroll for 01/2026 is already finalized");

        let open = PayrollRun {
            status: PayrollStatus::Preview,
            finalized_at: None,
            ..run
        };
        assert!(ensure_not_finalized(&open).is_ok());
    }
}
