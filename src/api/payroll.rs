use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::payroll::{PayrollPreview, PayrollRunRequest, Payslip, PayslipWithdrawInput};
use crate::service::payroll;
use crate::utils::notification::Notifier;

#[utoipa::path(
    post,
    path = "/api/payroll/run",
    request_body(
        content = PayrollRunRequest,
        example = json!({ "month": 1, "year": 2026 })
    ),
    responses(
        (status = 200, description = "Computed payslips; nothing is persisted besides the PREVIEW run", body = PayrollPreview),
        (status = 400, description = "Invalid month or a future period"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Payroll for this period is already finalized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn run_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<PayrollRunRequest>,
) -> Result<impl Responder, AppError> {
    auth.require_admin_level()?;
    let actor = auth.actor()?;

    let preview = payroll::preview(pool.get_ref(), actor.employee_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(preview))
}

#[utoipa::path(
    post,
    path = "/api/payroll/{run_id}/finalize",
    params(
        ("run_id" = u64, Path, description = "PREVIEW payroll run to finalize")
    ),
    responses(
        (status = 200, description = "Payslips recomputed and persisted; run is FINALIZED", body = PayrollPreview),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Payroll run not found"),
        (status = 409, description = "Payroll run is already finalized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn finalize_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_admin_level()?;
    let actor = auth.actor()?;

    let finalized = payroll::finalize(pool.get_ref(), actor.employee_id, path.into_inner()).await?;
    notifier.dispatch(finalized.notices);
    Ok(HttpResponse::Ok().json(finalized.summary))
}

#[utoipa::path(
    get,
    path = "/api/payroll/payslips",
    responses(
        (status = 200, description = "Finalized payslips; admins see all, others their own", body = [Payslip]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn list_payslips(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, AppError> {
    let scope = if auth.is_admin_level() {
        None
    } else {
        Some(auth.actor()?.employee_id)
    };
    let payslips = payroll::list_payslips(pool.get_ref(), scope).await?;
    Ok(HttpResponse::Ok().json(payslips))
}

#[utoipa::path(
    post,
    path = "/api/payroll/payslips/{payslip_id}/withdraw",
    params(
        ("payslip_id" = u64, Path, description = "Payslip to withdraw")
    ),
    request_body = PayslipWithdrawInput,
    responses(
        (status = 200, description = "Payslip marked WITHDRAWN; amounts unchanged", body = Payslip),
        (status = 400, description = "Reason missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Payslip not found"),
        (status = 409, description = "Payslip is already withdrawn")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn withdraw_payslip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<PayslipWithdrawInput>,
) -> Result<impl Responder, AppError> {
    auth.require_admin_level()?;
    let actor = auth.actor()?;

    let payslip = payroll::withdraw_payslip(
        pool.get_ref(),
        actor.employee_id,
        path.into_inner(),
        &payload.reason,
    )
    .await?;
    Ok(HttpResponse::Ok().json(payslip))
}
