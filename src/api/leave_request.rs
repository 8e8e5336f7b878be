use std::str::FromStr;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::model::leave::{
    Leave, LeaveAction, LeaveActionInput, LeaveAdminAddInput, LeaveApplyInput, LeaveStatus,
    LeaveTiming, LeaveTimingOption, LeaveView,
};
use crate::service::leave_workflow::{self, LeaveChange};
use crate::utils::notification::Notifier;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_PER_PAGE: u64 = 10;
const MAX_PER_PAGE: u64 = 100;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = "Pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveView>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

fn respond(change: LeaveChange, notifier: &Notifier, message: &str) -> HttpResponse {
    notifier.dispatch(change.notices);
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
        "data": change.leave,
    }))
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/apply",
    request_body(
        content = LeaveApplyInput,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = Leave),
        (status = 400, description = "Invalid input or insufficient balance", body = Object, example = json!({
            "success": false,
            "error": "Insufficient leave balance: available 2 day(s), requested 3 day(s)",
            "details": { "available": 2.0, "requested": 3.0 }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "Overlaps an existing Pending or APPROVED leave")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    notifier: web::Data<Notifier>,
    payload: web::Json<LeaveApplyInput>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let change =
        leave_workflow::apply(pool.get_ref(), actor, payload.into_inner(), config.leave_grace())
            .await?;

    notifier.dispatch(change.notices);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Leave request submitted",
        "data": change.leave,
    })))
}

/* =========================
Add approved leave for an employee
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/admin-add",
    request_body = LeaveAdminAddInput,
    responses(
        (status = 201, description = "Leave recorded as APPROVED and balance deducted", body = Leave),
        (status = 400, description = "Invalid input or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed to add leave for this employee"),
        (status = 404, description = "Employee or leave type not found"),
        (status = 409, description = "Overlaps an existing leave")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn admin_add_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    payload: web::Json<LeaveAdminAddInput>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let change = leave_workflow::admin_add(pool.get_ref(), actor, payload.into_inner()).await?;

    notifier.dispatch(change.notices);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Leave added",
        "data": change.leave,
    })))
}

/* =========================
Approve / reject
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/{leave_id}/action",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave to act on")
    ),
    request_body(
        content = LeaveActionInput,
        example = json!({ "action": "APPROVE" })
    ),
    responses(
        (status = 200, description = "Leave moved to its next status", body = Leave),
        (status = 400, description = "Unknown action or insufficient balance at final approval"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Self-approval, wrong role or not the direct manager"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is not in a status this action applies to", body = Object, example = json!({
            "success": false,
            "error": "Leave is APPROVED; only Pending, MANAGER_APPROVED or MANAGER_REJECTED leave can be actioned"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn action_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    path: web::Path<u64>,
    payload: web::Json<LeaveActionInput>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let action = LeaveAction::from_str(payload.action.trim())
        .map_err(|_| AppError::validation("action must be APPROVE or REJECT"))?;

    let change = leave_workflow::review(pool.get_ref(), actor, path.into_inner(), action).await?;
    let message = match action {
        LeaveAction::Approve => "Leave approved",
        LeaveAction::Reject => "Leave rejected",
    };
    Ok(respond(change, &notifier, message))
}

#[utoipa::path(
    post,
    path = "/api/leaves/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = Leave),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your leave"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is already in a terminal state")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let change = leave_workflow::cancel(pool.get_ref(), actor, path.into_inner()).await?;
    Ok(respond(change, &notifier, "Leave cancelled"))
}

#[utoipa::path(
    post,
    path = "/api/leaves/{leave_id}/withdraw",
    params(
        ("leave_id" = u64, Path, description = "ID of the approved leave to withdraw")
    ),
    responses(
        (status = 200, description = "Withdrawal requested (manager) or completed (admin)", body = Leave),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Own leave, wrong role or not the direct manager"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is not APPROVED or WITHDRAWAL_PENDING")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let change = leave_workflow::withdraw(pool.get_ref(), actor, path.into_inner()).await?;
    let message = if change.leave.status == LeaveStatus::Withdrawn {
        "Leave withdrawn"
    } else {
        "Leave withdrawal requested"
    };
    Ok(respond(change, &notifier, message))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list, scoped to the caller's role", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let filter = query.into_inner();

    let status = match filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(
            LeaveStatus::from_str(s)
                .map_err(|_| AppError::validation(format!("unknown leave status '{s}'")))?,
        ),
        None => None,
    };
    let page = filter.page.unwrap_or(1).max(1);
    let per_page = filter
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let (data, total) = leave_workflow::list(pool.get_ref(), actor, status, page, per_page).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leaves/timings",
    responses(
        (status = 200, description = "Leave timing options", body = [LeaveTimingOption]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_timings(_auth: AuthUser) -> impl Responder {
    let options: Vec<LeaveTimingOption> = LeaveTiming::ALL.into_iter().map(Into::into).collect();
    HttpResponse::Ok().json(options)
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave to fetch")
    ),
    responses(
        (status = 200, description = "Leave found", body = LeaveView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Leave not found", body = Object, example = json!({
            "success": false,
            "error": "Leave not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let view = leave_workflow::get(pool.get_ref(), actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}
