use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::employee::EmployeeRecord;
use crate::model::leave_balance::{LeaveAdjustmentInput, LeaveBalance, LeaveBalanceView};
use crate::repository::{
    audit, balance as balance_repo, employee as employee_repo, leave_type as leave_type_repo,
};
use crate::service::leave_policy::Actor;
use crate::service::ledger;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    /// Defaults to the current year
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/leave-balances/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balances to list"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Balances seeded so far for the year", body = [LeaveBalanceView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the employee, their manager or an admin"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn employee_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<BalanceQuery>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let employee_id = path.into_inner();
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let mut conn = pool.acquire().await?;
    let employee = employee_repo::find(&mut conn, employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    ensure_may_view(actor, &employee)?;

    let balances = balance_repo::list_for_employee(&mut conn, employee.id, year).await?;
    Ok(HttpResponse::Ok().json(balances))
}

#[utoipa::path(
    get,
    path = "/api/leave-balances/employee/{employee_id}/type/{leave_type_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        ("leave_type_id" = u64, Path, description = "Leave type ID"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Balance for the year", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the employee, their manager or an admin"),
        (status = 404, description = "No balance yet for this year", body = Object, example = json!({
            "success": false,
            "error": "Leave balance not found for this year"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
    query: web::Query<BalanceQuery>,
) -> Result<impl Responder, AppError> {
    let actor = auth.actor()?;
    let (employee_id, leave_type_id) = path.into_inner();
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let mut conn = pool.acquire().await?;
    let employee = employee_repo::find(&mut conn, employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    ensure_may_view(actor, &employee)?;

    let balance = ledger::get_balance(&mut conn, employee.id, leave_type_id, year).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[utoipa::path(
    post,
    path = "/api/leave-balances/adjust",
    request_body = LeaveAdjustmentInput,
    responses(
        (status = 200, description = "Balance after the adjustment", body = LeaveBalance),
        (status = 400, description = "Invalid input or closing would go negative"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee or leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn adjust_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<LeaveAdjustmentInput>,
) -> Result<impl Responder, AppError> {
    auth.require_admin_level()?;
    let actor = auth.actor()?;
    let input = payload.into_inner();

    if !input.quantity.is_finite() || input.quantity == 0.0 {
        return Err(AppError::validation("quantity must be a non-zero number of days"));
    }
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("reason is required"));
    }
    let year = input.year.unwrap_or_else(|| Utc::now().year());

    let mut tx = pool.begin().await?;
    let employee = employee_repo::find(&mut *tx, input.employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    let leave_type = leave_type_repo::find(&mut *tx, input.leave_type_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave type not found"))?;

    let balance = ledger::adjust(
        &mut *tx,
        employee.id,
        &leave_type,
        year,
        input.quantity,
        reason,
        actor.employee_id,
    )
    .await?;

    audit::add_log(
        &mut *tx,
        actor.employee_id,
        audit::COMPONENT_LEAVE_BALANCE,
        "adjust",
        Some(balance.id),
        json!({
            "employee_id": employee.id,
            "leave_type_id": leave_type.id,
            "year": year,
            "quantity": input.quantity,
            "reason": reason,
        }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        employee_id = employee.id,
        leave_type_id = leave_type.id,
        year,
        quantity = input.quantity,
        "Leave balance adjusted"
    );
    Ok(HttpResponse::Ok().json(balance))
}

fn ensure_may_view(actor: Actor, employee: &EmployeeRecord) -> Result<(), AppError> {
    let allowed = actor.employee_id == employee.id
        || actor.role.is_admin_level()
        || employee.reports_to(actor.employee_id);
    if !allowed {
        return Err(AppError::forbidden(
            "You can only view your own or your direct reports' balances",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn employee() -> EmployeeRecord {
        EmployeeRecord {
            id: 20,
            full_name: "Meera Iyer".into(),
            email: "meera@example.com".into(),
            role: Role::Employee,
            manager_id: Some(7),
            salary: 42000.0,
            status: "active".into(),
            deleted: false,
        }
    }

    fn actor(employee_id: u64, role: Role) -> Actor {
        Actor { employee_id, role }
    }

    #[test]
    fn balances_visible_to_self_manager_and_admins() {
        assert!(ensure_may_view(actor(20, Role::Employee), &employee()).is_ok());
        assert!(ensure_may_view(actor(7, Role::Manager), &employee()).is_ok());
        assert!(ensure_may_view(actor(1, Role::Admin), &employee()).is_ok());
        assert!(ensure_may_view(actor(8, Role::Manager), &employee()).is_err());
        assert!(ensure_may_view(actor(21, Role::Employee), &employee()).is_err());
    }
}
