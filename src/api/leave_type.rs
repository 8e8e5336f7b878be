use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::leave_type::{LeaveType, LeaveTypeInput};
use crate::repository::{audit, leave_type as leave_type_repo};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;

#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses(
        (status = 200, description = "All leave types", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Type"
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, AppError> {
    let mut conn = pool.acquire().await?;
    let types = leave_type_repo::list(&mut conn).await?;
    Ok(HttpResponse::Ok().json(types))
}

#[utoipa::path(
    post,
    path = "/api/leave-types",
    request_body = LeaveTypeInput,
    responses(
        (status = 201, description = "Leave type created", body = LeaveType),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "A leave type with this name already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Type"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<LeaveTypeInput>,
) -> Result<impl Responder, AppError> {
    auth.require_admin_level()?;
    let actor_id = auth.actor()?.employee_id;
    let input = payload.into_inner().validated()?;

    let mut tx = pool.begin().await?;
    let id = leave_type_repo::insert(&mut *tx, &input).await?;
    audit::add_log(
        &mut *tx,
        actor_id,
        audit::COMPONENT_LEAVE_TYPE,
        "create",
        Some(id),
        json!({
            "name": input.name,
            "is_paid": input.is_paid,
            "default_entitlement": input.default_entitlement
        }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(leave_type_id = id, name = %input.name, "Leave type created");
    Ok(HttpResponse::Created().json(LeaveType {
        id,
        name: input.name,
        is_paid: input.is_paid,
        default_entitlement: input.default_entitlement,
    }))
}

#[utoipa::path(
    put,
    path = "/api/leave-types/{id}",
    params(
        ("id" = u64, Path, description = "Leave type ID")
    ),
    request_body = LeaveTypeInput,
    responses(
        (status = 200, description = "Leave type updated", body = LeaveType),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "is_paid cannot change once the type is in use")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Type"
)]
pub async fn update_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<LeaveTypeInput>,
) -> Result<impl Responder, AppError> {
    auth.require_admin_level()?;
    let actor_id = auth.actor()?.employee_id;
    let id = path.into_inner();
    let input = payload.into_inner().validated()?;

    let mut tx = pool.begin().await?;
    let existing = leave_type_repo::find(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave type not found"))?;

    // Payroll history depends on is_paid of every referenced type.
    if existing.is_paid != input.is_paid && leave_type_repo::usage_count(&mut *tx, id).await? > 0 {
        return Err(AppError::conflict(
            "is_paid cannot be changed on a leave type that is already in use",
        ));
    }

    leave_type_repo::update(&mut *tx, id, &input).await?;
    audit::add_log(
        &mut *tx,
        actor_id,
        audit::COMPONENT_LEAVE_TYPE,
        "update",
        Some(id),
        json!({
            "before": existing,
            "name": input.name,
            "is_paid": input.is_paid,
            "default_entitlement": input.default_entitlement
        }),
    )
    .await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(LeaveType {
        id,
        name: input.name,
        is_paid: input.is_paid,
        default_entitlement: input.default_entitlement,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/leave-types/{id}",
    params(
        ("id" = u64, Path, description = "Leave type ID")
    ),
    responses(
        (status = 200, description = "Leave type deleted", body = Object, example = json!({
            "success": true,
            "message": "Leave type deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "Leave type is referenced by leave or balance records", body = Object, example = json!({
            "success": false,
            "error": "Leave type is referenced by 3 leave or balance record(s) and cannot be deleted"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Type"
)]
pub async fn delete_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_admin_level()?;
    let actor_id = auth.actor()?.employee_id;
    let id = path.into_inner();

    let mut tx = pool.begin().await?;
    let existing = leave_type_repo::find(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave type not found"))?;

    let in_use = leave_type_repo::usage_count(&mut *tx, id).await?;
    if in_use > 0 {
        return Err(AppError::conflict(format!(
            "Leave type is referenced by {in_use} leave or balance record(s) and cannot be deleted"
        )));
    }

    leave_type_repo::delete(&mut *tx, id).await?;
    audit::add_log(
        &mut *tx,
        actor_id,
        audit::COMPONENT_LEAVE_TYPE,
        "delete",
        Some(id),
        json!({ "name": existing.name }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(leave_type_id = id, "Leave type deleted");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave type deleted"
    })))
}
