use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::holiday::{DEFAULT_HOLIDAY_TYPE, Holiday, HolidayInput, weekday_label};
use crate::repository::{audit, holiday as holiday_repo};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;

#[utoipa::path(
    get,
    path = "/api/holidays",
    responses(
        (status = 200, description = "Company holidays ordered by date", body = [Holiday]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, AppError> {
    let mut conn = pool.acquire().await?;
    let holidays = holiday_repo::list(&mut conn).await?;
    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = HolidayInput,
    responses(
        (status = 201, description = "Holiday added", body = Object, example = json!({
            "success": true,
            "id": 4,
            "day": "Saturday"
        })),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superadmin only"),
        (status = 409, description = "A holiday already exists on this date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn add_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<HolidayInput>,
) -> Result<impl Responder, AppError> {
    auth.require_superadmin()?;
    let actor = auth.actor()?;
    let input = payload.into_inner();

    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    let holiday_type = input
        .holiday_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_HOLIDAY_TYPE)
        .to_uppercase();
    let day = weekday_label(input.date);

    let mut tx = pool.begin().await?;
    let id = holiday_repo::insert(&mut *tx, name, input.date, day, &holiday_type).await?;
    audit::add_log(
        &mut *tx,
        actor.employee_id,
        audit::COMPONENT_HOLIDAY,
        "create",
        Some(id),
        json!({ "name": name, "date": input.date, "type": holiday_type }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(holiday_id = id, date = %input.date, "Holiday added");
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "id": id,
        "day": day
    })))
}

#[utoipa::path(
    delete,
    path = "/api/holidays/{id}",
    params(
        ("id" = u64, Path, description = "Holiday ID")
    ),
    responses(
        (status = 200, description = "Holiday deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superadmin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_superadmin()?;
    let actor = auth.actor()?;
    let id = path.into_inner();

    let mut tx = pool.begin().await?;
    if holiday_repo::delete(&mut *tx, id).await? == 0 {
        return Err(AppError::not_found("Holiday not found"));
    }
    audit::add_log(
        &mut *tx,
        actor.employee_id,
        audit::COMPONENT_HOLIDAY,
        "delete",
        Some(id),
        json!({}),
    )
    .await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Holiday deleted"
    })))
}
