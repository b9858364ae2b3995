// src/handlers/planning.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{RequireRole, RoleAdmin},
    models::planning::{
        CheckDueDatesRequest, CheckResult, EmailResult, GeneratePlanRequest, GeneratePlanResult,
    },
};

#[utoipa::path(
    post,
    path = "/api/planning/generate/",
    tag = "Planning",
    request_body = GeneratePlanRequest,
    responses((status = 200, description = "Obrigações planejadas", body = GeneratePlanResult)),
    security(("api_jwt" = []))
)]
pub async fn generate(
    State(app_state): State<AppState>,
    admin: RequireRole<RoleAdmin>,
    payload: Option<Json<GeneratePlanRequest>>,
) -> Result<Json<GeneratePlanResult>, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    Ok(Json(app_state.planning_service.generate(&payload, admin.user().id).await?))
}

#[utoipa::path(
    post,
    path = "/api/planning/check-due-dates/",
    tag = "Planning",
    request_body = CheckDueDatesRequest,
    responses((status = 200, description = "Alertas de vencimento criados", body = CheckResult)),
    security(("api_jwt" = []))
)]
pub async fn check_due_dates(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
    payload: Option<Json<CheckDueDatesRequest>>,
) -> Result<Json<CheckResult>, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    Ok(Json(app_state.planning_service.check_due_dates(payload.days_ahead).await?))
}

#[utoipa::path(
    post,
    path = "/api/planning/check-overdue/",
    tag = "Planning",
    responses((status = 200, description = "Alertas de atraso criados", body = CheckResult)),
    security(("api_jwt" = []))
)]
pub async fn check_overdue(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
) -> Result<Json<CheckResult>, AppError> {
    Ok(Json(app_state.planning_service.check_overdue().await?))
}

#[utoipa::path(
    post,
    path = "/api/planning/send-emails/",
    tag = "Planning",
    responses((status = 200, description = "Resumos enviados por e-mail", body = EmailResult)),
    security(("api_jwt" = []))
)]
pub async fn send_emails(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
) -> Result<Json<EmailResult>, AppError> {
    Ok(Json(app_state.planning_service.send_emails().await?))
}
