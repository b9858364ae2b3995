// src/handlers/obligations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        obligation::{
            BulkDeletePayload, BulkDeleteResult, CreateObligationPayload, Obligation, ObligationFilter,
            UpdateObligationPayload,
        },
        recurrence::{RecurrenceGenerateResult, RecurrencePreview, RecurrenceRequest},
    },
};

// =============================================================================
//  ÁREA 1: CRUD
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/obligations/",
    tag = "Obligations",
    params(ObligationFilter),
    responses((status = 200, description = "Obrigações com status calculado", body = Vec<Obligation>)),
    security(("api_jwt" = []))
)]
pub async fn list_obligations(
    State(app_state): State<AppState>,
    Query(filter): Query<ObligationFilter>,
) -> Result<Json<Vec<Obligation>>, AppError> {
    Ok(Json(app_state.obligation_service.list(&filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/obligations/",
    tag = "Obligations",
    request_body = CreateObligationPayload,
    responses(
        (status = 201, description = "Obrigação criada", body = Obligation),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Obrigação duplicada para a competência")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_obligation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateObligationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let obligation = app_state.obligation_service.create(&payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(obligation)))
}

#[utoipa::path(
    get,
    path = "/api/obligations/{id}/",
    tag = "Obligations",
    params(("id" = i64, Path, description = "ID da obrigação")),
    responses(
        (status = 200, description = "Obrigação", body = Obligation),
        (status = 404, description = "Obrigação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_obligation(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Obligation>, AppError> {
    Ok(Json(app_state.obligation_service.get(id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/obligations/{id}/",
    tag = "Obligations",
    params(("id" = i64, Path, description = "ID da obrigação")),
    request_body = UpdateObligationPayload,
    responses((status = 200, description = "Obrigação atualizada", body = Obligation)),
    security(("api_jwt" = []))
)]
pub async fn update_obligation(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateObligationPayload>,
) -> Result<Json<Obligation>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.obligation_service.update(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/obligations/{id}/",
    tag = "Obligations",
    params(("id" = i64, Path, description = "ID da obrigação")),
    responses((status = 204, description = "Obrigação excluída")),
    security(("api_jwt" = []))
)]
pub async fn delete_obligation(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.obligation_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/obligations/bulk-delete/",
    tag = "Obligations",
    request_body = BulkDeletePayload,
    responses((status = 200, description = "Quantidade excluída", body = BulkDeleteResult)),
    security(("api_jwt" = []))
)]
pub async fn bulk_delete_obligations(
    State(app_state): State<AppState>,
    Json(payload): Json<BulkDeletePayload>,
) -> Result<Json<BulkDeleteResult>, AppError> {
    let deleted = app_state.obligation_service.bulk_delete(&payload.ids).await?;
    Ok(Json(BulkDeleteResult { deleted }))
}

// =============================================================================
//  ÁREA 2: RECORRÊNCIA (PRÉVIA / GERAÇÃO)
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/obligations/recurrence/preview/",
    tag = "Recurrence",
    request_body = RecurrenceRequest,
    responses(
        (status = 200, description = "Competências projetadas", body = RecurrencePreview),
        (status = 400, description = "Sem base ou tipo sem periodicidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn recurrence_preview(
    State(app_state): State<AppState>,
    Json(payload): Json<RecurrenceRequest>,
) -> Result<Json<RecurrencePreview>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.recurrence_service.preview(&payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/obligations/recurrence/generate/",
    tag = "Recurrence",
    request_body = RecurrenceRequest,
    responses((status = 201, description = "Obrigações geradas", body = RecurrenceGenerateResult)),
    security(("api_jwt" = []))
)]
pub async fn recurrence_generate(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<RecurrenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let result = app_state.recurrence_service.generate(&payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
