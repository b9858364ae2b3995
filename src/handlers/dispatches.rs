// src/handlers/dispatches.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, RoleAdmin},
    },
    models::dispatch::{
        CreateDispatchPayload, CreateSubtaskPayload, Dispatch, DispatchFilter, DispatchNotificationsResult,
        DispatchProgress, RecalculateResult, Subtask, UpdateDispatchPayload, UpdateSubtaskPayload,
    },
};

// =============================================================================
//  ÁREA 1: DESPACHOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/dispatches/",
    tag = "Dispatches",
    params(DispatchFilter),
    responses((status = 200, description = "Despachos com subtarefas", body = Vec<Dispatch>)),
    security(("api_jwt" = []))
)]
pub async fn list_dispatches(
    State(app_state): State<AppState>,
    Query(filter): Query<DispatchFilter>,
) -> Result<Json<Vec<Dispatch>>, AppError> {
    Ok(Json(app_state.dispatch_service.list(&filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/dispatches/",
    tag = "Dispatches",
    request_body = CreateDispatchPayload,
    responses(
        (status = 201, description = "Despacho criado", body = Dispatch),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_dispatch(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateDispatchPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let dispatch = app_state.dispatch_service.create(&payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(dispatch)))
}

#[utoipa::path(
    get,
    path = "/api/dispatches/{id}/",
    tag = "Dispatches",
    params(("id" = Uuid, Path, description = "ID do despacho")),
    responses(
        (status = 200, description = "Despacho", body = Dispatch),
        (status = 404, description = "Despacho não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dispatch(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Dispatch>, AppError> {
    Ok(Json(app_state.dispatch_service.get(id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/dispatches/{id}/",
    tag = "Dispatches",
    params(("id" = Uuid, Path, description = "ID do despacho")),
    request_body = UpdateDispatchPayload,
    responses((status = 200, description = "Despacho atualizado", body = Dispatch)),
    security(("api_jwt" = []))
)]
pub async fn update_dispatch(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDispatchPayload>,
) -> Result<Json<Dispatch>, AppError> {
    Ok(Json(app_state.dispatch_service.update(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/dispatches/{id}/",
    tag = "Dispatches",
    params(("id" = Uuid, Path, description = "ID do despacho")),
    responses((status = 204, description = "Despacho excluído")),
    security(("api_jwt" = []))
)]
pub async fn delete_dispatch(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.dispatch_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/dispatches/{id}/progress/",
    tag = "Dispatches",
    params(("id" = Uuid, Path, description = "ID do despacho")),
    responses((status = 200, description = "Progresso calculado", body = DispatchProgress)),
    security(("api_jwt" = []))
)]
pub async fn dispatch_progress(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DispatchProgress>, AppError> {
    Ok(Json(app_state.dispatch_service.progress(id).await?))
}

// =============================================================================
//  ÁREA 2: SUBTAREFAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/dispatches/{id}/subtasks/",
    tag = "Dispatches",
    params(("id" = Uuid, Path, description = "ID do despacho")),
    responses((status = 200, description = "Subtarefas em ordem", body = Vec<Subtask>)),
    security(("api_jwt" = []))
)]
pub async fn list_subtasks(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Subtask>>, AppError> {
    Ok(Json(app_state.dispatch_service.subtasks(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/dispatches/{id}/subtasks/",
    tag = "Dispatches",
    params(("id" = Uuid, Path, description = "ID do despacho")),
    request_body = CreateSubtaskPayload,
    responses((status = 201, description = "Subtarefa criada", body = Subtask)),
    security(("api_jwt" = []))
)]
pub async fn create_subtask(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSubtaskPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let subtask = app_state.dispatch_service.add_subtask(id, &payload).await?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

#[utoipa::path(
    patch,
    path = "/api/dispatches/{id}/subtasks/{subtask_id}/",
    tag = "Dispatches",
    params(
        ("id" = Uuid, Path, description = "ID do despacho"),
        ("subtask_id" = Uuid, Path, description = "ID da subtarefa")
    ),
    request_body = UpdateSubtaskPayload,
    responses((status = 200, description = "Subtarefa atualizada", body = Subtask)),
    security(("api_jwt" = []))
)]
pub async fn update_subtask(
    State(app_state): State<AppState>,
    Path((id, subtask_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateSubtaskPayload>,
) -> Result<Json<Subtask>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.dispatch_service.update_subtask(id, subtask_id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/dispatches/{id}/subtasks/{subtask_id}/",
    tag = "Dispatches",
    params(
        ("id" = Uuid, Path, description = "ID do despacho"),
        ("subtask_id" = Uuid, Path, description = "ID da subtarefa")
    ),
    responses((status = 204, description = "Subtarefa excluída")),
    security(("api_jwt" = []))
)]
pub async fn delete_subtask(
    State(app_state): State<AppState>,
    Path((id, subtask_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    app_state.dispatch_service.delete_subtask(id, subtask_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 3: ROTINAS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/dispatches/progress/recalculate/",
    tag = "Dispatches",
    responses((status = 200, description = "Despachos recalculados", body = RecalculateResult)),
    security(("api_jwt" = []))
)]
pub async fn recalculate(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
) -> Result<Json<RecalculateResult>, AppError> {
    Ok(Json(app_state.dispatch_service.recalculate_all().await?))
}

#[utoipa::path(
    post,
    path = "/api/dispatches/notifications/run/",
    tag = "Dispatches",
    responses((status = 200, description = "Lembretes criados", body = DispatchNotificationsResult)),
    security(("api_jwt" = []))
)]
pub async fn run_notifications(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
) -> Result<Json<DispatchNotificationsResult>, AppError> {
    Ok(Json(app_state.dispatch_service.run_notifications().await?))
}
