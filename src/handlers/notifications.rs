// src/handlers/notifications.rs

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::notification::{Notification, NotificationStats, StatusResponse},
};

#[utoipa::path(
    get,
    path = "/api/notifications/",
    tag = "Notifications",
    responses((status = 200, description = "Notificações do usuário, mais recentes primeiro", body = Vec<Notification>)),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(app_state.notification_service.list(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/notifications/stats/",
    tag = "Notifications",
    responses((status = 200, description = "Totais de lidas e não lidas", body = NotificationStats)),
    security(("api_jwt" = []))
)]
pub async fn notification_stats(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<NotificationStats>, AppError> {
    Ok(Json(app_state.notification_service.stats(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read/",
    tag = "Notifications",
    params(("id" = i64, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Marcada como lida", body = StatusResponse),
        (status = 404, description = "Notificação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, AppError> {
    app_state.notification_service.mark_read(user.id, id).await?;
    Ok(Json(StatusResponse::success()))
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all/",
    tag = "Notifications",
    responses((status = 200, description = "Todas marcadas como lidas", body = StatusResponse)),
    security(("api_jwt" = []))
)]
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<StatusResponse>, AppError> {
    app_state.notification_service.mark_all_read(user.id).await?;
    Ok(Json(StatusResponse::success()))
}
