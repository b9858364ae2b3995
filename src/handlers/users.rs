// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{RequireRole, RoleAdmin},
    models::user_admin::{
        AdminUser, AdminUserList, ChangePasswordPayload, CreateUserPayload, MessageResponse, RoleChanged,
        SetRolePayload, UserDeleted, UserHistory, UserStats,
    },
};

#[utoipa::path(
    get,
    path = "/api/users/admin/",
    tag = "Users",
    responses(
        (status = 200, description = "Usuários com papel e status", body = AdminUserList),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
) -> Result<Json<AdminUserList>, AppError> {
    Ok(Json(app_state.user_admin_service.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/users/create/",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = AdminUser),
        (status = 409, description = "Usuário já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    admin: RequireRole<RoleAdmin>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = app_state.user_admin_service.create(admin.user().id, &payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/role/",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    request_body = SetRolePayload,
    responses(
        (status = 200, description = "Papel alterado", body = RoleChanged),
        (status = 400, description = "Último administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_role(
    State(app_state): State<AppState>,
    admin: RequireRole<RoleAdmin>,
    Path(id): Path<i64>,
    Json(payload): Json<SetRolePayload>,
) -> Result<Json<RoleChanged>, AppError> {
    Ok(Json(app_state.user_admin_service.set_role(admin.user().id, id, payload.role).await?))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/password/",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    request_body = ChangePasswordPayload,
    responses((status = 200, description = "Senha alterada", body = MessageResponse)),
    security(("api_jwt" = []))
)]
pub async fn set_password(
    State(app_state): State<AppState>,
    admin: RequireRole<RoleAdmin>,
    Path(id): Path<i64>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    let response = app_state
        .user_admin_service
        .set_password(admin.user().id, id, &payload.new_password)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário excluído", body = UserDeleted),
        (status = 400, description = "Auto exclusão ou último administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    admin: RequireRole<RoleAdmin>,
    Path(id): Path<i64>,
) -> Result<Json<UserDeleted>, AppError> {
    Ok(Json(app_state.user_admin_service.delete(admin.user().id, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/history/",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    responses((status = 200, description = "Ações registradas do usuário", body = UserHistory)),
    security(("api_jwt" = []))
)]
pub async fn user_history(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
    Path(id): Path<i64>,
) -> Result<Json<UserHistory>, AppError> {
    Ok(Json(app_state.user_admin_service.history(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/stats/",
    tag = "Users",
    responses((status = 200, description = "Totais por papel e status", body = UserStats)),
    security(("api_jwt" = []))
)]
pub async fn user_stats(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(app_state.user_admin_service.stats().await?))
}
