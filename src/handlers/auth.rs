// src/handlers/auth.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AccessToken, CurrentUser, LoginPayload, RefreshPayload, TokenPair},
};

// POST /api/auth/login/
#[utoipa::path(
    post,
    path = "/api/auth/login/",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Tokens emitidos", body = TokenPair),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenPair>, AppError> {
    payload.validate()?;
    let tokens = app_state.auth_service.login(&payload.username, &payload.password).await?;
    Ok(Json(tokens))
}

// POST /api/auth/refresh/
#[utoipa::path(
    post,
    path = "/api/auth/refresh/",
    tag = "Auth",
    request_body = RefreshPayload,
    responses(
        (status = 200, description = "Novo access token", body = AccessToken),
        (status = 401, description = "Refresh token inválido")
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<AccessToken>, AppError> {
    payload.validate()?;
    let access = app_state.auth_service.refresh(&payload.refresh).await?;
    Ok(Json(AccessToken { access }))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/me/",
    tag = "Auth",
    responses((status = 200, description = "Usuário autenticado", body = CurrentUser)),
    security(("api_jwt" = []))
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<CurrentUser> {
    Json(CurrentUser::from(&user))
}
