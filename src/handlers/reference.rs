// src/handlers/reference.rs

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
    models::{
        auth::UserSummary,
        company::{
            Company, CompanyObligationOption, CreateCompanyPayload, ObligationType, State as Uf,
            UpdateCompanyPayload,
        },
    },
};

// =============================================================================
//  ÁREA 1: DADOS DE REFERÊNCIA
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/states/",
    tag = "Reference",
    responses((status = 200, description = "UFs ordenadas pela sigla", body = Vec<Uf>)),
    security(("api_jwt" = []))
)]
pub async fn list_states(State(app_state): State<AppState>) -> Result<Json<Vec<Uf>>, AppError> {
    Ok(Json(app_state.company_service.list_states().await?))
}

#[utoipa::path(
    get,
    path = "/api/obligation-types/",
    tag = "Reference",
    responses((status = 200, description = "Tipos de obrigação", body = Vec<ObligationType>)),
    security(("api_jwt" = []))
)]
pub async fn list_obligation_types(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ObligationType>>, AppError> {
    Ok(Json(app_state.company_service.list_obligation_types().await?))
}

#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "Reference",
    responses((status = 200, description = "Usuários ativos", body = Vec<UserSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(State(app_state): State<AppState>) -> Result<Json<Vec<UserSummary>>, AppError> {
    Ok(Json(app_state.company_service.list_users().await?))
}

// =============================================================================
//  ÁREA 2: EMPRESAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/companies/",
    tag = "Companies",
    responses((status = 200, description = "Empresas com contadores", body = Vec<Company>)),
    security(("api_jwt" = []))
)]
pub async fn list_companies(State(app_state): State<AppState>) -> Result<Json<Vec<Company>>, AppError> {
    Ok(Json(app_state.company_service.list_companies().await?))
}

#[utoipa::path(
    post,
    path = "/api/companies/",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código ou CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let company = app_state.company_service.create_company(&payload).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}/",
    tag = "Companies",
    params(("id" = i64, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa", body = Company),
        (status = 404, description = "Empresa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Company>, AppError> {
    Ok(Json(app_state.company_service.get_company(id).await?))
}

/// O código da empresa é ignorado na edição.
#[utoipa::path(
    patch,
    path = "/api/companies/{id}/",
    tag = "Companies",
    params(("id" = i64, Path, description = "ID da empresa")),
    request_body = UpdateCompanyPayload,
    responses((status = 200, description = "Empresa atualizada", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<Json<Company>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.company_service.update_company(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}/",
    tag = "Companies",
    params(("id" = i64, Path, description = "ID da empresa")),
    responses((status = 204, description = "Empresa excluída")),
    security(("api_jwt" = []))
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.company_service.delete_company(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/companies/{id}/obligations/ (opções do formulário de entrega)
#[utoipa::path(
    get,
    path = "/api/companies/{id}/obligations/",
    tag = "Companies",
    params(("id" = i64, Path, description = "ID da empresa")),
    responses((status = 200, description = "Obrigações da empresa", body = Vec<CompanyObligationOption>)),
    security(("api_jwt" = []))
)]
pub async fn company_obligations(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CompanyObligationOption>>, AppError> {
    Ok(Json(app_state.company_service.company_obligations(id).await?))
}
