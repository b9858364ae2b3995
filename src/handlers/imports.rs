// src/handlers/imports.rs

use axum::{
    extract::{Multipart, Path, State},
    response::Response,
    Json,
};

use crate::{
    common::{error::AppError, upload::MultipartForm, xlsx},
    config::AppState,
    handlers::file_response,
    middleware::rbac::{RequireRole, RoleAdmin},
    models::import::{ImportSummary, TemplateKind},
    services::import_service::template_xlsx,
};

#[utoipa::path(
    get,
    path = "/api/templates/{kind}/",
    tag = "Imports",
    params(("kind" = String, Path, description = "companies | obligations | deliveries")),
    responses(
        (status = 200, description = "Modelo .xlsx", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 404, description = "Modelo desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn template(Path(kind): Path<String>) -> Result<Response, AppError> {
    let kind = TemplateKind::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("Modelo '{kind}' não encontrado")))?;
    Ok(file_response(kind.filename(), xlsx::CONTENT_TYPE, template_xlsx(kind)?))
}

async fn uploaded_sheet(multipart: Multipart) -> Result<crate::models::submission::UploadedFile, AppError> {
    MultipartForm::read(multipart)
        .await?
        .take_file("file")
        .ok_or_else(|| AppError::field("file", "Envie a planilha."))
}

/// Multipart: `file` (CSV de empresas).
#[utoipa::path(
    post,
    path = "/api/imports/companies/",
    tag = "Imports",
    responses((status = 200, description = "Resumo da importação", body = ImportSummary)),
    security(("api_jwt" = []))
)]
pub async fn import_companies(
    State(app_state): State<AppState>,
    _admin: RequireRole<RoleAdmin>,
    multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let file = uploaded_sheet(multipart).await?;
    Ok(Json(app_state.import_service.import_companies(&file).await?))
}

/// Multipart: `file` (CSV de obrigações).
#[utoipa::path(
    post,
    path = "/api/imports/obligations/",
    tag = "Imports",
    responses((status = 200, description = "Resumo da importação", body = ImportSummary)),
    security(("api_jwt" = []))
)]
pub async fn import_obligations(
    State(app_state): State<AppState>,
    admin: RequireRole<RoleAdmin>,
    multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let file = uploaded_sheet(multipart).await?;
    Ok(Json(app_state.import_service.import_obligations(admin.user().id, &file).await?))
}
