// src/handlers/reports.rs

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use chrono::Local;

use crate::{
    common::{error::AppError, xlsx},
    config::AppState,
    handlers::file_response,
    models::report::{
        AdvancedFilter, AdvancedReport, DetailedFilter, DetailedReport, ReportSummary,
        UserPerformanceReport,
    },
};

#[utoipa::path(
    get,
    path = "/api/reports/summary/",
    tag = "Reports",
    responses((status = 200, description = "Contagens agrupadas", body = ReportSummary)),
    security(("api_jwt" = []))
)]
pub async fn summary(State(app_state): State<AppState>) -> Result<Json<ReportSummary>, AppError> {
    Ok(Json(app_state.report_service.summary().await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/detailed/",
    tag = "Reports",
    params(DetailedFilter),
    responses((status = 200, description = "Relatório detalhado", body = DetailedReport)),
    security(("api_jwt" = []))
)]
pub async fn detailed(
    State(app_state): State<AppState>,
    Query(filter): Query<DetailedFilter>,
) -> Result<Json<DetailedReport>, AppError> {
    Ok(Json(app_state.report_service.detailed(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/advanced/",
    tag = "Reports",
    params(AdvancedFilter),
    responses((status = 200, description = "Indicadores de conformidade", body = AdvancedReport)),
    security(("api_jwt" = []))
)]
pub async fn advanced(
    State(app_state): State<AppState>,
    Query(filter): Query<AdvancedFilter>,
) -> Result<Json<AdvancedReport>, AppError> {
    Ok(Json(app_state.report_service.advanced(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/user/{id}/",
    tag = "Reports",
    params(("id" = i64, Path, description = "ID do usuário")),
    responses((status = 200, description = "Desempenho do usuário", body = UserPerformanceReport)),
    security(("api_jwt" = []))
)]
pub async fn user_performance(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserPerformanceReport>, AppError> {
    Ok(Json(app_state.report_service.user_performance(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/export.csv",
    tag = "Reports",
    params(DetailedFilter),
    responses((status = 200, description = "Linhas do relatório detalhado", content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn export_csv(
    State(app_state): State<AppState>,
    Query(filter): Query<DetailedFilter>,
) -> Result<Response, AppError> {
    let csv = app_state.report_service.export_csv(&filter).await?;
    let filename = format!("relatorio_obrigacoes_{}.csv", Local::now().format("%Y%m%d"));
    Ok(file_response(&filename, "text/csv; charset=utf-8", csv.into_bytes()))
}

#[utoipa::path(
    get,
    path = "/api/reports/export.xlsx",
    tag = "Reports",
    params(DetailedFilter),
    responses((status = 200, description = "Linhas do relatório detalhado em planilha", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")),
    security(("api_jwt" = []))
)]
pub async fn export_xlsx(
    State(app_state): State<AppState>,
    Query(filter): Query<DetailedFilter>,
) -> Result<Response, AppError> {
    let bytes = app_state.report_service.export_xlsx(&filter).await?;
    let filename = format!("relatorio_obrigacoes_{}.xlsx", Local::now().format("%Y%m%d"));
    Ok(file_response(&filename, xlsx::CONTENT_TYPE, bytes))
}
