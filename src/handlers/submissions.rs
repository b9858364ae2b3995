// src/handlers/submissions.rs

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::{error::AppError, upload::MultipartForm, xlsx},
    config::AppState,
    handlers::file_response,
    middleware::auth::AuthenticatedUser,
    models::{
        import::TemplateKind,
        submission::{
            BulkAttachmentResult, BulkDeliveryResult, DeliveryFilter, DeliveryList, NewSubmission,
            SubmissionCreated, SubmissionType,
        },
    },
    services::import_service::template_xlsx,
};

/// Lê `submission_type`; ausente significa "decidir pelo histórico".
fn submission_type_field(form: &MultipartForm) -> Result<Option<SubmissionType>, AppError> {
    form.text("submission_type")
        .map(|raw| {
            SubmissionType::parse(raw)
                .ok_or_else(|| AppError::field("submission_type", "Use 'original' ou 'retificadora'."))
        })
        .transpose()
}

/// Multipart: `obligation`, `delivery_date`, `submission_type`, `comments`,
/// `receipt_file` e `attachments`.
#[utoipa::path(
    post,
    path = "/api/submissions/",
    tag = "Submissions",
    responses(
        (status = 201, description = "Entrega registrada", body = SubmissionCreated),
        (status = 400, description = "Dados inválidos ou 'original' após entrega existente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_submission(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let obligation_id = form
        .required_text("obligation")?
        .parse::<i64>()
        .map_err(|_| AppError::field("obligation", "Obrigação inválida."))?;

    let new = NewSubmission {
        obligation_id,
        delivery_date: form.required_date("delivery_date")?,
        submission_type: submission_type_field(&form)?,
        comments: form.text("comments").map(str::to_string),
        receipt: form.take_file("receipt_file"),
        attachments: form.take_files("attachments"),
    };

    let created = app_state.submission_service.create(user.id, new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/",
    tag = "Submissions",
    params(DeliveryFilter),
    responses((status = 200, description = "Entregas registradas", body = DeliveryList)),
    security(("api_jwt" = []))
)]
pub async fn list_deliveries(
    State(app_state): State<AppState>,
    Query(filter): Query<DeliveryFilter>,
) -> Result<Json<DeliveryList>, AppError> {
    Ok(Json(app_state.submission_service.list_deliveries(&filter).await?))
}

/// Multipart: `file` (CSV de entregas).
#[utoipa::path(
    post,
    path = "/api/deliveries/bulk/",
    tag = "Submissions",
    responses((status = 200, description = "Resumo do processamento", body = BulkDeliveryResult)),
    security(("api_jwt" = []))
)]
pub async fn bulk_deliveries(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> Result<Json<BulkDeliveryResult>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::field("file", "Envie a planilha de entregas."))?;

    Ok(Json(app_state.submission_service.bulk_deliveries(user.id, &file).await?))
}

/// Multipart: `files` nomeados `{CNPJ}_{MMAAAA}_{CHAVE}.ext`.
#[utoipa::path(
    post,
    path = "/api/deliveries/bulk-attachments/",
    tag = "Submissions",
    responses((status = 200, description = "Anexos vinculados", body = BulkAttachmentResult)),
    security(("api_jwt" = []))
)]
pub async fn bulk_attachments(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> Result<Json<BulkAttachmentResult>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let files = form.take_files("files");
    Ok(Json(app_state.submission_service.bulk_attachments(user.id, files).await?))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/template/",
    tag = "Submissions",
    responses((status = 200, description = "Modelo .xlsx de entregas", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")),
    security(("api_jwt" = []))
)]
pub async fn delivery_template() -> Result<Response, AppError> {
    let kind = TemplateKind::Deliveries;
    Ok(file_response(kind.filename(), xlsx::CONTENT_TYPE, template_xlsx(kind)?))
}
