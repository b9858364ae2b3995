// src/handlers/approvals.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    Json,
};

use crate::{
    common::{error::AppError, upload::MultipartForm},
    config::AppState,
    domain::approval::ApprovalAction,
    handlers::file_response,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, RoleApprover},
    },
    models::approval::{
        DecisionPayload, DecisionResult, MyDeliveries, MyDeliveriesFilter, PendingFilter, PendingList,
        ResubmitResult, Resubmission, Timeline,
    },
};

#[utoipa::path(
    get,
    path = "/api/approvals/pending/",
    tag = "Approvals",
    params(PendingFilter),
    responses(
        (status = 200, description = "Entregas aguardando revisão", body = PendingList),
        (status = 403, description = "Apenas aprovadores")
    ),
    security(("api_jwt" = []))
)]
pub async fn pending(
    State(app_state): State<AppState>,
    _approver: RequireRole<RoleApprover>,
    Query(filter): Query<PendingFilter>,
) -> Result<Json<PendingList>, AppError> {
    Ok(Json(app_state.approval_service.pending(&filter).await?))
}

// =============================================================================
//  ÁREA 1: DECISÕES
// =============================================================================

async fn decide(
    app_state: &AppState,
    approver: RequireRole<RoleApprover>,
    id: i64,
    action: ApprovalAction,
    payload: Option<Json<DecisionPayload>>,
) -> Result<Json<DecisionResult>, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let result = app_state
        .approval_service
        .decide(approver.user(), id, action, payload.comment.as_deref())
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/approvals/{id}/approve/",
    tag = "Approvals",
    params(("id" = i64, Path, description = "ID da entrega")),
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Entrega aprovada", body = DecisionResult),
        (status = 400, description = "Entrega não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve(
    State(app_state): State<AppState>,
    approver: RequireRole<RoleApprover>,
    Path(id): Path<i64>,
    payload: Option<Json<DecisionPayload>>,
) -> Result<Json<DecisionResult>, AppError> {
    decide(&app_state, approver, id, ApprovalAction::Approve, payload).await
}

#[utoipa::path(
    post,
    path = "/api/approvals/{id}/reject/",
    tag = "Approvals",
    params(("id" = i64, Path, description = "ID da entrega")),
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Entrega recusada", body = DecisionResult),
        (status = 400, description = "Comentário obrigatório ou entrega não pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject(
    State(app_state): State<AppState>,
    approver: RequireRole<RoleApprover>,
    Path(id): Path<i64>,
    payload: Option<Json<DecisionPayload>>,
) -> Result<Json<DecisionResult>, AppError> {
    decide(&app_state, approver, id, ApprovalAction::Reject, payload).await
}

#[utoipa::path(
    post,
    path = "/api/approvals/{id}/request-revision/",
    tag = "Approvals",
    params(("id" = i64, Path, description = "ID da entrega")),
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Revisão solicitada", body = DecisionResult),
        (status = 400, description = "Comentário obrigatório ou entrega não pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_revision(
    State(app_state): State<AppState>,
    approver: RequireRole<RoleApprover>,
    Path(id): Path<i64>,
    payload: Option<Json<DecisionPayload>>,
) -> Result<Json<DecisionResult>, AppError> {
    decide(&app_state, approver, id, ApprovalAction::RequestRevision, payload).await
}

// =============================================================================
//  ÁREA 2: REENVIO E HISTÓRICO
// =============================================================================

/// Multipart: `delivery_date`, `comments`, `receipt_file`, `attachments`.
/// O tipo do reenvio é sempre retificadora.
#[utoipa::path(
    post,
    path = "/api/approvals/{id}/resubmit/",
    tag = "Approvals",
    params(("id" = i64, Path, description = "ID da entrega")),
    responses(
        (status = 200, description = "Entrega reenviada", body = ResubmitResult),
        (status = 403, description = "Apenas o autor pode reenviar")
    ),
    security(("api_jwt" = []))
)]
pub async fn resubmit(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ResubmitResult>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    if form.text("submission_type").is_some_and(|t| t != "retificadora") {
        return Err(AppError::field("submission_type", "O reenvio deve ser do tipo retificadora."));
    }

    let resubmission = Resubmission {
        delivery_date: form.required_date("delivery_date")?,
        comments: form.text("comments").map(str::to_string),
        receipt: form.take_file("receipt_file"),
        attachments: form.take_files("attachments"),
    };

    Ok(Json(app_state.approval_service.resubmit(&user, id, resubmission).await?))
}

#[utoipa::path(
    get,
    path = "/api/approvals/{id}/timeline/",
    tag = "Approvals",
    params(("id" = i64, Path, description = "ID da entrega")),
    responses((status = 200, description = "Histórico da entrega", body = Timeline)),
    security(("api_jwt" = []))
)]
pub async fn timeline(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Timeline>, AppError> {
    Ok(Json(app_state.approval_service.timeline(&user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/approvals/{id}/attachments/{attachment_id}/download/",
    tag = "Approvals",
    params(
        ("id" = i64, Path, description = "ID da entrega"),
        ("attachment_id" = i64, Path, description = "ID do anexo")
    ),
    responses(
        (status = 200, description = "Conteúdo do anexo", content_type = "application/octet-stream"),
        (status = 403, description = "Sem acesso à entrega"),
        (status = 404, description = "Anexo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_attachment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, attachment_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let download = app_state.approval_service.download(&user, id, attachment_id).await?;
    Ok(file_response(&download.filename, &download.content_type, download.bytes))
}

#[utoipa::path(
    get,
    path = "/api/approvals/my-deliveries/",
    tag = "Approvals",
    params(MyDeliveriesFilter),
    responses((status = 200, description = "Entregas do usuário", body = MyDeliveries)),
    security(("api_jwt" = []))
)]
pub async fn my_deliveries(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<MyDeliveriesFilter>,
) -> Result<Json<MyDeliveries>, AppError> {
    Ok(Json(app_state.approval_service.my_deliveries(user.id, &filter).await?))
}
