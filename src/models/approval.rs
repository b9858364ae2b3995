// src/models/approval.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::submission::{ApprovalStatus, AttachmentKind, SubmissionType};

// ===== FILA DE APROVAÇÃO =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PendingFilter {
    pub company: Option<i64>,
    pub obligation_type: Option<i64>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyRef {
    pub id: i64,
    pub name: String,
    pub cnpj: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ObligationRef {
    pub id: i64,
    pub name: String,
    pub obligation_type: String,
    pub state: String,
    pub competence: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRef {
    pub id: Option<i64>,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentRef {
    pub id: i64,
    pub kind: AttachmentKind,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingApproval {
    pub id: i64,
    pub company: CompanyRef,
    pub obligation: ObligationRef,
    pub delivery_date: NaiveDate,
    pub delivered_at: DateTime<Utc>,
    pub delivered_by: UserRef,
    pub submission_type: SubmissionType,
    pub comments: Option<String>,
    pub attachments_count: usize,
    pub attachments: Vec<AttachmentRef>,
    pub approval_status: ApprovalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingList {
    pub count: usize,
    pub results: Vec<PendingApproval>,
}

// ===== DECISÕES =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DecisionPayload {
    #[schema(example = "Recibo ilegível")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionOutcome {
    pub id: i64,
    pub approval_status: ApprovalStatus,
    pub approval_decision_at: Option<DateTime<Utc>>,
    pub approval_decision_by: Option<String>,
    pub approval_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionResult {
    pub message: String,
    pub submission: DecisionOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResubmittedSubmission {
    pub id: i64,
    pub approval_status: ApprovalStatus,
    pub delivery_date: NaiveDate,
    pub submission_type: SubmissionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResubmitResult {
    pub message: String,
    pub submission: ResubmittedSubmission,
}

// ===== TIMELINE =====

/// Rótulo, ícone e cor usados pela interface para um status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusInfo {
    pub label: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Actor {
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimelineEvent {
    #[schema(example = "approved")]
    pub event: String,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub by: Option<Actor>,
    pub comment: Option<String>,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimelineSubmission {
    pub id: i64,
    pub company: String,
    pub obligation: String,
    pub competence: String,
    pub delivery_date: NaiveDate,
    pub submission_type: SubmissionType,
    pub approval_status: ApprovalStatus,
    pub status_info: StatusInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Timeline {
    pub submission: TimelineSubmission,
    pub timeline: Vec<TimelineEvent>,
}

// ===== MINHAS ENTREGAS =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyDeliveriesFilter {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyDelivery {
    pub id: i64,
    pub company: String,
    pub company_cnpj: Option<String>,
    pub obligation: String,
    pub obligation_type: String,
    pub state: String,
    pub competence: String,
    pub delivery_date: NaiveDate,
    pub delivered_at: DateTime<Utc>,
    pub submission_type: SubmissionType,
    pub approval_status: ApprovalStatus,
    pub approval_comment: Option<String>,
    pub approval_decision_at: Option<DateTime<Utc>>,
    pub approval_decision_by: Option<String>,
    pub attachments_count: i64,
    pub can_resubmit: bool,
    pub status_info: StatusInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyDeliveries {
    pub count: usize,
    pub results: Vec<MyDelivery>,
}

/// Dados do reenvio (multipart de POST /approvals/{id}/resubmit/).
#[derive(Debug, Clone)]
pub struct Resubmission {
    pub delivery_date: NaiveDate,
    pub comments: Option<String>,
    pub receipt: Option<crate::models::submission::UploadedFile>,
    pub attachments: Vec<crate::models::submission::UploadedFile>,
}
