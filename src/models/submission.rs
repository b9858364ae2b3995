// src/models/submission.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "submission_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionType {
    #[default]
    Original,
    Retificadora,
}

impl SubmissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionType::Original => "original",
            SubmissionType::Retificadora => "retificadora",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "original" => Some(Self::Original),
            "retificadora" => Some(Self::Retificadora),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    PendingReview,
    Approved,
    Rejected,
    NeedsRevision,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::PendingReview => "pending_review",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::NeedsRevision => "needs_revision",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending_review" => Some(Self::PendingReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "needs_revision" => Some(Self::NeedsRevision),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "attachment_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Receipt,
    Attachment,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Submission {
    pub id: i64,
    pub obligation_id: i64,
    pub delivered_by: Option<i64>,
    pub delivered_at: DateTime<Utc>,
    pub delivery_date: NaiveDate,
    pub comments: Option<String>,
    pub submission_type: SubmissionType,
    pub batch_id: Option<Uuid>,
    pub approval_status: ApprovalStatus,
    pub approval_decision_at: Option<DateTime<Utc>>,
    pub approval_decision_by: Option<i64>,
    pub approval_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attachment {
    pub id: i64,
    pub submission_id: i64,
    pub kind: AttachmentKind,
    pub filename: String,
    #[serde(skip)]
    pub stored_path: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub parsed_cnpj: Option<String>,
    pub parsed_period: Option<String>,
    pub parsed_obligation_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Arquivo recebido via multipart, ainda não persistido.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Dados de uma nova entrega (multipart de POST /submissions/).
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub obligation_id: i64,
    pub delivery_date: NaiveDate,
    pub submission_type: Option<SubmissionType>,
    pub comments: Option<String>,
    pub receipt: Option<UploadedFile>,
    pub attachments: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionCreated {
    pub id: i64,
    pub obligation_id: i64,
    pub submission_type: SubmissionType,
    pub approval_status: ApprovalStatus,
    pub delivery_date: NaiveDate,
    pub attachments: Vec<Attachment>,
}

// ===== LISTAGEM DE ENTREGAS =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeliveryFilter {
    pub company: Option<i64>,
    pub competence: Option<String>,
    /// Sigla da UF
    pub state: Option<String>,
    pub submission_type: Option<String>,
    pub batch_id: Option<Uuid>,
    pub approval_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DeliveryListItem {
    pub id: i64,
    pub obligation_id: i64,
    pub company: String,
    pub company_cnpj: Option<String>,
    pub obligation: String,
    pub competence: String,
    pub state: String,
    pub delivery_date: NaiveDate,
    pub delivered_at: DateTime<Utc>,
    pub delivered_by: Option<String>,
    pub submission_type: SubmissionType,
    pub comments: Option<String>,
    pub attachments_count: i64,
    pub batch_id: Option<Uuid>,
    pub approval_status: ApprovalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryList {
    pub deliveries: Vec<DeliveryListItem>,
    pub total: usize,
}

// ===== ENTREGAS EM MASSA =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeliveryResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedRow>,
    pub batch_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: String,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkAttachmentResult {
    pub attachments_linked: usize,
    pub skipped: Vec<SkippedFile>,
    pub message: String,
}
