// src/models/recurrence.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::obligation::validate_competence;

fn default_count() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecurrenceRequest {
    pub company_id: i64,
    pub state_id: i64,
    pub obligation_type_id: i64,
    /// Quando ausente, usa o nome do tipo de obrigação
    pub obligation_name: Option<String>,
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 60, message = "A quantidade deve estar entre 1 e 60."))]
    #[schema(example = 3)]
    pub count: u32,
    #[validate(custom(function = "validate_competence"))]
    #[schema(example = "01/2025")]
    pub start_competence: Option<String>,
    pub start_due_date: Option<NaiveDate>,
    pub start_delivery_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    Existing,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecurrenceBase {
    pub id: Option<i64>,
    pub competence: String,
    pub due_date: NaiveDate,
    pub delivery_deadline: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: BaseKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProposedObligation {
    pub competence: String,
    pub due_date: NaiveDate,
    pub delivery_deadline: Option<NaiveDate>,
    pub would_conflict: bool,
    pub conflict_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecurrencePreview {
    pub base_used: RecurrenceBase,
    pub proposed: Vec<ProposedObligation>,
    pub count_requested: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkippedProposal {
    pub competence: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedObligationRef {
    pub id: i64,
    pub competence: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateSummary {
    pub created_count: usize,
    pub skipped_count: usize,
    pub total_requested: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecurrenceGenerateResult {
    pub created: Vec<i64>,
    pub skipped: Vec<SkippedProposal>,
    pub base_used: RecurrenceBase,
    pub last_created: Option<CreatedObligationRef>,
    pub summary: GenerateSummary,
}
