// src/models/obligation.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::domain::competence::Competence;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ObligationStatus {
    #[default]
    Pendente,
    Atrasado,
    Entregue,
}

impl ObligationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pendente" => Some(Self::Pendente),
            "atrasado" => Some(Self::Atrasado),
            "entregue" => Some(Self::Entregue),
            _ => None,
        }
    }
}

// Linha de obrigação com os nomes das referências já resolvidos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Obligation {
    pub id: i64,
    pub company_id: i64,
    pub company_name: String,
    pub company_cnpj: Option<String>,
    pub state_id: i64,
    pub state_code: String,
    pub obligation_type_id: i64,
    pub obligation_type_name: String,
    pub obligation_name: String,
    #[schema(example = "03/2025")]
    pub competence: String,
    pub due_date: NaiveDate,
    pub delivery_deadline: Option<NaiveDate>,
    pub responsible_user_id: Option<i64>,
    pub responsible_username: Option<String>,
    pub validity_start_date: Option<NaiveDate>,
    pub validity_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub has_submission: bool,
    #[serde(default)]
    pub has_approved_submission: bool,

    // Calculado na camada de serviço
    #[sqlx(skip)]
    #[serde(default)]
    pub status: ObligationStatus,
}

pub(crate) fn validate_competence(value: &str) -> Result<(), ValidationError> {
    Competence::parse(value).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("competence");
        err.message = Some("A competência deve estar no formato MM/AAAA.".into());
        err
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateObligationPayload {
    pub company_id: i64,
    pub state_id: i64,
    pub obligation_type_id: i64,
    #[validate(length(min = 1, message = "O nome da obrigação é obrigatório."))]
    #[schema(example = "SPED Fiscal")]
    pub obligation_name: String,
    #[validate(custom(function = "validate_competence"))]
    #[schema(example = "03/2025")]
    pub competence: String,
    pub due_date: NaiveDate,
    pub delivery_deadline: Option<NaiveDate>,
    pub responsible_user_id: Option<i64>,
    pub validity_start_date: Option<NaiveDate>,
    pub validity_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateObligationPayload {
    pub company_id: Option<i64>,
    pub state_id: Option<i64>,
    pub obligation_type_id: Option<i64>,
    #[validate(length(min = 1, message = "O nome da obrigação é obrigatório."))]
    pub obligation_name: Option<String>,
    #[validate(custom(function = "validate_competence"))]
    pub competence: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub delivery_deadline: Option<NaiveDate>,
    pub responsible_user_id: Option<i64>,
    pub validity_start_date: Option<NaiveDate>,
    pub validity_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ObligationFilter {
    pub company: Option<i64>,
    /// Sigla da UF
    pub state: Option<String>,
    pub obligation_type: Option<i64>,
    pub competence: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeletePayload {
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResult {
    pub deleted: u64,
}

/// Obrigação pronta para inserção, já validada.
#[derive(Debug, Clone)]
pub struct NewObligation {
    pub company_id: i64,
    pub state_id: i64,
    pub obligation_type_id: i64,
    pub obligation_name: String,
    pub competence: String,
    pub due_date: NaiveDate,
    pub delivery_deadline: Option<NaiveDate>,
    pub responsible_user_id: Option<i64>,
    pub validity_start_date: Option<NaiveDate>,
    pub validity_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
}

impl NewObligation {
    /// Aplica um PATCH sobre a obrigação atual.
    pub fn merged(current: &Obligation, patch: &UpdateObligationPayload) -> Self {
        Self {
            company_id: patch.company_id.unwrap_or(current.company_id),
            state_id: patch.state_id.unwrap_or(current.state_id),
            obligation_type_id: patch.obligation_type_id.unwrap_or(current.obligation_type_id),
            obligation_name: patch
                .obligation_name
                .clone()
                .unwrap_or_else(|| current.obligation_name.clone()),
            competence: patch.competence.clone().unwrap_or_else(|| current.competence.clone()),
            due_date: patch.due_date.unwrap_or(current.due_date),
            delivery_deadline: patch.delivery_deadline.or(current.delivery_deadline),
            responsible_user_id: patch.responsible_user_id.or(current.responsible_user_id),
            validity_start_date: patch.validity_start_date.or(current.validity_start_date),
            validity_end_date: patch.validity_end_date.or(current.validity_end_date),
            notes: patch.notes.clone().or_else(|| current.notes.clone()),
            created_by: current.created_by,
        }
    }

    /// Início da vigência não pode ser posterior ao fim.
    pub fn validity_is_consistent(&self) -> bool {
        match (self.validity_start_date, self.validity_end_date) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}

impl From<(&CreateObligationPayload, i64)> for NewObligation {
    fn from((payload, created_by): (&CreateObligationPayload, i64)) -> Self {
        Self {
            company_id: payload.company_id,
            state_id: payload.state_id,
            obligation_type_id: payload.obligation_type_id,
            obligation_name: payload.obligation_name.trim().to_string(),
            competence: payload.competence.clone(),
            due_date: payload.due_date,
            delivery_deadline: payload.delivery_deadline,
            responsible_user_id: payload.responsible_user_id,
            validity_start_date: payload.validity_start_date,
            validity_end_date: payload.validity_end_date,
            notes: payload.notes.clone(),
            created_by: Some(created_by),
        }
    }
}
