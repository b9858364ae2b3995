// src/models/dispatch.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "dispatch_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchCategory {
    NotificacaoFiscal,
    Fiscalizacao,
    DespachoDecisorio,
}

impl DispatchCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DispatchCategory::NotificacaoFiscal => "Notificação Fiscal",
            DispatchCategory::Fiscalizacao => "Fiscalização",
            DispatchCategory::DespachoDecisorio => "Despacho Decisório",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "dispatch_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    #[default]
    NaoIniciado,
    EmAndamento,
    Concluido,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subtask {
    pub id: Uuid,
    pub dispatch_id: Uuid,
    pub name: String,
    pub status: DispatchStatus,
    #[sqlx(rename = "position")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Dispatch {
    pub id: Uuid,
    pub company_id: i64,
    pub company_name: String,
    pub category: DispatchCategory,
    pub title: Option<String>,
    pub responsible_id: Option<i64>,
    pub responsible_username: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(value_type = f64, example = 66.67)]
    pub progress_pct: Decimal,
    pub status: DispatchStatus,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

fn validate_period(payload: &CreateDispatchPayload) -> Result<(), validator::ValidationError> {
    if payload.end_date < payload.start_date {
        let mut err = validator::ValidationError::new("end_date");
        err.message = Some("A data final deve ser posterior à data inicial.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_period"))]
pub struct CreateDispatchPayload {
    pub company_id: i64,
    pub category: DispatchCategory,
    #[schema(example = "Intimação SEFAZ 2025/001")]
    pub title: Option<String>,
    pub responsible_id: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDispatchPayload {
    pub company_id: Option<i64>,
    pub category: Option<DispatchCategory>,
    pub title: Option<String>,
    pub responsible_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DispatchFilter {
    pub company: Option<i64>,
    pub category: Option<DispatchCategory>,
    pub status: Option<DispatchStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSubtaskPayload {
    #[validate(length(min = 1, message = "O nome da subtarefa é obrigatório."))]
    pub name: String,
    pub status: Option<DispatchStatus>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSubtaskPayload {
    #[validate(length(min = 1, message = "O nome da subtarefa é obrigatório."))]
    pub name: Option<String>,
    pub status: Option<DispatchStatus>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubtaskTotals {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchProgress {
    pub id: Uuid,
    #[schema(value_type = f64)]
    pub progress_pct: Decimal,
    pub status: DispatchStatus,
    pub totals: SubtaskTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecalculateResult {
    pub updated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchNotificationsResult {
    pub notifications_created: usize,
}
