// src/models/company.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// ===== REFERÊNCIAS =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct State {
    pub id: i64,
    #[schema(example = "SP")]
    pub code: String,
    #[schema(example = "São Paulo")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "recurrence_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Mensal,
    Bimestral,
    Trimestral,
    Semestral,
    Anual,
    Especifico,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ObligationType {
    pub id: i64,
    #[schema(example = "Federal")]
    pub name: String,
    pub description: Option<String>,
    pub recurrence: Recurrence,
    #[schema(example = 15)]
    pub due_day: i32,
}

// ===== EMPRESAS =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Company {
    pub id: i64,
    #[schema(example = "EMP001")]
    pub code: String,
    pub name: String,
    pub fantasy_name: Option<String>,
    #[schema(example = "12345678000190")]
    pub cnpj: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub responsible: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub obligations_count: i64,
    #[serde(default)]
    pub pending_obligations: i64,
    #[serde(default)]
    pub delivered_obligations: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, message = "O código da empresa é obrigatório."))]
    #[schema(example = "EMP001")]
    pub code: String,
    #[validate(length(min = 1, message = "A razão social é obrigatória."))]
    pub name: String,
    pub fantasy_name: Option<String>,
    pub cnpj: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub responsible: Option<String>,
    pub active: Option<bool>,
}

/// O código é imutável: não existe campo `code` aqui.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, message = "A razão social é obrigatória."))]
    pub name: Option<String>,
    pub fantasy_name: Option<String>,
    pub cnpj: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub responsible: Option<String>,
    pub active: Option<bool>,
}

// GET /companies/{id}/obligations/ (opções do formulário de entrega)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompanyObligationOption {
    pub id: i64,
    #[schema(example = "Federal - SPED Fiscal (SP)")]
    pub label: String,
    #[schema(example = "03/2025")]
    pub competence: String,
    pub due_date: NaiveDate,
    pub has_submission: bool,
}
