// src/models/report.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::models::{auth::UserSummary, company::Recurrence, obligation::ObligationStatus};

// Linha base de todos os relatórios: uma obrigação com o resumo das entregas
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReportRow {
    pub obligation_id: i64,
    pub company_id: i64,
    pub company: String,
    pub company_cnpj: Option<String>,
    pub state_id: i64,
    pub state_code: String,
    pub obligation_type_id: i64,
    pub obligation_type: String,
    pub recurrence: Recurrence,
    pub obligation_name: String,
    pub competence: String,
    pub due_date: NaiveDate,
    pub delivery_deadline: Option<NaiveDate>,
    pub responsible_user_id: Option<i64>,
    pub responsible_username: Option<String>,
    pub submissions_count: i64,
    pub has_approved_submission: bool,
    pub first_delivery_date: Option<NaiveDate>,
    pub last_delivery_date: Option<NaiveDate>,

    #[sqlx(skip)]
    #[serde(default)]
    pub status: ObligationStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCounts {
    pub total: usize,
    pub delivered: usize,
    pub pending: usize,
    pub overdue: usize,
    #[schema(value_type = f64, example = 33.33)]
    pub compliance_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Breakdown {
    pub key: String,
    pub label: String,
    pub total: usize,
    pub delivered: usize,
    pub pending: usize,
    pub overdue: usize,
}

// ===== RESUMO =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SummaryRow {
    pub company: String,
    pub state: String,
    pub obligation_type: String,
    pub competence: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportSummary {
    pub summary: Vec<SummaryRow>,
    pub total_obligations: i64,
    pub total_submissions: i64,
    pub obligations_with_submission: i64,
}

// ===== DETALHADO =====

/// Listas de IDs chegam separadas por vírgula (`company_id=1,2`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DetailedFilter {
    pub company_id: Option<String>,
    pub obligation_type_id: Option<String>,
    pub obligation_name: Option<String>,
    pub competence_start: Option<String>,
    pub competence_end: Option<String>,
    pub due_start: Option<NaiveDate>,
    pub due_end: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DetailedReport {
    pub filters_applied: DetailedFilter,
    pub totals: StatusCounts,
    pub by_company: Vec<Breakdown>,
    pub by_state: Vec<Breakdown>,
    pub by_type: Vec<Breakdown>,
    pub rows: Vec<ReportRow>,
}

// ===== AVANÇADO =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AdvancedFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<i64>,
    pub company_id: Option<i64>,
    pub state_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvancedReport {
    pub summary: StatusCounts,
    pub by_user: Vec<Breakdown>,
    pub by_company: Vec<Breakdown>,
    pub by_state: Vec<Breakdown>,
    pub by_obligation_type: Vec<Breakdown>,
    pub monthly_trend: Vec<Breakdown>,
    pub filters_applied: AdvancedFilter,
}

// ===== PERFORMANCE POR USUÁRIO =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Performance {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub avg_delivery_delay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyComparison {
    pub this_month: StatusCounts,
    pub last_month: StatusCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPerformanceReport {
    pub user: UserSummary,
    pub performance: Performance,
    pub monthly_comparison: MonthlyComparison,
    pub by_company: Vec<Breakdown>,
    pub by_obligation_type: Vec<Breakdown>,
}
