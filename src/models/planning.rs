// src/models/planning.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

fn default_months_ahead() -> u32 {
    3
}

fn default_days_ahead() -> i64 {
    7
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GeneratePlanRequest {
    #[serde(default = "default_months_ahead")]
    #[validate(range(min = 1, max = 36, message = "months_ahead deve estar entre 1 e 36."))]
    pub months_ahead: u32,
    pub company_id: Option<i64>,
    pub obligation_type_id: Option<i64>,
    pub obligation_name: Option<String>,
    pub state_id: Option<i64>,
}

impl Default for GeneratePlanRequest {
    fn default() -> Self {
        Self {
            months_ahead: default_months_ahead(),
            company_id: None,
            obligation_type_id: None,
            obligation_name: None,
            state_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratePlanResult {
    pub generated: usize,
    pub skipped: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckDueDatesRequest {
    #[serde(default = "default_days_ahead")]
    #[validate(range(min = 0, max = 90, message = "days_ahead deve estar entre 0 e 90."))]
    pub days_ahead: i64,
}

impl Default for CheckDueDatesRequest {
    fn default() -> Self {
        Self { days_ahead: default_days_ahead() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckResult {
    pub notifications_created: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailResult {
    pub emails_sent: usize,
    pub message: String,
}
