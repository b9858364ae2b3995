// src/client/api/planning.rs

use serde_json::json;

use crate::{
    client::{error::ClientResult, ApiClient},
    models::planning::{CheckDueDatesRequest, CheckResult, EmailResult, GeneratePlanRequest, GeneratePlanResult},
};

impl ApiClient {
    pub async fn generate_plan(&self, request: &GeneratePlanRequest) -> ClientResult<GeneratePlanResult> {
        self.transport().post("planning/generate/", request).await
    }

    pub async fn check_due_dates(&self, request: &CheckDueDatesRequest) -> ClientResult<CheckResult> {
        self.transport().post("planning/check-due-dates/", request).await
    }

    pub async fn check_overdue(&self) -> ClientResult<CheckResult> {
        self.transport().post("planning/check-overdue/", &json!({})).await
    }

    pub async fn send_notification_emails(&self) -> ClientResult<EmailResult> {
        self.transport().post("planning/send-emails/", &json!({})).await
    }
}
