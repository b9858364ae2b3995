// src/client/api/obligations.rs

use serde_json::json;

use crate::{
    client::{error::ClientResult, forms::ObligationForm, ApiClient},
    models::{
        obligation::{BulkDeleteResult, Obligation, ObligationFilter, UpdateObligationPayload},
        recurrence::{RecurrenceGenerateResult, RecurrencePreview, RecurrenceRequest},
    },
};

impl ApiClient {
    pub async fn obligations(&self, filter: &ObligationFilter) -> ClientResult<Vec<Obligation>> {
        self.transport().get_query("obligations/", filter).await
    }

    pub async fn obligation(&self, id: i64) -> ClientResult<Obligation> {
        self.transport().get(&format!("obligations/{id}/")).await
    }

    /// Confere os campos obrigatórios antes de enviar.
    pub async fn create_obligation(&self, form: &ObligationForm) -> ClientResult<Obligation> {
        let payload = form.to_payload()?;
        self.transport().post("obligations/", &payload).await
    }

    pub async fn update_obligation(&self, id: i64, patch: &UpdateObligationPayload) -> ClientResult<Obligation> {
        self.transport().patch(&format!("obligations/{id}/"), patch).await
    }

    pub async fn delete_obligation(&self, id: i64) -> ClientResult<()> {
        self.transport().delete(&format!("obligations/{id}/")).await
    }

    pub async fn bulk_delete_obligations(&self, ids: &[i64]) -> ClientResult<BulkDeleteResult> {
        self.transport().post("obligations/bulk-delete/", &json!({ "ids": ids })).await
    }

    pub async fn recurrence_preview(&self, request: &RecurrenceRequest) -> ClientResult<RecurrencePreview> {
        self.transport().post("obligations/recurrence/preview/", request).await
    }

    pub async fn recurrence_generate(&self, request: &RecurrenceRequest) -> ClientResult<RecurrenceGenerateResult> {
        self.transport().post("obligations/recurrence/generate/", request).await
    }
}
