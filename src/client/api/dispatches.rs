// src/client/api/dispatches.rs

use uuid::Uuid;

use crate::{
    client::{error::ClientResult, ApiClient},
    models::dispatch::{
        CreateDispatchPayload, CreateSubtaskPayload, Dispatch, DispatchFilter, DispatchNotificationsResult,
        DispatchProgress, DispatchStatus, RecalculateResult, Subtask, UpdateDispatchPayload, UpdateSubtaskPayload,
    },
};

impl ApiClient {
    pub async fn dispatches(&self, filter: &DispatchFilter) -> ClientResult<Vec<Dispatch>> {
        self.transport().get_query("dispatches/", filter).await
    }

    pub async fn dispatch(&self, id: Uuid) -> ClientResult<Dispatch> {
        self.transport().get(&format!("dispatches/{id}/")).await
    }

    pub async fn create_dispatch(&self, payload: &CreateDispatchPayload) -> ClientResult<Dispatch> {
        self.transport().post("dispatches/", payload).await
    }

    pub async fn update_dispatch(&self, id: Uuid, patch: &UpdateDispatchPayload) -> ClientResult<Dispatch> {
        self.transport().patch(&format!("dispatches/{id}/"), patch).await
    }

    pub async fn delete_dispatch(&self, id: Uuid) -> ClientResult<()> {
        self.transport().delete(&format!("dispatches/{id}/")).await
    }

    pub async fn dispatch_progress(&self, id: Uuid) -> ClientResult<DispatchProgress> {
        self.transport().get(&format!("dispatches/{id}/progress/")).await
    }

    pub async fn subtasks(&self, dispatch_id: Uuid) -> ClientResult<Vec<Subtask>> {
        self.transport().get(&format!("dispatches/{dispatch_id}/subtasks/")).await
    }

    // Mutações de subtarefa devolvem a lista de despachos recarregada,
    // já com o progresso recalculado pelo servidor.

    pub async fn create_subtask(
        &self,
        dispatch_id: Uuid,
        payload: &CreateSubtaskPayload,
        filter: &DispatchFilter,
    ) -> ClientResult<Vec<Dispatch>> {
        let _: Subtask = self.transport().post(&format!("dispatches/{dispatch_id}/subtasks/"), payload).await?;
        self.dispatches(filter).await
    }

    pub async fn update_subtask(
        &self,
        dispatch_id: Uuid,
        subtask_id: Uuid,
        patch: &UpdateSubtaskPayload,
        filter: &DispatchFilter,
    ) -> ClientResult<Vec<Dispatch>> {
        let path = format!("dispatches/{dispatch_id}/subtasks/{subtask_id}/");
        let _: Subtask = self.transport().patch(&path, patch).await?;
        self.dispatches(filter).await
    }

    pub async fn set_subtask_status(
        &self,
        dispatch_id: Uuid,
        subtask_id: Uuid,
        status: DispatchStatus,
        filter: &DispatchFilter,
    ) -> ClientResult<Vec<Dispatch>> {
        let patch = UpdateSubtaskPayload { status: Some(status), ..UpdateSubtaskPayload::default() };
        self.update_subtask(dispatch_id, subtask_id, &patch, filter).await
    }

    pub async fn delete_subtask(
        &self,
        dispatch_id: Uuid,
        subtask_id: Uuid,
        filter: &DispatchFilter,
    ) -> ClientResult<Vec<Dispatch>> {
        self.transport()
            .delete(&format!("dispatches/{dispatch_id}/subtasks/{subtask_id}/"))
            .await?;
        self.dispatches(filter).await
    }

    pub async fn recalculate_dispatch_progress(&self) -> ClientResult<RecalculateResult> {
        self.transport().post("dispatches/progress/recalculate/", &serde_json::json!({})).await
    }

    pub async fn run_dispatch_notifications(&self) -> ClientResult<DispatchNotificationsResult> {
        self.transport().post("dispatches/notifications/run/", &serde_json::json!({})).await
    }
}
