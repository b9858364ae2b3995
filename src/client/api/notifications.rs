// src/client/api/notifications.rs

use serde_json::json;

use crate::{
    client::{error::ClientResult, ApiClient},
    models::notification::{Notification, NotificationStats, StatusResponse},
};

impl ApiClient {
    pub async fn notifications(&self) -> ClientResult<Vec<Notification>> {
        self.transport().get("notifications/").await
    }

    pub async fn notification_stats(&self) -> ClientResult<NotificationStats> {
        self.transport().get("notifications/stats/").await
    }

    pub async fn mark_notification_read(&self, id: i64) -> ClientResult<StatusResponse> {
        self.transport().post(&format!("notifications/{id}/read/"), &json!({})).await
    }

    pub async fn mark_all_notifications_read(&self) -> ClientResult<StatusResponse> {
        self.transport().post("notifications/read-all/", &json!({})).await
    }
}
