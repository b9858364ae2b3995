// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DueSoon,
    Overdue,
    Reminder,
    System,
    Approval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub obligation_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationStats {
    pub total: i64,
    pub unread: i64,
    pub read: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "success")]
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self { status: "success".to_string() }
    }
}

/// Notificação ainda não gravada.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub obligation_id: Option<i64>,
    pub kind: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
}
