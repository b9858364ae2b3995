// src/db/notification_repo.rs

use sqlx::{Executor, FromRow, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::notification::{NewNotification, Notification, NotificationStats},
};

const NOTIFICATION_COLUMNS: &str = r#"
    id, user_id, obligation_id, kind, priority, title, message, is_read, created_at, read_at
"#;

/// Usuário com notificações não lidas (resumo por e-mail).
#[derive(Debug, Clone, FromRow)]
pub struct UnreadDigest {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub unread: i64,
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn stats_for_user(&self, user_id: i64) -> Result<NotificationStats, AppError> {
        let stats = sqlx::query_as::<_, NotificationStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE NOT is_read) AS unread,
                COUNT(*) FILTER (WHERE is_read) AS read
            FROM notifications
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// `false` quando a notificação não existe ou pertence a outro usuário.
    pub async fn mark_read(&self, user_id: i64, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn create<'e, E>(&self, executor: E, new: &NewNotification) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (user_id, obligation_id, kind, priority, title, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.obligation_id)
        .bind(new.kind)
        .bind(new.priority)
        .bind(&new.title)
        .bind(&new.message)
        .fetch_one(executor)
        .await?;
        Ok(notification)
    }

    /// Grava no máximo uma notificação por (usuário, obrigação, tipo) ao dia.
    /// Sem obrigação, o título faz o papel da chave. Devolve `true` se gravou.
    pub async fn create_deduplicated(&self, new: &NewNotification) -> Result<bool, AppError> {
        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO notifications (user_id, obligation_id, kind, priority, title, message)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM notifications
                WHERE user_id = $1
                  AND obligation_id IS NOT DISTINCT FROM $2
                  AND kind = $3
                  AND created_at::date = CURRENT_DATE
                  AND ($2::BIGINT IS NOT NULL OR title = $5)
            )
            RETURNING id
            "#,
        )
        .bind(new.user_id)
        .bind(new.obligation_id)
        .bind(new.kind)
        .bind(new.priority)
        .bind(&new.title)
        .bind(&new.message)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    pub async fn unread_digests(&self) -> Result<Vec<UnreadDigest>, AppError> {
        let digests = sqlx::query_as::<_, UnreadDigest>(
            r#"
            SELECT u.id AS user_id, u.username, u.email, COUNT(n.id) AS unread
            FROM users u
            JOIN notifications n ON n.user_id = u.id AND NOT n.is_read
            WHERE u.is_active
            GROUP BY u.id, u.username, u.email
            ORDER BY u.username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(digests)
    }
}
