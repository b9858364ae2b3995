// src/db/audit_repo.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, Executor, FromRow, PgPool, Postgres};

use crate::{common::error::AppError, models::user_admin::AuditEntry};

/// Evento de auditoria com o autor resolvido (linha do tempo).
#[derive(Debug, Clone, FromRow)]
pub struct AuditEvent {
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub changes: Json<Value>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record<'e, E>(
        &self,
        executor: E,
        user_id: Option<i64>,
        action: &str,
        model: &str,
        object_id: &str,
        changes: Value,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, model, object_id, changes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(model)
        .bind(object_id)
        .bind(Json(changes))
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Eventos de um objeto em ordem cronológica.
    pub async fn events_for(&self, model: &str, object_id: &str) -> Result<Vec<AuditEvent>, AppError> {
        let events = sqlx::query_as::<_, AuditEvent>(
            r#"
            SELECT a.action, a.timestamp, a.changes, u.username, u.first_name, u.last_name
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.model = $1 AND a.object_id = $2
            ORDER BY a.timestamp, a.id
            "#,
        )
        .bind(model)
        .bind(object_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    /// Ações feitas pelo usuário ou sobre ele, mais recentes primeiro.
    pub async fn history_of_user(&self, user_id: i64) -> Result<Vec<AuditEntry>, AppError> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, action, model, object_id, changes, timestamp
            FROM audit_logs
            WHERE user_id = $1 OR (model = 'User' AND object_id = $1::TEXT)
            ORDER BY timestamp DESC, id DESC
            LIMIT 100
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
