// src/db/dispatch_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dispatch::{
        CreateDispatchPayload, Dispatch, DispatchCategory, DispatchFilter, DispatchStatus, Subtask,
    },
};

const DISPATCH_SELECT: &str = r#"
    SELECT
        d.id, d.company_id, c.name AS company_name, d.category, d.title,
        d.responsible_id, u.username AS responsible_username,
        d.start_date, d.end_date, d.progress_pct, d.status,
        d.created_by, d.created_at, d.updated_at
    FROM dispatches d
    JOIN companies c ON c.id = d.company_id
    LEFT JOIN users u ON u.id = d.responsible_id
"#;

const SUBTASK_COLUMNS: &str = "id, dispatch_id, name, status, position, created_at, updated_at";

/// Campos finais de um despacho após aplicar um PATCH.
#[derive(Debug, Clone)]
pub struct DispatchFields {
    pub company_id: i64,
    pub category: DispatchCategory,
    pub title: Option<String>,
    pub responsible_id: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Clone)]
pub struct DispatchRepository {
    pool: PgPool,
}

impl DispatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list(&self, filter: &DispatchFilter) -> Result<Vec<Dispatch>, AppError> {
        let dispatches = sqlx::query_as::<_, Dispatch>(&format!(
            r#"
            {DISPATCH_SELECT}
            WHERE ($1::BIGINT IS NULL OR d.company_id = $1)
              AND ($2::dispatch_category IS NULL OR d.category = $2)
              AND ($3::dispatch_status IS NULL OR d.status = $3)
            ORDER BY d.end_date, d.created_at
            "#
        ))
        .bind(filter.company)
        .bind(filter.category)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;
        Ok(dispatches)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Dispatch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let dispatch = sqlx::query_as::<_, Dispatch>(&format!("{DISPATCH_SELECT} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(dispatch)
    }

    /// Trava o despacho enquanto suas subtarefas mudam.
    pub async fn lock<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM dispatches WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create(&self, payload: &CreateDispatchPayload, created_by: i64) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO dispatches
                (id, company_id, category, title, responsible_id, start_date, end_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(payload.company_id)
        .bind(payload.category)
        .bind(&payload.title)
        .bind(payload.responsible_id)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(created_by)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, fields: &DispatchFields) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE dispatches SET
                company_id = $2, category = $3, title = $4, responsible_id = $5,
                start_date = $6, end_date = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.company_id)
        .bind(fields.category)
        .bind(&fields.title)
        .bind(fields.responsible_id)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM dispatches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_progress<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        progress_pct: Decimal,
        status: DispatchStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE dispatches SET progress_pct = $2, status = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(progress_pct)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn all_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM dispatches")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Despachos não concluídos com prazo até `until` (inclui atrasados).
    pub async fn unfinished_ending_by(&self, until: NaiveDate) -> Result<Vec<Dispatch>, AppError> {
        let dispatches = sqlx::query_as::<_, Dispatch>(&format!(
            r#"
            {DISPATCH_SELECT}
            WHERE d.end_date <= $1 AND d.status <> 'CONCLUIDO'
            ORDER BY d.end_date
            "#
        ))
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(dispatches)
    }

    // ===== SUBTAREFAS =====

    pub async fn subtasks_of<'e, E>(&self, executor: E, dispatch_id: Uuid) -> Result<Vec<Subtask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subtasks = sqlx::query_as::<_, Subtask>(&format!(
            "SELECT {SUBTASK_COLUMNS} FROM dispatch_subtasks WHERE dispatch_id = $1 ORDER BY position, created_at"
        ))
        .bind(dispatch_id)
        .fetch_all(executor)
        .await?;
        Ok(subtasks)
    }

    pub async fn subtasks_for(&self, dispatch_ids: &[Uuid]) -> Result<Vec<Subtask>, AppError> {
        let subtasks = sqlx::query_as::<_, Subtask>(&format!(
            r#"
            SELECT {SUBTASK_COLUMNS} FROM dispatch_subtasks
            WHERE dispatch_id = ANY($1)
            ORDER BY dispatch_id, position, created_at
            "#
        ))
        .bind(dispatch_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(subtasks)
    }

    pub async fn find_subtask<'e, E>(
        &self,
        executor: E,
        dispatch_id: Uuid,
        subtask_id: Uuid,
    ) -> Result<Option<Subtask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subtask = sqlx::query_as::<_, Subtask>(&format!(
            "SELECT {SUBTASK_COLUMNS} FROM dispatch_subtasks WHERE id = $1 AND dispatch_id = $2"
        ))
        .bind(subtask_id)
        .bind(dispatch_id)
        .fetch_optional(executor)
        .await?;
        Ok(subtask)
    }

    pub async fn next_position<'e, E>(&self, executor: E, dispatch_id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (next,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM dispatch_subtasks WHERE dispatch_id = $1",
        )
        .bind(dispatch_id)
        .fetch_one(executor)
        .await?;
        Ok(next)
    }

    pub async fn insert_subtask<'e, E>(
        &self,
        executor: E,
        dispatch_id: Uuid,
        name: &str,
        status: DispatchStatus,
        position: i32,
    ) -> Result<Subtask, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subtask = sqlx::query_as::<_, Subtask>(&format!(
            r#"
            INSERT INTO dispatch_subtasks (id, dispatch_id, name, status, position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUBTASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(dispatch_id)
        .bind(name)
        .bind(status)
        .bind(position)
        .fetch_one(executor)
        .await?;
        Ok(subtask)
    }

    pub async fn update_subtask<'e, E>(
        &self,
        executor: E,
        subtask_id: Uuid,
        name: &str,
        status: DispatchStatus,
        position: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE dispatch_subtasks
            SET name = $2, status = $3, position = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(subtask_id)
        .bind(name)
        .bind(status)
        .bind(position)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_subtask<'e, E>(&self, executor: E, subtask_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM dispatch_subtasks WHERE id = $1")
            .bind(subtask_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
