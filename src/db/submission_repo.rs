// src/db/submission_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        approval::{MyDeliveriesFilter, PendingFilter},
        submission::{
            ApprovalStatus, Attachment, AttachmentKind, DeliveryFilter, DeliveryListItem,
            Submission, SubmissionType,
        },
    },
};

const SUBMISSION_COLUMNS: &str = r#"
    id, obligation_id, delivered_by, delivered_at, delivery_date, comments,
    submission_type, batch_id, approval_status, approval_decision_at,
    approval_decision_by, approval_comment
"#;

const ATTACHMENT_COLUMNS: &str = r#"
    id, submission_id, kind, filename, stored_path, content_type, size_bytes,
    parsed_cnpj, parsed_period, parsed_obligation_key, created_at
"#;

const DETAIL_SELECT: &str = r#"
    SELECT
        sb.id, sb.obligation_id,
        c.id AS company_id, c.name AS company, c.cnpj AS company_cnpj,
        t.id AS obligation_type_id, t.name AS obligation_type,
        COALESCE(NULLIF(o.obligation_name, ''), t.name) AS obligation_name,
        st.code AS state, o.competence, o.due_date,
        sb.delivery_date, sb.delivered_at,
        sb.delivered_by, du.username AS delivered_by_username,
        du.first_name AS delivered_by_first_name, du.last_name AS delivered_by_last_name,
        sb.submission_type, sb.comments, sb.batch_id, sb.approval_status,
        sb.approval_decision_at, au.username AS approval_decision_by_username,
        sb.approval_comment,
        (SELECT COUNT(*) FROM attachments a WHERE a.submission_id = sb.id) AS attachments_count
    FROM submissions sb
    JOIN obligations o ON o.id = sb.obligation_id
    JOIN companies c ON c.id = o.company_id
    JOIN obligation_types t ON t.id = o.obligation_type_id
    JOIN states st ON st.id = o.state_id
    LEFT JOIN users du ON du.id = sb.delivered_by
    LEFT JOIN users au ON au.id = sb.approval_decision_by
"#;

/// Entrega com empresa, obrigação e autores já resolvidos.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionDetail {
    pub id: i64,
    pub obligation_id: i64,
    pub company_id: i64,
    pub company: String,
    pub company_cnpj: Option<String>,
    pub obligation_type_id: i64,
    pub obligation_type: String,
    pub obligation_name: String,
    pub state: String,
    pub competence: String,
    pub due_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub delivered_at: DateTime<Utc>,
    pub delivered_by: Option<i64>,
    pub delivered_by_username: Option<String>,
    pub delivered_by_first_name: Option<String>,
    pub delivered_by_last_name: Option<String>,
    pub submission_type: SubmissionType,
    pub comments: Option<String>,
    pub batch_id: Option<Uuid>,
    pub approval_status: ApprovalStatus,
    pub approval_decision_at: Option<DateTime<Utc>>,
    pub approval_decision_by_username: Option<String>,
    pub approval_comment: Option<String>,
    pub attachments_count: i64,
}

/// Anexo pronto para inserção; o arquivo já está gravado em disco.
#[derive(Debug, Clone)]
pub struct NewAttachment<'a> {
    pub submission_id: i64,
    pub kind: AttachmentKind,
    pub filename: &'a str,
    pub stored_path: &'a str,
    pub content_type: Option<&'a str>,
    pub size_bytes: i64,
    pub parsed_cnpj: Option<&'a str>,
    pub parsed_period: Option<&'a str>,
    pub parsed_obligation_key: Option<&'a str>,
}

#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find<'e, E>(&self, executor: E, id: i64) -> Result<Option<Submission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(submission)
    }

    /// Trava a linha até o fim da transação.
    pub async fn lock<'e, E>(&self, executor: E, id: i64) -> Result<Option<Submission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(submission)
    }

    pub async fn detail<'e, E>(&self, executor: E, id: i64) -> Result<Option<SubmissionDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let detail = sqlx::query_as::<_, SubmissionDetail>(&format!("{DETAIL_SELECT} WHERE sb.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(detail)
    }

    /// Primeira entrega registrada para a obrigação.
    pub async fn first_for_obligation<'e, E>(
        &self,
        executor: E,
        obligation_id: i64,
    ) -> Result<Option<Submission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS} FROM submissions
            WHERE obligation_id = $1
            ORDER BY delivered_at, id
            LIMIT 1
            "#
        ))
        .bind(obligation_id)
        .fetch_optional(executor)
        .await?;
        Ok(submission)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        obligation_id: i64,
        delivered_by: i64,
        delivery_date: NaiveDate,
        comments: Option<&str>,
        submission_type: SubmissionType,
        batch_id: Option<Uuid>,
    ) -> Result<Submission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            r#"
            INSERT INTO submissions
                (obligation_id, delivered_by, delivery_date, comments, submission_type, batch_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(obligation_id)
        .bind(delivered_by)
        .bind(delivery_date)
        .bind(comments)
        .bind(submission_type)
        .bind(batch_id)
        .fetch_one(executor)
        .await?;
        Ok(submission)
    }

    /// Atualização feita pela planilha de entregas sobre uma entrega original.
    pub async fn update_from_batch<'e, E>(
        &self,
        executor: E,
        id: i64,
        delivery_date: NaiveDate,
        comments: Option<&str>,
        batch_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE submissions SET delivery_date = $2, comments = $3, batch_id = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(delivery_date)
        .bind(comments)
        .bind(batch_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn record_decision<'e, E>(
        &self,
        executor: E,
        id: i64,
        status: ApprovalStatus,
        decided_by: i64,
        comment: Option<&str>,
    ) -> Result<Submission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            r#"
            UPDATE submissions SET
                approval_status = $2,
                approval_decision_at = NOW(),
                approval_decision_by = $3,
                approval_comment = $4
            WHERE id = $1
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(comment)
        .fetch_one(executor)
        .await?;
        Ok(submission)
    }

    /// Volta a entrega para revisão, limpando a decisão anterior.
    pub async fn resubmit<'e, E>(
        &self,
        executor: E,
        id: i64,
        delivery_date: NaiveDate,
        comments: &str,
        submission_type: SubmissionType,
    ) -> Result<Submission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            r#"
            UPDATE submissions SET
                approval_status = 'pending_review',
                approval_decision_at = NULL,
                approval_decision_by = NULL,
                approval_comment = NULL,
                delivery_date = $2,
                comments = $3,
                submission_type = $4
            WHERE id = $1
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(delivery_date)
        .bind(comments)
        .bind(submission_type)
        .fetch_one(executor)
        .await?;
        Ok(submission)
    }

    // ===== ANEXOS =====

    pub async fn add_attachment<'e, E>(
        &self,
        executor: E,
        new: &NewAttachment<'_>,
    ) -> Result<Attachment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let attachment = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            INSERT INTO attachments (
                submission_id, kind, filename, stored_path, content_type, size_bytes,
                parsed_cnpj, parsed_period, parsed_obligation_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        ))
        .bind(new.submission_id)
        .bind(new.kind)
        .bind(new.filename)
        .bind(new.stored_path)
        .bind(new.content_type)
        .bind(new.size_bytes)
        .bind(new.parsed_cnpj)
        .bind(new.parsed_period)
        .bind(new.parsed_obligation_key)
        .fetch_one(executor)
        .await?;
        Ok(attachment)
    }

    pub async fn attachments_for(&self, submission_ids: &[i64]) -> Result<Vec<Attachment>, AppError> {
        let attachments = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            SELECT {ATTACHMENT_COLUMNS} FROM attachments
            WHERE submission_id = ANY($1)
            ORDER BY kind DESC, created_at, id
            "#
        ))
        .bind(submission_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(attachments)
    }

    pub async fn find_attachment(
        &self,
        submission_id: i64,
        attachment_id: i64,
    ) -> Result<Option<Attachment>, AppError> {
        let attachment = sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = $1 AND submission_id = $2"
        ))
        .bind(attachment_id)
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attachment)
    }

    // ===== LISTAGENS =====

    /// Última entrega de cada obrigação.
    pub async fn list_deliveries(&self, filter: &DeliveryFilter) -> Result<Vec<DeliveryListItem>, AppError> {
        let deliveries = sqlx::query_as::<_, DeliveryListItem>(
            r#"
            SELECT * FROM (
                SELECT DISTINCT ON (sb.obligation_id)
                    sb.id, sb.obligation_id,
                    c.name AS company, c.cnpj AS company_cnpj,
                    COALESCE(NULLIF(o.obligation_name, ''), t.name) AS obligation,
                    o.competence, st.code AS state,
                    sb.delivery_date, sb.delivered_at,
                    du.username AS delivered_by,
                    sb.submission_type, sb.comments,
                    (SELECT COUNT(*) FROM attachments a WHERE a.submission_id = sb.id) AS attachments_count,
                    sb.batch_id, sb.approval_status
                FROM submissions sb
                JOIN obligations o ON o.id = sb.obligation_id
                JOIN companies c ON c.id = o.company_id
                JOIN obligation_types t ON t.id = o.obligation_type_id
                JOIN states st ON st.id = o.state_id
                LEFT JOIN users du ON du.id = sb.delivered_by
                WHERE ($1::BIGINT IS NULL OR o.company_id = $1)
                  AND ($2::TEXT IS NULL OR o.competence = $2)
                  AND ($3::TEXT IS NULL OR UPPER(st.code) = UPPER($3))
                  AND ($4::submission_type IS NULL OR sb.submission_type = $4)
                  AND ($5::UUID IS NULL OR sb.batch_id = $5)
                  AND ($6::approval_status IS NULL OR sb.approval_status = $6)
                ORDER BY sb.obligation_id, sb.delivered_at DESC, sb.id DESC
            ) latest
            ORDER BY latest.delivered_at DESC
            "#,
        )
        .bind(filter.company)
        .bind(filter.competence.as_deref().filter(|v| !v.is_empty()))
        .bind(filter.state.as_deref().filter(|v| !v.is_empty()))
        .bind(filter.submission_type.as_deref().and_then(SubmissionType::parse))
        .bind(filter.batch_id)
        .bind(filter.approval_status.as_deref().and_then(ApprovalStatus::parse))
        .fetch_all(&self.pool)
        .await?;
        Ok(deliveries)
    }

    pub async fn pending(&self, filter: &PendingFilter) -> Result<Vec<SubmissionDetail>, AppError> {
        let rows = sqlx::query_as::<_, SubmissionDetail>(&format!(
            r#"
            {DETAIL_SELECT}
            WHERE sb.approval_status = 'pending_review'
              AND ($1::BIGINT IS NULL OR c.id = $1)
              AND ($2::BIGINT IS NULL OR t.id = $2)
              AND ($3::TEXT IS NULL
                   OR c.name ILIKE '%' || $3 || '%'
                   OR c.cnpj ILIKE '%' || $3 || '%'
                   OR o.obligation_name ILIKE '%' || $3 || '%')
              AND ($4::DATE IS NULL OR sb.delivered_at::date >= $4)
              AND ($5::DATE IS NULL OR sb.delivered_at::date <= $5)
            ORDER BY sb.delivered_at DESC
            "#
        ))
        .bind(filter.company)
        .bind(filter.obligation_type)
        .bind(filter.search.as_deref().map(str::trim).filter(|v| !v.is_empty()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delivered_by(
        &self,
        user_id: i64,
        filter: &MyDeliveriesFilter,
    ) -> Result<Vec<SubmissionDetail>, AppError> {
        let rows = sqlx::query_as::<_, SubmissionDetail>(&format!(
            r#"
            {DETAIL_SELECT}
            WHERE sb.delivered_by = $1
              AND ($2::approval_status IS NULL OR sb.approval_status = $2)
            ORDER BY sb.delivered_at DESC
            "#
        ))
        .bind(user_id)
        .bind(filter.status.as_deref().and_then(ApprovalStatus::parse))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
