// src/db/report_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::report::{ReportRow, SummaryRow},
};

/// Filtros aplicados no banco; competência e status são filtrados depois.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub company_ids: Vec<i64>,
    pub obligation_type_ids: Vec<i64>,
    pub obligation_name: Option<String>,
    pub due_start: Option<NaiveDate>,
    pub due_end: Option<NaiveDate>,
    pub responsible_user_id: Option<i64>,
    pub state_id: Option<i64>,
}

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn rows(&self, filter: &RowFilter) -> Result<Vec<ReportRow>, AppError> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT
                o.id AS obligation_id,
                c.id AS company_id, c.name AS company, c.cnpj AS company_cnpj,
                s.id AS state_id, s.code AS state_code,
                t.id AS obligation_type_id, t.name AS obligation_type, t.recurrence,
                COALESCE(NULLIF(o.obligation_name, ''), t.name) AS obligation_name,
                o.competence, o.due_date, o.delivery_deadline,
                o.responsible_user_id, u.username AS responsible_username,
                COUNT(sb.id) AS submissions_count,
                COALESCE(BOOL_OR(sb.approval_status = 'approved'), FALSE) AS has_approved_submission,
                MIN(sb.delivery_date) AS first_delivery_date,
                MAX(sb.delivery_date) AS last_delivery_date
            FROM obligations o
            JOIN companies c ON c.id = o.company_id
            JOIN states s ON s.id = o.state_id
            JOIN obligation_types t ON t.id = o.obligation_type_id
            LEFT JOIN users u ON u.id = o.responsible_user_id
            LEFT JOIN submissions sb ON sb.obligation_id = o.id
            WHERE (cardinality($1::BIGINT[]) = 0 OR o.company_id = ANY($1))
              AND (cardinality($2::BIGINT[]) = 0 OR o.obligation_type_id = ANY($2))
              AND ($3::TEXT IS NULL OR o.obligation_name ILIKE '%' || $3 || '%')
              AND ($4::DATE IS NULL OR o.due_date >= $4)
              AND ($5::DATE IS NULL OR o.due_date <= $5)
              AND ($6::BIGINT IS NULL OR o.responsible_user_id = $6)
              AND ($7::BIGINT IS NULL OR o.state_id = $7)
            GROUP BY o.id, c.id, s.id, t.id, u.username
            ORDER BY c.name, o.due_date, o.id
            "#,
        )
        .bind(&filter.company_ids)
        .bind(&filter.obligation_type_ids)
        .bind(filter.obligation_name.as_deref().map(str::trim).filter(|v| !v.is_empty()))
        .bind(filter.due_start)
        .bind(filter.due_end)
        .bind(filter.responsible_user_id)
        .bind(filter.state_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn summary(&self) -> Result<Vec<SummaryRow>, AppError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT c.name AS company, s.code AS state, t.name AS obligation_type,
                   o.competence, COUNT(*) AS total
            FROM obligations o
            JOIN companies c ON c.id = o.company_id
            JOIN states s ON s.id = o.state_id
            JOIN obligation_types t ON t.id = o.obligation_type_id
            GROUP BY c.name, s.code, t.name, o.competence
            ORDER BY c.name, s.code, t.name, o.competence
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// (obrigações, entregas, obrigações com ao menos uma entrega)
    pub async fn totals(&self) -> Result<(i64, i64, i64), AppError> {
        let totals: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                (SELECT COUNT(*) FROM submissions),
                COUNT(*) FILTER (WHERE EXISTS (SELECT 1 FROM submissions sb WHERE sb.obligation_id = o.id))
            FROM obligations o
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }
}
