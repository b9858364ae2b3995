// src/db/obligation_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{unique_violation_as, AppError},
    models::obligation::{NewObligation, Obligation, ObligationFilter},
};

pub const DUPLICATE_OBLIGATION: &str =
    "Já existe uma obrigação para esta empresa, estado, tipo, nome e competência.";

const OBLIGATION_SELECT: &str = r#"
    SELECT
        o.id, o.company_id, c.name AS company_name, c.cnpj AS company_cnpj,
        o.state_id, s.code AS state_code,
        o.obligation_type_id, t.name AS obligation_type_name,
        o.obligation_name, o.competence, o.due_date, o.delivery_deadline,
        o.responsible_user_id, u.username AS responsible_username,
        o.validity_start_date, o.validity_end_date, o.notes, o.created_by, o.created_at,
        EXISTS (SELECT 1 FROM submissions sb WHERE sb.obligation_id = o.id) AS has_submission,
        EXISTS (
            SELECT 1 FROM submissions sb
            WHERE sb.obligation_id = o.id AND sb.approval_status = 'approved'
        ) AS has_approved_submission
    FROM obligations o
    JOIN companies c ON c.id = o.company_id
    JOIN states s ON s.id = o.state_id
    JOIN obligation_types t ON t.id = o.obligation_type_id
    LEFT JOIN users u ON u.id = o.responsible_user_id
"#;

// Sem JOIN: FOR UPDATE não vale para o lado anulável de um LEFT JOIN
const LOCK_OBLIGATION: &str = "SELECT id FROM obligations WHERE id = $1 FOR UPDATE";

/// Identifica uma série de obrigações recorrentes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesKey<'a> {
    pub company_id: i64,
    pub state_id: i64,
    pub obligation_type_id: i64,
    pub obligation_name: &'a str,
}

#[derive(Clone)]
pub struct ObligationRepository {
    pool: PgPool,
}

impl ObligationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// O filtro de status é aplicado depois, pois depende da data atual.
    pub async fn list(&self, filter: &ObligationFilter) -> Result<Vec<Obligation>, AppError> {
        let obligations = sqlx::query_as::<_, Obligation>(&format!(
            r#"
            {OBLIGATION_SELECT}
            WHERE ($1::BIGINT IS NULL OR o.company_id = $1)
              AND ($2::TEXT IS NULL OR UPPER(s.code) = UPPER($2))
              AND ($3::BIGINT IS NULL OR o.obligation_type_id = $3)
              AND ($4::TEXT IS NULL OR o.competence = $4)
            ORDER BY o.due_date DESC, o.id DESC
            "#
        ))
        .bind(filter.company)
        .bind(filter.state.as_deref().filter(|v| !v.is_empty()))
        .bind(filter.obligation_type)
        .bind(filter.competence.as_deref().filter(|v| !v.is_empty()))
        .fetch_all(&self.pool)
        .await?;
        Ok(obligations)
    }

    pub async fn find<'e, E>(&self, executor: E, id: i64) -> Result<Option<Obligation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let obligation = sqlx::query_as::<_, Obligation>(&format!("{OBLIGATION_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(obligation)
    }

    /// Trava a obrigação até o fim da transação. Entregas concorrentes da
    /// mesma obrigação esperam aqui antes de procurar a entrega original.
    pub async fn lock<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: Option<(i64,)> = sqlx::query_as(LOCK_OBLIGATION).bind(id).fetch_optional(executor).await?;
        Ok(row.is_some())
    }

    pub async fn create<'e, E>(&self, executor: E, new: &NewObligation) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO obligations (
                company_id, state_id, obligation_type_id, obligation_name, competence,
                due_date, delivery_deadline, responsible_user_id,
                validity_start_date, validity_end_date, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(new.company_id)
        .bind(new.state_id)
        .bind(new.obligation_type_id)
        .bind(&new.obligation_name)
        .bind(&new.competence)
        .bind(new.due_date)
        .bind(new.delivery_deadline)
        .bind(new.responsible_user_id)
        .bind(new.validity_start_date)
        .bind(new.validity_end_date)
        .bind(&new.notes)
        .bind(new.created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| unique_violation_as(e, DUPLICATE_OBLIGATION))?;
        Ok(id)
    }

    /// Insere se a competência estiver livre; `None` quando já existia.
    pub async fn create_if_absent<'e, E>(
        &self,
        executor: E,
        new: &NewObligation,
    ) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO obligations (
                company_id, state_id, obligation_type_id, obligation_name, competence,
                due_date, delivery_deadline, responsible_user_id,
                validity_start_date, validity_end_date, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT ON CONSTRAINT obligations_period_key DO NOTHING
            RETURNING id
            "#,
        )
        .bind(new.company_id)
        .bind(new.state_id)
        .bind(new.obligation_type_id)
        .bind(&new.obligation_name)
        .bind(&new.competence)
        .bind(new.due_date)
        .bind(new.delivery_deadline)
        .bind(new.responsible_user_id)
        .bind(new.validity_start_date)
        .bind(new.validity_end_date)
        .bind(&new.notes)
        .bind(new.created_by)
        .fetch_optional(executor)
        .await?;
        Ok(id.map(|(id,)| id))
    }

    pub async fn update(&self, id: i64, new: &NewObligation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE obligations SET
                company_id = $2, state_id = $3, obligation_type_id = $4, obligation_name = $5,
                competence = $6, due_date = $7, delivery_deadline = $8, responsible_user_id = $9,
                validity_start_date = $10, validity_end_date = $11, notes = $12
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(new.company_id)
        .bind(new.state_id)
        .bind(new.obligation_type_id)
        .bind(&new.obligation_name)
        .bind(&new.competence)
        .bind(new.due_date)
        .bind(new.delivery_deadline)
        .bind(new.responsible_user_id)
        .bind(new.validity_start_date)
        .bind(new.validity_end_date)
        .bind(&new.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, DUPLICATE_OBLIGATION))?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM obligations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn bulk_delete(&self, ids: &[i64]) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM obligations WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ===== SÉRIES (RECORRÊNCIA E PLANEJAMENTO) =====

    /// Obrigação mais recente da série, base para projeções.
    pub async fn latest_in_series<'e, E>(
        &self,
        executor: E,
        key: &SeriesKey<'_>,
    ) -> Result<Option<Obligation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let obligation = sqlx::query_as::<_, Obligation>(&format!(
            r#"
            {OBLIGATION_SELECT}
            WHERE o.company_id = $1 AND o.state_id = $2
              AND o.obligation_type_id = $3 AND o.obligation_name = $4
            ORDER BY o.due_date DESC, o.competence DESC, o.created_at DESC
            LIMIT 1
            "#
        ))
        .bind(key.company_id)
        .bind(key.state_id)
        .bind(key.obligation_type_id)
        .bind(key.obligation_name)
        .fetch_optional(executor)
        .await?;
        Ok(obligation)
    }

    pub async fn competences_in_series<'e, E>(
        &self,
        executor: E,
        key: &SeriesKey<'_>,
    ) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT competence FROM obligations
            WHERE company_id = $1 AND state_id = $2
              AND obligation_type_id = $3 AND obligation_name = $4
            "#,
        )
        .bind(key.company_id)
        .bind(key.state_id)
        .bind(key.obligation_type_id)
        .bind(key.obligation_name)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    /// Última obrigação de cada série que passa nos filtros.
    pub async fn latest_per_series(
        &self,
        company_id: Option<i64>,
        obligation_type_id: Option<i64>,
        obligation_name: Option<&str>,
        state_id: Option<i64>,
    ) -> Result<Vec<Obligation>, AppError> {
        let obligations = sqlx::query_as::<_, Obligation>(&format!(
            r#"
            SELECT * FROM (
                {OBLIGATION_SELECT}
                WHERE ($1::BIGINT IS NULL OR o.company_id = $1)
                  AND ($2::BIGINT IS NULL OR o.obligation_type_id = $2)
                  AND ($3::TEXT IS NULL OR o.obligation_name ILIKE '%' || $3 || '%')
                  AND ($4::BIGINT IS NULL OR o.state_id = $4)
            ) latest
            WHERE latest.id IN (
                SELECT DISTINCT ON (company_id, state_id, obligation_type_id, obligation_name) id
                FROM obligations
                ORDER BY company_id, state_id, obligation_type_id, obligation_name,
                         due_date DESC, competence DESC, created_at DESC
            )
            ORDER BY latest.company_name, latest.obligation_name
            "#
        ))
        .bind(company_id)
        .bind(obligation_type_id)
        .bind(obligation_name.filter(|v| !v.is_empty()))
        .bind(state_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(obligations)
    }

    // ===== ALERTAS =====

    /// Obrigações sem entrega aprovada com vencimento no intervalo.
    pub async fn unapproved_due_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Obligation>, AppError> {
        let obligations = sqlx::query_as::<_, Obligation>(&format!(
            r#"
            {OBLIGATION_SELECT}
            WHERE o.due_date BETWEEN $1 AND $2
              AND NOT EXISTS (
                  SELECT 1 FROM submissions sb
                  WHERE sb.obligation_id = o.id AND sb.approval_status = 'approved'
              )
            ORDER BY o.due_date
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(obligations)
    }

    pub async fn unapproved_overdue(&self, today: NaiveDate) -> Result<Vec<Obligation>, AppError> {
        let obligations = sqlx::query_as::<_, Obligation>(&format!(
            r#"
            {OBLIGATION_SELECT}
            WHERE o.due_date < $1
              AND NOT EXISTS (
                  SELECT 1 FROM submissions sb
                  WHERE sb.obligation_id = o.id AND sb.approval_status = 'approved'
              )
            ORDER BY o.due_date
            "#
        ))
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(obligations)
    }

    // ===== BUSCAS DA ENTREGA EM MASSA =====

    /// Obrigação da empresa pela UF, parte do nome e (opcionalmente) competência.
    pub async fn find_for_delivery<'e, E>(
        &self,
        executor: E,
        company_id: i64,
        state_code: &str,
        name_fragment: &str,
        competence: Option<&str>,
    ) -> Result<Option<Obligation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let obligation = sqlx::query_as::<_, Obligation>(&format!(
            r#"
            {OBLIGATION_SELECT}
            WHERE o.company_id = $1
              AND UPPER(s.code) = UPPER($2)
              AND o.obligation_name ILIKE '%' || $3 || '%'
              AND ($4::TEXT IS NULL OR o.competence = $4)
            ORDER BY o.due_date DESC, o.id DESC
            LIMIT 1
            "#
        ))
        .bind(company_id)
        .bind(state_code)
        .bind(name_fragment)
        .bind(competence)
        .fetch_optional(executor)
        .await?;
        Ok(obligation)
    }

    /// Obrigação da empresa pela competência e chave do nome do arquivo.
    pub async fn find_by_key<'e, E>(
        &self,
        executor: E,
        company_id: i64,
        competence: &str,
        key: &str,
    ) -> Result<Option<Obligation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let obligation = sqlx::query_as::<_, Obligation>(&format!(
            r#"
            {OBLIGATION_SELECT}
            WHERE o.company_id = $1
              AND o.competence = $2
              AND (o.obligation_name ILIKE '%' || $3 || '%'
                   OR REPLACE(o.obligation_name, ' ', '') ILIKE '%' || REPLACE($3, ' ', '') || '%')
            ORDER BY o.id
            LIMIT 1
            "#
        ))
        .bind(company_id)
        .bind(competence)
        .bind(key)
        .fetch_optional(executor)
        .await?;
        Ok(obligation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_takes_a_row_lock_on_the_obligation_only() {
        assert!(LOCK_OBLIGATION.ends_with("FOR UPDATE"));
        assert!(LOCK_OBLIGATION.contains("FROM obligations WHERE id = $1"));
        assert!(!LOCK_OBLIGATION.contains("JOIN"));
    }
}
