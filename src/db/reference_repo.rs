// src/db/reference_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{unique_violation_as, AppError},
    models::company::{
        Company, CompanyObligationOption, CreateCompanyPayload, ObligationType, State,
        UpdateCompanyPayload,
    },
};

const COMPANY_SELECT: &str = r#"
    SELECT
        c.id, c.code, c.name, c.fantasy_name, c.cnpj, c.email, c.phone, c.address,
        c.responsible, c.active, c.created_at, c.updated_at,
        (SELECT COUNT(*) FROM obligations o WHERE o.company_id = c.id) AS obligations_count,
        (SELECT COUNT(*) FROM obligations o
            WHERE o.company_id = c.id
              AND NOT EXISTS (SELECT 1 FROM submissions s WHERE s.obligation_id = o.id)
        ) AS pending_obligations,
        (SELECT COUNT(*) FROM obligations o
            WHERE o.company_id = c.id
              AND EXISTS (SELECT 1 FROM submissions s WHERE s.obligation_id = o.id)
        ) AS delivered_obligations
    FROM companies c
"#;

// Estados, tipos de obrigação e empresas
#[derive(Clone)]
pub struct ReferenceRepository {
    pool: PgPool,
}

impl ReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ===== ESTADOS =====

    pub async fn list_states(&self) -> Result<Vec<State>, AppError> {
        let states = sqlx::query_as::<_, State>("SELECT id, code, name FROM states ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        Ok(states)
    }

    pub async fn find_state(&self, id: i64) -> Result<Option<State>, AppError> {
        let state = sqlx::query_as::<_, State>("SELECT id, code, name FROM states WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(state)
    }

    pub async fn find_state_by_code(&self, code: &str) -> Result<Option<State>, AppError> {
        let state = sqlx::query_as::<_, State>(
            "SELECT id, code, name FROM states WHERE UPPER(code) = UPPER($1)",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(state)
    }

    // ===== TIPOS DE OBRIGAÇÃO =====

    pub async fn list_obligation_types(&self) -> Result<Vec<ObligationType>, AppError> {
        let types = sqlx::query_as::<_, ObligationType>(
            "SELECT id, name, description, recurrence, due_day FROM obligation_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    pub async fn find_obligation_type<'e, E>(
        &self,
        executor: E,
        id: i64,
    ) -> Result<Option<ObligationType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kind = sqlx::query_as::<_, ObligationType>(
            "SELECT id, name, description, recurrence, due_day FROM obligation_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(kind)
    }

    pub async fn find_obligation_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ObligationType>, AppError> {
        let kind = sqlx::query_as::<_, ObligationType>(
            r#"
            SELECT id, name, description, recurrence, due_day
            FROM obligation_types
            WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(kind)
    }

    // ===== EMPRESAS =====

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>(&format!("{COMPANY_SELECT} ORDER BY c.name"))
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    pub async fn find_company(&self, id: i64) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(&format!("{COMPANY_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    /// Busca pelo CNPJ já normalizado (14 dígitos).
    pub async fn find_company_by_cnpj(&self, cnpj: &str) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "{COMPANY_SELECT} WHERE c.cnpj = $1 ORDER BY c.id LIMIT 1"
        ))
        .bind(cnpj)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "{COMPANY_SELECT} WHERE LOWER(c.name) = LOWER($1) ORDER BY c.id LIMIT 1"
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    /// `cnpj` já deve vir normalizado.
    pub async fn create_company(
        &self,
        payload: &CreateCompanyPayload,
        cnpj: Option<&str>,
    ) -> Result<i64, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO companies
                (code, name, fantasy_name, cnpj, email, phone, address, responsible, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(payload.code.trim())
        .bind(payload.name.trim())
        .bind(&payload.fantasy_name)
        .bind(cnpj)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.responsible)
        .bind(payload.active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, "Já existe uma empresa com este código."))?;
        Ok(id)
    }

    /// Campos ausentes mantêm o valor atual; o código nunca muda.
    pub async fn update_company(
        &self,
        id: i64,
        payload: &UpdateCompanyPayload,
        cnpj: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                fantasy_name = COALESCE($3, fantasy_name),
                cnpj = COALESCE($4, cnpj),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                address = COALESCE($7, address),
                responsible = COALESCE($8, responsible),
                active = COALESCE($9, active),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(&payload.fantasy_name)
        .bind(cnpj)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.responsible)
        .bind(payload.active)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_company(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Próximo código livre no formato `EMP0001`, usado na importação.
    pub async fn next_company_code(&self) -> Result<String, AppError> {
        let (next,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(MAX(SUBSTRING(code FROM 4)::BIGINT), 0) + 1
            FROM companies
            WHERE code ~ '^EMP[0-9]+$'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(format!("EMP{next:04}"))
    }

    pub async fn company_obligation_options(
        &self,
        company_id: i64,
    ) -> Result<Vec<CompanyObligationOption>, AppError> {
        let options = sqlx::query_as::<_, CompanyObligationOption>(
            r#"
            SELECT
                o.id,
                t.name || ' - ' || COALESCE(NULLIF(o.obligation_name, ''), t.name) || ' (' || s.code || ')' AS label,
                o.competence,
                o.due_date,
                EXISTS (SELECT 1 FROM submissions sb WHERE sb.obligation_id = o.id) AS has_submission
            FROM obligations o
            JOIN obligation_types t ON t.id = o.obligation_type_id
            JOIN states s ON s.id = o.state_id
            WHERE o.company_id = $1
            ORDER BY o.due_date DESC, o.id DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }
}
