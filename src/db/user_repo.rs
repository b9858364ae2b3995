// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{unique_violation_as, AppError},
    models::{
        auth::{Role, User, UserSummary},
        user_admin::{AdminUser, UserStats},
    },
};

const USER_COLUMNS: &str = r#"
    id, username, email, first_name, last_name, password_hash,
    role, is_active, last_login, date_joined
"#;

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn touch_last_login(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| unique_violation_as(e, "Já existe um usuário com este nome."))
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_active(&self) -> Result<Vec<UserSummary>, AppError> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, username, first_name, last_name, email
            FROM users
            WHERE is_active
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// IDs dos administradores ativos (destinatários de alertas).
    pub async fn admin_ids(&self) -> Result<Vec<i64>, AppError> {
        let ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE role = 'Admin' AND is_active")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    // ===== ADMINISTRAÇÃO =====

    pub async fn list_admin(&self) -> Result<Vec<AdminUser>, AppError> {
        let users = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, username, email, first_name, last_name, role, is_active, last_login, date_joined
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn find_admin_view(&self, id: i64) -> Result<Option<AdminUser>, AppError> {
        let user = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, username, email, first_name, last_name, role, is_active, last_login, date_joined
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn count_admins<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'Admin'")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn set_role<'e, E>(&self, executor: E, id: i64, role: Role) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<UserStats, AppError> {
        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT
                COUNT(*) AS total_users,
                COUNT(*) FILTER (WHERE is_active) AS active_users,
                COUNT(*) FILTER (WHERE role = 'Admin') AS admins,
                COUNT(*) FILTER (WHERE role = 'Aprovador') AS approvers,
                COUNT(*) FILTER (WHERE role = 'Usuario') AS regular_users
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
