// src/services/user_admin_service.rs

use serde_json::json;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AuditRepository, UserRepository},
    models::{
        auth::Role,
        user_admin::{
            AdminUser, AdminUserList, CreateUserPayload, MessageResponse, RoleChanged, UserDeleted,
            UserHistory, UserStats,
        },
    },
    services::auth::AuthService,
};

const USER_NOT_FOUND: &str = "Usuário não encontrado";
const LAST_ADMIN: &str = "Não é possível remover o último administrador do sistema.";

#[derive(Clone)]
pub struct UserAdminService {
    pool: PgPool,
    repo: UserRepository,
    audit_repo: AuditRepository,
    auth: AuthService,
}

impl UserAdminService {
    pub fn new(pool: PgPool, repo: UserRepository, audit_repo: AuditRepository, auth: AuthService) -> Self {
        Self { pool, repo, audit_repo, auth }
    }

    pub async fn list(&self) -> Result<AdminUserList, AppError> {
        let results = self.repo.list_admin().await?;
        Ok(AdminUserList { count: results.len(), results })
    }

    async fn get(&self, id: i64) -> Result<AdminUser, AppError> {
        self.repo
            .find_admin_view(id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))
    }

    pub async fn create(&self, actor_id: i64, payload: &CreateUserPayload) -> Result<AdminUser, AppError> {
        let password_hash = self.auth.hash_password(&payload.password).await?;
        let role = payload.role.unwrap_or(Role::Usuario);

        let mut tx = self.pool.begin().await?;
        let user = self
            .repo
            .create_user(
                &mut *tx,
                payload.username.trim(),
                payload.email.as_deref().unwrap_or_default(),
                payload.first_name.trim(),
                payload.last_name.trim(),
                &password_hash,
                role,
            )
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(actor_id),
                "user_created",
                "User",
                &user.id.to_string(),
                json!({ "username": user.username, "role": role.as_str() }),
            )
            .await?;
        tx.commit().await?;

        tracing::info!("👤 Usuário '{}' criado com papel {}", user.username, role.as_str());
        self.get(user.id).await
    }

    /// O último Admin não pode ser rebaixado.
    pub async fn set_role(&self, actor_id: i64, id: i64, role: Role) -> Result<RoleChanged, AppError> {
        let mut tx = self.pool.begin().await?;
        let user = self.get(id).await?;

        if user.role == Role::Admin && role != Role::Admin && self.repo.count_admins(&mut *tx).await? <= 1 {
            return Err(AppError::BadRequest(LAST_ADMIN.into()));
        }

        self.repo.set_role(&mut *tx, id, role).await?;
        self.audit_repo
            .record(
                &mut *tx,
                Some(actor_id),
                "role_changed",
                "User",
                &id.to_string(),
                json!({ "old_role": user.role.as_str(), "new_role": role.as_str() }),
            )
            .await?;
        tx.commit().await?;

        Ok(RoleChanged {
            message: format!("Papel de {} alterado para {}", user.username, role.as_str()),
            user_id: id,
            username: user.username,
            new_role: role,
        })
    }

    pub async fn set_password(&self, actor_id: i64, id: i64, new_password: &str) -> Result<MessageResponse, AppError> {
        let user = self.get(id).await?;
        let hash = self.auth.hash_password(new_password).await?;
        self.repo.set_password(id, &hash).await?;
        self.audit_repo
            .record(&self.pool, Some(actor_id), "password_changed", "User", &id.to_string(), json!({}))
            .await?;

        Ok(MessageResponse { message: format!("Senha de {} alterada com sucesso", user.username) })
    }

    pub async fn delete(&self, actor_id: i64, id: i64) -> Result<UserDeleted, AppError> {
        if actor_id == id {
            return Err(AppError::BadRequest("Você não pode excluir o próprio usuário.".into()));
        }

        let mut tx = self.pool.begin().await?;
        let user = self.get(id).await?;
        if user.role == Role::Admin && self.repo.count_admins(&mut *tx).await? <= 1 {
            return Err(AppError::BadRequest(LAST_ADMIN.into()));
        }

        self.audit_repo
            .record(
                &mut *tx,
                Some(actor_id),
                "user_deleted",
                "User",
                &id.to_string(),
                json!({ "username": user.username, "role": user.role.as_str() }),
            )
            .await?;
        self.repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Usuário '{}' excluído", user.username);
        Ok(UserDeleted { message: format!("Usuário {} excluído com sucesso", user.username), deleted_user_id: id })
    }

    pub async fn history(&self, id: i64) -> Result<UserHistory, AppError> {
        let user = self.get(id).await?;
        let history = self.audit_repo.history_of_user(id).await?;
        Ok(UserHistory { user, history })
    }

    pub async fn stats(&self) -> Result<UserStats, AppError> {
        self.repo.stats().await
    }
}
