// src/client/api/users.rs

use serde_json::json;

use crate::{
    client::{error::ClientResult, ApiClient},
    models::{
        auth::Role,
        user_admin::{
            AdminUser, AdminUserList, CreateUserPayload, MessageResponse, RoleChanged, UserDeleted, UserHistory,
            UserStats,
        },
    },
};

impl ApiClient {
    pub async fn admin_users(&self) -> ClientResult<AdminUserList> {
        self.transport().get("users/admin/").await
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> ClientResult<AdminUser> {
        self.transport().post("users/create/", payload).await
    }

    pub async fn set_user_role(&self, id: i64, role: Role) -> ClientResult<RoleChanged> {
        self.transport().patch(&format!("users/{id}/role/"), &json!({ "role": role })).await
    }

    pub async fn set_user_password(&self, id: i64, new_password: &str) -> ClientResult<MessageResponse> {
        self.transport()
            .post(&format!("users/{id}/password/"), &json!({ "new_password": new_password }))
            .await
    }

    pub async fn delete_user(&self, id: i64) -> ClientResult<UserDeleted> {
        self.transport().delete_json(&format!("users/{id}/")).await
    }

    pub async fn user_history(&self, id: i64) -> ClientResult<UserHistory> {
        self.transport().get(&format!("users/{id}/history/")).await
    }

    pub async fn user_stats(&self) -> ClientResult<UserStats> {
        self.transport().get("users/stats/").await
    }
}
