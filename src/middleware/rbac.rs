// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

/// 1. O Trait que define quais papéis liberam a rota
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: Role) -> bool;
    fn denied_message() -> &'static str;
}

/// 2. O Extractor (Guardião). Devolve o usuário já autorizado.
pub struct RequireRole<T>(pub User, pub PhantomData<T>);

impl<T> RequireRole<T> {
    pub fn user(&self) -> &User {
        &self.0
    }
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // O auth_guard já validou o token e inseriu o usuário
        let user = parts.extensions.get::<User>().cloned().ok_or(AppError::InvalidToken)?;

        if !T::allows(user.role) {
            return Err(AppError::Forbidden(T::denied_message().to_string()));
        }

        Ok(RequireRole(user, PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct RoleAdmin;
impl RoleDef for RoleAdmin {
    fn allows(role: Role) -> bool { role == Role::Admin }
    fn denied_message() -> &'static str { "Apenas administradores podem realizar esta ação." }
}

pub struct RoleApprover;
impl RoleDef for RoleApprover {
    fn allows(role: Role) -> bool { role.can_approve() }
    fn denied_message() -> &'static str { "Apenas aprovadores podem realizar esta ação." }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approvers_include_admins() {
        assert!(RoleApprover::allows(Role::Admin));
        assert!(RoleApprover::allows(Role::Aprovador));
        assert!(!RoleApprover::allows(Role::Usuario));
        assert!(!RoleAdmin::allows(Role::Aprovador));
    }
}
