// src/services/company_service.rs

use crate::{
    common::error::AppError,
    db::{ReferenceRepository, UserRepository},
    domain::cnpj,
    models::{
        auth::UserSummary,
        company::{
            Company, CompanyObligationOption, CreateCompanyPayload, ObligationType, State,
            UpdateCompanyPayload,
        },
    },
};

const INVALID_CNPJ: &str = "CNPJ deve conter 14 dígitos.";

/// CNPJ opcional: vazio vira `None`, com máscara é normalizado.
fn normalized_cnpj(raw: Option<&str>) -> Result<Option<String>, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => cnpj::normalize(value)
            .map(Some)
            .ok_or_else(|| AppError::field("cnpj", INVALID_CNPJ)),
    }
}

// Cadastros de referência: estados, tipos, usuários e empresas
#[derive(Clone)]
pub struct CompanyService {
    repo: ReferenceRepository,
    user_repo: UserRepository,
}

impl CompanyService {
    pub fn new(repo: ReferenceRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    pub async fn list_states(&self) -> Result<Vec<State>, AppError> {
        self.repo.list_states().await
    }

    pub async fn list_obligation_types(&self) -> Result<Vec<ObligationType>, AppError> {
        self.repo.list_obligation_types().await
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AppError> {
        self.user_repo.list_active().await
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        self.repo.list_companies().await
    }

    pub async fn get_company(&self, id: i64) -> Result<Company, AppError> {
        self.repo
            .find_company(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Empresa não encontrada".into()))
    }

    pub async fn create_company(&self, payload: &CreateCompanyPayload) -> Result<Company, AppError> {
        let cnpj = normalized_cnpj(payload.cnpj.as_deref())?;
        let id = self.repo.create_company(payload, cnpj.as_deref()).await?;
        tracing::info!("🏢 Empresa {} criada", payload.code.trim());
        self.get_company(id).await
    }

    pub async fn update_company(
        &self,
        id: i64,
        payload: &UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        let cnpj = normalized_cnpj(payload.cnpj.as_deref())?;
        if !self.repo.update_company(id, payload, cnpj.as_deref()).await? {
            return Err(AppError::NotFound("Empresa não encontrada".into()));
        }
        self.get_company(id).await
    }

    pub async fn delete_company(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_company(id).await? {
            return Err(AppError::NotFound("Empresa não encontrada".into()));
        }
        Ok(())
    }

    pub async fn company_obligations(&self, id: i64) -> Result<Vec<CompanyObligationOption>, AppError> {
        self.get_company(id).await?;
        self.repo.company_obligation_options(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cnpj_mask_is_stripped() {
        assert_eq!(
            normalized_cnpj(Some("12.345.678/0001-90")).unwrap().as_deref(),
            Some("12345678000190")
        );
    }

    #[test]
    fn blank_cnpj_is_absent() {
        assert_eq!(normalized_cnpj(Some("  ")).unwrap(), None);
        assert_eq!(normalized_cnpj(None).unwrap(), None);
    }

    #[test]
    fn short_cnpj_is_a_field_error() {
        match normalized_cnpj(Some("1234")) {
            Err(AppError::FieldErrors(errors)) => assert_eq!(errors["cnpj"], vec![INVALID_CNPJ]),
            other => panic!("esperava erro de campo, veio {other:?}"),
        }
    }
}
