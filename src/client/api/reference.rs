// src/client/api/reference.rs

use crate::{
    client::{error::ClientResult, ApiClient},
    models::{
        auth::UserSummary,
        company::{
            Company, CompanyObligationOption, CreateCompanyPayload, ObligationType, State,
            UpdateCompanyPayload,
        },
    },
};

/// Dados de apoio carregados juntos na abertura das telas.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub companies: Vec<Company>,
    pub states: Vec<State>,
    pub obligation_types: Vec<ObligationType>,
    pub users: Vec<UserSummary>,
}

fn or_empty<T>(what: &str, result: ClientResult<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("Falha ao carregar {}: {}", what, e);
        Vec::new()
    })
}

impl ApiClient {
    pub async fn states(&self) -> ClientResult<Vec<State>> {
        self.transport().get("states/").await
    }

    pub async fn obligation_types(&self) -> ClientResult<Vec<ObligationType>> {
        self.transport().get("obligation-types/").await
    }

    pub async fn users(&self) -> ClientResult<Vec<UserSummary>> {
        self.transport().get("users/").await
    }

    pub async fn companies(&self) -> ClientResult<Vec<Company>> {
        self.transport().get("companies/").await
    }

    pub async fn company(&self, id: i64) -> ClientResult<Company> {
        self.transport().get(&format!("companies/{id}/")).await
    }

    pub async fn create_company(&self, payload: &CreateCompanyPayload) -> ClientResult<Company> {
        self.transport().post("companies/", payload).await
    }

    pub async fn update_company(&self, id: i64, payload: &UpdateCompanyPayload) -> ClientResult<Company> {
        self.transport().patch(&format!("companies/{id}/"), payload).await
    }

    pub async fn delete_company(&self, id: i64) -> ClientResult<()> {
        self.transport().delete(&format!("companies/{id}/")).await
    }

    pub async fn company_obligations(&self, id: i64) -> ClientResult<Vec<CompanyObligationOption>> {
        self.transport().get(&format!("companies/{id}/obligations/")).await
    }

    /// Busca as quatro listas em paralelo; cada falha vira lista vazia.
    pub async fn load_reference_data(&self) -> ReferenceData {
        let (companies, states, obligation_types, users) =
            tokio::join!(self.companies(), self.states(), self.obligation_types(), self.users());
        ReferenceData {
            companies: or_empty("empresas", companies),
            states: or_empty("UFs", states),
            obligation_types: or_empty("tipos de obrigação", obligation_types),
            users: or_empty("usuários", users),
        }
    }
}
