// src/services/obligation_service.rs

use chrono::{Local, NaiveDate};

use crate::{
    common::error::AppError,
    db::ObligationRepository,
    domain::status,
    models::obligation::{
        CreateObligationPayload, NewObligation, Obligation, ObligationFilter, ObligationStatus,
        UpdateObligationPayload,
    },
};

const INCONSISTENT_VALIDITY: &str = "O início da vigência não pode ser posterior ao fim.";

fn with_status(mut obligation: Obligation, today: NaiveDate) -> Obligation {
    obligation.status = status::classify(obligation.has_approved_submission, obligation.due_date, today);
    obligation
}

#[derive(Clone)]
pub struct ObligationService {
    repo: ObligationRepository,
}

impl ObligationService {
    pub fn new(repo: ObligationRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, filter: &ObligationFilter) -> Result<Vec<Obligation>, AppError> {
        let wanted = match filter.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                ObligationStatus::parse(raw)
                    .ok_or_else(|| AppError::field("status", "Status inválido."))?,
            ),
            None => None,
        };
        let today = Local::now().date_naive();

        Ok(self
            .repo
            .list(filter)
            .await?
            .into_iter()
            .map(|o| with_status(o, today))
            .filter(|o| wanted.is_none_or(|w| o.status == w))
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<Obligation, AppError> {
        let obligation = self
            .repo
            .find(self.repo_pool(), id)
            .await?
            .ok_or_else(|| AppError::NotFound("Obrigação não encontrada".into()))?;
        Ok(with_status(obligation, Local::now().date_naive()))
    }

    pub async fn create(
        &self,
        payload: &CreateObligationPayload,
        created_by: i64,
    ) -> Result<Obligation, AppError> {
        let new = NewObligation::from((payload, created_by));
        if !new.validity_is_consistent() {
            return Err(AppError::field("validity_end_date", INCONSISTENT_VALIDITY));
        }
        let id = self.repo.create(self.repo_pool(), &new).await?;
        self.get(id).await
    }

    pub async fn update(&self, id: i64, patch: &UpdateObligationPayload) -> Result<Obligation, AppError> {
        let current = self.get(id).await?;
        let merged = NewObligation::merged(&current, patch);
        if !merged.validity_is_consistent() {
            return Err(AppError::field("validity_end_date", INCONSISTENT_VALIDITY));
        }
        self.repo.update(id, &merged).await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Obrigação não encontrada".into()));
        }
        Ok(())
    }

    pub async fn bulk_delete(&self, ids: &[i64]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Err(AppError::field("ids", "Informe ao menos uma obrigação."));
        }
        let deleted = self.repo.bulk_delete(ids).await?;
        tracing::info!("🗑️ {} obrigações removidas em lote", deleted);
        Ok(deleted)
    }

    fn repo_pool(&self) -> &sqlx::PgPool {
        self.repo.pool()
    }
}
