// src/services/recurrence_service.rs

use std::collections::HashSet;

use chrono::Local;
use sqlx::{PgConnection, PgPool};

use crate::{
    common::error::AppError,
    db::{obligation_repo::SeriesKey, ObligationRepository, ReferenceRepository},
    domain::{
        competence::Competence,
        recurrence::{self, Period, CONFLICT_REASON},
    },
    models::{
        obligation::NewObligation,
        recurrence::{
            BaseKind, CreatedObligationRef, GenerateSummary, ProposedObligation, RecurrenceBase,
            RecurrenceGenerateResult, RecurrencePreview, RecurrenceRequest, SkippedProposal,
        },
    },
};

fn conflict(competence: String) -> SkippedProposal {
    SkippedProposal { competence, reason: CONFLICT_REASON.to_string() }
}

/// Separa os períodos livres dos que já têm obrigação na série.
fn partition_periods<'a>(
    periods: &'a [Period],
    existing: &'a HashSet<Competence>,
) -> (Vec<&'a Period>, Vec<SkippedProposal>) {
    let mut free = Vec::new();
    let mut skipped = Vec::new();
    for (period, taken) in recurrence::flag_conflicts(periods, existing) {
        if taken {
            skipped.push(conflict(period.competence.to_string()));
        } else {
            free.push(period);
        }
    }
    (free, skipped)
}

fn summarize(created: &[i64], skipped: &[SkippedProposal], total_requested: u32) -> GenerateSummary {
    GenerateSummary { created_count: created.len(), skipped_count: skipped.len(), total_requested }
}

/// Base resolvida e períodos projetados para uma requisição.
struct Plan {
    obligation_name: String,
    base: RecurrenceBase,
    responsible_user_id: Option<i64>,
    periods: Vec<Period>,
    existing: HashSet<Competence>,
}

#[derive(Clone)]
pub struct RecurrenceService {
    pool: PgPool,
    obligation_repo: ObligationRepository,
    reference_repo: ReferenceRepository,
}

impl RecurrenceService {
    pub fn new(pool: PgPool, obligation_repo: ObligationRepository, reference_repo: ReferenceRepository) -> Self {
        Self { pool, obligation_repo, reference_repo }
    }

    pub async fn preview(&self, request: &RecurrenceRequest) -> Result<RecurrencePreview, AppError> {
        let mut conn = self.pool.acquire().await?;
        let plan = self.plan(&mut conn, request).await?;

        let proposed = recurrence::flag_conflicts(&plan.periods, &plan.existing)
            .map(|(period, conflict)| ProposedObligation {
                competence: period.competence.to_string(),
                due_date: period.due_date,
                delivery_deadline: period.delivery_deadline,
                would_conflict: conflict,
                conflict_reason: conflict.then(|| CONFLICT_REASON.to_string()),
            })
            .collect();

        Ok(RecurrencePreview { base_used: plan.base, proposed, count_requested: request.count })
    }

    /// Gera as obrigações projetadas numa única transação.
    pub async fn generate(
        &self,
        request: &RecurrenceRequest,
        user_id: i64,
    ) -> Result<RecurrenceGenerateResult, AppError> {
        let mut tx = self.pool.begin().await?;
        let plan = self.plan(&mut tx, request).await?;

        let now = Local::now();
        let notes = format!(
            "Obrigação gerada automaticamente por recorrência - {}",
            now.format("%d/%m/%Y %H:%M")
        );

        let (free, mut skipped) = partition_periods(&plan.periods, &plan.existing);
        let mut created = Vec::new();
        let mut last_created = None;

        for period in free {
            let competence = period.competence.to_string();
            let new = NewObligation {
                company_id: request.company_id,
                state_id: request.state_id,
                obligation_type_id: request.obligation_type_id,
                obligation_name: plan.obligation_name.clone(),
                competence: competence.clone(),
                due_date: period.due_date,
                delivery_deadline: period.delivery_deadline,
                responsible_user_id: plan.responsible_user_id,
                validity_start_date: Some(now.date_naive()),
                validity_end_date: None,
                notes: Some(notes.clone()),
                created_by: Some(user_id),
            };

            // Outra transação pode ter criado a competência depois do plano
            match self.obligation_repo.create_if_absent(&mut *tx, &new).await? {
                Some(id) => {
                    created.push(id);
                    last_created = Some(CreatedObligationRef { id, competence, due_date: period.due_date });
                }
                None => skipped.push(conflict(competence)),
            }
        }

        tx.commit().await?;

        tracing::info!(
            "🔁 Recorrência de '{}': {} criadas, {} ignoradas",
            plan.obligation_name,
            created.len(),
            skipped.len()
        );

        Ok(RecurrenceGenerateResult {
            summary: summarize(&created, &skipped, request.count),
            created,
            skipped,
            base_used: plan.base,
            last_created,
        })
    }

    async fn plan(&self, conn: &mut PgConnection, request: &RecurrenceRequest) -> Result<Plan, AppError> {
        if self.reference_repo.find_company(request.company_id).await?.is_none() {
            return Err(AppError::NotFound("Empresa não encontrada".into()));
        }
        if self.reference_repo.find_state(request.state_id).await?.is_none() {
            return Err(AppError::NotFound("Estado não encontrado".into()));
        }
        let obligation_type = self
            .reference_repo
            .find_obligation_type(&mut *conn, request.obligation_type_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tipo de obrigação não encontrado".into()))?;

        let interval = obligation_type.recurrence.interval_months().ok_or_else(|| {
            AppError::BadRequest(
                "Tipo de obrigação com recorrência específica não permite geração automática".into(),
            )
        })?;

        let obligation_name = request
            .obligation_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&obligation_type.name)
            .to_string();

        let key = SeriesKey {
            company_id: request.company_id,
            state_id: request.state_id,
            obligation_type_id: request.obligation_type_id,
            obligation_name: &obligation_name,
        };

        let latest = self.obligation_repo.latest_in_series(&mut *conn, &key).await?;
        let (base, base_period, responsible_user_id) = match latest {
            Some(existing) => {
                let competence = Competence::parse_lenient(&existing.competence).map_err(|_| {
                    AppError::BadRequest(format!(
                        "Competência da obrigação base é inválida: {}",
                        existing.competence
                    ))
                })?;
                let period = Period {
                    competence,
                    due_date: existing.due_date,
                    delivery_deadline: existing.delivery_deadline,
                };
                let base = RecurrenceBase {
                    id: Some(existing.id),
                    competence: existing.competence.clone(),
                    due_date: existing.due_date,
                    delivery_deadline: existing.delivery_deadline,
                    kind: BaseKind::Existing,
                };
                (base, period, existing.responsible_user_id)
            }
            None => {
                let (Some(raw_competence), Some(due_date)) =
                    (request.start_competence.as_deref(), request.start_due_date)
                else {
                    return Err(AppError::BadRequest(
                        "Nenhuma obrigação base encontrada. Informe start_competence e start_due_date."
                            .into(),
                    ));
                };
                let competence = Competence::parse(raw_competence)
                    .map_err(|e| AppError::field("start_competence", e.to_string()))?;
                let period = Period {
                    competence,
                    due_date,
                    delivery_deadline: request.start_delivery_deadline,
                };
                let base = RecurrenceBase {
                    id: None,
                    competence: competence.to_string(),
                    due_date,
                    delivery_deadline: request.start_delivery_deadline,
                    kind: BaseKind::Manual,
                };
                (base, period, None)
            }
        };

        let existing = self
            .obligation_repo
            .competences_in_series(&mut *conn, &key)
            .await?
            .iter()
            .filter_map(|c| Competence::parse_lenient(c).ok())
            .collect();

        Ok(Plan {
            obligation_name,
            base,
            responsible_user_id,
            periods: recurrence::project(&base_period, interval, request.count),
            existing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn periods() -> Vec<Period> {
        let base = Period {
            competence: Competence::parse("12/2024").unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            delivery_deadline: None,
        };
        recurrence::project(&base, 1, 3)
    }

    #[test]
    fn taken_competences_are_skipped_and_not_counted() {
        let periods = periods();
        let existing: HashSet<Competence> = [Competence::parse("02/2025").unwrap()].into();

        let (free, skipped) = partition_periods(&periods, &existing);
        let free: Vec<String> = free.iter().map(|p| p.competence.to_string()).collect();
        assert_eq!(free, ["01/2025", "03/2025"]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].competence, "02/2025");
        assert_eq!(skipped[0].reason, CONFLICT_REASON);

        // Só o que foi de fato inserido entra em created_count
        let created = vec![10, 11];
        let summary = summarize(&created, &skipped, 3);
        assert_eq!(summary.created_count, 2);
        assert_eq!(summary.skipped_count, 1);
        assert_eq!(summary.total_requested, 3);
    }

    #[test]
    fn all_taken_creates_nothing() {
        let periods = periods();
        let existing: HashSet<Competence> = periods.iter().map(|p| p.competence).collect();

        let (free, skipped) = partition_periods(&periods, &existing);
        assert!(free.is_empty());
        let summary = summarize(&[], &skipped, 3);
        assert_eq!((summary.created_count, summary.skipped_count), (0, 3));
    }
}
