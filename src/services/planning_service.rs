// src/services/planning_service.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{Local, NaiveDate};
use tokio::task::JoinHandle;

use crate::{
    common::error::AppError,
    db::{obligation_repo::SeriesKey, NotificationRepository, ObligationRepository, ReferenceRepository},
    domain::{
        competence::{add_months_clamped, Competence},
        recurrence::{self, Period},
        status,
    },
    models::{
        notification::{NewNotification, NotificationType, Priority},
        obligation::{NewObligation, Obligation},
        planning::{CheckResult, EmailResult, GeneratePlanRequest, GeneratePlanResult},
    },
    services::{mailer::Mailer, notification_service::NotificationService},
};

fn br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Alertas de vencimento próximo: responsável sempre, admins se urgente/alta.
fn due_soon_alerts(obligation: &Obligation, today: NaiveDate, admin_ids: &[i64]) -> Vec<NewNotification> {
    let days = (obligation.due_date - today).num_days();
    let priority = status::due_priority(days);
    let message = format!(
        "A obrigação {} da empresa {} vence em {} dia(s) ({}).",
        obligation.obligation_type_name,
        obligation.company_name,
        days,
        br_date(obligation.due_date)
    );

    let mut alerts = Vec::new();
    if let Some(user_id) = obligation.responsible_user_id {
        alerts.push(NewNotification {
            user_id,
            obligation_id: Some(obligation.id),
            kind: NotificationType::DueSoon,
            priority,
            title: format!("⚠️ Obrigação vence em {days} dia(s)"),
            message: message.clone(),
        });
    }
    if matches!(priority, Priority::Urgent | Priority::High) {
        alerts.extend(admin_ids.iter().map(|&user_id| NewNotification {
            user_id,
            obligation_id: Some(obligation.id),
            kind: NotificationType::DueSoon,
            priority,
            title: format!("🚨 Obrigação crítica: {days} dia(s) para vencimento"),
            message: message.clone(),
        }));
    }
    alerts
}

fn overdue_alerts(obligation: &Obligation, today: NaiveDate, admin_ids: &[i64]) -> Vec<NewNotification> {
    let days = (today - obligation.due_date).num_days();
    let message = format!(
        "A obrigação {} da empresa {} está em atraso desde {}.",
        obligation.obligation_type_name,
        obligation.company_name,
        br_date(obligation.due_date)
    );

    let responsible = obligation.responsible_user_id.map(|user_id| NewNotification {
        user_id,
        obligation_id: Some(obligation.id),
        kind: NotificationType::Overdue,
        priority: Priority::Urgent,
        title: format!("🔴 Obrigação em atraso há {days} dia(s)"),
        message: message.clone(),
    });
    let admins = admin_ids.iter().map(|&user_id| NewNotification {
        user_id,
        obligation_id: Some(obligation.id),
        kind: NotificationType::Overdue,
        priority: Priority::Urgent,
        title: format!("🚨 Obrigação em atraso há {days} dia(s)"),
        message: message.clone(),
    });
    responsible.into_iter().chain(admins).collect()
}

#[derive(Clone)]
pub struct PlanningService {
    obligation_repo: ObligationRepository,
    reference_repo: ReferenceRepository,
    notifications: NotificationService,
    notification_repo: NotificationRepository,
    mailer: Arc<dyn Mailer>,
}

impl PlanningService {
    pub fn new(
        obligation_repo: ObligationRepository,
        reference_repo: ReferenceRepository,
        notifications: NotificationService,
        notification_repo: NotificationRepository,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self { obligation_repo, reference_repo, notifications, notification_repo, mailer }
    }

    /// Estende cada série até hoje + `months_ahead` meses.
    pub async fn generate(&self, request: &GeneratePlanRequest, user_id: i64) -> Result<GeneratePlanResult, AppError> {
        let intervals: HashMap<i64, Option<u32>> = self
            .reference_repo
            .list_obligation_types()
            .await?
            .into_iter()
            .map(|t| (t.id, t.recurrence.interval_months()))
            .collect();

        let now = Local::now();
        let today = now.date_naive();
        let until = add_months_clamped(today, request.months_ahead);
        let notes = format!(
            "Obrigação gerada automaticamente pelo planejamento - {}",
            now.format("%d/%m/%Y %H:%M")
        );

        let series = self
            .obligation_repo
            .latest_per_series(
                request.company_id,
                request.obligation_type_id,
                request.obligation_name.as_deref(),
                request.state_id,
            )
            .await?;

        let pool = self.obligation_repo.pool();
        let mut generated = 0;
        let mut skipped = 0;

        for base in &series {
            let Some(Some(interval)) = intervals.get(&base.obligation_type_id).copied() else {
                continue;
            };
            let Ok(competence) = Competence::parse_lenient(&base.competence) else {
                tracing::warn!("Competência inválida na obrigação {}: {}", base.id, base.competence);
                continue;
            };
            let base_period = Period {
                competence,
                due_date: base.due_date,
                delivery_deadline: base.delivery_deadline,
            };

            let key = SeriesKey {
                company_id: base.company_id,
                state_id: base.state_id,
                obligation_type_id: base.obligation_type_id,
                obligation_name: &base.obligation_name,
            };
            let existing = self
                .obligation_repo
                .competences_in_series(pool, &key)
                .await?
                .iter()
                .filter_map(|c| Competence::parse_lenient(c).ok())
                .collect();

            let periods = recurrence::project_until(&base_period, interval, until);
            for (period, conflict) in recurrence::flag_conflicts(&periods, &existing) {
                if conflict {
                    skipped += 1;
                    continue;
                }
                let new = NewObligation {
                    company_id: base.company_id,
                    state_id: base.state_id,
                    obligation_type_id: base.obligation_type_id,
                    obligation_name: base.obligation_name.clone(),
                    competence: period.competence.to_string(),
                    due_date: period.due_date,
                    delivery_deadline: period.delivery_deadline,
                    responsible_user_id: base.responsible_user_id,
                    validity_start_date: Some(today),
                    validity_end_date: None,
                    notes: Some(notes.clone()),
                    created_by: Some(user_id),
                };
                match self.obligation_repo.create_if_absent(pool, &new).await? {
                    Some(_) => generated += 1,
                    None => skipped += 1,
                }
            }
        }

        let message = format!("{generated} obrigações geradas, {skipped} já existentes");
        tracing::info!("🗓️ Planejamento: {}", message);
        Ok(GeneratePlanResult { generated, skipped, message })
    }

    pub async fn check_due_dates(&self, days_ahead: i64) -> Result<CheckResult, AppError> {
        let today = Local::now().date_naive();
        let until = today + chrono::Duration::days(days_ahead);
        let admin_ids = self.notifications.admin_ids().await?;

        let mut created = 0;
        for obligation in self.obligation_repo.unapproved_due_between(today, until).await? {
            for alert in due_soon_alerts(&obligation, today, &admin_ids) {
                if self.notifications.notify_deduplicated(&alert).await? {
                    created += 1;
                }
            }
        }

        tracing::info!("⏰ Verificação de vencimentos: {} notificações", created);
        Ok(CheckResult {
            notifications_created: created,
            message: format!("{created} notificações de vencimento criadas"),
        })
    }

    pub async fn check_overdue(&self) -> Result<CheckResult, AppError> {
        let today = Local::now().date_naive();
        let admin_ids = self.notifications.admin_ids().await?;

        let mut created = 0;
        for obligation in self.obligation_repo.unapproved_overdue(today).await? {
            for alert in overdue_alerts(&obligation, today, &admin_ids) {
                if self.notifications.notify_deduplicated(&alert).await? {
                    created += 1;
                }
            }
        }

        tracing::info!("🔴 Verificação de atrasos: {} notificações", created);
        Ok(CheckResult {
            notifications_created: created,
            message: format!("{created} notificações de atraso criadas"),
        })
    }

    /// Um e-mail por usuário com notificações não lidas.
    pub async fn send_emails(&self) -> Result<EmailResult, AppError> {
        let mut sent = 0;
        for digest in self.notification_repo.unread_digests().await? {
            if digest.email.trim().is_empty() {
                continue;
            }
            let subject = format!(
                "[Sistema] Você tem {} notificação(ões) pendente(s)",
                digest.unread
            );
            let body = format!(
                "Olá, {}.\n\nVocê tem {} notificação(ões) não lida(s) no sistema de obrigações.\nAcesse o sistema para conferir.",
                digest.username, digest.unread
            );
            match self.mailer.send(&digest.email, &subject, &body).await {
                Ok(()) => sent += 1,
                Err(e) => tracing::error!("Falha ao enviar e-mail para {}: {}", digest.email, e),
            }
        }

        Ok(EmailResult { emails_sent: sent, message: format!("{sent} e-mails enviados") })
    }

    /// Executa as verificações de vencimento e atraso periodicamente.
    pub fn spawn_background(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.check_due_dates(7).await {
                    tracing::error!("Falha na verificação de vencimentos: {}", e);
                }
                if let Err(e) = self.check_overdue().await {
                    tracing::error!("Falha na verificação de atrasos: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::obligation::ObligationStatus;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn obligation(due_date: NaiveDate, responsible: Option<i64>) -> Obligation {
        Obligation {
            id: 10,
            company_id: 1,
            company_name: "Alfa Ltda".into(),
            company_cnpj: None,
            state_id: 25,
            state_code: "SP".into(),
            obligation_type_id: 1,
            obligation_type_name: "Federal".into(),
            obligation_name: "DCTF".into(),
            competence: "02/2025".into(),
            due_date,
            delivery_deadline: None,
            responsible_user_id: responsible,
            responsible_username: None,
            validity_start_date: None,
            validity_end_date: None,
            notes: None,
            created_by: None,
            created_at: Utc::now(),
            has_submission: false,
            has_approved_submission: false,
            status: ObligationStatus::Pendente,
        }
    }

    #[test]
    fn low_priority_due_alert_skips_admins() {
        let alerts = due_soon_alerts(&obligation(d(2025, 3, 17), Some(4)), d(2025, 3, 10), &[1, 2]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].priority, Priority::Low);
        assert_eq!(alerts[0].title, "⚠️ Obrigação vence em 7 dia(s)");
        assert_eq!(
            alerts[0].message,
            "A obrigação Federal da empresa Alfa Ltda vence em 7 dia(s) (17/03/2025)."
        );
    }

    #[test]
    fn urgent_due_alert_reaches_admins() {
        let alerts = due_soon_alerts(&obligation(d(2025, 3, 11), None), d(2025, 3, 10), &[1, 2]);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.priority == Priority::Urgent));
        assert_eq!(alerts[0].title, "🚨 Obrigação crítica: 1 dia(s) para vencimento");
    }

    #[test]
    fn overdue_alerts_cover_responsible_and_admins() {
        let alerts = overdue_alerts(&obligation(d(2025, 3, 5), Some(4)), d(2025, 3, 10), &[1]);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].user_id, 4);
        assert_eq!(alerts[0].title, "🔴 Obrigação em atraso há 5 dia(s)");
        assert_eq!(alerts[1].title, "🚨 Obrigação em atraso há 5 dia(s)");
        assert!(alerts.iter().all(|a| a.kind == NotificationType::Overdue));
    }
}
