// src/services/dispatch_service.rs

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{dispatch_repo::DispatchFields, DispatchRepository},
    domain::progress,
    models::{
        dispatch::{
            CreateDispatchPayload, CreateSubtaskPayload, Dispatch, DispatchFilter,
            DispatchNotificationsResult, DispatchProgress, DispatchStatus, RecalculateResult,
            Subtask, UpdateDispatchPayload, UpdateSubtaskPayload,
        },
        notification::{NewNotification, NotificationType, Priority},
    },
    services::notification_service::NotificationService,
};

const DISPATCH_NOT_FOUND: &str = "Despacho não encontrado";
const SUBTASK_NOT_FOUND: &str = "Subtarefa não encontrada";
const REMINDER_WINDOW_DAYS: i64 = 7;

/// Empresa ou responsável inexistente chega como violação de chave estrangeira.
fn invalid_reference(err: AppError) -> AppError {
    match err {
        AppError::DatabaseError(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            AppError::BadRequest("Empresa ou responsável inválido.".into())
        }
        other => other,
    }
}

fn reminder_priority(days_left: i64) -> Priority {
    match days_left {
        i64::MIN..=1 => Priority::Urgent,
        2..=3 => Priority::High,
        _ => Priority::Medium,
    }
}

/// Lembretes de um despacho não concluído: responsável e, se diferente, o criador.
fn dispatch_reminders(dispatch: &Dispatch, today: NaiveDate) -> Vec<NewNotification> {
    let days = (dispatch.end_date - today).num_days();
    let label = dispatch.category.label();
    let subject = dispatch.title.as_deref().unwrap_or(label);
    let message = format!(
        "{} \"{}\" da empresa {} termina em {} ({}% concluído).",
        label,
        subject,
        dispatch.company_name,
        dispatch.end_date.format("%d/%m/%Y"),
        dispatch.progress_pct.round_dp(0)
    );

    let (priority, responsible_title, creator_title) = if days < 0 {
        let overdue = format!("🔴 Despacho em atraso há {} dia(s)", -days);
        (Priority::Urgent, overdue.clone(), overdue)
    } else {
        (
            reminder_priority(days),
            format!("⚠️ Despacho vence em {days} dia(s)"),
            format!("📋 Despacho criado por você vence em {days} dia(s)"),
        )
    };

    let notification = |user_id: i64, title: String| NewNotification {
        user_id,
        obligation_id: None,
        kind: NotificationType::Reminder,
        priority,
        title,
        message: message.clone(),
    };

    let mut reminders = Vec::new();
    if let Some(responsible) = dispatch.responsible_id {
        reminders.push(notification(responsible, responsible_title));
    }
    if let Some(creator) = dispatch.created_by.filter(|c| Some(*c) != dispatch.responsible_id) {
        reminders.push(notification(creator, creator_title));
    }
    reminders
}

#[derive(Clone)]
pub struct DispatchService {
    pool: PgPool,
    repo: DispatchRepository,
    notifications: NotificationService,
}

impl DispatchService {
    pub fn new(pool: PgPool, repo: DispatchRepository, notifications: NotificationService) -> Self {
        Self { pool, repo, notifications }
    }

    pub async fn list(&self, filter: &DispatchFilter) -> Result<Vec<Dispatch>, AppError> {
        let mut dispatches = self.repo.list(filter).await?;
        let ids: Vec<Uuid> = dispatches.iter().map(|d| d.id).collect();

        let mut by_dispatch: HashMap<Uuid, Vec<Subtask>> = HashMap::new();
        for subtask in self.repo.subtasks_for(&ids).await? {
            by_dispatch.entry(subtask.dispatch_id).or_default().push(subtask);
        }
        for dispatch in &mut dispatches {
            dispatch.subtasks = by_dispatch.remove(&dispatch.id).unwrap_or_default();
        }
        Ok(dispatches)
    }

    pub async fn get(&self, id: Uuid) -> Result<Dispatch, AppError> {
        let mut dispatch = self
            .repo
            .find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(DISPATCH_NOT_FOUND.into()))?;
        dispatch.subtasks = self.repo.subtasks_of(&self.pool, id).await?;
        Ok(dispatch)
    }

    pub async fn create(&self, payload: &CreateDispatchPayload, user_id: i64) -> Result<Dispatch, AppError> {
        let id = self.repo.create(payload, user_id).await.map_err(invalid_reference)?;
        tracing::info!("📋 Despacho {} criado ({})", id, payload.category.label());
        self.get(id).await
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateDispatchPayload) -> Result<Dispatch, AppError> {
        let current = self.get(id).await?;
        let fields = DispatchFields {
            company_id: payload.company_id.unwrap_or(current.company_id),
            category: payload.category.unwrap_or(current.category),
            title: payload.title.clone().or(current.title),
            responsible_id: payload.responsible_id.or(current.responsible_id),
            start_date: payload.start_date.unwrap_or(current.start_date),
            end_date: payload.end_date.unwrap_or(current.end_date),
        };
        if fields.end_date < fields.start_date {
            return Err(AppError::field("end_date", "A data final deve ser posterior à data inicial."));
        }

        self.repo.update(id, &fields).await.map_err(invalid_reference)?;
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound(DISPATCH_NOT_FOUND.into()));
        }
        Ok(())
    }

    pub async fn progress(&self, id: Uuid) -> Result<DispatchProgress, AppError> {
        let dispatch = self.get(id).await?;
        let statuses: Vec<DispatchStatus> = dispatch.subtasks.iter().map(|s| s.status).collect();
        let (progress_pct, status) = progress::compute(&statuses);
        Ok(DispatchProgress { id, progress_pct, status, totals: progress::totals(&statuses) })
    }

    // ===== SUBTAREFAS =====

    pub async fn subtasks(&self, id: Uuid) -> Result<Vec<Subtask>, AppError> {
        self.get(id).await.map(|d| d.subtasks)
    }

    pub async fn add_subtask(&self, id: Uuid, payload: &CreateSubtaskPayload) -> Result<Subtask, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock(&mut tx, id).await?;

        let position = match payload.order {
            Some(order) => order,
            None => self.repo.next_position(&mut *tx, id).await?,
        };
        let subtask = self
            .repo
            .insert_subtask(
                &mut *tx,
                id,
                payload.name.trim(),
                payload.status.unwrap_or_default(),
                position,
            )
            .await?;

        self.recompute(&mut tx, id).await?;
        tx.commit().await?;
        Ok(subtask)
    }

    pub async fn update_subtask(
        &self,
        id: Uuid,
        subtask_id: Uuid,
        payload: &UpdateSubtaskPayload,
    ) -> Result<Subtask, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock(&mut tx, id).await?;

        let current = self
            .repo
            .find_subtask(&mut *tx, id, subtask_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SUBTASK_NOT_FOUND.into()))?;

        let name = payload.name.as_deref().map(str::trim).unwrap_or(&current.name);
        let status = payload.status.unwrap_or(current.status);
        let order = payload.order.unwrap_or(current.order);
        self.repo.update_subtask(&mut *tx, subtask_id, name, status, order).await?;

        self.recompute(&mut tx, id).await?;
        let updated = self
            .repo
            .find_subtask(&mut *tx, id, subtask_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SUBTASK_NOT_FOUND.into()))?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_subtask(&self, id: Uuid, subtask_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock(&mut tx, id).await?;

        self.repo
            .find_subtask(&mut *tx, id, subtask_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SUBTASK_NOT_FOUND.into()))?;
        self.repo.delete_subtask(&mut *tx, subtask_id).await?;

        self.recompute(&mut tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ===== ROTINAS =====

    pub async fn recalculate_all(&self) -> Result<RecalculateResult, AppError> {
        let mut updated = 0;
        for id in self.repo.all_ids().await? {
            let mut tx = self.pool.begin().await?;
            self.recompute(&mut tx, id).await?;
            tx.commit().await?;
            updated += 1;
        }
        tracing::info!("📊 Progresso recalculado para {} despachos", updated);
        Ok(RecalculateResult { updated })
    }

    pub async fn run_notifications(&self) -> Result<DispatchNotificationsResult, AppError> {
        let today = Local::now().date_naive();
        let until = today + chrono::Duration::days(REMINDER_WINDOW_DAYS);

        let mut created = 0;
        for dispatch in self.repo.unfinished_ending_by(until).await? {
            for reminder in dispatch_reminders(&dispatch, today) {
                if self.notifications.notify_deduplicated(&reminder).await? {
                    created += 1;
                }
            }
        }

        tracing::info!("🔔 Lembretes de despachos: {}", created);
        Ok(DispatchNotificationsResult { notifications_created: created })
    }

    async fn lock(&self, conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        if !self.repo.lock(&mut *conn, id).await? {
            return Err(AppError::NotFound(DISPATCH_NOT_FOUND.into()));
        }
        Ok(())
    }

    /// Recalcula percentual e status a partir das subtarefas atuais.
    async fn recompute(&self, conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        let statuses: Vec<DispatchStatus> = self
            .repo
            .subtasks_of(&mut *conn, id)
            .await?
            .iter()
            .map(|s| s.status)
            .collect();
        let (pct, status) = progress::compute(&statuses);
        self.repo.set_progress(&mut *conn, id, pct, status).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::dispatch::DispatchCategory;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dispatch(end_date: NaiveDate, responsible: Option<i64>, creator: Option<i64>) -> Dispatch {
        Dispatch {
            id: Uuid::nil(),
            company_id: 1,
            company_name: "Alfa Ltda".into(),
            category: DispatchCategory::Fiscalizacao,
            title: Some("Auditoria ICMS".into()),
            responsible_id: responsible,
            responsible_username: None,
            start_date: d(2025, 3, 1),
            end_date,
            progress_pct: Decimal::new(5000, 2),
            status: DispatchStatus::EmAndamento,
            created_by: creator,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            subtasks: Vec::new(),
        }
    }

    #[test]
    fn reminder_reaches_responsible_and_creator() {
        let reminders = dispatch_reminders(&dispatch(d(2025, 3, 13), Some(2), Some(3)), d(2025, 3, 10));
        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].title, "⚠️ Despacho vence em 3 dia(s)");
        assert_eq!(reminders[1].title, "📋 Despacho criado por você vence em 3 dia(s)");
        assert!(reminders.iter().all(|r| r.priority == Priority::High));
        assert!(reminders[0].message.contains("Fiscalização \"Auditoria ICMS\""));
        assert!(reminders[0].message.contains("(50% concluído)"));
    }

    #[test]
    fn creator_who_is_responsible_gets_one_reminder() {
        let reminders = dispatch_reminders(&dispatch(d(2025, 3, 17), Some(2), Some(2)), d(2025, 3, 10));
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].priority, Priority::Medium);
    }

    #[test]
    fn overdue_dispatch_is_urgent() {
        let reminders = dispatch_reminders(&dispatch(d(2025, 3, 8), Some(2), None), d(2025, 3, 10));
        assert_eq!(reminders[0].title, "🔴 Despacho em atraso há 2 dia(s)");
        assert_eq!(reminders[0].priority, Priority::Urgent);
    }
}
