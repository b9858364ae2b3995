// src/services/notification_service.rs

use crate::{
    common::error::AppError,
    db::{NotificationRepository, UserRepository},
    domain::approval::ApprovalAction,
    models::notification::{
        NewNotification, Notification, NotificationStats, NotificationType, Priority,
    },
};

/// Monta a notificação enviada ao autor quando uma entrega é decidida.
pub fn approval_notification(
    recipient_id: i64,
    obligation_id: i64,
    action: ApprovalAction,
    obligation_label: &str,
    competence: &str,
    decided_by: &str,
    comment: Option<&str>,
) -> NewNotification {
    let comment = comment.map(str::trim).filter(|c| !c.is_empty());

    let (title, priority, mut message) = match action {
        ApprovalAction::Approve => {
            let mut message = format!("Sua entrega de {obligation_label} foi aprovada por {decided_by}.");
            if let Some(c) = comment {
                message.push_str(&format!("\n\nComentário: {c}"));
            }
            ("✅ Entrega Aprovada", Priority::Medium, message)
        }
        ApprovalAction::Reject => {
            let mut message = format!("Sua entrega de {obligation_label} foi recusada por {decided_by}.");
            if let Some(c) = comment {
                message.push_str(&format!("\n\nMotivo: {c}"));
            }
            ("🔴 Entrega Recusada", Priority::High, message)
        }
        ApprovalAction::RequestRevision => {
            let mut message =
                format!("{decided_by} solicitou revisão da sua entrega de {obligation_label}.");
            if let Some(c) = comment {
                message.push_str(&format!("\n\nObservações: {c}"));
            }
            ("⚠️ Revisão Solicitada", Priority::High, message)
        }
    };
    message.push_str(&format!("\n\nCompetência: {competence}"));

    NewNotification {
        user_id: recipient_id,
        obligation_id: Some(obligation_id),
        kind: NotificationType::Approval,
        priority,
        title: title.to_string(),
        message,
    }
}

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    user_repo: UserRepository,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Notification>, AppError> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn stats(&self, user_id: i64) -> Result<NotificationStats, AppError> {
        self.repo.stats_for_user(user_id).await
    }

    pub async fn mark_read(&self, user_id: i64, id: i64) -> Result<(), AppError> {
        if !self.repo.mark_read(user_id, id).await? {
            return Err(AppError::NotFound("Notificação não encontrada".into()));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, AppError> {
        self.repo.mark_all_read(user_id).await
    }

    /// Grava a notificação se ainda não houver uma equivalente hoje.
    pub async fn notify_deduplicated(&self, new: &NewNotification) -> Result<bool, AppError> {
        let created = self.repo.create_deduplicated(new).await?;
        if created {
            tracing::debug!(user_id = new.user_id, "🔔 Notificação criada: {}", new.title);
        }
        Ok(created)
    }

    pub async fn admin_ids(&self) -> Result<Vec<i64>, AppError> {
        self.user_repo.admin_ids().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_message_carries_comment_and_competence() {
        let n = approval_notification(
            7,
            3,
            ApprovalAction::Approve,
            "DCTF - Empresa X",
            "03/2025",
            "maria",
            Some("ok"),
        );
        assert_eq!(n.title, "✅ Entrega Aprovada");
        assert_eq!(n.priority, Priority::Medium);
        assert_eq!(n.kind, NotificationType::Approval);
        assert!(n.message.contains("aprovada por maria"));
        assert!(n.message.contains("\n\nComentário: ok"));
        assert!(n.message.ends_with("\n\nCompetência: 03/2025"));
    }

    #[test]
    fn rejection_is_high_priority_with_reason() {
        let n = approval_notification(
            7,
            3,
            ApprovalAction::Reject,
            "DCTF",
            "03/2025",
            "maria",
            Some("Recibo ilegível"),
        );
        assert_eq!(n.title, "🔴 Entrega Recusada");
        assert_eq!(n.priority, Priority::High);
        assert!(n.message.contains("Motivo: Recibo ilegível"));
    }

    #[test]
    fn blank_comment_is_omitted() {
        let n = approval_notification(
            1,
            2,
            ApprovalAction::RequestRevision,
            "GIA",
            "01/2025",
            "joao",
            Some("   "),
        );
        assert_eq!(n.title, "⚠️ Revisão Solicitada");
        assert!(!n.message.contains("Observações"));
    }
}
