// src/services/approval_service.rs

use std::collections::HashMap;

use chrono::Local;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    common::{error::AppError, storage::MediaStorage},
    db::{
        submission_repo::SubmissionDetail, AuditRepository, NotificationRepository,
        SubmissionRepository,
    },
    domain::approval::{ApprovalAction, TimelineKind},
    models::{
        approval::{
            Actor, AttachmentRef, CompanyRef, DecisionOutcome, DecisionResult, MyDeliveries,
            MyDeliveriesFilter, MyDelivery, ObligationRef, PendingApproval, PendingFilter,
            PendingList, ResubmitResult, ResubmittedSubmission, Resubmission, Timeline,
            TimelineEvent, TimelineSubmission, UserRef,
        },
        auth::User,
        submission::{Attachment, SubmissionType},
    },
    services::{notification_service::approval_notification, submission_service::store_files},
};

const SUBMISSION_NOT_FOUND: &str = "Entrega não encontrada";

/// Arquivo pronto para download.
#[derive(Debug, Clone)]
pub struct AttachmentDownload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn full_name(first: Option<&str>, last: Option<&str>, username: &str) -> String {
    let full = format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default());
    let full = full.trim();
    if full.is_empty() { username.to_string() } else { full.to_string() }
}

fn author_of(detail: &SubmissionDetail) -> UserRef {
    let username = detail.delivered_by_username.clone().unwrap_or_default();
    UserRef {
        id: detail.delivered_by,
        full_name: full_name(
            detail.delivered_by_first_name.as_deref(),
            detail.delivered_by_last_name.as_deref(),
            &username,
        ),
        username,
    }
}

fn pending_item(detail: SubmissionDetail, attachments: Vec<AttachmentRef>) -> PendingApproval {
    PendingApproval {
        delivered_by: author_of(&detail),
        id: detail.id,
        company: CompanyRef { id: detail.company_id, name: detail.company, cnpj: detail.company_cnpj },
        obligation: ObligationRef {
            id: detail.obligation_id,
            name: detail.obligation_name,
            obligation_type: detail.obligation_type,
            state: detail.state,
            competence: detail.competence,
            due_date: detail.due_date,
        },
        delivery_date: detail.delivery_date,
        delivered_at: detail.delivered_at,
        submission_type: detail.submission_type,
        comments: detail.comments,
        attachments_count: attachments.len(),
        attachments,
        approval_status: detail.approval_status,
    }
}

fn my_delivery(detail: SubmissionDetail) -> MyDelivery {
    MyDelivery {
        id: detail.id,
        company: detail.company,
        company_cnpj: detail.company_cnpj,
        obligation: detail.obligation_name,
        obligation_type: detail.obligation_type,
        state: detail.state,
        competence: detail.competence,
        delivery_date: detail.delivery_date,
        delivered_at: detail.delivered_at,
        submission_type: detail.submission_type,
        approval_status: detail.approval_status,
        approval_comment: detail.approval_comment,
        approval_decision_at: detail.approval_decision_at,
        approval_decision_by: detail.approval_decision_by_username,
        attachments_count: detail.attachments_count,
        can_resubmit: detail.approval_status.can_resubmit(),
        status_info: detail.approval_status.status_info(),
    }
}

#[derive(Clone)]
pub struct ApprovalService {
    pool: PgPool,
    repo: SubmissionRepository,
    audit_repo: AuditRepository,
    notification_repo: NotificationRepository,
    storage: MediaStorage,
}

impl ApprovalService {
    pub fn new(
        pool: PgPool,
        repo: SubmissionRepository,
        audit_repo: AuditRepository,
        notification_repo: NotificationRepository,
        storage: MediaStorage,
    ) -> Self {
        Self { pool, repo, audit_repo, notification_repo, storage }
    }

    pub async fn pending(&self, filter: &PendingFilter) -> Result<PendingList, AppError> {
        let rows = self.repo.pending(filter).await?;
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let mut by_submission: HashMap<i64, Vec<AttachmentRef>> = HashMap::new();
        for a in self.repo.attachments_for(&ids).await? {
            by_submission.entry(a.submission_id).or_default().push(AttachmentRef {
                id: a.id,
                kind: a.kind,
                filename: a.filename,
                uploaded_at: a.created_at,
            });
        }

        let results: Vec<PendingApproval> = rows
            .into_iter()
            .map(|detail| {
                let attachments = by_submission.remove(&detail.id).unwrap_or_default();
                pending_item(detail, attachments)
            })
            .collect();

        Ok(PendingList { count: results.len(), results })
    }

    /// Aprova, recusa ou pede revisão. Decisão, auditoria e notificação do
    /// autor acontecem na mesma transação.
    pub async fn decide(
        &self,
        approver: &User,
        submission_id: i64,
        action: ApprovalAction,
        comment: Option<&str>,
    ) -> Result<DecisionResult, AppError> {
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .lock(&mut *tx, submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SUBMISSION_NOT_FOUND.into()))?;
        let target = current.approval_status.decide(action, comment)?;

        let updated = self
            .repo
            .record_decision(&mut *tx, submission_id, target, approver.id, comment)
            .await?;

        self.audit_repo
            .record(
                &mut *tx,
                Some(approver.id),
                action.audit_action(),
                "Submission",
                &submission_id.to_string(),
                json!({
                    "previous_status": current.approval_status.as_str(),
                    "new_status": target.as_str(),
                    "comment": comment,
                }),
            )
            .await?;

        let detail = self
            .repo
            .detail(&mut *tx, submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SUBMISSION_NOT_FOUND.into()))?;

        if let Some(author_id) = detail.delivered_by {
            let label = format!("{} - {}", detail.obligation_name, detail.company);
            let notification = approval_notification(
                author_id,
                detail.obligation_id,
                action,
                &label,
                &detail.competence,
                &approver.full_name(),
                comment,
            );
            self.notification_repo.create(&mut *tx, &notification).await?;
        }

        tx.commit().await?;
        tracing::info!(
            "📝 Entrega {} -> {} por {}",
            submission_id,
            target.as_str(),
            approver.username
        );

        Ok(DecisionResult {
            message: action.success_message().to_string(),
            submission: DecisionOutcome {
                id: updated.id,
                approval_status: updated.approval_status,
                approval_decision_at: updated.approval_decision_at,
                approval_decision_by: Some(approver.username.clone()),
                approval_comment: updated.approval_comment,
            },
        })
    }

    /// Reenvio pelo autor de uma entrega recusada ou com revisão pedida.
    pub async fn resubmit(
        &self,
        user: &User,
        submission_id: i64,
        resubmission: Resubmission,
    ) -> Result<ResubmitResult, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .lock(&mut *tx, submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SUBMISSION_NOT_FOUND.into()))?;

        if current.delivered_by != Some(user.id) {
            return Err(AppError::Forbidden(
                "Apenas o autor da entrega pode reenviá-la".into(),
            ));
        }
        current.approval_status.resubmit()?;

        let stamp = format!("[Reenviado em {}]", Local::now().format("%d/%m/%Y %H:%M"));
        let comments = match resubmission.comments.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(text) => format!("{text}\n\n{stamp}"),
            None => stamp,
        };

        let updated = self
            .repo
            .resubmit(
                &mut *tx,
                submission_id,
                resubmission.delivery_date,
                &comments,
                SubmissionType::Retificadora,
            )
            .await?;

        let attachments = store_files(
            &mut tx,
            &self.repo,
            &self.storage,
            submission_id,
            resubmission.receipt.as_ref(),
            &resubmission.attachments,
        )
        .await?;

        self.audit_repo
            .record(
                &mut *tx,
                Some(user.id),
                "resubmitted",
                "Submission",
                &submission_id.to_string(),
                json!({
                    "previous_status": current.approval_status.as_str(),
                    "delivery_date": resubmission.delivery_date,
                    "comment": comments,
                    "new_attachments": attachments.len(),
                }),
            )
            .await?;

        tx.commit().await?;

        Ok(ResubmitResult {
            message: "Entrega reenviada com sucesso".into(),
            submission: ResubmittedSubmission {
                id: updated.id,
                approval_status: updated.approval_status,
                delivery_date: updated.delivery_date,
                submission_type: updated.submission_type,
            },
        })
    }

    pub async fn timeline(&self, user: &User, submission_id: i64) -> Result<Timeline, AppError> {
        let detail = self.visible_detail(user, submission_id).await?;
        let events = self.repo_events(submission_id).await?;

        let submitted = TimelineKind::Submitted;
        let author = author_of(&detail);
        let mut timeline = vec![TimelineEvent {
            event: submitted.event().into(),
            label: submitted.label().into(),
            timestamp: detail.delivered_at,
            by: Some(Actor { username: author.username, full_name: author.full_name }),
            comment: None,
            icon: submitted.icon().into(),
            color: submitted.color().into(),
        }];
        timeline.extend(events);

        Ok(Timeline {
            submission: TimelineSubmission {
                id: detail.id,
                company: detail.company,
                obligation: detail.obligation_name,
                competence: detail.competence,
                delivery_date: detail.delivery_date,
                submission_type: detail.submission_type,
                approval_status: detail.approval_status,
                status_info: detail.approval_status.status_info(),
            },
            timeline,
        })
    }

    pub async fn my_deliveries(&self, user_id: i64, filter: &MyDeliveriesFilter) -> Result<MyDeliveries, AppError> {
        let results: Vec<MyDelivery> = self
            .repo
            .delivered_by(user_id, filter)
            .await?
            .into_iter()
            .map(my_delivery)
            .collect();
        Ok(MyDeliveries { count: results.len(), results })
    }

    /// Lê o anexo do disco; permitido a aprovadores e ao autor da entrega.
    pub async fn download(
        &self,
        user: &User,
        submission_id: i64,
        attachment_id: i64,
    ) -> Result<AttachmentDownload, AppError> {
        self.visible_detail(user, submission_id).await?;

        let attachment: Attachment = self
            .repo
            .find_attachment(submission_id, attachment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Anexo não encontrado".into()))?;
        let bytes = self.storage.read(&attachment.stored_path).await?;

        self.audit_repo
            .record(
                &self.pool,
                Some(user.id),
                "downloaded",
                "Attachment",
                &attachment.id.to_string(),
                json!({ "submission_id": submission_id, "filename": attachment.filename }),
            )
            .await?;

        Ok(AttachmentDownload {
            content_type: attachment
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            filename: attachment.filename,
            bytes,
        })
    }

    async fn visible_detail(&self, user: &User, submission_id: i64) -> Result<SubmissionDetail, AppError> {
        let detail = self
            .repo
            .detail(&self.pool, submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SUBMISSION_NOT_FOUND.into()))?;

        if !user.role.can_approve() && detail.delivered_by != Some(user.id) {
            return Err(AppError::Forbidden(
                "Você não tem permissão para acessar esta entrega".into(),
            ));
        }
        Ok(detail)
    }

    async fn repo_events(&self, submission_id: i64) -> Result<Vec<TimelineEvent>, AppError> {
        let events = self.audit_repo.events_for("Submission", &submission_id.to_string()).await?;
        Ok(events
            .into_iter()
            .filter_map(|e| {
                let kind = TimelineKind::from_audit_action(&e.action)?;
                let by = e.username.as_deref().map(|username| Actor {
                    username: username.to_string(),
                    full_name: full_name(e.first_name.as_deref(), e.last_name.as_deref(), username),
                });
                let comment = e.changes.0.get("comment").and_then(|c| c.as_str()).map(str::to_string);
                Some(TimelineEvent {
                    event: kind.event().into(),
                    label: kind.label().into(),
                    timestamp: e.timestamp,
                    by,
                    comment,
                    icon: kind.icon().into(),
                    color: kind.color().into(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_falls_back_to_username() {
        assert_eq!(full_name(Some("Ana"), Some("Souza"), "ana"), "Ana Souza");
        assert_eq!(full_name(Some("Ana"), None, "ana"), "Ana");
        assert_eq!(full_name(None, Some(" "), "ana"), "ana");
    }
}
