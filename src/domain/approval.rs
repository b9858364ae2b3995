// src/domain/approval.rs
//
// Máquina de estados da revisão de entregas:
//   pending_review -> approved | rejected | needs_revision
//   rejected | needs_revision -> pending_review (reenvio)

use thiserror::Error;

use crate::models::{
    approval::StatusInfo,
    submission::{ApprovalStatus, SubmissionType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Approve,
    Reject,
    RequestRevision,
}

impl ApprovalAction {
    pub fn target(&self) -> ApprovalStatus {
        match self {
            ApprovalAction::Approve => ApprovalStatus::Approved,
            ApprovalAction::Reject => ApprovalStatus::Rejected,
            ApprovalAction::RequestRevision => ApprovalStatus::NeedsRevision,
        }
    }

    pub fn requires_comment(&self) -> bool {
        !matches!(self, ApprovalAction::Approve)
    }

    /// Nome da ação gravado no log de auditoria.
    pub fn audit_action(&self) -> &'static str {
        match self {
            ApprovalAction::Approve => "approved",
            ApprovalAction::Reject => "rejected",
            ApprovalAction::RequestRevision => "revision_requested",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            ApprovalAction::Approve => "Entrega aprovada com sucesso",
            ApprovalAction::Reject => "Entrega recusada",
            ApprovalAction::RequestRevision => "Revisão solicitada com sucesso",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Submission não está pendente de revisão (status atual: {})", .0.as_str())]
    NotPending(ApprovalStatus),

    #[error("O comentário é obrigatório para recusar uma entrega")]
    RejectCommentRequired,

    #[error("O comentário é obrigatório para solicitar revisão")]
    RevisionCommentRequired,

    #[error("Esta entrega não pode ser reenviada (status atual: {})", .0.as_str())]
    NotResubmittable(ApprovalStatus),

    #[error("Já existe entrega para esta obrigação; use o tipo retificadora")]
    OriginalAfterSubmission,
}

pub fn is_blank(comment: Option<&str>) -> bool {
    comment.map(str::trim).is_none_or(str::is_empty)
}

/// Valida o comentário exigido por uma ação, sem olhar o status.
pub fn check_comment(action: ApprovalAction, comment: Option<&str>) -> Result<(), TransitionError> {
    if action.requires_comment() && is_blank(comment) {
        return Err(match action {
            ApprovalAction::Reject => TransitionError::RejectCommentRequired,
            _ => TransitionError::RevisionCommentRequired,
        });
    }
    Ok(())
}

impl ApprovalStatus {
    pub fn decide(
        self,
        action: ApprovalAction,
        comment: Option<&str>,
    ) -> Result<ApprovalStatus, TransitionError> {
        if self != ApprovalStatus::PendingReview {
            return Err(TransitionError::NotPending(self));
        }
        check_comment(action, comment)?;
        Ok(action.target())
    }

    pub fn can_resubmit(self) -> bool {
        matches!(self, ApprovalStatus::Rejected | ApprovalStatus::NeedsRevision)
    }

    pub fn resubmit(self) -> Result<ApprovalStatus, TransitionError> {
        if !self.can_resubmit() {
            return Err(TransitionError::NotResubmittable(self));
        }
        Ok(ApprovalStatus::PendingReview)
    }

    pub fn status_info(self) -> StatusInfo {
        let (label, icon, color) = match self {
            ApprovalStatus::PendingReview => ("Pendente de Revisão", "⏳", "gray"),
            ApprovalStatus::Approved => ("Aprovada", "✅", "green"),
            ApprovalStatus::Rejected => ("Recusada", "❌", "red"),
            ApprovalStatus::NeedsRevision => ("Necessita Revisão", "⚠️", "yellow"),
        };
        StatusInfo { label: label.into(), icon: icon.into(), color: color.into() }
    }
}

/// Tipo efetivo de uma nova entrega: com entrega anterior, só retificadora.
pub fn effective_submission_type(
    has_prior_submission: bool,
    requested: Option<SubmissionType>,
) -> Result<SubmissionType, TransitionError> {
    match (has_prior_submission, requested) {
        (true, Some(SubmissionType::Original)) => Err(TransitionError::OriginalAfterSubmission),
        (true, _) => Ok(SubmissionType::Retificadora),
        (false, requested) => Ok(requested.unwrap_or_default()),
    }
}

/// Eventos exibidos na linha do tempo de uma entrega.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineKind {
    Submitted,
    Approved,
    Rejected,
    RevisionRequested,
    Resubmitted,
}

impl TimelineKind {
    pub fn from_audit_action(action: &str) -> Option<Self> {
        match action {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "revision_requested" => Some(Self::RevisionRequested),
            "resubmitted" => Some(Self::Resubmitted),
            _ => None,
        }
    }

    pub fn event(&self) -> &'static str {
        match self {
            TimelineKind::Submitted => "submitted",
            TimelineKind::Approved => "approved",
            TimelineKind::Rejected => "rejected",
            TimelineKind::RevisionRequested => "revision_requested",
            TimelineKind::Resubmitted => "resubmitted",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimelineKind::Submitted => "Entrega enviada",
            TimelineKind::Approved => "Aprovada",
            TimelineKind::Rejected => "Recusada",
            TimelineKind::RevisionRequested => "Revisão solicitada",
            TimelineKind::Resubmitted => "Reenviada",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TimelineKind::Submitted => "📤",
            TimelineKind::Approved => "✅",
            TimelineKind::Rejected => "❌",
            TimelineKind::RevisionRequested => "⚠️",
            TimelineKind::Resubmitted => "🔄",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TimelineKind::Submitted => "blue",
            TimelineKind::Approved => "green",
            TimelineKind::Rejected => "red",
            TimelineKind::RevisionRequested => "yellow",
            TimelineKind::Resubmitted => "purple",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_submission_accepts_every_decision() {
        let s = ApprovalStatus::PendingReview;
        assert_eq!(s.decide(ApprovalAction::Approve, None), Ok(ApprovalStatus::Approved));
        assert_eq!(s.decide(ApprovalAction::Reject, Some("ilegível")), Ok(ApprovalStatus::Rejected));
        assert_eq!(
            s.decide(ApprovalAction::RequestRevision, Some("falta anexo")),
            Ok(ApprovalStatus::NeedsRevision)
        );
    }

    #[test]
    fn approve_does_not_need_a_comment() {
        assert!(ApprovalStatus::PendingReview.decide(ApprovalAction::Approve, Some("   ")).is_ok());
    }

    #[test]
    fn reject_and_revision_need_non_blank_comment() {
        let s = ApprovalStatus::PendingReview;
        assert_eq!(
            s.decide(ApprovalAction::Reject, Some("  \t")),
            Err(TransitionError::RejectCommentRequired)
        );
        assert_eq!(
            s.decide(ApprovalAction::RequestRevision, None),
            Err(TransitionError::RevisionCommentRequired)
        );
    }

    #[test]
    fn decided_submission_cannot_be_decided_again() {
        let err = ApprovalStatus::Approved.decide(ApprovalAction::Reject, Some("x")).unwrap_err();
        assert_eq!(err, TransitionError::NotPending(ApprovalStatus::Approved));
        assert_eq!(
            err.to_string(),
            "Submission não está pendente de revisão (status atual: approved)"
        );
    }

    #[test]
    fn only_rejected_or_revision_can_be_resubmitted() {
        assert!(ApprovalStatus::Rejected.can_resubmit());
        assert!(ApprovalStatus::NeedsRevision.can_resubmit());
        assert!(!ApprovalStatus::Approved.can_resubmit());
        assert!(!ApprovalStatus::PendingReview.can_resubmit());

        assert_eq!(ApprovalStatus::NeedsRevision.resubmit(), Ok(ApprovalStatus::PendingReview));
        assert!(ApprovalStatus::Approved.resubmit().is_err());
    }

    #[test]
    fn prior_submission_forces_retificadora() {
        assert_eq!(effective_submission_type(true, None), Ok(SubmissionType::Retificadora));
        assert_eq!(
            effective_submission_type(true, Some(SubmissionType::Retificadora)),
            Ok(SubmissionType::Retificadora)
        );
        assert_eq!(
            effective_submission_type(true, Some(SubmissionType::Original)),
            Err(TransitionError::OriginalAfterSubmission)
        );
        assert_eq!(effective_submission_type(false, None), Ok(SubmissionType::Original));
    }

    #[test]
    fn timeline_kinds_map_from_audit_actions() {
        let kind = TimelineKind::from_audit_action("revision_requested").unwrap();
        assert_eq!((kind.icon(), kind.color()), ("⚠️", "yellow"));
        assert_eq!(TimelineKind::from_audit_action("attachment_downloaded"), None);
    }
}
