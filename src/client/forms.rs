// src/client/forms.rs

//! Formulários com as verificações locais feitas antes de qualquer
//! requisição. O servidor continua sendo a validação oficial.

use chrono::NaiveDate;

use crate::{
    client::error::{ClientError, ClientResult},
    domain::{approval::{check_comment, ApprovalAction}, competence::Competence},
    models::{
        approval::MyDelivery,
        company::CompanyObligationOption,
        obligation::CreateObligationPayload,
        submission::{SubmissionType, UploadedFile},
    },
};

// ===== ENTREGA =====

/// Formulário de entrega individual. Com entrega anterior na obrigação o
/// tipo fica travado em retificadora.
#[derive(Debug, Clone, Default)]
pub struct DeliveryForm {
    obligation: Option<CompanyObligationOption>,
    submission_type: SubmissionType,
    pub delivery_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub receipt: Option<UploadedFile>,
    pub attachments: Vec<UploadedFile>,
}

impl DeliveryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_obligation(&mut self, obligation: CompanyObligationOption) {
        if obligation.has_submission {
            self.submission_type = SubmissionType::Retificadora;
        }
        self.obligation = Some(obligation);
    }

    pub fn obligation(&self) -> Option<&CompanyObligationOption> {
        self.obligation.as_ref()
    }

    pub fn submission_type(&self) -> SubmissionType {
        self.submission_type
    }

    pub fn type_is_locked(&self) -> bool {
        self.obligation.as_ref().is_some_and(|o| o.has_submission)
    }

    /// Devolve `false` quando a troca foi recusada pela trava.
    pub fn set_submission_type(&mut self, submission_type: SubmissionType) -> bool {
        if self.type_is_locked() && submission_type == SubmissionType::Original {
            return false;
        }
        self.submission_type = submission_type;
        true
    }

    pub(crate) fn validated(&self) -> ClientResult<(i64, NaiveDate)> {
        let obligation = self
            .obligation
            .as_ref()
            .ok_or_else(|| ClientError::Validation("Selecione a obrigação.".into()))?;
        let date = self
            .delivery_date
            .ok_or_else(|| ClientError::Validation("Informe a data de entrega.".into()))?;
        Ok((obligation.id, date))
    }
}

// ===== OBRIGAÇÃO =====

#[derive(Debug, Clone, Default)]
pub struct ObligationForm {
    pub company_id: Option<i64>,
    pub state_id: Option<i64>,
    pub obligation_type_id: Option<i64>,
    pub obligation_name: String,
    pub competence: String,
    pub due_date: Option<NaiveDate>,
    pub delivery_deadline: Option<NaiveDate>,
    pub responsible_user_id: Option<i64>,
    pub validity_start_date: Option<NaiveDate>,
    pub validity_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ObligationForm {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.company_id.is_none() {
            missing.push("empresa");
        }
        if self.state_id.is_none() {
            missing.push("UF");
        }
        if self.obligation_type_id.is_none() {
            missing.push("tipo de obrigação");
        }
        if self.obligation_name.trim().is_empty() {
            missing.push("nome da obrigação");
        }
        if self.competence.trim().is_empty() {
            missing.push("competência");
        }
        if self.due_date.is_none() {
            missing.push("vencimento");
        }
        missing
    }

    pub fn to_payload(&self) -> ClientResult<CreateObligationPayload> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ClientError::Validation(format!(
                "Preencha os campos obrigatórios: {}.",
                missing.join(", ")
            )));
        }
        let competence = Competence::parse(self.competence.trim())
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        match (self.company_id, self.state_id, self.obligation_type_id, self.due_date) {
            (Some(company_id), Some(state_id), Some(obligation_type_id), Some(due_date)) => {
                Ok(CreateObligationPayload {
                    company_id,
                    state_id,
                    obligation_type_id,
                    obligation_name: self.obligation_name.trim().to_string(),
                    competence: competence.to_string(),
                    due_date,
                    delivery_deadline: self.delivery_deadline,
                    responsible_user_id: self.responsible_user_id,
                    validity_start_date: self.validity_start_date,
                    validity_end_date: self.validity_end_date,
                    notes: self.notes.clone(),
                })
            }
            _ => Err(ClientError::Validation("Preencha os campos obrigatórios.".into())),
        }
    }
}

// ===== DECISÃO =====

#[derive(Debug, Clone)]
pub struct DecisionForm {
    pub action: ApprovalAction,
    pub comment: String,
}

impl DecisionForm {
    pub fn new(action: ApprovalAction) -> Self {
        Self { action, comment: String::new() }
    }

    pub fn with_comment(action: ApprovalAction, comment: impl Into<String>) -> Self {
        Self { action, comment: comment.into() }
    }

    /// Recusa e pedido de revisão exigem comentário; aprovação não.
    pub fn validate(&self) -> ClientResult<()> {
        check_comment(self.action, Some(&self.comment)).map_err(|e| ClientError::Validation(e.to_string()))
    }

    pub(crate) fn comment(&self) -> Option<&str> {
        Some(self.comment.trim()).filter(|c| !c.is_empty())
    }
}

// ===== REENVIO =====

/// Só existe para entregas com `can_resubmit`.
#[derive(Debug, Clone)]
pub struct ResubmitForm {
    submission_id: i64,
    pub delivery_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub receipt: Option<UploadedFile>,
    pub attachments: Vec<UploadedFile>,
}

impl ResubmitForm {
    pub fn for_delivery(delivery: &MyDelivery) -> Option<Self> {
        delivery.can_resubmit.then(|| Self {
            submission_id: delivery.id,
            delivery_date: None,
            comments: None,
            receipt: None,
            attachments: Vec::new(),
        })
    }

    pub fn submission_id(&self) -> i64 {
        self.submission_id
    }

    pub(crate) fn validated_date(&self) -> ClientResult<NaiveDate> {
        self.delivery_date
            .ok_or_else(|| ClientError::Validation("Informe a nova data de entrega.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(has_submission: bool) -> CompanyObligationOption {
        CompanyObligationOption {
            id: 7,
            label: "Federal - DCTF (SP)".into(),
            competence: "03/2025".into(),
            due_date: NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
            has_submission,
        }
    }

    #[test]
    fn prior_submission_forces_amendment() {
        let mut form = DeliveryForm::new();
        assert_eq!(form.submission_type(), SubmissionType::Original);

        form.select_obligation(option(true));
        assert_eq!(form.submission_type(), SubmissionType::Retificadora);
        assert!(!form.set_submission_type(SubmissionType::Original));
        assert_eq!(form.submission_type(), SubmissionType::Retificadora);
    }

    #[test]
    fn first_delivery_type_is_free() {
        let mut form = DeliveryForm::new();
        form.select_obligation(option(false));
        assert!(form.set_submission_type(SubmissionType::Retificadora));
        assert!(form.set_submission_type(SubmissionType::Original));
    }

    #[test]
    fn obligation_form_lists_missing_fields() {
        let form = ObligationForm { company_id: Some(1), ..ObligationForm::default() };
        let err = form.to_payload().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Preencha os campos obrigatórios: UF, tipo de obrigação, nome da obrigação, competência, vencimento."
        );
    }

    #[test]
    fn obligation_form_checks_competence() {
        let form = ObligationForm {
            company_id: Some(1),
            state_id: Some(2),
            obligation_type_id: Some(3),
            obligation_name: "DCTF".into(),
            competence: "13/2025".into(),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 15),
            ..ObligationForm::default()
        };
        assert!(matches!(form.to_payload(), Err(ClientError::Validation(_))));
    }

    #[test]
    fn comment_gate() {
        assert!(DecisionForm::new(ApprovalAction::Approve).validate().is_ok());
        assert!(DecisionForm::with_comment(ApprovalAction::Reject, "   ").validate().is_err());
        assert!(DecisionForm::new(ApprovalAction::RequestRevision).validate().is_err());
        assert!(DecisionForm::with_comment(ApprovalAction::Reject, "Recibo ilegível").validate().is_ok());
    }
}
