// src/client/api/approvals.rs

use reqwest::multipart::Form;

use crate::{
    client::{
        api::attach_files,
        error::ClientResult,
        forms::{DecisionForm, ResubmitForm},
        ApiClient, Download,
    },
    domain::approval::ApprovalAction,
    models::approval::{
        DecisionPayload, DecisionResult, MyDeliveries, MyDeliveriesFilter, PendingFilter, PendingList,
        ResubmitResult, Timeline,
    },
};

fn action_path(action: ApprovalAction) -> &'static str {
    match action {
        ApprovalAction::Approve => "approve",
        ApprovalAction::Reject => "reject",
        ApprovalAction::RequestRevision => "request-revision",
    }
}

impl ApiClient {
    pub async fn pending_approvals(&self, filter: &PendingFilter) -> ClientResult<PendingList> {
        self.transport().get_query("approvals/pending/", filter).await
    }

    /// Sem comentário em recusa ou revisão nenhuma requisição é feita.
    pub async fn decide(&self, submission_id: i64, form: &DecisionForm) -> ClientResult<DecisionResult> {
        form.validate()?;
        let payload = DecisionPayload { comment: form.comment().map(str::to_string) };
        let path = format!("approvals/{submission_id}/{}/", action_path(form.action));
        self.transport().post(&path, &payload).await
    }

    pub async fn resubmit(&self, form: &ResubmitForm) -> ClientResult<ResubmitResult> {
        let delivery_date = form.validated_date()?;
        let mut multipart = Form::new()
            .text("delivery_date", delivery_date.format("%Y-%m-%d").to_string())
            .text("submission_type", "retificadora");
        if let Some(comments) = &form.comments {
            multipart = multipart.text("comments", comments.clone());
        }
        let multipart = attach_files(multipart, form.receipt.as_ref(), &form.attachments)?;
        let path = format!("approvals/{}/resubmit/", form.submission_id());
        self.transport().post_multipart(&path, multipart).await
    }

    pub async fn timeline(&self, submission_id: i64) -> ClientResult<Timeline> {
        self.transport().get(&format!("approvals/{submission_id}/timeline/")).await
    }

    pub async fn download_attachment(&self, submission_id: i64, attachment_id: i64) -> ClientResult<Download> {
        let path = format!("approvals/{submission_id}/attachments/{attachment_id}/download/");
        self.transport().download(&path, &()).await
    }

    pub async fn my_deliveries(&self, filter: &MyDeliveriesFilter) -> ClientResult<MyDeliveries> {
        self.transport().get_query("approvals/my-deliveries/", filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_action_has_its_own_endpoint() {
        assert_eq!(action_path(ApprovalAction::Approve), "approve");
        assert_eq!(action_path(ApprovalAction::RequestRevision), "request-revision");
    }
}
