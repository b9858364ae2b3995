// src/client/api/submissions.rs

use reqwest::multipart::Form;

use crate::{
    client::{
        api::{attach_files, file_part},
        error::ClientResult,
        forms::DeliveryForm,
        ApiClient, Download,
    },
    models::submission::{
        BulkAttachmentResult, BulkDeliveryResult, DeliveryFilter, DeliveryList, SubmissionCreated,
        UploadedFile,
    },
};

impl ApiClient {
    /// Registra uma entrega a partir do formulário (tipo já travado se preciso).
    pub async fn submit_delivery(&self, form: &DeliveryForm) -> ClientResult<SubmissionCreated> {
        let (obligation_id, delivery_date) = form.validated()?;
        let mut multipart = Form::new()
            .text("obligation", obligation_id.to_string())
            .text("delivery_date", delivery_date.format("%Y-%m-%d").to_string())
            .text("submission_type", form.submission_type().as_str());
        if let Some(comments) = &form.comments {
            multipart = multipart.text("comments", comments.clone());
        }
        let multipart = attach_files(multipart, form.receipt.as_ref(), &form.attachments)?;
        self.transport().post_multipart("submissions/", multipart).await
    }

    pub async fn deliveries(&self, filter: &DeliveryFilter) -> ClientResult<DeliveryList> {
        self.transport().get_query("deliveries/", filter).await
    }

    pub async fn bulk_deliveries(&self, sheet: &UploadedFile) -> ClientResult<BulkDeliveryResult> {
        let form = Form::new().part("file", file_part(sheet)?);
        self.transport().post_multipart("deliveries/bulk/", form).await
    }

    pub async fn bulk_attachments(&self, files: &[UploadedFile]) -> ClientResult<BulkAttachmentResult> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", file_part(file)?);
        }
        self.transport().post_multipart("deliveries/bulk-attachments/", form).await
    }

    pub async fn delivery_template(&self) -> ClientResult<Download> {
        self.transport().download("deliveries/template/", &()).await
    }
}
