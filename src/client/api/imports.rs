// src/client/api/imports.rs

use reqwest::multipart::Form;

use crate::{
    client::{api::file_part, error::ClientResult, ApiClient, Download},
    models::{import::{ImportSummary, TemplateKind}, submission::UploadedFile},
};

impl ApiClient {
    pub async fn download_template(&self, kind: TemplateKind) -> ClientResult<Download> {
        self.transport().download(&format!("templates/{}/", kind.as_str()), &()).await
    }

    pub async fn import_companies(&self, sheet: &UploadedFile) -> ClientResult<ImportSummary> {
        let form = Form::new().part("file", file_part(sheet)?);
        self.transport().post_multipart("imports/companies/", form).await
    }

    pub async fn import_obligations(&self, sheet: &UploadedFile) -> ClientResult<ImportSummary> {
        let form = Form::new().part("file", file_part(sheet)?);
        self.transport().post_multipart("imports/obligations/", form).await
    }
}
