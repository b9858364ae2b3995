// src/client/api.rs

//! Métodos do [`ApiClient`](crate::client::ApiClient), um arquivo por área.

pub mod approvals;
pub mod auth;
pub mod dispatches;
pub mod imports;
pub mod notifications;
pub mod obligations;
pub mod planning;
pub mod reference;
pub mod reports;
pub mod submissions;
pub mod users;

use reqwest::multipart::{Form, Part};

use crate::{client::error::ClientResult, models::submission::UploadedFile};

pub(crate) fn file_part(file: &UploadedFile) -> ClientResult<Part> {
    let part = Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
    Ok(match &file.content_type {
        Some(mime) => part.mime_str(mime)?,
        None => part,
    })
}

/// Anexa o recibo e os anexos nos campos usados pelo servidor.
pub(crate) fn attach_files(
    mut form: Form,
    receipt: Option<&UploadedFile>,
    attachments: &[UploadedFile],
) -> ClientResult<Form> {
    if let Some(receipt) = receipt {
        form = form.part("receipt_file", file_part(receipt)?);
    }
    for file in attachments {
        form = form.part("attachments", file_part(file)?);
    }
    Ok(form)
}
