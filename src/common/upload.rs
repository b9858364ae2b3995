// src/common/upload.rs

use std::collections::HashMap;

use axum::extract::Multipart;
use chrono::NaiveDate;

use crate::{common::error::AppError, models::submission::UploadedFile};

/// Campos de texto e arquivos de um corpo multipart, já lidos em memória.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: Vec<(String, UploadedFile)>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?.to_vec();
                    if !filename.is_empty() {
                        form.files.push((name, UploadedFile { filename, content_type, bytes }));
                    }
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    pub fn required_text(&self, name: &str) -> Result<&str, AppError> {
        self.text(name).ok_or_else(|| AppError::field(name, "Este campo é obrigatório."))
    }

    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, AppError> {
        self.text(name)
            .map(|v| {
                NaiveDate::parse_from_str(v, "%Y-%m-%d")
                    .map_err(|_| AppError::field(name, "Data inválida (use AAAA-MM-DD)."))
            })
            .transpose()
    }

    pub fn required_date(&self, name: &str) -> Result<NaiveDate, AppError> {
        self.date(name)?.ok_or_else(|| AppError::field(name, "Este campo é obrigatório."))
    }

    /// Remove e devolve o primeiro arquivo do campo.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(index).1)
    }

    /// Remove e devolve todos os arquivos do campo.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (taken, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.files).into_iter().partition(|(n, _)| n == name);
        self.files = rest;
        taken.into_iter().map(|(_, f)| f).collect()
    }
}
