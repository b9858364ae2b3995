// src/services/submission_service.rs

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{csv, error::AppError, storage::MediaStorage, xlsx},
    db::{
        submission_repo::NewAttachment, AuditRepository, ObligationRepository, ReferenceRepository,
        SubmissionRepository,
    },
    domain::{approval, cnpj, competence::Competence, filename},
    models::{
        submission::{
            Attachment, AttachmentKind, BulkAttachmentResult, BulkDeliveryResult, DeliveryFilter,
            DeliveryList, NewSubmission, SkippedFile, SkippedRow, SubmissionCreated, SubmissionType,
            UploadedFile,
        },
    },
};

const MISSING_DATA: &str = "Dados obrigatórios faltando";
const INVALID_CNPJ: &str = "CNPJ inválido";
const COMPANY_NOT_FOUND: &str = "Empresa não encontrada";
const OBLIGATION_NOT_FOUND: &str = "Obrigação não encontrada";
const INVALID_DATE: &str = "Data inválida";
const BAD_FILENAME: &str = "Nome do arquivo não segue o padrão esperado";

/// Aceita `AAAA-MM-DD` ou `DD/MM/AAAA`.
pub fn parse_sheet_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

/// Grava os arquivos em disco e registra os anexos. Se algo falhar, os
/// arquivos já gravados nesta chamada são removidos.
pub(crate) async fn store_files(
    conn: &mut PgConnection,
    repo: &SubmissionRepository,
    storage: &MediaStorage,
    submission_id: i64,
    receipt: Option<&UploadedFile>,
    attachments: &[UploadedFile],
) -> Result<Vec<Attachment>, AppError> {
    let files = receipt
        .map(|f| (AttachmentKind::Receipt, f))
        .into_iter()
        .chain(attachments.iter().map(|f| (AttachmentKind::Attachment, f)));

    let folder = format!("submissions/{submission_id}");
    let mut saved = Vec::new();
    let mut stored = Vec::new();

    for (kind, file) in files {
        let result = async {
            let path = storage.save(&folder, file).await?;
            saved.push(path.clone());
            repo.add_attachment(
                &mut *conn,
                &NewAttachment {
                    submission_id,
                    kind,
                    filename: &file.filename,
                    stored_path: &path,
                    content_type: file.content_type.as_deref(),
                    size_bytes: file.bytes.len() as i64,
                    parsed_cnpj: None,
                    parsed_period: None,
                    parsed_obligation_key: None,
                },
            )
            .await
        }
        .await;

        match result {
            Ok(attachment) => stored.push(attachment),
            Err(e) => {
                for path in &saved {
                    storage.remove(path).await;
                }
                return Err(e);
            }
        }
    }
    Ok(stored)
}

/// Índices das colunas pelo cabeçalho da planilha (sem distinção de caixa).
fn header_index(header: &[String]) -> HashMap<String, usize> {
    header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_lowercase(), i))
        .collect()
}

fn column<'a>(row: &'a [String], index: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    index.get(name).and_then(|&i| csv::cell(row, i))
}

#[derive(Clone)]
pub struct SubmissionService {
    pool: PgPool,
    repo: SubmissionRepository,
    obligation_repo: ObligationRepository,
    reference_repo: ReferenceRepository,
    audit_repo: AuditRepository,
    storage: MediaStorage,
}

impl SubmissionService {
    pub fn new(
        pool: PgPool,
        repo: SubmissionRepository,
        obligation_repo: ObligationRepository,
        reference_repo: ReferenceRepository,
        audit_repo: AuditRepository,
        storage: MediaStorage,
    ) -> Self {
        Self { pool, repo, obligation_repo, reference_repo, audit_repo, storage }
    }

    /// Registra uma entrega individual com recibo e anexos.
    pub async fn create(&self, user_id: i64, new: NewSubmission) -> Result<SubmissionCreated, AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.obligation_repo.lock(&mut *tx, new.obligation_id).await? {
            return Err(AppError::NotFound(OBLIGATION_NOT_FOUND.into()));
        }

        let has_prior = self.repo.first_for_obligation(&mut *tx, new.obligation_id).await?.is_some();
        let submission_type = approval::effective_submission_type(has_prior, new.submission_type)?;

        let submission = self
            .repo
            .create(
                &mut *tx,
                new.obligation_id,
                user_id,
                new.delivery_date,
                new.comments.as_deref(),
                submission_type,
                None,
            )
            .await?;

        let attachments = store_files(
            &mut tx,
            &self.repo,
            &self.storage,
            submission.id,
            new.receipt.as_ref(),
            &new.attachments,
        )
        .await?;

        self.audit_repo
            .record(
                &mut *tx,
                Some(user_id),
                "created",
                "Submission",
                &submission.id.to_string(),
                json!({
                    "obligation_id": new.obligation_id,
                    "submission_type": submission_type.as_str(),
                    "delivery_date": new.delivery_date,
                    "attachments": attachments.len(),
                }),
            )
            .await?;

        tx.commit().await?;
        tracing::info!("📦 Entrega {} registrada para a obrigação {}", submission.id, new.obligation_id);

        Ok(SubmissionCreated {
            id: submission.id,
            obligation_id: submission.obligation_id,
            submission_type: submission.submission_type,
            approval_status: submission.approval_status,
            delivery_date: submission.delivery_date,
            attachments,
        })
    }

    pub async fn list_deliveries(&self, filter: &DeliveryFilter) -> Result<DeliveryList, AppError> {
        let deliveries = self.repo.list_deliveries(filter).await?;
        Ok(DeliveryList { total: deliveries.len(), deliveries })
    }

    // ===== ENTREGAS EM MASSA =====

    /// Processa a planilha de entregas numa transação; linhas inválidas são
    /// puladas com o motivo.
    pub async fn bulk_deliveries(&self, user_id: i64, file: &UploadedFile) -> Result<BulkDeliveryResult, AppError> {
        let rows = xlsx::upload_rows(&file.filename, &file.bytes)?;
        let Some((header, data_rows)) = rows.split_first() else {
            return Err(AppError::field("file", "A planilha está vazia."));
        };
        let index = header_index(header);

        let batch_id = Uuid::new_v4();
        let mut created = 0;
        let mut updated = 0;
        let mut skipped = Vec::new();

        let mut tx = self.pool.begin().await?;

        for (offset, row) in data_rows.iter().enumerate() {
            if csv::is_blank_row(row) {
                continue;
            }
            let row_number = offset + 2;
            let skip = |reason: &str| SkippedRow {
                row: row_number,
                reason: reason.to_string(),
                data: row.join(", "),
            };

            let (Some(raw_cnpj), Some(state), Some(name), Some(raw_date)) = (
                column(row, &index, "cnpj"),
                column(row, &index, "state"),
                column(row, &index, "obligation_name"),
                column(row, &index, "delivery_date"),
            ) else {
                skipped.push(skip(MISSING_DATA));
                continue;
            };

            let Some(cnpj) = cnpj::normalize(raw_cnpj) else {
                skipped.push(skip(INVALID_CNPJ));
                continue;
            };
            let Some(company) = self.reference_repo.find_company_by_cnpj(&cnpj).await? else {
                skipped.push(skip(COMPANY_NOT_FOUND));
                continue;
            };

            let competence = column(row, &index, "competence").map(|raw| {
                Competence::parse_lenient(raw).map(|c| c.to_string()).unwrap_or_else(|_| raw.to_string())
            });
            let Some(obligation) = self
                .obligation_repo
                .find_for_delivery(&mut *tx, company.id, state, name, competence.as_deref())
                .await?
            else {
                skipped.push(skip(OBLIGATION_NOT_FOUND));
                continue;
            };

            let Some(delivery_date) = parse_sheet_date(raw_date) else {
                skipped.push(skip(INVALID_DATE));
                continue;
            };

            let requested = column(row, &index, "submission_type")
                .and_then(SubmissionType::parse)
                .unwrap_or_default();
            let comments = column(row, &index, "comments");

            self.obligation_repo.lock(&mut *tx, obligation.id).await?;
            match self.repo.first_for_obligation(&mut *tx, obligation.id).await? {
                Some(existing) if requested == SubmissionType::Original => {
                    self.repo
                        .update_from_batch(&mut *tx, existing.id, delivery_date, comments, batch_id)
                        .await?;
                    updated += 1;
                }
                existing => {
                    let submission_type = if existing.is_some() { SubmissionType::Retificadora } else { requested };
                    self.repo
                        .create(
                            &mut *tx,
                            obligation.id,
                            user_id,
                            delivery_date,
                            comments,
                            submission_type,
                            Some(batch_id),
                        )
                        .await?;
                    created += 1;
                }
            }
        }

        self.audit_repo
            .record(
                &mut *tx,
                Some(user_id),
                "delivery_bulk",
                "Submission",
                &batch_id.to_string(),
                json!({
                    "filename": file.filename,
                    "created": created,
                    "updated": updated,
                    "skipped": skipped.len(),
                }),
            )
            .await?;
        tx.commit().await?;

        let message = format!(
            "Processamento concluído: {} criadas, {} atualizadas, {} puladas",
            created,
            updated,
            skipped.len()
        );
        tracing::info!("📑 Lote {}: {}", batch_id, message);

        Ok(BulkDeliveryResult { created, updated, skipped, batch_id, message })
    }

    /// Vincula arquivos `{CNPJ}_{MMAAAA}_{CHAVE}.ext` às entregas das obrigações
    /// correspondentes; sem entrega, cria uma original com a data de hoje.
    pub async fn bulk_attachments(
        &self,
        user_id: i64,
        files: Vec<UploadedFile>,
    ) -> Result<BulkAttachmentResult, AppError> {
        if files.is_empty() {
            return Err(AppError::field("files", "Envie ao menos um arquivo."));
        }

        let today = Local::now().date_naive();
        let mut linked = 0;
        let mut skipped = Vec::new();
        let mut saved = Vec::new();

        let mut tx = self.pool.begin().await?;
        let result: Result<(), AppError> = async {
            for file in &files {
                let skip = |reason: &str, data: Option<String>| SkippedFile {
                    filename: file.filename.clone(),
                    reason: reason.to_string(),
                    data,
                };

                let Some(parsed) = filename::parse_attachment_name(&file.filename) else {
                    skipped.push(skip(BAD_FILENAME, None));
                    continue;
                };
                let Some(company) = self.reference_repo.find_company_by_cnpj(&parsed.cnpj).await? else {
                    skipped.push(skip(COMPANY_NOT_FOUND, Some(format!("CNPJ: {}", parsed.cnpj))));
                    continue;
                };

                let competence = parsed.competence.to_string();
                let key = parsed.obligation_search();
                let Some(obligation) = self
                    .obligation_repo
                    .find_by_key(&mut *tx, company.id, &competence, &key)
                    .await?
                else {
                    skipped.push(skip(OBLIGATION_NOT_FOUND, Some(format!("{key} - {competence}"))));
                    continue;
                };

                self.obligation_repo.lock(&mut *tx, obligation.id).await?;
                let submission = match self.repo.first_for_obligation(&mut *tx, obligation.id).await? {
                    Some(existing) => existing,
                    None => {
                        self.repo
                            .create(
                                &mut *tx,
                                obligation.id,
                                user_id,
                                today,
                                None,
                                SubmissionType::Original,
                                None,
                            )
                            .await?
                    }
                };

                let path = self.storage.save(&format!("submissions/{}", submission.id), file).await?;
                saved.push(path.clone());
                self.repo
                    .add_attachment(
                        &mut *tx,
                        &NewAttachment {
                            submission_id: submission.id,
                            kind: AttachmentKind::Attachment,
                            filename: &file.filename,
                            stored_path: &path,
                            content_type: file.content_type.as_deref(),
                            size_bytes: file.bytes.len() as i64,
                            parsed_cnpj: Some(&parsed.cnpj),
                            parsed_period: Some(&parsed.period),
                            parsed_obligation_key: Some(&parsed.obligation_key),
                        },
                    )
                    .await?;
                linked += 1;
            }

            self.audit_repo
                .record(
                    &mut *tx,
                    Some(user_id),
                    "delivery_attachments_linked",
                    "Attachment",
                    "bulk",
                    json!({ "linked": linked, "skipped": skipped.len(), "files": files.len() }),
                )
                .await
        }
        .await;

        if let Err(e) = result {
            for path in &saved {
                self.storage.remove(path).await;
            }
            return Err(e);
        }
        tx.commit().await?;

        let message = format!("Processamento concluído: {} anexos vinculados, {} pulados", linked, skipped.len());
        tracing::info!("📎 {}", message);

        Ok(BulkAttachmentResult { attachments_linked: linked, skipped, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_dates_accept_iso_and_brazilian_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(parse_sheet_date("2025-03-05"), Some(expected));
        assert_eq!(parse_sheet_date(" 05/03/2025 "), Some(expected));
        assert_eq!(parse_sheet_date("31/02/2025"), None);
        assert_eq!(parse_sheet_date("ontem"), None);
    }

    #[test]
    fn header_lookup_ignores_case_and_spacing() {
        let header = vec![" CNPJ ".to_string(), "State".to_string(), "obligation_name".to_string()];
        let index = header_index(&header);
        let row = vec!["12345678000190".to_string(), "sp".to_string(), "".to_string()];

        assert_eq!(column(&row, &index, "cnpj"), Some("12345678000190"));
        assert_eq!(column(&row, &index, "state"), Some("sp"));
        assert_eq!(column(&row, &index, "obligation_name"), None);
        assert_eq!(column(&row, &index, "comments"), None);
    }

    #[test]
    fn delivery_template_columns_are_found_by_name() {
        let bytes = crate::services::import_service::template_xlsx(crate::models::import::TemplateKind::Deliveries)
            .unwrap();
        let rows = xlsx::upload_rows("template_entregas.xlsx", &bytes).unwrap();
        let index = header_index(&rows[0]);
        let row = &rows[1];

        assert_eq!(column(row, &index, "cnpj"), Some("12345678000190"));
        assert_eq!(column(row, &index, "obligation_name"), Some("DCTF"));
        let date = column(row, &index, "delivery_date").and_then(parse_sheet_date);
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 2, 18));
        assert_eq!(column(row, &index, "comments"), None);
    }
}
