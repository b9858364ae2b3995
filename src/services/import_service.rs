// src/services/import_service.rs

use crate::{
    common::{csv, error::AppError, xlsx},
    db::{ObligationRepository, ReferenceRepository},
    domain::{cnpj, competence::Competence},
    models::{
        company::{Company, CreateCompanyPayload},
        import::{ImportSummary, TemplateKind},
        obligation::NewObligation,
        submission::UploadedFile,
    },
    services::submission_service::parse_sheet_date,
};

/// Linhas de dados com o número da linha na planilha (cabeçalho = linha 1).
fn data_rows(file: &UploadedFile) -> Result<Vec<(usize, Vec<String>)>, AppError> {
    let mut rows = xlsx::upload_rows(&file.filename, &file.bytes)?.into_iter();
    if rows.next().is_none() {
        return Err(AppError::field("file", "A planilha está vazia."));
    }
    Ok(rows
        .enumerate()
        .map(|(i, row)| (i + 2, row))
        .filter(|(_, row)| !csv::is_blank_row(row))
        .collect())
}

/// Exemplo de linha incluído em cada modelo.
fn template_example(kind: TemplateKind) -> &'static [&'static str] {
    match kind {
        TemplateKind::Companies => &[
            "Empresa Exemplo Ltda", "12.345.678/0001-90", "Exemplo", "contato@exemplo.com",
            "(11) 99999-0000", "Rua Exemplo, 100", "Maria",
        ],
        TemplateKind::Obligations => &[
            "Empresa Exemplo Ltda", "12345678000190", "SP", "Federal", "01/2025", "2025-02-20",
            "2025-02-15", "",
        ],
        TemplateKind::Deliveries => &[
            "12345678000190", "Empresa Exemplo Ltda", "SP", "DCTF", "01/2025", "2025-02-18",
            "original", "",
        ],
    }
}

/// Modelo .xlsx: cabeçalho e uma linha de exemplo.
pub fn template_xlsx(kind: TemplateKind) -> Result<Vec<u8>, AppError> {
    xlsx::write_sheet(kind.sheet_name(), kind.header(), &[template_example(kind).to_vec()])
}

#[derive(Clone)]
pub struct ImportService {
    reference_repo: ReferenceRepository,
    obligation_repo: ObligationRepository,
}

impl ImportService {
    pub fn new(reference_repo: ReferenceRepository, obligation_repo: ObligationRepository) -> Self {
        Self { reference_repo, obligation_repo }
    }

    /// Colunas: name, cnpj, fantasy_name, email, phone, address, responsible.
    pub async fn import_companies(&self, file: &UploadedFile) -> Result<ImportSummary, AppError> {
        let rows = data_rows(file)?;
        let mut summary = ImportSummary { total_processed: rows.len(), ..ImportSummary::default() };

        for (line, row) in rows {
            let Some(name) = csv::cell(&row, 0) else {
                summary.errors.push(format!("Linha {line}: nome da empresa é obrigatório"));
                continue;
            };
            let cnpj = match csv::cell(&row, 1) {
                None => None,
                Some(raw) => match cnpj::normalize(raw) {
                    Some(digits) => Some(digits),
                    None => {
                        summary.errors.push(format!("Linha {line}: CNPJ inválido ({raw})"));
                        continue;
                    }
                },
            };

            let payload = CreateCompanyPayload {
                code: self.reference_repo.next_company_code().await?,
                name: name.to_string(),
                fantasy_name: csv::cell(&row, 2).map(str::to_string),
                cnpj: cnpj.clone(),
                email: csv::cell(&row, 3).map(str::to_string),
                phone: csv::cell(&row, 4).map(str::to_string),
                address: csv::cell(&row, 5).map(str::to_string),
                responsible: csv::cell(&row, 6).map(str::to_string),
                active: Some(true),
            };

            match self.reference_repo.create_company(&payload, cnpj.as_deref()).await {
                Ok(_) => summary.created += 1,
                Err(AppError::DatabaseError(e)) => return Err(AppError::DatabaseError(e)),
                Err(e) => summary.errors.push(format!("Linha {line}: {e}")),
            }
        }

        tracing::info!("📥 Importação de empresas: {}", summary.banner());
        Ok(summary)
    }

    /// Colunas: company, cnpj, state, obligation_type, competence, due_date,
    /// delivery_deadline, notes.
    pub async fn import_obligations(&self, user_id: i64, file: &UploadedFile) -> Result<ImportSummary, AppError> {
        let rows = data_rows(file)?;
        let mut summary = ImportSummary { total_processed: rows.len(), ..ImportSummary::default() };

        for (line, row) in rows {
            match self.obligation_from_row(user_id, &row).await {
                Ok(new) => match self.obligation_repo.create(self.obligation_repo.pool(), &new).await {
                    Ok(_) => summary.created += 1,
                    Err(AppError::DatabaseError(e)) => return Err(AppError::DatabaseError(e)),
                    Err(e) => summary.errors.push(format!("Linha {line}: {e}")),
                },
                Err(RowError::Invalid(message)) => summary.errors.push(format!("Linha {line}: {message}")),
                Err(RowError::Fatal(e)) => return Err(e),
            }
        }

        tracing::info!("📥 Importação de obrigações: {}", summary.banner());
        Ok(summary)
    }

    async fn find_company(&self, name: Option<&str>, raw_cnpj: Option<&str>) -> Result<Option<Company>, AppError> {
        if let Some(digits) = raw_cnpj.and_then(cnpj::normalize) {
            if let Some(company) = self.reference_repo.find_company_by_cnpj(&digits).await? {
                return Ok(Some(company));
            }
        }
        match name {
            Some(name) => self.reference_repo.find_company_by_name(name).await,
            None => Ok(None),
        }
    }

    async fn obligation_from_row(&self, user_id: i64, row: &[String]) -> Result<NewObligation, RowError> {
        let company_name = csv::cell(row, 0);
        let raw_cnpj = csv::cell(row, 1);
        if company_name.is_none() && raw_cnpj.is_none() {
            return Err(RowError::Invalid("informe a empresa ou o CNPJ".into()));
        }
        let company = self
            .find_company(company_name, raw_cnpj)
            .await?
            .ok_or_else(|| RowError::Invalid("empresa não encontrada".into()))?;

        let state_code = csv::cell(row, 2).ok_or_else(|| RowError::Invalid("UF é obrigatória".into()))?;
        let state = self
            .reference_repo
            .find_state_by_code(state_code)
            .await?
            .ok_or_else(|| RowError::Invalid(format!("UF não encontrada ({state_code})")))?;

        let type_name = csv::cell(row, 3)
            .ok_or_else(|| RowError::Invalid("tipo de obrigação é obrigatório".into()))?;
        let obligation_type = self
            .reference_repo
            .find_obligation_type_by_name(type_name)
            .await?
            .ok_or_else(|| RowError::Invalid(format!("tipo de obrigação não encontrado ({type_name})")))?;

        let competence = csv::cell(row, 4)
            .ok_or_else(|| RowError::Invalid("competência é obrigatória".into()))
            .and_then(|raw| Competence::parse_lenient(raw).map_err(|e| RowError::Invalid(e.to_string())))?;

        let due_date = csv::cell(row, 5)
            .ok_or_else(|| RowError::Invalid("data de vencimento é obrigatória".into()))
            .and_then(|raw| {
                parse_sheet_date(raw).ok_or_else(|| RowError::Invalid(format!("data de vencimento inválida ({raw})")))
            })?;
        let delivery_deadline = match csv::cell(row, 6) {
            None => None,
            Some(raw) => Some(
                parse_sheet_date(raw)
                    .ok_or_else(|| RowError::Invalid(format!("prazo de entrega inválido ({raw})")))?,
            ),
        };

        Ok(NewObligation {
            company_id: company.id,
            state_id: state.id,
            obligation_type_id: obligation_type.id,
            obligation_name: obligation_type.name,
            competence: competence.to_string(),
            due_date,
            delivery_deadline,
            responsible_user_id: None,
            validity_start_date: None,
            validity_end_date: None,
            notes: csv::cell(row, 7).map(str::to_string),
            created_by: Some(user_id),
        })
    }
}

/// Erro de uma linha: inválida (segue para a próxima) ou falha geral.
enum RowError {
    Invalid(String),
    Fatal(AppError),
}

impl From<AppError> for RowError {
    fn from(e: AppError) -> Self {
        RowError::Fatal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(text: &str) -> UploadedFile {
        UploadedFile { filename: "planilha.csv".into(), content_type: None, bytes: text.as_bytes().to_vec() }
    }

    #[test]
    fn data_rows_are_numbered_after_the_header() {
        let rows = data_rows(&sheet("name;cnpj\nAlfa;1\n;\nBeta;2\n")).unwrap();
        let lines: Vec<usize> = rows.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn empty_sheet_is_rejected() {
        assert!(data_rows(&sheet("")).is_err());
    }

    #[test]
    fn templates_start_with_the_expected_header() {
        let bytes = template_xlsx(TemplateKind::Obligations).unwrap();
        let rows = xlsx::read_rows(&bytes).unwrap();
        assert_eq!(
            rows[0],
            ["company", "cnpj", "state", "obligation_type", "competence", "due_date", "delivery_deadline", "notes"]
        );
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn every_template_reads_back_as_an_import() {
        for kind in [TemplateKind::Companies, TemplateKind::Obligations, TemplateKind::Deliveries] {
            let file = UploadedFile {
                filename: kind.filename().into(),
                content_type: Some(xlsx::CONTENT_TYPE.into()),
                bytes: template_xlsx(kind).unwrap(),
            };
            let rows = data_rows(&file).unwrap();
            assert_eq!(rows.len(), 1, "{}", kind.as_str());
            assert_eq!(rows[0].0, 2);
            assert_eq!(rows[0].1.len(), kind.header().len());
        }
    }

    #[test]
    fn xlsx_upload_is_read_by_columns() {
        let bytes = xlsx::write_sheet(
            "Empresas",
            TemplateKind::Companies.header(),
            &[vec!["Alfa Ltda", "12.345.678/0001-90"], vec![], vec!["Beta", ""]],
        )
        .unwrap();
        let file = UploadedFile { filename: "empresas.xlsx".into(), content_type: None, bytes };

        let rows = data_rows(&file).unwrap();
        let lines: Vec<usize> = rows.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![2, 4]);
        assert_eq!(csv::cell(&rows[0].1, 1), Some("12.345.678/0001-90"));
        assert_eq!(csv::cell(&rows[1].1, 0), Some("Beta"));
    }
}
