// src/services/report_service.rs

use chrono::{Datelike, Local, NaiveDate};

use crate::{
    common::{csv, error::AppError, xlsx},
    db::{report_repo::RowFilter, ReportRepository, UserRepository},
    domain::{competence::Competence, report, status},
    models::{
        auth::UserSummary,
        obligation::ObligationStatus,
        report::{
            AdvancedFilter, AdvancedReport, Breakdown, DetailedFilter, DetailedReport,
            MonthlyComparison, Performance, ReportRow, ReportSummary, UserPerformanceReport,
        },
    },
};

const EXPORT_HEADER: [&str; 11] = [
    "empresa", "cnpj", "uf", "tipo", "obrigacao", "competencia", "vencimento",
    "prazo_entrega", "responsavel", "entregas", "status",
];

/// Lista de IDs separada por vírgula (`1,2,3`).
fn parse_ids(field: &str, raw: Option<&str>) -> Result<Vec<i64>, AppError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<i64>().map_err(|_| AppError::field(field, format!("ID inválido: {v}"))))
        .collect()
}

fn parse_competence(field: &str, raw: Option<&str>) -> Result<Option<Competence>, AppError> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| Competence::parse_lenient(v).map_err(|e| AppError::field(field, e.to_string())))
        .transpose()
}

fn with_status(rows: Vec<ReportRow>, today: NaiveDate) -> Vec<ReportRow> {
    rows.into_iter()
        .map(|mut row| {
            row.status = status::classify(row.has_approved_submission, row.due_date, today);
            row
        })
        .collect()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn in_month(row: &ReportRow, month_start: NaiveDate) -> bool {
    first_of_month(row.due_date) == month_start
}

fn by_company(rows: &[ReportRow]) -> Vec<Breakdown> {
    report::breakdown(rows, |r| r.company_id.to_string(), |r| r.company.clone())
}

fn by_type(rows: &[ReportRow]) -> Vec<Breakdown> {
    report::breakdown(rows, |r| r.obligation_type_id.to_string(), |r| r.obligation_type.clone())
}

fn status_label(status: ObligationStatus) -> &'static str {
    match status {
        ObligationStatus::Entregue => "entregue",
        ObligationStatus::Atrasado => "atrasado",
        ObligationStatus::Pendente => "pendente",
    }
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    user_repo: UserRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    pub async fn summary(&self) -> Result<ReportSummary, AppError> {
        let summary = self.repo.summary().await?;
        let (total_obligations, total_submissions, obligations_with_submission) = self.repo.totals().await?;
        Ok(ReportSummary { summary, total_obligations, total_submissions, obligations_with_submission })
    }

    /// Linhas filtradas do relatório detalhado (também usadas na exportação).
    async fn detailed_rows(&self, filter: &DetailedFilter) -> Result<Vec<ReportRow>, AppError> {
        let wanted_status = match filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                ObligationStatus::parse(raw).ok_or_else(|| AppError::field("status", "Status inválido."))?,
            ),
            None => None,
        };
        let competence_start = parse_competence("competence_start", filter.competence_start.as_deref())?;
        let competence_end = parse_competence("competence_end", filter.competence_end.as_deref())?;

        let row_filter = RowFilter {
            company_ids: parse_ids("company_id", filter.company_id.as_deref())?,
            obligation_type_ids: parse_ids("obligation_type_id", filter.obligation_type_id.as_deref())?,
            obligation_name: filter.obligation_name.clone(),
            due_start: filter.due_start,
            due_end: filter.due_end,
            ..RowFilter::default()
        };

        let today = Local::now().date_naive();
        Ok(with_status(self.repo.rows(&row_filter).await?, today)
            .into_iter()
            .filter(|row| {
                let competence = Competence::parse_lenient(&row.competence).ok();
                let after_start = competence_start.is_none_or(|start| competence.is_some_and(|c| c >= start));
                let before_end = competence_end.is_none_or(|end| competence.is_some_and(|c| c <= end));
                after_start && before_end && wanted_status.is_none_or(|s| row.status == s)
            })
            .collect())
    }

    pub async fn detailed(&self, filter: DetailedFilter) -> Result<DetailedReport, AppError> {
        let rows = self.detailed_rows(&filter).await?;
        Ok(DetailedReport {
            totals: report::counts(&rows),
            by_company: by_company(&rows),
            by_state: report::breakdown(&rows, |r| r.state_code.clone(), |r| r.state_code.clone()),
            by_type: by_type(&rows),
            rows,
            filters_applied: filter,
        })
    }

    pub async fn advanced(&self, filter: AdvancedFilter) -> Result<AdvancedReport, AppError> {
        let row_filter = RowFilter {
            company_ids: filter.company_id.into_iter().collect(),
            due_start: filter.start_date,
            due_end: filter.end_date,
            responsible_user_id: filter.user_id,
            state_id: filter.state_id,
            ..RowFilter::default()
        };
        let rows = with_status(self.repo.rows(&row_filter).await?, Local::now().date_naive());

        let mut monthly_trend = report::breakdown(
            &rows,
            |r| r.due_date.format("%Y-%m").to_string(),
            |r| r.due_date.format("%m/%Y").to_string(),
        );
        monthly_trend.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(AdvancedReport {
            summary: report::counts(&rows),
            by_user: report::breakdown(
                &rows,
                |r| r.responsible_user_id.map(|id| id.to_string()).unwrap_or_default(),
                |r| r.responsible_username.clone().unwrap_or_else(|| "Sem responsável".to_string()),
            ),
            by_company: by_company(&rows),
            by_state: report::breakdown(&rows, |r| r.state_id.to_string(), |r| r.state_code.clone()),
            by_obligation_type: by_type(&rows),
            monthly_trend,
            filters_applied: filter,
        })
    }

    /// Desempenho das obrigações sob responsabilidade do usuário.
    pub async fn user_performance(&self, user_id: i64) -> Result<UserPerformanceReport, AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".into()))?;

        let today = Local::now().date_naive();
        let row_filter = RowFilter { responsible_user_id: Some(user_id), ..RowFilter::default() };
        let rows = with_status(self.repo.rows(&row_filter).await?, today);

        let this_month = first_of_month(today);
        let last_month = first_of_month(this_month.pred_opt().unwrap_or(this_month));

        Ok(UserPerformanceReport {
            performance: Performance {
                counts: report::counts(&rows),
                avg_delivery_delay: report::avg_delivery_delay(&rows),
            },
            monthly_comparison: MonthlyComparison {
                this_month: report::counts(rows.iter().filter(|r| in_month(r, this_month))),
                last_month: report::counts(rows.iter().filter(|r| in_month(r, last_month))),
            },
            by_company: by_company(&rows),
            by_obligation_type: by_type(&rows),
            user: UserSummary {
                id: user.id,
                username: user.username,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
            },
        })
    }

    /// Exporta as linhas do relatório detalhado em CSV.
    pub async fn export_csv(&self, filter: &DetailedFilter) -> Result<String, AppError> {
        let rows = self.detailed_rows(filter).await?;

        let mut out = csv::write_row(&EXPORT_HEADER);
        for row in &rows {
            out.push_str(&csv::write_row(&export_row(row)));
        }
        Ok(out)
    }

    /// Mesmas colunas do CSV, numa planilha .xlsx.
    pub async fn export_xlsx(&self, filter: &DetailedFilter) -> Result<Vec<u8>, AppError> {
        let rows = self.detailed_rows(filter).await?;
        export_workbook(&rows)
    }
}

fn export_row(row: &ReportRow) -> Vec<String> {
    vec![
        row.company.clone(),
        row.company_cnpj.clone().unwrap_or_default(),
        row.state_code.clone(),
        row.obligation_type.clone(),
        row.obligation_name.clone(),
        row.competence.clone(),
        row.due_date.format("%d/%m/%Y").to_string(),
        row.delivery_deadline.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default(),
        row.responsible_username.clone().unwrap_or_default(),
        row.submissions_count.to_string(),
        status_label(row.status).to_string(),
    ]
}

fn export_workbook(rows: &[ReportRow]) -> Result<Vec<u8>, AppError> {
    let cells: Vec<Vec<String>> = rows.iter().map(export_row).collect();
    xlsx::write_sheet("Relatório", &EXPORT_HEADER, &cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_lists_are_comma_separated() {
        assert_eq!(parse_ids("company_id", Some("1, 2,,3")).unwrap(), vec![1, 2, 3]);
        assert!(parse_ids("company_id", None).unwrap().is_empty());
        assert!(matches!(parse_ids("company_id", Some("1,x")), Err(AppError::FieldErrors(_))));
    }

    #[test]
    fn competence_bounds_accept_both_layouts() {
        let c = parse_competence("competence_start", Some("2025-03")).unwrap();
        assert_eq!(c.map(|c| c.to_string()), Some("03/2025".to_string()));
        assert!(parse_competence("competence_start", Some(" ")).unwrap().is_none());
        assert!(parse_competence("competence_start", Some("13/2025")).is_err());
    }

    fn report_row() -> ReportRow {
        ReportRow {
            obligation_id: 7,
            company_id: 1,
            company: "Padaria São João".into(),
            company_cnpj: Some("12345678000190".into()),
            state_id: 1,
            state_code: "SP".into(),
            obligation_type_id: 2,
            obligation_type: "Federal".into(),
            recurrence: crate::models::company::Recurrence::Mensal,
            obligation_name: "DCTF".into(),
            competence: "01/2025".into(),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 20).unwrap(),
            delivery_deadline: None,
            responsible_user_id: None,
            responsible_username: Some("ana".into()),
            submissions_count: 1,
            has_approved_submission: true,
            first_delivery_date: NaiveDate::from_ymd_opt(2025, 2, 18),
            last_delivery_date: NaiveDate::from_ymd_opt(2025, 2, 18),
            status: ObligationStatus::Entregue,
        }
    }

    #[test]
    fn xlsx_export_has_the_csv_columns() {
        let bytes = export_workbook(&[report_row()]).unwrap();
        let rows = xlsx::read_rows(&bytes).unwrap();

        assert_eq!(rows[0], EXPORT_HEADER);
        assert_eq!(
            rows[1],
            [
                "Padaria São João", "12345678000190", "SP", "Federal", "DCTF", "01/2025",
                "20/02/2025", "", "ana", "1", "entregue",
            ]
        );
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn xlsx_export_without_rows_keeps_the_header() {
        let rows = xlsx::read_rows(&export_workbook(&[]).unwrap()).unwrap();
        assert_eq!(rows, [EXPORT_HEADER.map(String::from).to_vec()]);
    }
}
