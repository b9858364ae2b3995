// src/client/api/reports.rs

use crate::{
    client::{error::ClientResult, ApiClient, Download},
    models::report::{
        AdvancedFilter, AdvancedReport, DetailedFilter, DetailedReport, ReportSummary, UserPerformanceReport,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    fn path(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "reports/export.csv",
            ExportFormat::Xlsx => "reports/export.xlsx",
        }
    }
}

impl ApiClient {
    pub async fn report_summary(&self) -> ClientResult<ReportSummary> {
        self.transport().get("reports/summary/").await
    }

    pub async fn detailed_report(&self, filter: &DetailedFilter) -> ClientResult<DetailedReport> {
        self.transport().get_query("reports/detailed/", filter).await
    }

    pub async fn advanced_report(&self, filter: &AdvancedFilter) -> ClientResult<AdvancedReport> {
        self.transport().get_query("reports/advanced/", filter).await
    }

    pub async fn user_performance(&self, user_id: i64) -> ClientResult<UserPerformanceReport> {
        self.transport().get(&format!("reports/user/{user_id}/")).await
    }

    /// O nome do arquivo vem do Content-Disposition da resposta.
    pub async fn export_report(&self, format: ExportFormat, filter: &DetailedFilter) -> ClientResult<Download> {
        self.transport().download(format.path(), filter).await
    }
}
