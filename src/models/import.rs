// src/models/import.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Resultado de uma importação por planilha.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub created: usize,
    pub errors: Vec<String>,
    pub total_processed: usize,
}

impl ImportSummary {
    /// Mensagem curta para o banner de resultado.
    pub fn banner(&self) -> String {
        if self.errors.is_empty() {
            format!("{} de {} linhas importadas com sucesso.", self.created, self.total_processed)
        } else {
            format!(
                "{} de {} linhas importadas; {} com erro.",
                self.created,
                self.total_processed,
                self.errors.len()
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Companies,
    Obligations,
    Deliveries,
}

impl TemplateKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "companies" => Some(Self::Companies),
            "obligations" => Some(Self::Obligations),
            "deliveries" => Some(Self::Deliveries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Companies => "companies",
            TemplateKind::Obligations => "obligations",
            TemplateKind::Deliveries => "deliveries",
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            TemplateKind::Companies => "template_empresas.xlsx",
            TemplateKind::Obligations => "template_obrigacoes.xlsx",
            TemplateKind::Deliveries => "template_entregas.xlsx",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            TemplateKind::Companies => "Empresas",
            TemplateKind::Obligations => "Obrigações",
            TemplateKind::Deliveries => "Entregas",
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            TemplateKind::Companies => &[
                "name", "cnpj", "fantasy_name", "email", "phone", "address", "responsible",
            ],
            TemplateKind::Obligations => &[
                "company", "cnpj", "state", "obligation_type", "competence", "due_date",
                "delivery_deadline", "notes",
            ],
            TemplateKind::Deliveries => &[
                "cnpj", "company_name", "state", "obligation_name", "competence",
                "delivery_date", "submission_type", "comments",
            ],
        }
    }
}
