// src/domain/filename.rs

use crate::domain::competence::Competence;

/// Partes extraídas de um anexo nomeado `{CNPJ}_{MMAAAA}_{CHAVE}.{zip|pdf|rar}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAttachmentName {
    pub cnpj: String,
    pub period: String,
    pub competence: Competence,
    pub obligation_key: String,
    pub extension: String,
}

impl ParsedAttachmentName {
    /// Chave da obrigação com `_` trocado por espaço, para busca por nome.
    pub fn obligation_search(&self) -> String {
        self.obligation_key.replace('_', " ")
    }
}

const EXTENSIONS: [&str; 3] = ["zip", "pdf", "rar"];

pub fn parse_attachment_name(name: &str) -> Option<ParsedAttachmentName> {
    let (stem, extension) = name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    if !EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    let mut parts = stem.splitn(3, '_');
    let cnpj = parts.next()?;
    let period = parts.next()?;
    let key = parts.next()?;

    if cnpj.len() != 14 || !cnpj.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let competence = Competence::from_period(period).ok()?;
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }

    Some(ParsedAttachmentName {
        cnpj: cnpj.to_string(),
        period: period.to_string(),
        competence,
        obligation_key: key.to_string(),
        extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_names() {
        let parsed = parse_attachment_name("12345678000190_032025_SPED_FISCAL.pdf").unwrap();
        assert_eq!(parsed.cnpj, "12345678000190");
        assert_eq!(parsed.competence.to_string(), "03/2025");
        assert_eq!(parsed.obligation_key, "SPED_FISCAL");
        assert_eq!(parsed.obligation_search(), "SPED FISCAL");
    }

    #[test]
    fn rejects_names_outside_the_pattern() {
        for name in [
            "12345678000190_032025_SPED.docx",
            "1234567800019_032025_SPED.pdf",
            "12345678000190_132025_SPED.pdf",
            "12345678000190_032025_.pdf",
            "12345678000190_032025_SPED-X.zip",
            "recibo.pdf",
        ] {
            assert!(parse_attachment_name(name).is_none(), "{name}");
        }
    }
}
