// src/client/download.rs

//! Downloads binários (anexos, modelos, relatórios exportados).

use std::path::{Path, PathBuf};

use reqwest::{header, Response};

use crate::client::error::ClientResult;

pub const FALLBACK_FILENAME: &str = "arquivo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Download {
    pub async fn from_response(response: Response) -> ClientResult<Self> {
        let headers = response.headers();
        let filename = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(Self { filename, content_type, bytes })
    }

    /// Grava o arquivo no diretório, usando apenas o nome (sem caminhos).
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> ClientResult<PathBuf> {
        let name = Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| FALLBACK_FILENAME.into());
        let path = dir.as_ref().join(name);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

fn percent_decode(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = value.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Nome do arquivo de um `Content-Disposition`; `filename*` tem prioridade.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for part in value.split(';').map(str::trim) {
        let Some((key, raw)) = part.split_once('=') else { continue };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = raw.trim().trim_matches('"');
                let encoded = encoded.splitn(3, '\'').nth(2).unwrap_or(encoded);
                if let Some(name) = percent_decode(encoded).filter(|n| !n.is_empty()) {
                    return Some(name);
                }
            }
            "filename" => {
                let name = raw.trim().trim_matches('"');
                if !name.is_empty() {
                    plain = Some(name.to_string());
                }
            }
            _ => {}
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_filename_is_read() {
        assert_eq!(
            filename_from_disposition("attachment; filename=\"recibo.pdf\"").as_deref(),
            Some("recibo.pdf")
        );
        assert_eq!(filename_from_disposition("attachment; filename=dados.csv").as_deref(), Some("dados.csv"));
    }

    #[test]
    fn extended_filename_wins() {
        let header = "attachment; filename=\"relat_rio.csv\"; filename*=UTF-8''relat%C3%B3rio.csv";
        assert_eq!(filename_from_disposition(header).as_deref(), Some("relatório.csv"));
    }

    #[test]
    fn missing_filename_gives_none() {
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition("attachment; filename=\"\""), None);
    }

    #[tokio::test]
    async fn save_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let download = Download {
            filename: "../../etc/recibo.pdf".into(),
            content_type: None,
            bytes: b"%PDF".to_vec(),
        };
        let path = download.save_to(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("recibo.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF");
    }
}
