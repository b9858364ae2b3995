// src/common/storage.rs

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{common::error::AppError, models::submission::UploadedFile};

/// Arquivos enviados ficam em disco sob `MEDIA_ROOT`.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
}

/// Remove separadores e caracteres de controle do nome enviado pelo cliente.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if matches!(c, '"' | ':' | '*' | '?' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() { "arquivo".to_string() } else { cleaned }
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Grava o arquivo e devolve o caminho relativo à raiz.
    pub async fn save(&self, folder: &str, file: &UploadedFile) -> Result<String, AppError> {
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;

        let stored = format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(&file.filename));
        tokio::fs::write(dir.join(&stored), &file.bytes).await?;

        Ok(Path::new(folder).join(stored).to_string_lossy().into_owned())
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, AppError> {
        match tokio::fs::read(self.root.join(relative)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Arquivo não encontrado no servidor".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, relative: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!("Falha ao remover arquivo {}: {}", relative, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_paths_and_reserved_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\tmp\\re\"cibo?.pdf"), "re_cibo_.pdf");
        assert_eq!(sanitize_filename("..."), "arquivo");
    }

    #[tokio::test]
    async fn saves_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        let file = UploadedFile {
            filename: "recibo.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF-1.4".to_vec(),
        };

        let path = storage.save("submissions/7", &file).await.unwrap();
        assert!(path.ends_with("_recibo.pdf"));
        assert_eq!(storage.read(&path).await.unwrap(), b"%PDF-1.4");
        assert!(matches!(storage.read("nada.pdf").await, Err(AppError::NotFound(_))));
    }
}
