// src/common/error.rs

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::approval::TransitionError;

// Erro da API, com `thiserror` para conversões automáticas.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Erros de campo montados à mão (ex.: regras que dependem do banco)
    #[error("Erro de validação")]
    FieldErrors(HashMap<String, Vec<String>>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de arquivo: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro no upload: {0}")]
    MultipartError(#[from] MultipartError),
}

impl AppError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::FieldErrors(HashMap::from([(field.to_string(), vec![message.into()])]))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::FieldErrors(_)
            | AppError::BadRequest(_)
            | AppError::Transition(_)
            | AppError::MultipartError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converte violação de unicidade em 409 com a mensagem dada.
pub fn unique_violation_as(err: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message.to_string());
        }
    }
    err.into()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("Valor inválido ({})", e.code))
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                // Erros de nível de struct (schema) chegam como "__all__"
                if let Some(messages) = details.remove("__all__") {
                    details.insert("non_field_errors".to_string(), messages);
                }
                (status, Json(json!({ "errors": details }))).into_response()
            }
            AppError::FieldErrors(details) => {
                (status, Json(json!({ "errors": details }))).into_response()
            }
            other => {
                let message = match &other {
                    AppError::InvalidCredentials => "Credenciais inválidas.".to_string(),
                    AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
                    e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                        tracing::error!("Erro Interno do Servidor: {:?}", e);
                        "Ocorreu um erro inesperado.".to_string()
                    }
                    e => e.to_string(),
                };
                (status, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn single_message_errors_use_error_key() {
        let (status, body) = body_of(AppError::NotFound("Notificação não encontrada".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Notificação não encontrada");
    }

    #[tokio::test]
    async fn field_errors_use_errors_key() {
        let (status, body) = body_of(AppError::field("password", "A senha deve ter no mínimo 6 caracteres.")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["password"][0], "A senha deve ter no mínimo 6 caracteres.");
    }

    #[tokio::test]
    async fn transition_errors_are_bad_requests() {
        let err = AppError::from(TransitionError::RejectCommentRequired);
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "O comentário é obrigatório para recusar uma entrega");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_of(AppError::InternalServerError(anyhow::anyhow!("segredo"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Ocorreu um erro inesperado.");
    }
}
