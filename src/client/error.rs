// src/client/error.rs

//! Erros do cliente HTTP.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Falha de rede ou de transporte
    #[error("Falha na comunicação com o servidor: {0}")]
    Http(#[from] reqwest::Error),

    /// O servidor respondeu HTML onde se esperava JSON
    #[error("Servidor retornou HTML em vez de JSON (status {status}). Verifique a URL da API e se o backend está em execução.")]
    HtmlResponse { status: u16 },

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Sua sessão expirou. Faça login novamente.")]
    SessionExpired,

    /// Resposta com formato diferente do esperado
    #[error("Resposta inesperada de {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Validação local; nenhuma requisição foi enviada
    #[error("{0}")]
    Validation(String),

    #[error("Erro de arquivo: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HtmlResponse { status } | ClientError::Api { status, .. } => Some(*status),
            ClientError::SessionExpired => Some(401),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        Value::Object(map) => map.values().find_map(first_message),
        _ => None,
    }
}

/// Mensagem de erro de uma resposta não-2xx: `error`, depois a primeira
/// mensagem de `errors`, depois `detail`, senão "Erro {status}: {motivo}".
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| v.get("errors").and_then(first_message))
                .or_else(|| v.get("detail").and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            format!("Erro {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("Erro desconhecido"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_key_wins() {
        let body = r#"{"error": "Notificação não encontrada", "detail": "x"}"#.as_bytes();
        assert_eq!(error_message(StatusCode::NOT_FOUND, body), "Notificação não encontrada");
    }

    #[test]
    fn field_errors_give_first_message() {
        let body = r#"{"errors": {"password": ["A senha deve ter no mínimo 6 caracteres."]}}"#.as_bytes();
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "A senha deve ter no mínimo 6 caracteres."
        );
        let list = r#"{"errors": ["Linha 2: UF é obrigatória"]}"#.as_bytes();
        assert_eq!(error_message(StatusCode::BAD_REQUEST, list), "Linha 2: UF é obrigatória");
    }

    #[test]
    fn detail_is_used_when_alone() {
        let body = r#"{"detail": "Não autorizado"}"#.as_bytes();
        assert_eq!(error_message(StatusCode::FORBIDDEN, body), "Não autorizado");
    }

    #[test]
    fn non_json_body_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, b"<html>oops</html>"),
            "Erro 502: Bad Gateway"
        );
    }
}
