// src/services/mailer.rs

use async_trait::async_trait;

use crate::common::error::AppError;

/// Saída de e-mail usada pelo resumo de notificações.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Implementação padrão: apenas registra a mensagem no log.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        tracing::info!(to, subject, "📧 E-mail registrado ({} caracteres)", body.chars().count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_never_fails() {
        let mailer = LogMailer;
        assert!(mailer.send("fiscal@example.com", "Assunto", "Corpo").await.is_ok());
    }
}
