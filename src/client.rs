// src/client.rs

//! Cliente tipado da API de obrigações.
//!
//! Todas as chamadas passam pelo [`transport::Transport`], que injeta o token
//! da [`session::Session`], trata 401 de forma uniforme e decodifica cada
//! resposta no modelo correspondente de `crate::models`.

pub mod api;
pub mod download;
pub mod error;
pub mod feed;
pub mod format;
pub mod forms;
pub mod session;
pub mod transport;

use std::{env, time::Duration};

pub use download::Download;
pub use error::{ClientError, ClientResult};
pub use feed::{FeedSnapshot, NotificationFeed};
pub use session::Session;

use transport::Transport;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub notification_poll: Duration,
    /// Sem timeout por padrão
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            notification_poll: Duration::from_secs(60),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Lê `API_URL`, `NOTIFICATION_POLL_SECS` e `REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let secs = |name: &str| {
            env::var(name).ok().and_then(|v| v.trim().parse::<u64>().ok()).filter(|s| *s > 0)
        };
        let defaults = Self::default();
        Self {
            api_url: env::var("API_URL").ok().filter(|v| !v.trim().is_empty()).unwrap_or(defaults.api_url),
            notification_poll: secs("NOTIFICATION_POLL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.notification_poll),
            request_timeout: secs("REQUEST_TIMEOUT_SECS").map(Duration::from_secs),
        }
    }

    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into(), ..Self::default() }
    }
}

/// Cliente da API. Clones compartilham a mesma sessão.
#[derive(Clone)]
pub struct ApiClient {
    transport: Transport,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Self::with_session(config, Session::new())
    }

    pub fn with_session(config: ClientConfig, session: Session) -> ClientResult<Self> {
        Ok(Self { transport: Transport::new(&config, session)?, config })
    }

    pub fn session(&self) -> &Session {
        self.transport.session()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_every_minute_without_timeout() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.notification_poll, Duration::from_secs(60));
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn clones_share_the_session() {
        let client = ApiClient::new(ClientConfig::with_api_url("http://127.0.0.1:9/api/")).unwrap();
        let clone = client.clone();
        clone.session().set_tokens(crate::models::auth::TokenPair { access: "novo".into(), refresh: "r".into() });
        assert_eq!(client.session().access_token().as_deref(), Some("novo"));
    }
}
