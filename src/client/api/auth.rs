// src/client/api/auth.rs

use serde_json::json;

use crate::{
    client::{error::ClientResult, ApiClient},
    models::auth::{AccessToken, CurrentUser, TokenPair},
};

impl ApiClient {
    /// Autentica e guarda os tokens na sessão.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<TokenPair> {
        let tokens: TokenPair = self
            .transport()
            .post("auth/login/", &json!({ "username": username, "password": password }))
            .await?;
        self.session().set_tokens(tokens.clone());
        Ok(tokens)
    }

    /// Renova o access token com o refresh token da sessão.
    pub async fn refresh(&self) -> ClientResult<()> {
        let refresh = self.session().refresh_token().ok_or(crate::client::ClientError::SessionExpired)?;
        let token: AccessToken = self.transport().post("auth/refresh/", &json!({ "refresh": refresh })).await?;
        self.session().set_access(token.access);
        Ok(())
    }

    pub fn logout(&self) {
        self.session().invalidate();
    }

    pub async fn me(&self) -> ClientResult<CurrentUser> {
        self.transport().get("me/").await
    }
}
