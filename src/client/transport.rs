// src/client/transport.rs

//! Transporte HTTP: injeta o Bearer token, detecta respostas HTML e
//! decodifica cada resposta no tipo esperado.

use reqwest::{header, multipart::Form, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::client::{
    download::Download,
    error::{error_message, ClientError, ClientResult},
    session::Session,
    ClientConfig,
};

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("text/html"))
}

/// Decodifica o JSON no tipo esperado. Structs derivadas do serde também
/// aceitam arrays posicionais, então um array só é aceito quando o próprio
/// tipo é uma sequência.
pub(crate) fn decode_body<T: DeserializeOwned>(bytes: &[u8], endpoint: &str) -> ClientResult<T> {
    let decode_err = |source| ClientError::Decode { endpoint: endpoint.to_string(), source };
    let value: Value = serde_json::from_slice(bytes).map_err(decode_err)?;
    if value.is_array() {
        // Um tipo sequência decodifica um array vazio; uma struct não.
        if serde_json::from_value::<T>(Value::Array(Vec::new())).is_err() {
            let len = value.as_array().map_or(0, Vec::len);
            return Err(decode_err(<serde_json::Error as serde::de::Error>::custom(format!(
                "esperado um objeto, recebido um array de {len} itens"
            ))));
        }
    }
    serde_json::from_value(value).map_err(decode_err)
}

#[derive(Clone)]
pub struct Transport {
    http: Client,
    base_url: String,
    session: Session,
}

impl Transport {
    pub fn new(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Envia a requisição e trata os status de erro. Qualquer 401 invalida a sessão.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ClientResult<Response> {
        let url = self.url(path);
        let token = self.session.access_token();

        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        tracing::debug!(%method, %url, "➡️ requisição");

        let response = build(request).send().await?;
        let status = response.status();
        tracing::debug!(
            status = status.as_u16(),
            content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            "⬅️ resposta de {}",
            url
        );

        if status.is_success() {
            return Ok(response);
        }
        // 401 vem antes da checagem de HTML: página de login de um proxy
        // também encerra a sessão.
        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate();
            if token.is_some() {
                return Err(ClientError::SessionExpired);
            }
        }
        if is_html(&response) {
            return Err(ClientError::HtmlResponse { status: status.as_u16() });
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(ClientError::Api { status: status.as_u16(), message: error_message(status, &body) })
    }

    /// Decodifica o corpo no tipo da resposta, falhando se o formato divergir.
    pub async fn decode<T: DeserializeOwned>(&self, response: Response, endpoint: &str) -> ClientResult<T> {
        if is_html(&response) {
            return Err(ClientError::HtmlResponse { status: response.status().as_u16() });
        }
        let bytes = response.bytes().await?;
        decode_body(&bytes, endpoint)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(Method::GET, path, |b| b).await?;
        self.decode(response, path).await
    }

    pub async fn get_query<Q: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, query: &Q) -> ClientResult<T> {
        let response = self.send(Method::GET, path, |b| b.query(query)).await?;
        self.decode(response, path).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let response = self.send(Method::POST, path, |b| b.json(body)).await?;
        self.decode(response, path).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let response = self.send(Method::PATCH, path, |b| b.json(body)).await?;
        self.decode(response, path).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(Method::DELETE, path, |b| b).await?;
        Ok(())
    }

    /// DELETE que devolve corpo JSON.
    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(Method::DELETE, path, |b| b).await?;
        self.decode(response, path).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> ClientResult<T> {
        let response = self.send(Method::POST, path, |b| b.multipart(form)).await?;
        self.decode(response, path).await
    }

    pub async fn download<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ClientResult<Download> {
        let response = self.send(Method::GET, path, |b| b.query(query)).await?;
        if is_html(&response) {
            return Err(ClientError::HtmlResponse { status: response.status().as_u16() });
        }
        Download::from_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::NotificationStats;

    #[test]
    fn positional_array_is_not_accepted_as_struct() {
        let err = decode_body::<NotificationStats>(b"[1, 2, 3]", "notifications/stats/").unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref endpoint, .. } if endpoint == "notifications/stats/"));
    }

    #[test]
    fn arrays_still_decode_into_lists() {
        let ids: Vec<i64> = decode_body(b"[1, 2, 3]", "ids").unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn wrong_field_type_is_a_decode_error() {
        let err = decode_body::<NotificationStats>(br#"{"total": "x", "unread": 0, "read": 0}"#, "stats").unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }
}
