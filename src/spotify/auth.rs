use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use thiserror::Error;

use crate::types::{AccessToken, Credentials, TokenResponse};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token exchange rejected with status {0}")]
    Rejected(StatusCode),
    #[error("token exchange failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token response could not be read: {0}")]
    MalformedResponse(String),
    #[error("missing credential: {0}")]
    MissingCredential(String),
}

/// Exchanges client credentials for short-lived bearer tokens.
///
/// The provider keeps no token state: every call performs one fresh
/// exchange. Retrying is the caller's decision, since repeating an exchange
/// with bad credentials can never succeed.
pub struct TokenProvider {
    client: Client,
    credentials: Credentials,
    token_url: String,
}

impl TokenProvider {
    pub fn new(credentials: Credentials, token_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), credentials, token_url)
    }

    pub fn with_client(
        client: Client,
        credentials: Credentials,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            token_url: token_url.into(),
        }
    }

    /// Performs a client credentials grant against the token endpoint.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Rejected`] for any non-2xx status
    /// - [`AuthError::Transport`] when the endpoint cannot be reached
    /// - [`AuthError::MalformedResponse`] when the body holds no token
    pub async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        let res = self
            .client
            .post(&self.token_url)
            .header(AUTHORIZATION, basic_auth_header(&self.credentials))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(AuthError::Rejected(status));
        }

        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        if body.access_token.is_empty() {
            return Err(AuthError::MalformedResponse(
                "empty access_token".to_string(),
            ));
        }

        Ok(AccessToken::new(body.access_token))
    }
}

pub fn basic_auth_header(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.client_id, credentials.client_secret);
    format!("Basic {}", STANDARD.encode(raw))
}
