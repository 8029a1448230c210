use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    config::CmsConfig,
    error,
    error::AuthError,
    http::{HttpClient, HttpRequest},
    info,
    management::{Token, TokenManager},
};

#[derive(Debug, Serialize)]
struct ClientCredentials<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Obtains OAuth2 client-credentials tokens for the CMS and keeps the
/// current one in a [`TokenManager`].
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: HttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    tokens: TokenManager,
}

impl AuthClient {
    pub fn new(http: HttpClient, config: &CmsConfig) -> Self {
        Self::with_token_manager(http, config, TokenManager::new())
    }

    pub fn with_token_manager(http: HttpClient, config: &CmsConfig, tokens: TokenManager) -> Self {
        Self {
            http,
            token_url: config.auth_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            tokens,
        }
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// Returns the cached token, fetching a new one when none is cached or
    /// the cached one is about to expire.
    pub async fn fetch_token(&self) -> Result<String, AuthError> {
        self.tokens
            .get_or_refresh(|| self.request_token())
            .await
            .inspect_err(|e| error!("{}", e))
    }

    pub async fn invalidate_cache(&self) {
        self.tokens.invalidate().await;
    }

    /// Drops `rejected` from the cache unless another caller already
    /// replaced it.
    pub async fn invalidate_rejected(&self, rejected: &str) {
        self.tokens.invalidate_if_current(rejected).await;
    }

    /// Attaches the bearer token to `request`.
    pub async fn authorize(&self, request: HttpRequest) -> Result<HttpRequest, AuthError> {
        let token = self.fetch_token().await?;
        Ok(request.bearer(token))
    }

    async fn request_token(&self) -> Result<Token, AuthError> {
        if self.client_id.is_empty() {
            return Err(AuthError::MissingCredential("client id"));
        }
        if self.client_secret.is_empty() {
            return Err(AuthError::MissingCredential("client secret"));
        }

        let body = serde_json::to_string(&ClientCredentials {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "client_credentials",
        })?;

        info!("Fetching access token");
        let request = HttpRequest::with_json_body(Method::POST, self.token_url.as_str(), body);
        let response = self.http.execute(&request, false).await?;

        if response.is_error() {
            return Err(AuthError::Rejected {
                status: response.status.as_u16(),
                body: response.body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body)?;
        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        info!("Access token fetched successfully");
        Ok(Token::new(access_token, parsed.expires_in))
    }
}
