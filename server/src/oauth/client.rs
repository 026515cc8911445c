use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::errors::RelayError;
use crate::state::LawmaticsSettings;

/// Raw token endpoint response. Lawmatics returns at least an access token;
/// everything else is optional and carried through opaquely.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The authorization-server boundary. The lifecycle manager talks to the
/// token endpoint only through this trait, so tests can swap in a mock.
#[async_trait]
pub trait AuthServer: Send + Sync {
    /// Exchange a one-time authorization code for the first token set
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, RelayError>;

    /// Mint a new access token from a refresh token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, RelayError>;
}

/// Real Lawmatics token endpoint client
pub struct LawmaticsAuthServer {
    http: reqwest::Client,
    settings: LawmaticsSettings,
}

impl LawmaticsAuthServer {
    pub fn new(http: reqwest::Client, settings: LawmaticsSettings) -> Self {
        Self { http, settings }
    }

    async fn post_token_request(
        &self,
        form: &[(&str, &str)],
        failure: fn(String) -> RelayError,
    ) -> Result<TokenResponse, RelayError> {
        let token_url = self.settings.token_url();

        let response = self
            .http
            .post(&token_url)
            .form(form)
            .send()
            .await
            .map_err(|err| failure(format!("request to {token_url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failure(format!("token endpoint returned {status}: {body}")));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|err| failure(format!("could not parse token response: {err}")))
    }
}

#[async_trait]
impl AuthServer for LawmaticsAuthServer {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, RelayError> {
        info!("Exchanging authorization code with Lawmatics");

        self.post_token_request(
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
            ],
            RelayError::CodeExchangeFailed,
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, RelayError> {
        info!("Refreshing Lawmatics access token");

        self.post_token_request(
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
            RelayError::RefreshFailed,
        )
        .await
    }
}
