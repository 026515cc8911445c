use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::oauth::{LawmaticsAuthServer, TokenLifecycle, TokenStore};

/// OAuth and API settings for the Lawmatics tenant this relay fronts
#[derive(Debug, Clone)]
pub struct LawmaticsSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Interactive app host, serves the authorization and token endpoints
    pub app_base_url: String,
    /// REST API host, serves prospect creation
    pub api_base_url: String,
}

impl LawmaticsSettings {
    pub fn from_env() -> color_eyre::Result<Self> {
        Ok(Self {
            client_id: env::var("LAWMATICS_CLIENT_ID")?,
            client_secret: env::var("LAWMATICS_CLIENT_SECRET")?,
            redirect_uri: env::var("LAWMATICS_REDIRECT_URI")?,
            app_base_url: env::var("LAWMATICS_APP_URL")
                .unwrap_or_else(|_| "https://app.lawmatics.com".to_string()),
            api_base_url: env::var("LAWMATICS_API_URL")
                .unwrap_or_else(|_| "https://api.lawmatics.com".to_string()),
        })
    }

    /// Deterministic authorization redirect URL for a given state value
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&state={}",
            self.app_base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state),
        )
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.app_base_url)
    }

    pub fn prospects_url(&self) -> String {
        format!("{}/v1/prospects", self.api_base_url)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: LawmaticsSettings,
    pub http: reqwest::Client,
    pub tokens: Arc<TokenLifecycle<LawmaticsAuthServer>>,
    pub port: u16,
}

impl AppState {
    pub fn from_env() -> color_eyre::Result<Self> {
        let settings = LawmaticsSettings::from_env()?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()?;

        let token_store_path =
            env::var("TOKEN_STORE_PATH").unwrap_or_else(|_| "tokens.json".to_string());

        // One shared client with an explicit timeout so nothing stalls forever
        let http = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .use_rustls_tls()
            .build()?;

        let store = TokenStore::new(&token_store_path);
        let auth = LawmaticsAuthServer::new(http.clone(), settings.clone());
        let tokens = Arc::new(TokenLifecycle::new(store, auth));

        Ok(Self {
            settings,
            http,
            tokens,
            port,
        })
    }
}
