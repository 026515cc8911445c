use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::RelayError;
use crate::oauth::client::{AuthServer, TokenResponse};
use crate::oauth::store::TokenStore;
use crate::oauth::token::{now_ms, TokenRecord, KEEP_ALIVE_THRESHOLD_MS};

/// What a keep-alive pass decided to do
#[derive(Debug, PartialEq, Eq)]
pub enum KeepAliveStatus {
    /// No record, or a record with no known expiry: nothing to refresh
    Idle,
    /// Token still has plenty of life left (ms remaining)
    Fresh(i64),
    /// Token was refreshed early
    Refreshed,
}

/// The single authority for "is this token usable".
///
/// Owns the durable store and the authorization-server client; everything
/// else asks this manager for an access token instead of inspecting expiry
/// on its own. Refreshes are serialized behind a mutex so a request and the
/// background keep-alive deciding to refresh at the same moment do not race
/// each other through the token endpoint.
pub struct TokenLifecycle<A: AuthServer> {
    store: TokenStore,
    auth: A,
    refresh_lock: Mutex<()>,
}

impl<A: AuthServer> TokenLifecycle<A> {
    pub fn new(store: TokenStore, auth: A) -> Self {
        Self {
            store,
            auth,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Raw record read, for the status endpoint only
    pub fn current(&self) -> Option<TokenRecord> {
        self.store.load()
    }

    /// Return an access token that is good for at least the refresh margin,
    /// refreshing first when the stored one is near or past expiry.
    pub async fn get_valid_access_token(&self) -> Result<String, RelayError> {
        let record = self.store.load().ok_or(RelayError::Unauthorized)?;

        if !record.is_near_expiry(now_ms()) {
            debug!("Stored access token is still fresh");
            return Ok(record.access_token);
        }

        if record.refresh_token.is_none() {
            return Err(RelayError::MissingRefreshToken);
        }

        let refreshed = self.refresh().await?;
        Ok(refreshed.access_token)
    }

    /// Complete the authorization-code flow: exchange the code and persist
    /// the first token record. Failures are not retried; the user restarts
    /// the flow.
    pub async fn complete_authorization(&self, code: &str) -> Result<TokenRecord, RelayError> {
        let response = self.auth.exchange_code(code).await?;
        let record = self.store.save(merge_response(response, None))?;
        info!("Authorization complete, token record stored");
        Ok(record)
    }

    /// Refresh the stored token and persist the replacement.
    ///
    /// On failure the stored record is left untouched, so the next request
    /// or keep-alive tick can try again with the same refresh token.
    pub async fn refresh(&self) -> Result<TokenRecord, RelayError> {
        let _guard = self.refresh_lock.lock().await;

        let record = self.store.load().ok_or(RelayError::Unauthorized)?;
        let refresh_token = record
            .refresh_token
            .clone()
            .ok_or(RelayError::MissingRefreshToken)?;

        let response = self.auth.refresh(&refresh_token).await?;
        let record = self.store.save(merge_response(response, Some(refresh_token)))?;

        info!("Access token refreshed, expires_at={:?}", record.expires_at);
        Ok(record)
    }

    /// One background keep-alive pass: refresh early when less than the
    /// keep-alive threshold remains, so idle periods absorb the refresh cost.
    pub async fn keep_warm(&self) -> Result<KeepAliveStatus, RelayError> {
        let record = match self.store.load() {
            Some(record) => record,
            None => return Ok(KeepAliveStatus::Idle),
        };

        let ms_left = match record.ms_until_expiry(now_ms()) {
            Some(ms_left) => ms_left,
            // Without a known expiry there is nothing sensible to refresh
            None => return Ok(KeepAliveStatus::Idle),
        };

        if ms_left < KEEP_ALIVE_THRESHOLD_MS {
            self.refresh().await?;
            Ok(KeepAliveStatus::Refreshed)
        } else {
            Ok(KeepAliveStatus::Fresh(ms_left))
        }
    }
}

/// Build the replacement record from a token endpoint response. The previous
/// refresh token is carried forward when the server omits one, otherwise a
/// single refresh would strand the relay until the next manual authorization.
fn merge_response(response: TokenResponse, prior_refresh_token: Option<String>) -> TokenRecord {
    TokenRecord {
        access_token: response.access_token,
        refresh_token: response.refresh_token.or(prior_refresh_token),
        expires_in: response.expires_in,
        expires_at: None,
        extra: response.extra,
    }
}
