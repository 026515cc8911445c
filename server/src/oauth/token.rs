use chrono::Utc;
use serde::{Deserialize, Serialize};

/// How close to expiry a token may get before the request path refreshes it.
/// Two minutes absorbs clock skew and in-flight request latency.
pub const REFRESH_MARGIN_MS: i64 = 2 * 60 * 1000;

/// Remaining lifetime below which the background keep-alive refreshes early,
/// so interactive requests rarely pay the refresh latency cost.
pub const KEEP_ALIVE_THRESHOLD_MS: i64 = 12 * 60 * 60 * 1000;

/// Current time as epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// The single persisted set of Lawmatics OAuth tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer credential for Lawmatics API requests
    pub access_token: String,
    /// Credential used to mint a new access token without user interaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds as reported by Lawmatics at issuance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Derived expiry as epoch milliseconds; authoritative for expiry checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Anything else the authorization server returned, preserved opaquely
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenRecord {
    /// Recompute `expires_at` from `expires_in`. Called on every write so the
    /// derived expiry is never trusted from upstream directly.
    pub fn with_expiry_stamp(mut self, now_ms: i64) -> Self {
        if let Some(expires_in) = self.expires_in {
            self.expires_at = Some(now_ms + expires_in * 1000);
        }
        self
    }

    /// A record with no usable expiry is treated as near-expiry too, since we
    /// have no way to know it is still good.
    pub fn is_near_expiry(&self, now_ms: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now_ms >= expires_at - REFRESH_MARGIN_MS,
            None => true,
        }
    }

    /// Milliseconds until expiry (negative once past), if an expiry is known
    pub fn ms_until_expiry(&self, now_ms: i64) -> Option<i64> {
        self.expires_at.map(|expires_at| expires_at - now_ms)
    }

    /// A record lacking an access token is not considered authorized
    pub fn is_authorized(&self) -> bool {
        !self.access_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_in: Option<i64>, expires_at: Option<i64>) -> TokenRecord {
        TokenRecord {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_in,
            expires_at,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn stamping_derives_expiry_from_expires_in() {
        let now = 1_700_000_000_000;
        let stamped = record(Some(3600), None).with_expiry_stamp(now);
        assert_eq!(stamped.expires_at, Some(now + 3_600_000));
    }

    #[test]
    fn stamping_is_idempotent_for_a_fixed_instant() {
        let now = 1_700_000_000_000;
        let first = record(Some(86400), None).with_expiry_stamp(now);
        let second = first.clone().with_expiry_stamp(now);
        assert_eq!(first.expires_at, second.expires_at);
    }

    #[test]
    fn stamping_without_expires_in_leaves_expiry_untouched() {
        let stamped = record(None, Some(42)).with_expiry_stamp(1_700_000_000_000);
        assert_eq!(stamped.expires_at, Some(42));
    }

    #[test]
    fn near_expiry_honors_the_two_minute_margin() {
        let now = 1_700_000_000_000;

        // Comfortably in the future
        assert!(!record(None, Some(now + REFRESH_MARGIN_MS + 1)).is_near_expiry(now));
        // Exactly at the margin boundary counts as near expiry
        assert!(record(None, Some(now + REFRESH_MARGIN_MS)).is_near_expiry(now));
        // Already expired
        assert!(record(None, Some(now - 1)).is_near_expiry(now));
        // Unknown expiry is treated as near expiry
        assert!(record(None, None).is_near_expiry(now));
    }

    #[test]
    fn empty_access_token_is_not_authorized() {
        let mut r = record(None, None);
        assert!(r.is_authorized());
        r.access_token.clear();
        assert!(!r.is_authorized());
    }

    #[test]
    fn extra_fields_round_trip_opaquely() {
        let json = serde_json::json!({
            "access_token": "abc",
            "refresh_token": "def",
            "expires_in": 3600,
            "token_type": "Bearer",
            "scope": "read write",
        });

        let parsed: TokenRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.extra.get("token_type").and_then(|v| v.as_str()), Some("Bearer"));

        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back.get("scope").and_then(|v| v.as_str()), Some("read write"));
    }
}
