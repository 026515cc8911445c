use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use maud::{html, Markup};

use crate::oauth::token::now_ms;
use crate::state::AppState;

pub mod lawmatics;

/// Build the application router with all routes
pub fn routes(app_state: AppState) -> axum::Router {
    axum::Router::new()
        // Informational page
        .route("/", get(root_page))
        // Lawmatics OAuth flow
        .route("/auth", get(lawmatics::authorize))
        .route("/callback", get(lawmatics::callback))
        // Lead forwarding
        .route("/lead", post(lawmatics::submit_lead))
        // Operator visibility into the stored token
        .route("/token-status", get(token_status))
        // Add trace layer for debugging
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Root page handler - a static page describing the relay's endpoints
async fn root_page() -> Markup {
    html! {
        (maud::DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Lawmatics Lead Relay" }
                style {
                    "body { font-family: sans-serif; max-width: 40rem; margin: 3rem auto; color: #1f2937; }"
                    "code { background: #f3f4f6; padding: 0.1rem 0.3rem; border-radius: 0.25rem; }"
                    "li { margin-bottom: 0.5rem; }"
                }
            }
            body {
                h1 { "Lawmatics Lead Relay" }
                p {
                    "This service holds a Lawmatics OAuth connection and forwards "
                    "lead submissions to the Lawmatics prospects API."
                }
                ul {
                    li { code { "GET /auth" } " — start the Lawmatics authorization flow" }
                    li { code { "GET /callback" } " — OAuth redirect target, completes the flow" }
                    li { code { "POST /lead" } " — submit a lead as JSON" }
                    li { code { "GET /token-status" } " — current token state" }
                }
            }
        }
    }
}

/// Report the stored token's state without exposing the token itself
async fn token_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.tokens.current() {
        Some(record) if record.is_authorized() => Json(serde_json::json!({
            "authorized": true,
            "expires_at": record.expires_at,
            "ms_until_expiry": record.ms_until_expiry(now_ms()),
            "has_refresh_token": record.refresh_token.is_some(),
        })),
        _ => Json(serde_json::json!({
            "authorized": false,
        })),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    use super::*;
    use crate::oauth::{LawmaticsAuthServer, TokenLifecycle, TokenStore};
    use crate::state::LawmaticsSettings;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let settings = LawmaticsSettings {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
            app_base_url: "http://localhost:9".to_string(),
            api_base_url: "http://localhost:9".to_string(),
        };
        let http = reqwest::ClientBuilder::new()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        let auth = LawmaticsAuthServer::new(http.clone(), settings.clone());

        AppState {
            settings,
            http,
            tokens: Arc::new(TokenLifecycle::new(store, auth)),
            port: 0,
        }
    }

    #[tokio::test]
    async fn lead_with_missing_last_name_is_rejected_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let app = routes(test_state(&dir));

        let response = app
            .oneshot(
                Request::post("/lead")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"firstName": "John"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        // Nothing listens on the configured base URLs, so a 400 here also
        // proves validation fired before any submission attempt
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn token_status_reports_unauthorized_with_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let app = routes(test_state(&dir));

        let response = app
            .oneshot(Request::get("/token-status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn auth_redirects_to_lawmatics() {
        let dir = tempfile::tempdir().unwrap();
        let app = routes(test_state(&dir));

        let response = app
            .oneshot(
                Request::get("/auth?state=test-state")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()["location"].to_str().unwrap();
        assert!(location.starts_with("http://localhost:9/oauth/authorize?"));
        assert!(location.contains("state=test-state"));
        assert!(location.contains("response_type=code"));
    }

    #[tokio::test]
    async fn callback_without_code_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = routes(test_state(&dir));

        let response = app
            .oneshot(Request::get("/callback").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
