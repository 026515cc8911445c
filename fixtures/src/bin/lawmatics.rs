//! Mock Lawmatics server for local development: enough of the OAuth flow and
//! the prospects API to exercise the relay without a real Lawmatics account.

use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use clap::Parser;
use fixtures::{run_server, FixtureArgs};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// Lawmatics fixture server
#[derive(Parser, Debug)]
#[clap(name = "lawmatics-fixture")]
struct Cli {
    #[clap(flatten)]
    common: FixtureArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let app = Router::new()
        // OAuth endpoints (app host)
        .route("/oauth/authorize", get(authorize))
        .route("/oauth/token", post(token))
        // REST API (api host)
        .route("/v1/prospects", post(create_prospect));

    run_server(args.common, app).await
}

#[derive(Deserialize)]
struct AuthorizeParams {
    client_id: String,
    redirect_uri: String,
    state: Option<String>,
}

/// Skip the consent screen and bounce straight back with a code
async fn authorize(Query(params): Query<AuthorizeParams>) -> impl IntoResponse {
    info!("Authorize request for client {}", params.client_id);

    let code = Uuid::new_v4().to_string();
    let mut location = format!("{}?code={}", params.redirect_uri, code);
    if let Some(state) = params.state {
        location.push_str(&format!("&state={state}"));
    }

    (StatusCode::FOUND, [(header::LOCATION, location)])
}

#[derive(Deserialize)]
struct TokenParams {
    grant_type: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    code: Option<String>,
    refresh_token: Option<String>,
}

/// Issue a fresh fake token set for either grant type
async fn token(Form(params): Form<TokenParams>) -> impl IntoResponse {
    if params.client_id.is_none() || params.client_secret.is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_client"})),
        );
    }

    match params.grant_type.as_str() {
        "authorization_code" if params.code.is_some() => {}
        "refresh_token" if params.refresh_token.is_some() => {}
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "unsupported_grant_type"})),
            );
        }
    }

    info!("Issuing tokens for grant_type={}", params.grant_type);

    (
        StatusCode::OK,
        Json(json!({
            "access_token": Uuid::new_v4().to_string(),
            "refresh_token": Uuid::new_v4().to_string(),
            "token_type": "Bearer",
            "expires_in": 86400,
        })),
    )
}

/// Accept a prospect and echo it back the way Lawmatics does
async fn create_prospect(
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "));

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "missing bearer token"})),
        );
    }

    info!("Prospect created");

    (
        StatusCode::CREATED,
        Json(json!({
            "data": {
                "id": Uuid::new_v4().to_string(),
                "type": "prospect",
                "attributes": body,
            }
        })),
    )
}
