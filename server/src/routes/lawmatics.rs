use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use maud::html;
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::RelayError;
use crate::leads::{self, LeadPayload};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AuthParams {
    /// Opaque state carried through the flow for CSRF correlation
    pub state: Option<String>,
}

/// Start the Lawmatics OAuth flow by redirecting to the authorization page
pub async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthParams>,
) -> Response {
    // Callers that don't supply a state still get a correlation value
    let flow_state = params
        .state
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let url = state.settings.authorization_url(&flow_state);
    info!("Redirecting to Lawmatics authorization page");

    (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
}

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth redirect target: exchange the one-time code for the first token set
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    // The authorization server reports user-denied and similar failures
    // through query parameters rather than a code
    if let Some(err) = params.error {
        error!(
            "Lawmatics authorization failed: {} ({:?})",
            err, params.error_description
        );
        return (
            StatusCode::BAD_REQUEST,
            format!("Authorization failed: {err}"),
        )
            .into_response();
    }

    let code = match params.code {
        Some(code) => code,
        None => {
            error!("Callback hit without an authorization code");
            return (
                StatusCode::BAD_REQUEST,
                "Missing authorization code. Please restart the flow at /auth.".to_string(),
            )
                .into_response();
        }
    };

    info!("Callback received, state: {:?}", params.state);

    let record = match state.tokens.complete_authorization(&code).await {
        Ok(record) => record,
        Err(err) => return err.into_response(),
    };

    info!(
        "Lawmatics connection established, token expires_at={:?}",
        record.expires_at
    );

    html! {
        (maud::DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Connected to Lawmatics" }
            }
            body {
                h1 { "Connected to Lawmatics" }
                p { "Authorization complete. This relay can now forward leads." }
                p { "You can close this window." }
            }
        }
    }
    .into_response()
}

/// Forward a lead to the Lawmatics prospects API
pub async fn submit_lead(
    State(state): State<AppState>,
    Json(payload): Json<LeadPayload>,
) -> Result<Json<serde_json::Value>, RelayError> {
    let data = leads::submit_lead(&state, &payload).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": data,
    })))
}
