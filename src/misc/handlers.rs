use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::{
    error::{ApiError, ApiResult},
    mailer::OutgoingMail,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test-mail-sent", post(test_mail))
        .route("/zen-quote", get(zen_quote))
}

#[derive(Debug, Deserialize)]
pub struct TestMailRequest {
    pub session_title: Option<String>,
}

#[instrument(skip(state, payload))]
pub async fn test_mail(
    State(state): State<AppState>,
    Json(payload): Json<TestMailRequest>,
) -> ApiResult<Json<Value>> {
    let mut body = "This is a test e-mail directed to only students of the school.".to_string();
    if let Some(session_title) = payload.session_title.as_deref() {
        body.push_str(&format!("\nSession: {}", session_title));
    }

    state
        .mailer
        .send(OutgoingMail {
            to: state.config.test_mail_recipient.clone(),
            subject: "Email Title".to_string(),
            body,
        })
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!("success")))
}

/// Pass-through to the quote upstream. Upstream failure is reported in the
/// body with a 200, matching the consumer's existing contract.
#[instrument(skip(state))]
pub async fn zen_quote(State(state): State<AppState>) -> Json<Value> {
    match state.quotes.random().await {
        Ok(quote) => Json(json!({
            "success": true,
            "quote": quote,
        })),
        Err(e) => {
            warn!(error = %e, "quote fetch failed");
            Json(json!({
                "success": false,
                "message": "Failed to fetch quote from external API",
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zen_quote_returns_fake_quote() {
        let state = AppState::fake();
        let Json(body) = zen_quote(State(state)).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["quote"]["text"], "Do the thing.");
        assert_eq!(body["quote"]["author"], "Anon");
    }

    #[tokio::test]
    async fn test_mail_reports_success() {
        let state = AppState::fake();
        let result = test_mail(
            State(state),
            Json(TestMailRequest {
                session_title: Some("Algebra II".into()),
            }),
        )
        .await;
        let Json(body) = result.expect("mail should send");
        assert_eq!(body, json!("success"));
    }
}
