//! HTTP surface of the frame flow.
//!
//! Every route follows the same pattern: parse the signature packet,
//! verify it (fail closed), run the step, convert the outcome. All
//! protocol responses are 200: frame hosts cannot display HTTP
//! errors, so even a malformed body renders the inert frame.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use framepay_validator::{FrameMessageVerifier, FrameSignaturePacket};

use crate::engine::{FlowEngine, StepOutcome};

/// Shared state of the frame routes.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FlowEngine>,
    pub verifier: Arc<dyn FrameMessageVerifier>,
}

/// Builds the frame flow router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/farcaster/frames/jar/{id}/contribute", post(contribute))
        .route("/farcaster/frames/jar/{id}/contribute/token", post(choose_token))
        .route("/farcaster/frames/jar/{id}/contribute/amount", post(choose_amount))
        .route("/farcaster/frames/jar/{id}/contribute/confirm", post(confirm))
        .route("/farcaster/frames/jar/{id}/contribute/comment", post(comment))
        .route("/farcaster/frames/pay/{id}/command", post(pay_command))
        .route("/farcaster/frames/pay/{id}/frame/confirm", post(pay_confirm))
        .route("/farcaster/frames/pay/{id}/frame/comment", post(pay_comment))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn contribute(State(state): State<AppState>, Path(id): Path<String>, body: Bytes) -> Response {
    let Some(jar_uuid) = parse_uuid(&id) else {
        return respond(StepOutcome::inert());
    };
    let action = verify(&state, &body).await;
    respond(state.engine.contribute(jar_uuid, &action).await)
}

async fn choose_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(jar_uuid) = parse_uuid(&id) else {
        return respond(StepOutcome::inert());
    };
    let action = verify(&state, &body).await;
    respond(state.engine.choose_token(jar_uuid, &action).await)
}

async fn choose_amount(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(jar_uuid) = parse_uuid(&id) else {
        return respond(StepOutcome::inert());
    };
    let action = verify(&state, &body).await;
    respond(state.engine.choose_amount(jar_uuid, &action).await)
}

async fn confirm(State(state): State<AppState>, Path(id): Path<String>, body: Bytes) -> Response {
    let Some(jar_uuid) = parse_uuid(&id) else {
        return respond(StepOutcome::inert());
    };
    let action = verify(&state, &body).await;
    respond(state.engine.confirm(jar_uuid, &action).await)
}

async fn comment(State(state): State<AppState>, Path(id): Path<String>, body: Bytes) -> Response {
    let Some(jar_uuid) = parse_uuid(&id) else {
        return respond(StepOutcome::inert());
    };
    let action = verify(&state, &body).await;
    respond(state.engine.comment(jar_uuid, &action).await)
}

async fn pay_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let action = verify(&state, &body).await;
    respond(state.engine.pay_command(&id, &action).await)
}

async fn pay_confirm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let action = verify(&state, &body).await;
    respond(state.engine.pay_confirm(&id, &action).await)
}

async fn pay_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let action = verify(&state, &body).await;
    respond(state.engine.pay_comment(&id, &action).await)
}

fn parse_uuid(raw: &str) -> Option<Uuid> {
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        tracing::debug!(%raw, "Rejected malformed jar uuid");
    }
    parsed
}

/// Parses and verifies a submission, failing closed on a bad body.
async fn verify(state: &AppState, body: &Bytes) -> framepay_types::ValidatedAction {
    match serde_json::from_slice::<FrameSignaturePacket>(body) {
        Ok(packet) => state.verifier.verify(&packet).await,
        Err(error) => {
            tracing::debug!(%error, "Rejected malformed signature packet");
            framepay_types::ValidatedAction::invalid()
        }
    }
}

fn respond(outcome: StepOutcome) -> Response {
    match outcome {
        StepOutcome::Frame(frame) => Html(frame.to_html()).into_response(),
        StepOutcome::Transactions(mut calls) => {
            // Frame hosts expect a single transaction object.
            if calls.len() == 1 {
                Json(calls.remove(0)).into_response()
            } else {
                Json(calls).into_response()
            }
        }
        StepOutcome::Message(message) => Json(message).into_response(),
    }
}
