//! Frame payment server entrypoint.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/farcaster/frames/jar/{id}/contribute` | Contribution entry frame |
//! | `POST` | `/farcaster/frames/jar/{id}/contribute/token` | Token selection |
//! | `POST` | `/farcaster/frames/jar/{id}/contribute/amount` | Amount selection |
//! | `POST` | `/farcaster/frames/jar/{id}/contribute/confirm` | Confirmation and TX calls |
//! | `POST` | `/farcaster/frames/jar/{id}/contribute/comment` | Post-payment comment |
//! | `POST` | `/farcaster/frames/pay/{id}/command` | One-shot pay command |
//! | `POST` | `/farcaster/frames/pay/{id}/frame/confirm` | Command payment confirmation |
//! | `POST` | `/farcaster/frames/pay/{id}/frame/comment` | Command payment comment |
//! | `GET` | `/health` | Health check |
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: `0.0.0.0`)
//! - `PORT` - Server port (default: `8080`)
//! - `API_URL` - Base URL of the image generation service
//! - `DAPP_URL` - Base URL of the user-facing app
//! - `FRAMES_URL` - Public base URL of this service
//! - `HUB_API_URL` / `HUB_API_KEY` - Hub message validation endpoint
//! - `XMTP_VALIDATION_URL` - Xmtp message validation endpoint
//! - `BACKEND_API_URL` - Identity, jar, price, and notification APIs
//! - `HTTP_TIMEOUT_MS` - Outbound call timeout (default: 2500)
//! - `CUSTOM_AMOUNT_SUFFIXES` - Allow `k`/`m` amount suffixes on commands
//! - `FRAMEPAY_CORS_ALLOWED_ORIGINS` - comma-separated CORS allowlist, or `*`
//! - `RUST_LOG` - tracing filter (default: `info`)

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use framepay_flow::handlers::{self, AppState};
use framepay_flow::{FlowEngine, FrameConfig};
use framepay_ledger::{InMemoryPaymentStore, PaymentLedger};
use framepay_validator::{HubVerifier, ProtocolVerifier, XmtpVerifier};

use crate::config::Config;
use crate::remote::{BackendDirectory, BackendNotifier, BackendPriceOracle};

fn build_cors_layer(raw: &str) -> Result<cors::CorsLayer, io::Error> {
    let base = cors::CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(cors::Any);

    if raw.trim() == "*" {
        return Ok(base.allow_origin(cors::Any));
    }

    let origins: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid FRAMEPAY_CORS_ALLOWED_ORIGINS: {e}"),
            )
        })?;

    if origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "FRAMEPAY_CORS_ALLOWED_ORIGINS is empty",
        ));
    }

    Ok(base.allow_origin(origins))
}

/// Cancels the returned token on SIGINT or SIGTERM.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(sigterm) => sigterm,
                Err(error) => {
                    tracing::error!(%error, "Failed to install SIGTERM handler");
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        tracing::info!("Shutdown signal received");
        trigger.cancel();
    });
    token
}

/// Initializes and runs the frame payment server.
///
/// - Loads `.env` variables and the environment configuration.
/// - Wires the hub and xmtp verifiers, the in-memory ledger, and the
///   reqwest-backed collaborators into the flow engine.
/// - Serves the frame routes until a shutdown signal arrives.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let hub = HubVerifier::new(config.hub_api_url.clone(), config.hub_api_key.clone())
        .with_timeout(config.http_timeout);
    let xmtp =
        XmtpVerifier::new(config.xmtp_validation_url.clone()).with_timeout(config.http_timeout);
    let verifier = ProtocolVerifier::new(Arc::new(hub), Arc::new(xmtp));

    let ledger = PaymentLedger::new(Arc::new(InMemoryPaymentStore::new()));
    let directory = Arc::new(BackendDirectory::new(
        config.backend_api_url.clone(),
        config.http_timeout,
    ));
    let engine = FlowEngine::new(
        ledger,
        directory.clone(),
        directory,
        Arc::new(BackendPriceOracle::new(
            config.backend_api_url.clone(),
            config.http_timeout,
        )),
        Arc::new(BackendNotifier::new(
            config.backend_api_url.clone(),
            config.http_timeout,
        )),
        FrameConfig {
            api_url: config.api_url.clone(),
            dapp_url: config.dapp_url.clone(),
            frames_url: config.frames_url.clone(),
            custom_amount_suffixes: config.custom_amount_suffixes,
        },
    );

    let state = AppState {
        engine: Arc::new(engine),
        verifier: Arc::new(verifier),
    };
    let router = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config.cors_allowed_origins)?);

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let token = shutdown_token();
    let graceful_shutdown = async move { token.cancelled().await };
    axum::serve(listener, router)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}
