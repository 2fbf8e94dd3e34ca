//! Grok Q&A assistant API
//!
//! Manages linear question-and-answer chat sessions and forwards each
//! submitted question to the xAI (Grok) completion endpoint. Transcripts are
//! held in memory for the lifetime of a session; each connected user gets an
//! isolated session.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod gateway;
mod routes;
mod session;

use config::Config;
use gateway::{ResponseGateway, XaiClient, XaiConfig};
use session::manager::SessionManager;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ResponseGateway>,
    pub sessions: Arc<SessionManager>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grok_qa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing credentials fail here, before any session can start.
    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let mut xai = XaiConfig::new(config.xai_api_key.clone());
    if let Some(ref base_url) = config.xai_base_url {
        xai = xai.with_base_url(base_url.clone());
    }

    let gateway = Arc::new(ResponseGateway::new(
        Arc::new(XaiClient::new(xai)),
        config.model.clone(),
    ));

    let state = AppState {
        gateway,
        sessions: Arc::new(SessionManager::new()),
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Grok Q&A API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
