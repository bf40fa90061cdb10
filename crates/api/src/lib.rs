//! Otto HTTP API
//!
//! Accepts structured tasks and free-form prompts over HTTP and runs them
//! through the same skill registry the CLI uses.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use otto_skill::{SkillContext, SkillRegistry};

mod handlers;

pub use handlers::{PromptRequest, TaskRequest, TaskResponse};

pub const SERVICE_NAME: &str = "Otto API";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SkillRegistry>,
    pub context: SkillContext,
}

impl AppState {
    pub fn new(registry: SkillRegistry, context: SkillContext) -> Self {
        Self {
            registry: Arc::new(registry),
            context,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/capabilities", get(handlers::capabilities))
        .route("/skills", get(handlers::list_skills))
        .route("/health/skills", get(handlers::skill_health))
        .route("/task", post(handlers::submit_task))
        .route("/prompt", post(handlers::submit_prompt))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 {} listening on http://{}", SERVICE_NAME, listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
