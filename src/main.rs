mod config;
mod demo;
mod encode;
mod protocol;
mod publish;
mod render;
mod routes;
mod session;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let server = config::ServerConfig::from_env();
    let template = match config::SessionTemplate::from_env() {
        Ok(template) => template,
        Err(e) => {
            tracing::error!(error = %e, "invalid session configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(settings = ?template.settings, shared = server.shared_session, "session template loaded");

    let renderer: Arc<dyn render::Renderer> = Arc::new(demo::DemoRenderer::default());
    let state = state::AppState::new(renderer, template, server.shared_session);

    let app = routes::app(state);
    let port = server.port;
    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %port, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%port, "remote viewer listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
