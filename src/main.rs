mod config;
mod conversation;
mod encoder;
mod errors;
mod gateway_client;
mod handlers;
mod models;
mod predictor;
mod session;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::gateway_client::GroqClient;
use crate::predictor::ChurnModel;
use crate::session::SessionStore;

/// Serves the dashboard shell page.
///
/// The page is a thin static shell: the form and chat panels talk to the
/// JSON API, and all rendering beyond this skeleton belongs to the browser.
async fn serve_dashboard() -> impl IntoResponse {
    let html = r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ClientInsight Pro</title>
    <link rel="stylesheet" href="/assets/style.css">
</head>
<body>
    <h1>Client<span class="accent">Insight Pro</span></h1>
    <p class="tagline">Votre portail intelligent pour l'analyse prédictive et l'assistance client.</p>
    <nav>
        <button data-panel="prediction">Prédiction de Désabonnement</button>
        <button data-panel="chat">Chatbot d'Assistance</button>
    </nav>
    <section id="prediction" class="panel">
        <h3>Outil de Prédiction Client</h3>
        <form id="prediction-form"></form>
        <div id="prediction-result"></div>
    </section>
    <section id="chat" class="panel">
        <h3>Assistant Virtuel</h3>
        <div id="chat-log"></div>
        <form id="chat-form"></form>
    </section>
    <footer>
        <p class="app-footer">Conçu avec passion pour l'excellence de l'expérience client | © 2024 VotreEntreprise</p>
    </footer>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Main entry point for the application.
///
/// Initialization order matters: logging first, then configuration, then
/// the startup-fatal assets (stylesheet, model artifact), then state and
/// the HTTP server. Any failure before the server starts aborts the whole
/// application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churn_insight_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (missing API credential is fatal here)
    let config = Config::from_env()?;

    // Stylesheet is a startup-fatal asset
    let stylesheet = std::fs::read_to_string(&config.stylesheet_path).map_err(|e| {
        anyhow::anyhow!(
            "stylesheet '{}' is missing or unreadable: {}",
            config.stylesheet_path,
            e
        )
    })?;
    tracing::info!("Stylesheet loaded from {}", config.stylesheet_path);

    // Model artifact is loaded once and lives for the process lifetime
    let model = Arc::new(ChurnModel::load(&config.model_path)?);

    // Transcription/completion gateway client
    let gateway = GroqClient::new(&config)
        .map_err(|e| anyhow::anyhow!("failed to initialize gateway client: {}", e))?;
    tracing::info!("Gateway client initialized: {}", config.groq_base_url);

    // Per-user session store (30 min idle TTL)
    let sessions = SessionStore::new();
    tracing::info!("Session store initialized");

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        model,
        gateway,
        sessions,
        stylesheet,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/sessions", post(handlers::create_session))
        .route("/api/v1/sessions/:id", get(handlers::get_session))
        .route("/api/v1/sessions/:id/predict", post(handlers::predict))
        .route(
            "/api/v1/sessions/:id/prediction",
            delete(handlers::clear_prediction),
        )
        .route(
            "/api/v1/sessions/:id/chat/message",
            post(handlers::chat_message),
        )
        .route(
            "/api/v1/sessions/:id/chat/recording",
            post(handlers::chat_recording),
        )
        .route("/api/v1/sessions/:id/chat", delete(handlers::clear_chat))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload (audio blobs included)
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check and static assets outside the limiter
    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(serve_dashboard))
        .route("/assets/style.css", get(handlers::serve_stylesheet))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
