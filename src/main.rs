// src/main.rs

use battle_quiz::config::Config;
use battle_quiz::models::catalog::Catalog;
use battle_quiz::routes;
use battle_quiz::state::AppState;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Load the question catalog
    let catalog = Catalog::from_path(&config.catalog_path).expect("Failed to load quiz catalog");
    if catalog.concepts.len() < config.quiz_shape.concepts {
        tracing::warn!(
            "Catalog has {} concepts but each quiz draws {}; quiz generation will fail",
            catalog.concepts.len(),
            config.quiz_shape.concepts
        );
    }

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .expect("BIND_ADDR must be a socket address");

    // Create AppState
    let state = AppState::new(config, catalog);

    // Evict finished and idle sessions in the background
    state.sessions.spawn_sweeper(state.config.session_retention);

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
