use sheet_cutter::api::{AppState, router};
use sheet_cutter::config::ServerConfig;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to open {}: {}", config.log_file, e);
            std::process::exit(1);
        });

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    // Flushes pending events on drop.
    let _sentry = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let app = router(AppState { pack: config.pack }).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: could not bind {addr}: {e}");
            std::process::exit(1);
        });
    tracing::info!(%addr, pack = ?config.pack, "listening");
    eprintln!("Listening on {addr}");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server stopped");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
