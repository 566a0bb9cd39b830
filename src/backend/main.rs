/**
 * PairSync Server Entry Point
 *
 * Loads `.env`, reads the server configuration, installs tracing and serves
 * the Axum app.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use pairsync::backend::server::{create_app, ServerConfig};
    use tracing_subscriber::EnvFilter;

    dotenv::dotenv().ok();

    let config = ServerConfig::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("[STARTUP] Server initialization started");

    let app = create_app(&config).await;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("[STARTUP] Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin pairsync-server --features ssr");
    std::process::exit(1);
}
