use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use folio::engine::Engine;
use folio::http;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("FOLIO_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    folio::observability::init(metrics_port);

    let port = std::env::var("FOLIO_PORT").unwrap_or_else(|_| "8000".into());
    let bind = std::env::var("FOLIO_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let data_dir = std::env::var("FOLIO_DATA_DIR").unwrap_or_else(|_| "./data".into());

    // Ensure data directory exists before the stores open their files
    std::fs::create_dir_all(&data_dir)?;
    let engine = Arc::new(Engine::open(Path::new(&data_dir))?);
    let app = http::router(engine);

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("folio listening on {addr}");
    info!("  data_dir: {data_dir}");
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, drain in-flight requests
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("folio stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
