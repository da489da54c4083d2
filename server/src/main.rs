//! Hotel API server.
//!
//! Run from repo root: `cargo run -p server`

use hotel_api::{
    app, connect, init_tracing, layered, load_env_files, ready_routes, AppState, Controller, CrudService,
    Employee, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Env files first so RUST_LOG from them reaches the filter.
    let env_files = load_env_files();
    init_tracing();
    for path in env_files? {
        tracing::debug!(path = %path.display(), "loaded env file");
    }

    let settings = Settings::from_env()?;
    tracing::info!(env = settings.env.as_str(), "starting hotel api");
    let pool = connect(&settings).await?;

    let employees = Arc::new(Controller::<Employee>::new(Arc::new(CrudService::<Employee>::new(
        pool.clone(),
    ))));
    let router = app(employees).merge(ready_routes(AppState { pool: pool.clone() }));
    let router = layered(router, &settings);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
