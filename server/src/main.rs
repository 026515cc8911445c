use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod errors;
mod keepalive;
mod leads;
mod oauth;
mod routes;
mod state;

use state::AppState;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Create and run the tokio runtime
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?
        .block_on(async { run_application().await })
}

async fn run_application() -> color_eyre::Result<()> {
    setup_tracing();

    // Initialize application state
    let app_state = AppState::from_env()?;
    if app_state.tokens.current().is_some() {
        info!("Lawmatics relay starting with an existing token record");
    } else {
        info!("Lawmatics relay starting unauthorized, connect via /auth");
    }

    // One shutdown signal shared by the server and the keep-alive loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    // Spawn application tasks
    info!("Spawning application tasks");
    let futures = spawn_application_tasks(app_state, shutdown_rx)?;

    // Wait for all tasks to complete
    for result in futures::future::try_join_all(futures).await? {
        result?;
    }

    Ok(())
}

/// Spawn all application background tasks
fn spawn_application_tasks(
    app_state: AppState,
    shutdown_rx: watch::Receiver<bool>,
) -> color_eyre::Result<Vec<tokio::task::JoinHandle<color_eyre::Result<()>>>> {
    let mut futures = vec![];

    if is_feature_enabled("SERVER") {
        info!("Server Enabled");
        futures.push(tokio::spawn(run_server(
            app_state.clone(),
            shutdown_rx.clone(),
        )));
    } else {
        info!("Server Disabled");
    }

    // Initialize keep-alive worker if enabled
    if is_feature_enabled("KEEP_ALIVE") {
        info!("Keep-alive Enabled");
        futures.push(tokio::spawn(keepalive::run_keep_alive(
            app_state,
            shutdown_rx,
        )));
    } else {
        info!("Keep-alive Disabled");
    }

    info!("All application tasks spawned successfully");
    Ok(futures)
}

async fn run_server(
    app_state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> color_eyre::Result<()> {
    let addr = format!("0.0.0.0:{}", app_state.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, routes::routes(app_state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Check if a feature is enabled based on environment variables
fn is_feature_enabled(feature: &str) -> bool {
    std::env::var(format!("{}_DISABLED", feature)).unwrap_or_else(|_| "false".to_string()) != "true"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn feature_is_enabled_unless_explicitly_disabled() {
        env::remove_var("RELAY_TEST_FEATURE_DISABLED");
        assert!(is_feature_enabled("RELAY_TEST_FEATURE"));

        env::set_var("RELAY_TEST_FEATURE_DISABLED", "true");
        assert!(!is_feature_enabled("RELAY_TEST_FEATURE"));

        // Anything other than the exact string "true" keeps the feature on
        env::set_var("RELAY_TEST_FEATURE_DISABLED", "yes");
        assert!(is_feature_enabled("RELAY_TEST_FEATURE"));

        env::remove_var("RELAY_TEST_FEATURE_DISABLED");
    }
}
