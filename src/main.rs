//! Timer Sync - shared countdown timers kept consistent across devices
//!
//! This is the main entry point for the timer-sync server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use timer_sync::{
    api::create_router,
    config::Config,
    replication::LoopbackBus,
    session::{SessionBackend, SessionRegistry},
    state::AppState,
    tasks::session_sweeper_task,
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_sync={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timer-sync server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, tick={}ms, correction={}ms",
        config.host, config.port, config.tick_ms, config.correction_ms
    );
    match &config.cache_dir {
        Some(dir) => info!("Caching snapshots in {}", dir.display()),
        None => info!("Caching snapshots in memory"),
    }

    let backend = SessionBackend {
        transport: Arc::new(LoopbackBus::new()),
        store: config.store(),
        clock: Arc::new(SystemClock),
        reconciler: config.reconciler(),
    };
    let state = Arc::new(AppState::new(
        SessionRegistry::new(backend),
        config.port,
        config.host.clone(),
    ));

    // Start idle session sweeper
    match config.idle_timeout() {
        Some(idle) => {
            let sweeper_state = Arc::clone(&state);
            tokio::spawn(async move {
                session_sweeper_task(sweeper_state, idle).await;
            });
        }
        None => info!("Idle session eviction disabled"),
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /sessions/:id                    - Session timers and connectivity");
    info!("  GET    /sessions/:id/events             - Snapshot stream (SSE)");
    info!("  POST   /sessions/:id/timers             - Add a timer");
    info!("  DELETE /sessions/:id/timers/:timer      - Remove a timer");
    info!("  PUT    /sessions/:id/timers/:timer/name - Rename a timer");
    info!("  POST   /sessions/:id/timers/:timer/toggle");
    info!("  POST   /sessions/:id/timers/:timer/reset");
    info!("  PUT    /sessions/:id/timers/:timer/time");
    info!("  POST   /sessions/:id/reset-all | /pause-all");
    info!("  GET    /health                          - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.registry.close_all();
    info!("Server shutdown complete");
    Ok(())
}
