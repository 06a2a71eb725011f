//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_room, debug_room_state, get_room_by_join_code, get_room_detail, get_rooms,
        health_check, websocket_handler,
    },
    reconciler::spawn_reconciler,
    signal::shutdown_signal,
    state::AppState,
};

/// Watch-together sync server
///
/// # Example
///
/// ```ignore
/// let state = AppState::in_memory(&config, Arc::new(SystemClock));
/// let server = Server::new(state, config.reconcile_interval);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    reconcile_interval: Duration,
}

impl Server {
    pub fn new(state: AppState, reconcile_interval: Duration) -> Self {
        Self {
            state: Arc::new(state),
            reconcile_interval,
        }
    }

    /// Build the HTTP / WebSocket routes
    pub fn router(state: Arc<AppState>) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms).post(create_room))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/rooms/code/{join_code}", get(get_room_by_join_code))
            .route("/debug/rooms/{room_id}", get(debug_room_state))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the server until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Sync server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// The reconciliation loop runs for as long as the server does.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let reconciler = spawn_reconciler(
            self.state.reconcile_playback_usecase.clone(),
            self.reconcile_interval,
        );

        let app = Self::router(self.state);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        reconciler.abort();
        tracing::info!("Server shutdown complete");
        result.map_err(Into::into)
    }
}
