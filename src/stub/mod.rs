//! In-process backend serving the same REST surface the console consumes.
//!
//! Backs the integration tests and local demos; state lives in memory and
//! is lost on shutdown.

pub mod handlers;
pub mod seed;
pub mod store;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;

// Re-export key types
pub use store::{ErrorResponse, Store, StubError};

/// Shared state of every handler.
pub struct AppState {
    pub store: RwLock<Store>,
}

impl AppState {
    pub fn new(store: Store) -> Arc<Self> {
        Arc::new(Self {
            store: RwLock::new(store),
        })
    }
}

/// Every endpoint, nested under `/api`.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/rules", get(handlers::list_rules).post(handlers::create_rule))
        .route("/rules/execute", post(handlers::execute_rules))
        .route("/rules/:id", put(handlers::update_rule).delete(handlers::delete_rule))
        .route("/rules/:id/toggle", patch(handlers::toggle_rule))
        .route("/parametricas/vigentes", get(handlers::vigentes))
        .route("/parametricas/evaluar", post(handlers::evaluate))
        .route("/parametricas/catalogo-completo", get(handlers::catalog))
        .route("/parametricas/health", get(handlers::health))
        .route("/uit/vigente", get(handlers::uit_vigente))
        .route(
            "/:entity",
            get(handlers::list_entities).post(handlers::create_entity),
        )
        .route(
            "/:entity/:id",
            get(handlers::get_entity)
                .put(handlers::update_entity)
                .delete(handlers::delete_entity),
        );

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `store` on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, store: Store) -> std::io::Result<()> {
    let app = router(AppState::new(store));
    axum::serve(listener, app).await
}

/// Bind `addr` and serve in the background. Port 0 picks a free port;
/// the returned address is the one actually bound.
pub async fn spawn(addr: SocketAddr, store: Store) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!("Stub backend listening on {}", local);

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, store).await {
            tracing::error!("Stub backend stopped: {}", e);
        }
    });
    Ok((local, handle))
}
