//! HTTP API server.
//!
//! Every route lives under `/api`. Errors are rendered as
//! `{ "code", "message", "field" }` bodies by [`crate::error::ApiError`].

mod extract;
mod handlers;

pub use extract::{ApiJson, ApiQuery, CurrentUser};

use crate::board::Board;
use axum::Router;
use axum::routing::{delete, get, patch, post};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the router with all routes.
pub fn build_router(board: Board) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        // Auth
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        // Users and topic grants
        .route("/api/me", get(handlers::me))
        .route("/api/users", get(handlers::list_users))
        .route("/api/users/{user_id}", patch(handlers::set_user_role))
        .route(
            "/api/users/{user_id}/topics",
            get(handlers::user_topics)
                .post(handlers::add_user_topic)
                .delete(handlers::remove_user_topic),
        )
        .route("/api/catalog", get(handlers::catalog))
        // Domains
        .route(
            "/api/domains",
            get(handlers::list_domains).post(handlers::create_domain),
        )
        .route("/api/domains/{domain_id}", delete(handlers::delete_domain))
        // Parent tasks
        .route(
            "/api/parent-tasks",
            get(handlers::list_parent_tasks).post(handlers::create_parent_task),
        )
        .route(
            "/api/parent-tasks/{parent_id}",
            get(handlers::get_parent_task)
                .patch(handlers::update_parent_task)
                .delete(handlers::delete_parent_task),
        )
        .route(
            "/api/parent-tasks/{parent_id}/comments",
            get(handlers::parent_task_messages).post(handlers::post_parent_task_message),
        )
        // Tasks
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/api/tasks/my", get(handlers::my_tasks))
        .route("/api/board", get(handlers::board_columns))
        .route(
            "/api/tasks/{task_id}",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route(
            "/api/tasks/{task_id}/comments",
            get(handlers::task_messages).post(handlers::post_task_message),
        )
        .route(
            "/api/tasks/{task_id}/collaborators",
            get(handlers::list_collaborators).post(handlers::add_collaborator),
        )
        .route(
            "/api/tasks/{task_id}/collaborators/{user_id}",
            delete(handlers::remove_collaborator),
        )
        // Pins
        .route(
            "/api/pinned-tasks",
            get(handlers::pinned_tasks).post(handlers::pin_task),
        )
        .route("/api/pinned-tasks/{task_id}", delete(handlers::unpin_task))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(board)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(board: Board, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(board);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task board listening on http://{}", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Task board shutting down");
        })
        .await?;
    Ok(())
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
