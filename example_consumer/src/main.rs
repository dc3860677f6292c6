//! Example consumer: a todo service using docrest's generated routes plus two hand-written ones.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Needs `DATABASE_URI` and `DATABASE_NAME` (a `.env` file works); `DATABASE_URI=memory://`
//! runs without a database server.

use axum::extract::{Path, State};
use axum::routing::{delete, put};
use docrest::{
    common_routes, connect, load_database_settings, load_server_settings, register_crud_routes, AppError,
    AppState, DocumentId, DocumentService, Model,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Todo {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<DocumentId>,
    title: String,
    completed: bool,
}

impl Model for Todo {
    const NAME: &'static str = "models.Todo";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docrest=info,example_consumer=info")),
        )
        .init();

    let db = load_database_settings(false)?;
    let server = load_server_settings()?;
    let store = connect(&db).await?;
    let state = AppState::new(store);

    let app = register_crud_routes::<Todo>("/todo", state.clone())
        .route("/:id/customDeleteTodo", delete(custom_delete))
        .route("/:id/markComplete", put(mark_complete))
        .mount(common_routes(state))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(server.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}

/// Uses the generic delete directly; a real service would check dependents first.
async fn custom_delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<&'static str, AppError> {
    DocumentService::delete::<Todo>(state.store(), &id).await?;
    Ok("Todo deleted.")
}

async fn mark_complete(State(state): State<AppState>, Path(id): Path<String>) -> Result<&'static str, AppError> {
    let mut todo: Todo = DocumentService::read_one(state.store(), &id).await?;
    todo.completed = true;
    DocumentService::replace_one(state.store(), &todo, &id).await?;
    Ok("Marked complete!")
}
