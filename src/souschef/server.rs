// SPDX-License-Identifier: MIT

//! Chat HTTP server
//!
//! `POST /chat` runs the workflow on a message and returns the rendered
//! artifact; `POST /chat/stream` streams step progress over SSE while the
//! run executes. Fatal run outcomes reach the client only as a structured
//! error flag plus a non-sensitive message.

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::flow::{RunError, RunEvent};
use crate::souschef::workflow::{RecipeWorkflow, WorkflowParams};

pub struct AppState {
    pub workflow: Arc<RecipeWorkflow>,
    pub default_params: WorkflowParams,
}

pub async fn serve(
    port: u16,
    workflow: Arc<RecipeWorkflow>,
    default_params: WorkflowParams,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = Arc::new(AppState {
        workflow,
        default_params,
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Deserialize)]
struct ChatMessage {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    error: bool,
}

async fn health() -> Json<Value> {
    // The workflow graph is validated before the server starts, so a
    // running server is always ready
    Json(json!({ "status": "healthy", "workflow_ready": true }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatMessage>,
) -> Json<ChatResponse> {
    match state
        .workflow
        .run(&payload.message, &state.default_params)
        .await
    {
        Ok(response) => Json(ChatResponse {
            response,
            error: false,
        }),
        Err(err) => {
            log::error!("workflow run failed: {}", err);
            Json(ChatResponse {
                response: user_message(&err),
                error: true,
            })
        }
    }
}

async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatMessage>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<RunEvent>(100);

    tokio::spawn(async move {
        log::info!("starting streaming run");
        if let Err(err) = state
            .workflow
            .run_with_events(&payload.message, &state.default_params, tx)
            .await
        {
            // The executor already emitted a Failed event; nothing else to
            // send, but keep the detail in the logs
            log::error!("streaming workflow run failed: {}", err);
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default()))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new().interval(std::time::Duration::from_secs(1)),
    )
}

/// Map a fatal run outcome to a user-safe message. Internal detail stays
/// in the logs.
fn user_message(err: &RunError) -> String {
    match err {
        RunError::LoopLimitExceeded { .. } => {
            "I couldn't settle on a recipe that meets your goal after several attempts. \
             Please try rephrasing your request or adjusting your goal."
                .to_string()
        }
        RunError::Cancelled { .. } => {
            "Your request took too long to process. Please try again.".to_string()
        }
        _ => "Sorry, something went wrong while preparing your recipe. Please try again."
            .to_string(),
    }
}
