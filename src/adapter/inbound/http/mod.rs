//! HTTP surface: event webhook, admin drop and health probe.
//!
//! | Method | Path               | Behavior                                   |
//! |--------|--------------------|--------------------------------------------|
//! | GET    | `/api/orders/drop` | Drop the destination collection            |
//! | POST   | `/api/events`      | Event Grid delivery or validation handshake |
//! | GET    | `/health`          | `ok`                                       |

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::domain::event::parse_events;
use crate::error::Result;
use crate::port::OrderOperator;

type Operator = Arc<dyn OrderOperator>;

/// Build the application router.
pub fn build_router(operator: Operator) -> Router {
    Router::new()
        .route("/api/orders/drop", get(drop_orders))
        .route("/api/events", post(receive_events))
        .route("/health", get(health))
        .with_state(operator)
}

/// Serve `operator` on `listen` until `shutdown` resolves.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve<F>(listen: &str, operator: Operator, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(listen).await?;
    serve_on(listener, operator, shutdown).await
}

/// Serve on an already bound listener.
///
/// After `shutdown` resolves and open requests complete, waits for every
/// ingestion the webhook dispatched so their sessions are closed before
/// returning.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn serve_on<F>(listener: TcpListener, operator: Operator, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "HTTP server listening");
    let served = axum::serve(listener, build_router(Arc::clone(&operator)))
        .with_graceful_shutdown(shutdown)
        .await;
    operator.drain().await;
    served?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn drop_orders(State(operator): State<Operator>) -> Response {
    let response = operator.drop_orders().await;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, response.body).into_response()
}

async fn receive_events(State(operator): State<Operator>, body: Bytes) -> Response {
    let events = match parse_events(&body) {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "Rejected malformed event payload");
            return (StatusCode::BAD_REQUEST, format!("Invalid event payload: {e}")).into_response();
        }
    };

    if let Some(code) = events.iter().find_map(|event| event.validation_code()) {
        info!("Answering subscription validation handshake");
        return Json(json!({ "validationResponse": code })).into_response();
    }

    debug!(events = events.len(), "Dispatching events");
    for event in events {
        // the sender does not wait for ingestion; outcomes surface in logs
        operator.dispatch(event);
    }
    StatusCode::ACCEPTED.into_response()
}
