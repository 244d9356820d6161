//! The HTTP binding of the dispatcher.
//!
//! `GET` carries a query request and `POST` a command request, on both `/` and `/exec`. Responses
//! are always `200 OK` with a JSON envelope; success or failure is in the envelope.

use crate::dispatch::{Dispatcher, Envelope};
use crate::error::Res;
use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
struct QueryParams {
    action: Option<String>,
}

/// Builds the router. CORS is permissive so that a web app served from anywhere can call the API.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(handle_query).post(handle_command))
        .route("/exec", get(handle_query).post(handle_command))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(dispatcher)
}

async fn handle_query(
    State(dispatcher): State<Arc<Dispatcher>>,
    Query(params): Query<QueryParams>,
) -> Json<Envelope> {
    Json(dispatcher.query(params.action.as_deref()).await)
}

/// The body is taken as raw bytes whatever the content type: clients commonly post JSON as
/// `text/plain` to avoid a CORS preflight.
async fn handle_command(State(dispatcher): State<Arc<Dispatcher>>, body: Bytes) -> Json<Envelope> {
    Json(dispatcher.command(&String::from_utf8_lossy(&body)).await)
}

/// Serves the API on `addr` until the process receives Ctrl-C.
pub async fn serve(dispatcher: Arc<Dispatcher>, addr: &str) -> Res<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    let local = listener
        .local_addr()
        .context("Unable to get the listening address")?;
    info!("Listening on http://{local}");
    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("The HTTP server failed")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!("Unable to listen for Ctrl-C, the server must be killed to stop: {e}");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::config::SheetNames;
    use crate::workbook::Workbook;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> Router {
        let sheets = SheetNames::default();
        let store = MemoryStore::seeded(&sheets).unwrap();
        let dispatcher = Dispatcher::new(Workbook::new(Box::new(store), sheets));
        router(Arc::new(dispatcher))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_request(uri: &str, body: Value, content_type: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_without_action() {
        let (status, json) = send(app(), get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({"success": true, "message": "Mi Finanzas API v1.0"})
        );
    }

    #[tokio::test]
    async fn test_get_data_on_exec() {
        let (status, json) = send(app(), get_request("/exec?action=getData")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["tarjetas"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_action_is_still_ok() {
        let (status, json) = send(app(), get_request("/?action=nope")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"success": false, "error": "Acción no válida"}));
    }

    #[tokio::test]
    async fn test_post_as_text_plain() {
        let body = json!({
            "action": "addTarjeta",
            "item": {"id": "tj-003-1", "tarjeta": "Visa", "cuotasTotales": 1}
        });
        let (status, json) = send(app(), post_request("/exec", body, "text/plain")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"success": true, "row": 5}));
    }

    #[tokio::test]
    async fn test_post_sync_without_data() {
        let body = json!({"action": "sync"});
        let (status, json) = send(app(), post_request("/", body, "application/json")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"success": false, "error": "No data provided"}));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/exec")
            .header(header::ORIGIN, "https://finanzas.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_requests_share_state() {
        let app = app();
        let body = json!({"action": "addMovimiento", "item": {"id": "x"}});
        let (_, first) = send(
            app.clone(),
            post_request("/", body.clone(), "application/json"),
        )
        .await;
        let (_, second) = send(app, post_request("/", body, "application/json")).await;
        assert_eq!(first["row"], 7);
        assert_eq!(second["row"], 8);
    }
}
