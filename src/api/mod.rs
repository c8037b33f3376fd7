//! Admin REST API: broadcast triggers, session counts and lifecycle.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. With the `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the admin API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "ws-multicast admin API"),
    paths(
        handlers::system::health_handler,
        handlers::broadcast::broadcast_frame,
        handlers::broadcast::close_all,
        handlers::server::list_sessions,
        handlers::server::start_server,
        handlers::server::stop_server,
    ),
    tags(
        (name = "System", description = "Health"),
        (name = "Broadcast", description = "Frame multicast to every handshaked client"),
        (name = "Server", description = "Sessions and lifecycle"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::api::dto::{BroadcastResponse, LifecycleResponse, SessionsResponse};
    use crate::server::WsServer;
    use crate::session::Outbound;

    fn app(server: &Arc<WsServer>) -> Router {
        build_router().with_state(AppState {
            server: Arc::clone(server),
        })
    }

    async fn call(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let Ok(request) = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
        else {
            panic!("invalid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        (status, bytes.to_vec())
    }

    fn started() -> Arc<WsServer> {
        let server = Arc::new(WsServer::default());
        server.start();
        server
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, _) = call(app(&started()), "GET", "/health", "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn broadcast_text_reaches_session() {
        let server = started();
        let Ok((session, mut rx)) = server.create_session() else {
            panic!("session creation failed");
        };
        session.mark_handshaked();

        let (status, body) = call(
            app(&server),
            "POST",
            "/api/v1/broadcast/text",
            r#"{"payload":"hi"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let Ok(resp) = serde_json::from_slice::<BroadcastResponse>(&body) else {
            panic!("bad response body");
        };
        assert_eq!(resp.opcode, "text");
        assert_eq!(resp.delivered, 1);
        assert!(matches!(rx.try_recv(), Ok(Outbound::Frame(f)) if f[..] == [0x81, 0x02, b'h', b'i']));
    }

    #[tokio::test]
    async fn unknown_kind_is_bad_request() {
        let (status, _) = call(
            app(&started()),
            "POST",
            "/api/v1/broadcast/fragment",
            r#"{"payload":"x"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stopped_server_returns_503() {
        let server = Arc::new(WsServer::default());
        let (status, _) = call(app(&server), "POST", "/api/v1/broadcast/ping", "{}").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = call(app(&server), "POST", "/api/v1/close-all", "{}").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn oversized_ping_is_bad_request() {
        let server = started();
        let Ok((session, mut rx)) = server.create_session() else {
            panic!("session creation failed");
        };
        session.mark_handshaked();

        let body = format!(r#"{{"payload":"{}"}}"#, "p".repeat(126));
        let (status, _) = call(app(&server), "POST", "/api/v1/broadcast/ping", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn close_all_uses_requested_status() {
        let server = started();
        let Ok((session, mut rx)) = server.create_session() else {
            panic!("session creation failed");
        };
        session.mark_handshaked();

        let (status, _) = call(app(&server), "POST", "/api/v1/close-all", r#"{"status":1001}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(matches!(rx.try_recv(), Ok(Outbound::Frame(f)) if f[..] == [0x88, 0x02, 0x03, 0xE9]));
        assert!(matches!(rx.try_recv(), Ok(Outbound::Disconnect)));
    }

    #[tokio::test]
    async fn lifecycle_and_sessions() {
        let server = Arc::new(WsServer::default());

        let (_, body) = call(app(&server), "POST", "/api/v1/server/start", "").await;
        let Ok(resp) = serde_json::from_slice::<LifecycleResponse>(&body) else {
            panic!("bad response body");
        };
        assert!(resp.accepting && resp.changed);

        let Ok((session, _rx)) = server.create_session() else {
            panic!("session creation failed");
        };
        let (_, body) = call(app(&server), "GET", "/api/v1/sessions", "").await;
        let Ok(resp) = serde_json::from_slice::<SessionsResponse>(&body) else {
            panic!("bad response body");
        };
        assert_eq!((resp.total, resp.handshaked, resp.accepting), (1, 0, true));
        assert_eq!(resp.sessions.len(), 1);
        assert_eq!(resp.sessions[0].id, session.id());
        assert_eq!(resp.sessions[0].connected_at, session.connected_at());
        assert!(!resp.sessions[0].handshaked);

        let (_, body) = call(app(&server), "POST", "/api/v1/server/stop", "").await;
        let Ok(resp) = serde_json::from_slice::<LifecycleResponse>(&body) else {
            panic!("bad response body");
        };
        assert!(!resp.accepting && resp.changed);
        assert_eq!(server.session_count(), 0);
    }

    #[test]
    fn openapi_lists_broadcast_path() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/broadcast/{kind}"));
        assert!(doc.paths.paths.contains_key("/api/v1/close-all"));
    }
}
