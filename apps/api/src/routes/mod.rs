pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::users::handlers as users;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/generate", post(generation::handle_generate))
        .route(
            "/api/users",
            get(users::handle_list_users).post(users::handle_create_user),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::generation::entitlement::QuotaPolicy;
    use crate::llm_client::LlmClient;
    use crate::users::store::InMemoryUserStore;

    fn app() -> Router {
        build_router(AppState {
            users: Arc::new(InMemoryUserStore::new()),
            llm: Arc::new(LlmClient::new(None, "http://127.0.0.1:9").unwrap()),
            quota: QuotaPolicy::default(),
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_user(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/users")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_and_list_users() {
        let app = app();

        let (status, body) = send(
            &app,
            post_user(json!({"email": "ada@example.com", "stripeCustomerId": "cus_ABC123"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["tier"], "free");
        assert_eq!(body["user"]["subscriptionStatus"], "active");
        assert_eq!(body["user"]["stripeCustomerId"], "cus_ABC123");

        let request = Request::builder().uri("/api/users").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_user_without_email_is_400() {
        let (status, body) = send(&app(), post_user(json!({"tier": "pro"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email is required");
    }

    #[tokio::test]
    async fn test_create_user_ignores_requested_tier() {
        let (status, body) = send(
            &app(),
            post_user(json!({"email": "eve@example.com", "tier": "pro"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["tier"], "free");
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_shape() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/users")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
