use crate::{
    error::AppError,
    hubspot::IntegrationItem,
    oauth::{AuthorizeResponse, CallbackQuery},
    server::Server,
};
use axum::{
    Router,
    extract::{Query, State},
    response::{Html, Json},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;

/// Identifies the user/org pair a flow belongs to.
#[derive(Debug, Deserialize)]
pub struct UserOrgRequest {
    pub user_id: String,
    pub org_id: String,
}

/// Returned to the OAuth popup; its only job is to close the window so
/// the opener can continue.
const CLOSE_WINDOW_PAGE: &str = r#"<html>
    <script>
        window.close();
    </script>
</html>
"#;

pub fn create_integration_routes() -> Router<Server> {
    Router::new()
        .route("/hubspot/authorize", post(authorize_handler))
        .route("/hubspot/oauth2callback", get(callback_handler))
        .route("/hubspot/credentials", post(credentials_handler))
        .route("/hubspot/items", post(items_handler))
}

async fn authorize_handler(
    State(server): State<Server>,
    Json(request): Json<UserOrgRequest>,
) -> Result<Json<AuthorizeResponse>, AppError> {
    let response = server
        .oauth
        .authorization_url(&request.user_id, &request.org_id)
        .await?;
    Ok(Json(response))
}

async fn callback_handler(
    State(server): State<Server>,
    Query(params): Query<CallbackQuery>,
) -> Result<Html<&'static str>, AppError> {
    server.oauth.handle_callback(&params).await?;
    Ok(Html(CLOSE_WINDOW_PAGE))
}

async fn credentials_handler(
    State(server): State<Server>,
    Json(request): Json<UserOrgRequest>,
) -> Result<Json<Value>, AppError> {
    let credentials = server
        .oauth
        .fetch_and_consume_credentials(&request.user_id, &request.org_id)
        .await?;
    Ok(Json(credentials))
}

async fn items_handler(
    State(server): State<Server>,
    Json(credentials): Json<Value>,
) -> Result<Json<Vec<IntegrationItem>>, AppError> {
    let items = server.hubspot.list_contacts(&credentials).await?;
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestServerBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_authorize_handler_returns_url() {
        let server = TestServerBuilder::new().build().await;
        let app = create_integration_routes().with_state(server);

        let request = Request::builder()
            .method("POST")
            .uri("/hubspot/authorize")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"user_id": "alice", "org_id": "acme"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(
            json["authorization_url"]
                .as_str()
                .unwrap()
                .starts_with("https://app.hubspot.com/oauth/authorize")
        );
    }

    #[tokio::test]
    async fn test_callback_handler_rejects_provider_error() {
        let server = TestServerBuilder::new().build().await;
        let app = create_integration_routes().with_state(server);

        let request = Request::builder()
            .uri("/hubspot/oauth2callback?error=access_denied&error_description=nope")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_credentials_handler_without_stored_credentials() {
        let server = TestServerBuilder::new().build().await;
        let app = create_integration_routes().with_state(server);

        let request = Request::builder()
            .method("POST")
            .uri("/hubspot/credentials")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"user_id": "alice", "org_id": "acme"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "No credentials found");
    }
}
