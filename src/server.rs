use crate::{
    cache::CacheManager,
    config::Config,
    error::AppError,
    health::HealthService,
    hubspot::HubSpotClient,
    oauth::OAuthFlows,
    routes::{create_health_routes, create_integration_routes},
};
use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub cache: CacheManager,
    pub oauth: Arc<OAuthFlows>,
    pub hubspot: Arc<HubSpotClient>,
    pub health: Arc<HealthService>,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let cache = CacheManager::new_from_config(&config.cache).await?;
        let oauth = Arc::new(OAuthFlows::new(config.clone(), cache.clone())?);
        let hubspot = Arc::new(HubSpotClient::new(config.hubspot.contacts_url.clone()));

        let health = Arc::new(HealthService::new());
        health.register(Arc::new(cache.clone())).await;

        Ok(Self {
            config,
            cache,
            oauth,
            hubspot,
            health,
        })
    }

    /// Creates the application router
    pub fn create_app(&self) -> Router {
        Router::new()
            .nest("/integrations", create_integration_routes())
            .nest("/health", create_health_routes())
            .with_state(self.clone())
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let app = self.create_app();

        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid listen address: {}", e)))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Graceful shutdown initiated");
            })
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestServerBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_server_creation() {
        let server = TestServerBuilder::new().build().await;
        assert_eq!(server.config.cache.backend, "memory");
    }

    #[tokio::test]
    async fn test_health_endpoint_is_routed() {
        let server = TestServerBuilder::new().build().await;
        let app = server.create_app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let server = TestServerBuilder::new().build().await;
        let app = server.create_app();

        let request = Request::builder()
            .uri("/integrations/other/items")
            .method("POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
