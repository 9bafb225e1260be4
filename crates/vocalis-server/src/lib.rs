mod cors;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tts::EngineLoader;
use vocalis_config::Config;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration and load the default model
    ///
    /// A default model that fails to load is logged, and the server starts
    /// without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the synthesis pipeline cannot be initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let synthesis = tts::build_server(&config)?;
        Ok(Self::assemble(&config, synthesis).await)
    }

    /// Build the server around a custom engine loader
    ///
    /// # Errors
    ///
    /// Returns an error if the synthesis pipeline cannot be initialized
    pub async fn with_loader(config: Config, loader: Arc<dyn EngineLoader>) -> anyhow::Result<Self> {
        let synthesis = tts::build_server_with_loader(&config, loader)?;
        Ok(Self::assemble(&config, synthesis).await)
    }

    async fn assemble(config: &Config, synthesis: Arc<tts::Server>) -> Self {
        let listen_address = config.server.listen_address();

        tts::load_initial_model(&synthesis, config.models.default_model.as_deref()).await;

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.merge(tts::endpoint_router().with_state(synthesis));

        app = app.layer(TraceLayer::new_for_http());

        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Self {
            router: app,
            listen_address,
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use vocalis_config::{AnyOrList, CorsConfig};

    use super::*;

    fn offline_config(temp_dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.models.default_model = None;
        config.models.list_args = Vec::new();
        config.storage.temp_dir = Some(temp_dir.to_path_buf());
        config
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_and_status_without_model() {
        let scratch = tempfile::tempdir().unwrap();
        let router = Server::new(offline_config(scratch.path())).await.unwrap().into_router();

        assert_eq!(get(router.clone(), "/health").await, (StatusCode::OK, "ok".to_string()));

        let (status, body) = get(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#""model":null"#), "{body}");
    }

    #[tokio::test]
    async fn health_route_can_be_moved_or_disabled() {
        let scratch = tempfile::tempdir().unwrap();

        let mut config = offline_config(scratch.path());
        config.server.health.path = "/livez".to_string();
        let router = Server::new(config).await.unwrap().into_router();
        assert_eq!(get(router.clone(), "/livez").await.0, StatusCode::OK);
        assert_eq!(get(router, "/health").await.0, StatusCode::NOT_FOUND);

        let mut config = offline_config(scratch.path());
        config.server.health.enabled = false;
        let router = Server::new(config).await.unwrap().into_router();
        assert_eq!(get(router, "/health").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_headers_are_applied() {
        let scratch = tempfile::tempdir().unwrap();

        let mut config = offline_config(scratch.path());
        config.server.cors = Some(CorsConfig {
            origins: AnyOrList::Any,
            ..CorsConfig::default()
        });
        let router = Server::new(config).await.unwrap().into_router();

        let response = router
            .oneshot(
                Request::get("/speakers")
                    .header(header::ORIGIN, "http://localhost:8080")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
