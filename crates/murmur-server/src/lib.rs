mod cors;
mod health;
mod probe;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use murmur_config::Config;
use murmur_core::extract::error_response;
use murmur_core::{ErrorKind, RetryPolicy, ServiceRegistry, Upstream};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub use probe::Prober;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    registry: Arc<ServiceRegistry>,
    prober: Prober,
    probe_interval: Option<std::time::Duration>,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete or a service
    /// fails to initialize
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();

        let api_key: SecretString = config
            .openai
            .api_key
            .clone()
            .context("an upstream API key is required")?;

        let client = murmur_core::build_http_client(config.openai.connect_timeout()?)
            .context("failed to build upstream HTTP client")?;

        let retry = RetryPolicy {
            max_retries: config.retry.max_retries,
            base_delay: config.retry.base_delay()?,
            max_delay: config.retry.max_delay()?,
            jitter: config.retry.jitter,
        };

        let registry = Arc::new(ServiceRegistry::new([stt::SERVICE_NAME, chat::SERVICE_NAME]));
        let upstream = Upstream::new(
            client,
            config.openai.base_url.clone(),
            api_key,
            retry,
            Arc::clone(&registry),
        );

        let stt_state = stt::build_server(&config, upstream.clone())?;
        let chat_state = chat::build_server(&config, upstream.clone())?;

        let prober = Prober::new(
            upstream,
            &[stt::SERVICE_NAME, chat::SERVICE_NAME],
            config.server.health.probe_timeout()?,
        );
        let health_state = health::HealthState {
            registry: Arc::clone(&registry),
            prober: prober.clone(),
        };

        let mut app = Router::new()
            .route("/health", get(health::health_handler))
            .route("/services", get(health::services_handler).with_state(health_state))
            .merge(stt::endpoint_router(stt_state.body_limit()).with_state(stt_state))
            .merge(chat::endpoint_router().with_state(chat_state))
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed);

        app = app.layer(TraceLayer::new_for_http());

        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        tracing::info!(
            base_url = %config.openai.base_url,
            transcription_model = %config.transcription.model,
            chat_model = %config.chat.model,
            max_retries = config.retry.max_retries,
            "server initialized"
        );

        Ok(Self {
            router: app,
            listen_address,
            registry,
            prober,
            probe_interval: config.server.health.probe_interval()?,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Shared service status registry
    #[must_use]
    pub fn registry(&self) -> Arc<ServiceRegistry> {
        Arc::clone(&self.registry)
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered. Background probes,
    /// when configured, stop with the same token.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.listen_address)
            .await
            .with_context(|| format!("failed to bind {}", self.listen_address))?;

        self.serve_with_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails
    pub async fn serve_with_listener(self, listener: TcpListener, shutdown: CancellationToken) -> anyhow::Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        let probes = self
            .probe_interval
            .map(|interval| self.prober.spawn(interval, shutdown.child_token()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        if let Some(probes) = probes
            && let Err(e) = probes.await
        {
            tracing::warn!(error = %e, "background probe task ended abnormally");
        }

        Ok(())
    }
}

async fn not_found(uri: http::Uri) -> axum::response::Response {
    error_response(ErrorKind::NotFound, format!("no route for {}", uri.path()))
}

async fn method_not_allowed(method: http::Method, uri: http::Uri) -> axum::response::Response {
    error_response(
        ErrorKind::MethodNotAllowed,
        format!("method {method} is not allowed for {}", uri.path()),
    )
}
