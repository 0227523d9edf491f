//! HTTP shell around the Keel error model and health aggregator
//!
//! [`Server::builder`] assembles the router: application routes, the health
//! endpoint, the not-found fallback and the middleware stack that funnels
//! every failure through one [`Dispatcher`].

mod cors;
pub mod diagnostics;
mod dispatch;
mod extract;
mod health;
mod not_found;
mod rate_limit;
mod reply;
mod request_id;
mod security_headers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use keel_config::{Config, ProbeConfig, parse_duration};
use keel_health::{HealthAggregator, HealthProbe, ProbeRegistry, TcpProbe};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[cfg(any(test, feature = "test-util"))]
pub use diagnostics::{CapturedRecord, MemorySink};
pub use diagnostics::{Classification, DiagnosticRecord, DiagnosticSink, TracingSink};
pub use dispatch::Dispatcher;
pub use extract::{Validate, ValidJson, checked_json};
pub use reply::ApiError;
pub use request_id::{MakeRequestUuidV7, REQUEST_ID_HEADER};

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    limiter: Option<Arc<keel_ratelimit::RequestLimiter>>,
}

/// Collects routes, probes and the diagnostic sink before building a [`Server`]
pub struct ServerBuilder {
    config: Config,
    routes: Router,
    registry: ProbeRegistry,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl ServerBuilder {
    /// Merge application routes
    #[must_use]
    pub fn routes(mut self, routes: Router) -> Self {
        self.routes = self.routes.merge(routes);
        self
    }

    /// Register a health probe under `name`
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or already registered
    pub fn probe(mut self, name: impl Into<String>, probe: impl HealthProbe + 'static) -> anyhow::Result<Self> {
        self.registry.register(name, probe)?;
        Ok(self)
    }

    /// Send dispatcher diagnostics somewhere other than `tracing`
    #[must_use]
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the server
    ///
    /// Configured probes are registered after the ones added through
    /// [`ServerBuilder::probe`].
    ///
    /// # Errors
    ///
    /// Returns an error if a probe name clashes, a duration or header value
    /// in the configuration is invalid, or the rate limiter cannot be built
    pub fn build(self) -> anyhow::Result<Server> {
        let Self {
            config,
            routes,
            mut registry,
            sink,
        } = self;

        let environment = config.app.environment;
        let listen_address = config.server.listen_address();
        let dispatcher = Arc::new(match sink {
            Some(sink) => Dispatcher::new(environment, sink),
            None => Dispatcher::with_tracing(environment),
        });

        let mut app = routes;

        // Health check
        let health_config = &config.server.health;
        if health_config.enabled {
            for (name, probe) in &health_config.probes {
                match probe {
                    ProbeConfig::Tcp {
                        address,
                        connect_timeout,
                    } => {
                        let timeout = parse_duration(&format!("health probe '{name}' connect_timeout"), connect_timeout)?;
                        registry.register(name.clone(), TcpProbe::new(address.clone(), timeout))?;
                    }
                }
            }

            let aggregator = HealthAggregator::new(registry).with_probe_timeout(health_config.probe_timeout()?);
            let state = Arc::new(health::HealthState::new(aggregator, config.app.clone()));
            app = app.route(
                &health_config.path,
                axum::routing::get(health::health_handler).with_state(state),
            );
        }

        // Unknown routes and unsupported methods
        app = app
            .fallback(move |request: Request| not_found::not_found(environment, request))
            .method_not_allowed_fallback(move |request: Request| not_found::not_found(environment, request));

        // Apply middleware layers (innermost first)

        // Panics become unclassified failures
        app = app.layer(CatchPanicLayer::custom(reply::panic_response));

        // Rate limiting
        let mut request_limiter = None;
        if let Some(ref rl_config) = config.server.rate_limit {
            let limiter = Arc::new(keel_ratelimit::create_request_limiter(rl_config)?);
            if limiter.is_enabled() {
                request_limiter = Some(Arc::clone(&limiter));
                app = app.layer(axum::middleware::from_fn(move |req, next| {
                    let limiter = Arc::clone(&limiter);
                    async move { rate_limit::rate_limit_middleware(limiter, req, next).await }
                }));
            }
        }

        // Every failure below this point is rendered by the dispatcher
        app = app.layer(axum::middleware::from_fn_with_state(
            Arc::clone(&dispatcher),
            reply::error_layer,
        ));

        // Security headers
        for (name, value) in security_headers::security_headers(&config.server.security_headers, environment)? {
            app = app.layer(SetResponseHeaderLayer::if_not_present(name, value));
        }

        // CORS
        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config)?);
        }

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // Request id (outermost, so every layer above sees it)
        app = app
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER.clone()))
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER.clone(), MakeRequestUuidV7));

        tracing::debug!(%environment, probes = health_config.probes.len(), "server assembled");

        Ok(Server {
            router: app,
            listen_address,
            limiter: request_limiter,
        })
    }
}

impl Server {
    /// Start building a server from configuration
    pub fn builder(config: Config) -> ServerBuilder {
        ServerBuilder {
            config,
            routes: Router::new(),
            registry: ProbeRegistry::new(),
            sink: None,
        }
    }

    /// Build a server with no application routes
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be turned into a server
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::builder(config).build()
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

        if let Some(limiter) = self.limiter {
            tokio::spawn(rate_limit::sweep_idle_clients(
                limiter,
                rate_limit::IDLE_CLIENT_SWEEP,
                shutdown.clone(),
            ));
        }

        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("graceful shutdown initiated");
        })
        .await?;

        Ok(())
    }
}
