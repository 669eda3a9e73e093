//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gate middleware and handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Publish provisioned matchers atomically, at startup and on reload
//! - Bind server to listener and shut down gracefully

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{uri::Authority, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{client::legacy::Client, client::legacy::connect::HttpConnector, rt::TokioExecutor};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GateConfig, MatcherConfig};
use crate::http::forward::{forward, UpstreamClient};
use crate::http::gate::gate_middleware;
use crate::matcher::Matcher;
use crate::observability::metrics;
use crate::registry::{MatcherRegistry, RegistryError};

/// Errors that prevent the server from being built.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("matcher: {0}")]
    Matcher(#[from] RegistryError),

    #[error("invalid upstream address '{0}'")]
    InvalidUpstream(String),
}

/// The matcher currently guarding the gate.
#[derive(Debug)]
pub struct ActiveMatcher {
    /// Registry id the matcher was built from.
    pub module: String,
    pub matcher: Arc<dyn Matcher>,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct GateState {
    /// Swapped as a whole; requests never observe a partially built matcher.
    pub matcher: Arc<ArcSwap<ActiveMatcher>>,
    pub upstream: Option<Authority>,
    pub client: UpstreamClient,
}

/// HTTP server for the gate.
pub struct HttpServer {
    config: GateConfig,
    registry: Arc<MatcherRegistry>,
    state: GateState,
}

impl HttpServer {
    /// Provision the configured matcher and prepare the server.
    ///
    /// Fails if the matcher does not provision; nothing is served in that case.
    pub fn new(config: GateConfig, registry: Arc<MatcherRegistry>) -> Result<Self, ServerError> {
        let active = build_matcher(&registry, &config.matcher)?;

        let upstream = match &config.upstream {
            Some(upstream) => Some(
                Authority::from_str(&upstream.address)
                    .map_err(|_| ServerError::InvalidUpstream(upstream.address.clone()))?,
            ),
            None => None,
        };

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = GateState {
            matcher: Arc::new(ArcSwap::from_pointee(active)),
            upstream,
            client,
        };

        Ok(Self {
            config,
            registry,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(gate_handler)
            .layer(middleware::from_fn_with_state(self.state.clone(), gate_middleware))
            .with_state(self.state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The matcher currently in effect.
    pub fn active_matcher(&self) -> Arc<ActiveMatcher> {
        self.state.matcher.load_full()
    }

    /// Rebuild the matcher from `config` and publish it.
    ///
    /// On failure the current matcher stays in place.
    pub fn reload(&self, config: &GateConfig) -> Result<(), RegistryError> {
        publish(&self.registry, &self.state.matcher, &config.matcher)
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates only replace the matcher; listener, upstream and
    /// timeouts are fixed for the lifetime of the server.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = ?self.state.upstream.as_ref().map(|a| a.as_str()),
            "Gate server starting"
        );

        let app = self.router();

        let registry = self.registry.clone();
        let slot = self.state.matcher.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        let reloader = tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => {
                            // Errors are logged inside; the old matcher keeps serving.
                            let _ = publish(&registry, &slot, &config.matcher);
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        reloader.abort();
        tracing::info!("Gate server stopped");
        Ok(())
    }
}

/// Matched requests land here: forwarded, or acknowledged in forward-auth mode.
async fn gate_handler(State(state): State<GateState>, request: Request<Body>) -> Response {
    match &state.upstream {
        Some(upstream) => forward(&state.client, upstream, request).await,
        None => (StatusCode::OK, "OK").into_response(),
    }
}

fn build_matcher(registry: &MatcherRegistry, config: &MatcherConfig) -> Result<ActiveMatcher, RegistryError> {
    let matcher = registry.build(&config.module, config.params_value())?;
    Ok(ActiveMatcher {
        module: config.module.clone(),
        matcher,
    })
}

fn publish(
    registry: &MatcherRegistry,
    slot: &ArcSwap<ActiveMatcher>,
    config: &MatcherConfig,
) -> Result<(), RegistryError> {
    match build_matcher(registry, config) {
        Ok(active) => {
            tracing::info!(module = %active.module, "Matcher published");
            slot.store(Arc::new(active));
            metrics::record_reload(true);
            Ok(())
        }
        Err(e) => {
            tracing::error!(module = %config.module, error = %e, "Matcher rebuild failed, keeping current matcher");
            metrics::record_reload(false);
            Err(e)
        }
    }
}
