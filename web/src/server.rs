//! Shared services and the default router.
//!
//! ```text
//! /api/admin/registerAccount   ValidateCaller ─▶ GetUser ─▶ AccountRegistration
//! /api/admin/getAccount        ValidateCaller ─▶ GetUser
//! /metrics                     Prometheus exposition text
//! ```

use crate::handler::ActionEndpoint;
use crate::middleware::throttle_layer;
use crate::reader::RequestReader;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use pipeline_auth::{
    AuthService, CallerValidator, CheckSecurityAction, GetUserAction, RegisterAccountAction,
    SecurityService, ValidateCallerAction,
};
use pipeline_core::{Action, Chain, PipelineConfig, SettingsProvider};
use pipeline_runtime::metrics::install_recorder;
use pipeline_runtime::{ActionRunner, AttemptLimiter, RateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// Everything the HTTP layer wires actions from.
///
/// Cloning is cheap; clones share stores and limiters.
#[derive(Clone)]
pub struct Services {
    config: Arc<PipelineConfig>,
    settings: Arc<dyn SettingsProvider>,
    runner: ActionRunner,
    auth: AuthService,
    attempts: AttemptLimiter,
    rate_limiter: RateLimiter,
    metrics: Option<PrometheusHandle>,
}

impl Services {
    /// Services for `config`, with empty stores.
    ///
    /// Installs the process-wide Prometheus recorder on first use. When
    /// another recorder owns the global slot, metrics are not exposed.
    #[must_use]
    pub fn new(config: PipelineConfig, settings: Arc<dyn SettingsProvider>) -> Self {
        let runner = ActionRunner::for_profile(config.is_production());
        let attempts = AttemptLimiter::new(
            config.attempts.limit,
            config.attempts.interval(),
            config.attempts.message.clone(),
        );
        let rate_limiter = RateLimiter::new(config.throttle.rate, config.throttle.burst);
        let metrics = install_recorder()
            .inspect_err(|e| tracing::warn!(error = %e, "Metrics exposition disabled"))
            .ok();
        Self {
            config: Arc::new(config),
            settings,
            runner,
            auth: AuthService::default(),
            attempts,
            rate_limiter,
            metrics,
        }
    }

    /// Replace the action runner.
    #[must_use]
    pub fn with_runner(mut self, runner: ActionRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Account and session service.
    #[must_use]
    pub const fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Login attempt limiter.
    #[must_use]
    pub const fn attempts(&self) -> &AttemptLimiter {
        &self.attempts
    }

    /// Per-IP rate limiter.
    #[must_use]
    pub const fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Current metrics in Prometheus text format, if a recorder is installed.
    #[must_use]
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics.as_ref().map(PrometheusHandle::render)
    }

    /// Endpoint for `action` presenting JSON.
    #[must_use]
    pub fn endpoint(&self, action: Arc<dyn Action>) -> ActionEndpoint {
        ActionEndpoint::new(
            action,
            self.runner.clone(),
            RequestReader::from_config(&self.config),
        )
    }

    /// Client version check.
    #[must_use]
    pub fn validate_caller(&self) -> Arc<dyn Action> {
        Arc::new(ValidateCallerAction::new(CallerValidator::new(Arc::clone(
            &self.settings,
        ))))
    }

    /// Security policy check for `action_name`.
    #[must_use]
    pub fn check_security(&self, action_name: &str) -> Arc<dyn Action> {
        let security = SecurityService::from_config(Arc::clone(&self.settings), &self.config);
        Arc::new(CheckSecurityAction::new(security, action_name))
    }

    /// Authentication guarded by the attempt limiter.
    #[must_use]
    pub fn get_user(&self) -> Arc<dyn Action> {
        Arc::new(GetUserAction::new(self.auth.clone()).with_attempt_limiter(self.attempts.clone()))
    }

    /// Account registration.
    #[must_use]
    pub fn register_account(&self) -> Arc<dyn Action> {
        Arc::new(RegisterAccountAction::new(self.auth.clone()))
    }

    /// Start the periodic limiter sweeps. Requires a tokio runtime.
    pub fn spawn_sweepers(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.attempts
                .spawn_sweeper(self.config.attempts.sweep_interval()),
            self.rate_limiter
                .spawn_sweeper(self.config.throttle.sweep_interval()),
        ]
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("config", &self.config)
            .field("attempts", &self.attempts)
            .field("rate_limiter", &self.rate_limiter)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

/// The default admin routes plus `/metrics`, throttled when
/// `throttle.enabled` is set.
pub fn router(services: &Services) -> Router {
    let register = Chain::named(
        "RegisterAccount",
        vec![
            services.validate_caller(),
            services.get_user(),
            services.register_account(),
        ],
    );
    let get_account = Chain::named(
        "GetAccount",
        vec![services.validate_caller(), services.get_user()],
    );

    let router = Router::new()
        .route(
            "/api/admin/registerAccount",
            services.endpoint(Arc::new(register)).into_route(),
        )
        .route(
            "/api/admin/getAccount",
            services.endpoint(Arc::new(get_account)).into_route(),
        )
        .route("/metrics", get(metrics_handler(services.metrics.clone())));

    with_layers(router, services)
}

fn metrics_handler(
    handle: Option<PrometheusHandle>,
) -> impl Fn() -> std::future::Ready<Response> + Clone + Send + Sync + 'static {
    move || {
        std::future::ready(match &handle {
            Some(handle) => handle.render().into_response(),
            None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        })
    }
}

/// Apply the throttle (if enabled) and request tracing layers.
pub fn with_layers(router: Router, services: &Services) -> Router {
    let router = if services.config.throttle.enabled {
        router.layer(throttle_layer(services.rate_limiter.clone()))
    } else {
        router
    };
    router.layer(TraceLayer::new_for_http())
}

/// Serve `router` on `listener` with client socket addresses available.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    tracing::info!(addr = ?listener.local_addr().ok(), "HTTP server listening");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
