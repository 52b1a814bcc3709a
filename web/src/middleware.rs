//! Throttle middleware.
//!
//! Consults a [`RateLimiter`] keyed by client IP before the request reaches
//! its handler. Rejected requests get `429 Too Many Requests` with a regular
//! result body:
//!
//! ```json
//! {"error": {"reason": "TOO_MANY_REQUESTS", "message": "Too many requests"}, "executionTimeMs": 0}
//! ```
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use pipeline_runtime::RateLimiter;
//! use pipeline_web::middleware::throttle_layer;
//!
//! let app = Router::new()
//!     .route("/api/users", get(list_users))
//!     .layer(throttle_layer(RateLimiter::new(10.0, 20)));
//! ```

use crate::extractors::client_ip;
use crate::presenter::JsonPresenter;
use axum::{extract::Request, response::Response};
use pipeline_core::{ActionResult, ClassifiedError, Reason};
use pipeline_runtime::RateLimiter;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Message of throttled responses.
pub const THROTTLED_MESSAGE: &str = "Too many requests";

/// Create a layer throttling requests per client IP.
#[must_use]
pub const fn throttle_layer(limiter: RateLimiter) -> ThrottleLayer {
    ThrottleLayer { limiter }
}

/// Layer for per-IP throttling.
#[derive(Clone, Debug)]
pub struct ThrottleLayer {
    limiter: RateLimiter,
}

impl<S> Layer<S> for ThrottleLayer {
    type Service = ThrottleMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ThrottleMiddleware {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Middleware service for per-IP throttling.
#[derive(Clone, Debug)]
pub struct ThrottleMiddleware<S> {
    inner: S,
    limiter: RateLimiter,
}

impl<S> Service<Request> for ThrottleMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let ip = client_ip(req.headers(), req.extensions().get()).to_string();

        if !self.limiter.allow(&ip) {
            let result = ActionResult::failure(ClassifiedError::new(
                Reason::TooManyRequests,
                THROTTLED_MESSAGE,
            ));
            return Box::pin(async move { Ok(JsonPresenter::render(&result, None)) });
        }

        let fut = self.inner.call(req);
        Box::pin(fut)
    }
}
