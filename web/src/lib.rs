//! Axum transport adapter for the action pipeline.
//!
//! # Request Flow
//!
//! 1. **Throttle** by client IP (when enabled)
//! 2. **Read** the caller and parameters ([`RequestReader`])
//! 3. **Run** the action through the [`ActionRunner`](pipeline_runtime::ActionRunner)
//! 4. **Present** the result ([`JsonPresenter`] or [`FilePresenter`])
//!
//! Every classified failure still produces a well-formed result body; only
//! the status code changes.
//!
//! # Example
//!
//! ```no_run
//! use pipeline_core::{PipelineConfig, StaticSettingsProvider};
//! use pipeline_web::{Services, router, serve};
//! use std::sync::Arc;
//!
//! # async fn run() -> std::io::Result<()> {
//! let services = Services::new(
//!     PipelineConfig::default(),
//!     Arc::new(StaticSettingsProvider::default()),
//! );
//! services.spawn_sweepers();
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! serve(listener, router(&services)).await
//! # }
//! ```

pub mod extractors;
pub mod handler;
pub mod middleware;
pub mod presenter;
pub mod reader;
pub mod server;

pub use extractors::ClientIp;
pub use handler::ActionEndpoint;
pub use middleware::{ThrottleLayer, throttle_layer};
pub use presenter::{FilePresenter, JsonPresenter, Presenter};
pub use reader::RequestReader;
pub use server::{Services, router, serve, with_layers};
