//! # Action Pipeline Core
//!
//! Core traits and types for a transport-agnostic action pipeline.
//!
//! A request is decoded into [`CallParams`], wrapped in a [`Payload`] and run
//! through an [`Action`] (usually a [`Chain`] of them). Failures are
//! [`PipelineError`]s; an [`ErrorClassifier`] turns them into a stable
//! [`ClassifiedError`], and [`status`] maps the outcome onto a transport code.
//!
//! ## Core Concepts
//!
//! - **Action**: named unit of work with lifecycle hooks
//! - **Chain**: sequential composition; output feeds the next input
//! - **Payload**: the value carried between actions
//! - **Reason**: machine-readable failure tag shared with clients
//! - **`ActionResult`**: the envelope every client receives
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use pipeline_core::{Action, ActionContext, Chain, NopAction, Payload};
//!
//! # tokio_test::block_on(async {
//! let chain = Chain::new(vec![Arc::new(NopAction) as Arc<dyn Action>]);
//! let mut ctx = ActionContext::new();
//! let out = chain.run(&mut ctx, Payload::Empty).await;
//! assert!(out.is_ok());
//! # });
//! ```

pub mod action;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod entities;
pub mod error;
pub mod payload;
pub mod result;
pub mod settings;
pub mod status;
pub mod validation;

pub use action::{Action, ActionContext, AlertParams, NopAction};
pub use chain::Chain;
pub use classifier::{DefaultErrorClassifier, ErrorClassifier, INTERNAL_ERROR_MESSAGE};
pub use config::{ConfigError, Environment, PipelineConfig};
pub use entities::{Account, AuthArgs, CallParams, Caller, Parameters, Role, Session, Version};
pub use error::{PipelineError, Reason, StorageReason, ValidationError};
pub use payload::{FileInfo, Payload};
pub use result::{ActionResult, ClassifiedError};
pub use settings::{ServerSettings, SettingsError, SettingsProvider, StaticSettingsProvider};

// Re-exported so implementors don't need a direct dependency.
pub use async_trait::async_trait;
