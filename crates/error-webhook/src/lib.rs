//! Error-tracking webhook bridge for CTO platform investigation workflows.
//!
//! This crate provides:
//! - Typed webhook schemas for GlitchTip and Better Stack
//! - Normalization into a single [`ErrorRecord`]
//! - Better Stack `cause` markdown extraction
//! - GitHub `repository_dispatch` client
//! - HTTP server for webhook handling (standalone service)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod cause;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod models;
pub mod providers;
pub mod server;
pub mod webhooks;

pub use config::{Config, GitHubConfig};
pub use dispatch::{Dispatch, DispatchOutcome, GitHubDispatcher};
pub use error::DispatchError;
pub use handler::{WebhookHandler, WebhookResponse};
pub use models::{ErrorRecord, Provider};
pub use providers::ProviderPayload;
