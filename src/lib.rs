//! # Weblibri client
//!
//! Client side of the weblibri e-book service.
//!
//! ## Features
//!
//! - JSON client for the catalog and conversion status endpoints
//! - Readiness polling with geometric backoff (1s, then x1.5 per answer)
//! - Polling sessions bound to a dismissible progress dialog
//! - Reader and download link construction

pub mod client;
pub mod config;
pub mod error;
pub mod links;
pub mod poller;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::types::{ItemId, ItemRecord, ReaderStatus};
pub use client::{LibraryClient, StatusClient};
pub use config::{ClientConfig, PollConfig};
pub use error::{ClientError, ClientResult};
pub use links::{DownloadLink, Links};
pub use poller::{ConversionSession, PollScheduler, SessionState, SessionStatus};
pub use session::{DismissHandle, Navigator, OpenOutcome, ProgressDialog, SessionHandle, SessionLifecycle};

/// Default API base
pub const DEFAULT_API_ROOT: &str = "http://localhost:8000/api";

/// Wait before the first scheduled readiness poll
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Growth of the poll delay after each not-ready answer
pub const DEFAULT_GROWTH_FACTOR: f64 = 1.5;
