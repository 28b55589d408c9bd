//! Generation job dispatcher for mediagen.
//!
//! # Architecture
//!
//! - [`registry`] — static descriptors for every supported model + lookup
//! - [`payload`] — per-style body builders with clamping and validation
//! - [`traits::JobTransport`] — trait for authenticated JSON POST/GET
//! - [`http_transport::HttpTransport`] — `reqwest` implementation
//! - [`submitter`] — submission and envelope handling
//! - [`poller`] — bounded, cancellable status polling
//! - [`normalize`] — artifact URL extraction from provider payloads
//! - [`classify`] — provider outcomes → `GenerationError`
//! - [`dispatcher::Dispatcher`] — ties the above together per request

pub mod classify;
pub mod dispatcher;
pub mod http_transport;
pub mod normalize;
pub mod payload;
pub mod poller;
pub mod registry;
pub mod submitter;
pub mod traits;
pub mod wire;

#[cfg(test)]
mod mock;

// Re-export main types for convenience
pub use dispatcher::{DispatchOptions, Dispatcher};
pub use http_transport::HttpTransport;
pub use poller::PollConfig;
pub use registry::{lookup, lookup_or_default, ModelDescriptor, MODELS};
pub use traits::{Auth, JobTransport};
pub use tokio_util::sync::CancellationToken;
