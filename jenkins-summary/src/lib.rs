//! Jenkins integration for `jenkins-summary-core`.
//!
//! - [`client`]: HTTP client implementing the core's job-list and config-fetch collaborators.
//! - [`retry`]: bounded retry with fixed backoff used by the client.
//! - [`load_config`]: YAML settings merged with credentials from the environment.
//! - [`pipeline`]: entrypoint tying settings, source and aggregator together.

pub mod client;
pub mod load_config;
pub mod pipeline;
pub mod retry;
pub mod telemetry;

pub use client::{ClientError, JenkinsClient, LastBuild};
pub use load_config::{load_config, Credentials, Settings, SourceSettings};
pub use pipeline::run;
pub use retry::RetryPolicy;
