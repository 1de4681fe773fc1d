#![allow(unused)]

//! # contract: collaborator seams and the summary data model
//!
//! The core never speaks HTTP. It consumes two collaborators:
//!
//! - [`JobLister`]: enumerates the jobs a CI server knows about.
//! - [`ConfigFetcher`]: returns the raw `config.xml` bytes for one job.
//!
//! Transport, authentication and retry policy belong to the implementor (see the
//! `jenkins-summary` crate for the HTTP client). Errors cross the seam as boxed
//! [`FetchError`]s.
//!
//! ## Mocking & Testing
//! Both traits are annotated for `mockall`; the mocks are exported under the
//! default `test-export-mocks` feature so integration tests can use them.

use std::collections::HashMap;

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};

use crate::classify::JobType;
pub use crate::error::FetchError;

/// One entry of the server's job list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Validated projection of a job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_type: JobType,
    pub job_name: String,
    pub git_url: String,
    pub branch: String,
}

/// Enumerates the jobs known to a CI server, keyed by job name.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait JobLister: Send + Sync {
    async fn list_jobs(&self) -> Result<HashMap<String, JobDescriptor>, FetchError>;
}

/// Retrieves the complete configuration document of a single job.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    /// Returns the raw bytes of `job_name`'s configuration, or a terminal error
    /// once the implementor has given up retrying.
    async fn fetch_config(&self, job_name: &str) -> Result<Vec<u8>, FetchError>;
}
