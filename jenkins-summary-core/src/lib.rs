#![doc = "jenkins-summary-core: core logic library for jenkins-summary."]

//! Discovers Jenkins job configurations, classifies them by build-system type and
//! reduces each one to a validated [`JobSummary`](contract::JobSummary): job type,
//! Git repository URL and branch.
//!
//! This crate contains no transport code. A live server is reached through the
//! collaborator traits in [`contract`]; a filesystem mirror of the job tree is read
//! directly through [`walk`].
//!
//! # Pipeline
//! [`summarise::resolve_all`] → [`classify`] → [`schema`] → [`validate`], with
//! per-job failures isolated into the returned report.

pub mod classify;
pub mod contract;
pub mod error;
pub mod schema;
pub mod summarise;
pub mod validate;
pub mod walk;

pub use classify::{classify, JobType};
pub use contract::{ConfigFetcher, JobDescriptor, JobLister, JobSummary};
pub use error::{FetchError, JobError, NamingError, ParseError, SourceError, ValidationError, WalkError};
pub use schema::{decode, FreestyleJobConfig, JobConfig, MavenJobConfig, ScmInfo};
pub use summarise::{resolve_all, FilesystemSource, JobSource, ServerSource, SummaryReport};
pub use validate::{validate, ValidatedScm};
