//! Error kinds for discovery, classification, decoding and validation.
//!
//! Per-job errors ([`JobError`] and the kinds it wraps) never escape a batch:
//! the aggregator records them as [`crate::summarise::JobFailure`]s and moves on.
//! Only [`SourceError`] (the job list could not be enumerated) aborts a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by the collaborators that talk to the CI server.
///
/// Kept as a boxed trait object so any transport can plug in behind the traits in
/// [`crate::contract`].
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// The walk root is missing or a directory below it could not be read.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("walk root {} does not exist", path.display())]
    RootNotFound { path: PathBuf },

    #[error("walk root {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to traverse {}: {source}", path.display())]
    Traverse {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// The document is not well-formed markup, or lacks the structure a decoder needs.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("no root element found before end of document")]
    NoRootElement,

    #[error("malformed markup before the end of the root start tag: {0}")]
    Markup(#[from] xmlparser::Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected root element <{expected}> but found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    #[error("missing <{element}> element under <{parent}>")]
    MissingElement {
        element: &'static str,
        parent: &'static str,
    },
}

/// The SCM section decoded fine but describes a shape that is not supported.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("job builds {count} branches; exactly one branch is supported")]
    AmbiguousBranches { count: usize },

    #[error("job references {count} remote repositories; exactly one repository is supported")]
    AmbiguousRepositories { count: usize },

    #[error("repository URL {url:?} does not use ssh://; only ssh:// URLs are supported")]
    UntrustedTransport { url: String },
}

/// A configuration path does not follow the `<job>/<config file>` layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("configuration path {path:?} has no parent directory to name the job")]
    MissingJobDirectory { path: String },

    #[error("configuration path {path:?} does not end in {expected:?}")]
    UnexpectedFileName { path: String, expected: String },

    #[error("job directory of {} is not valid UTF-8", path.display())]
    NonUtf8JobName { path: PathBuf },
}

/// Everything that can go wrong while resolving a single job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to fetch configuration: {0}")]
    Fetch(#[source] FetchError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("unsupported job type with root element <{root}>")]
    UnsupportedJobType { root: String },

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Enumerating the jobs of a source failed; no partial result is produced.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to list jobs: {0}")]
    ListJobs(#[source] FetchError),

    #[error(transparent)]
    Walk(#[from] WalkError),
}
