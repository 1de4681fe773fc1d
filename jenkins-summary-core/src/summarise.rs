//! Batch pipeline: enumerate jobs → load configuration → classify → decode → validate.
//!
//! Jobs come from a [`JobSource`]: either a live server ([`ServerSource`], backed by
//! the [`JobLister`] and [`ConfigFetcher`] collaborators) or a filesystem mirror of
//! the server's job tree ([`FilesystemSource`], backed by [`crate::walk`]).
//!
//! # Failure isolation
//! A job that fails at any stage is left out of the summaries and recorded as a
//! [`JobFailure`] naming the job and the reason; the batch always carries on. The
//! only fatal error is failing to enumerate the jobs in the first place.
//!
//! # Ordering
//! Jobs are processed one at a time. Server jobs are visited in name order; the
//! filesystem source follows the walker's depth-first order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::contract::{ConfigFetcher, JobLister, JobSummary};
use crate::error::{JobError, NamingError, SourceError};
use crate::schema;
use crate::validate::validate;
use crate::walk;

/// Default configuration file name of a job in the job tree.
pub const CONFIG_FILE_NAME: &str = "config.xml";

/// A job's identifier together with its raw configuration document.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub job_name: String,
    pub document: Vec<u8>,
}

/// A job that was skipped, with the reason.
#[derive(Debug)]
pub struct JobFailure {
    /// Job name, or the configuration path when no name could be derived.
    pub job: String,
    pub error: JobError,
}

/// Outcome of a batch: every summary that passed validation, plus one failure per
/// skipped job.
#[derive(Debug, Default)]
pub struct SummaryReport {
    pub summaries: Vec<JobSummary>,
    pub failures: Vec<JobFailure>,
}

/// Something that can enumerate jobs and hand out their configuration documents.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Identifies one job within the source.
    type Key: Send + Sync;

    /// Keys for every job the source knows about. Failing here aborts the batch.
    async fn list(&self) -> Result<Vec<Self::Key>, SourceError>;

    /// Loads the job behind `key`. Failing here skips only that job.
    async fn load(&self, key: &Self::Key) -> Result<LoadedConfig, JobError>;

    /// Names `key` in a failure report when no job name could be loaded.
    fn describe(&self, key: &Self::Key) -> String;
}

/// Jobs enumerated and fetched from a live server.
pub struct ServerSource<L, F> {
    lister: L,
    fetcher: F,
}

impl<L, F> ServerSource<L, F>
where
    L: JobLister,
    F: ConfigFetcher,
{
    pub fn new(lister: L, fetcher: F) -> Self {
        Self { lister, fetcher }
    }
}

#[async_trait]
impl<L, F> JobSource for ServerSource<L, F>
where
    L: JobLister,
    F: ConfigFetcher,
{
    type Key = String;

    async fn list(&self) -> Result<Vec<String>, SourceError> {
        let jobs = self
            .lister
            .list_jobs()
            .await
            .map_err(SourceError::ListJobs)?;
        let mut names: Vec<String> = jobs.into_keys().collect();
        names.sort();
        Ok(names)
    }

    async fn load(&self, key: &String) -> Result<LoadedConfig, JobError> {
        let document = self
            .fetcher
            .fetch_config(key)
            .await
            .map_err(JobError::Fetch)?;
        Ok(LoadedConfig {
            job_name: key.clone(),
            document,
        })
    }

    fn describe(&self, key: &String) -> String {
        key.clone()
    }
}

/// Jobs read from a directory laid out like the server's job tree:
/// `<root>/<job name>/<config file name>`.
#[derive(Debug, Clone)]
pub struct FilesystemSource {
    root: PathBuf,
    config_file_name: String,
}

impl FilesystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_file_name(root, CONFIG_FILE_NAME)
    }

    pub fn with_file_name(root: impl Into<PathBuf>, config_file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            config_file_name: config_file_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl JobSource for FilesystemSource {
    /// Path of the configuration file, relative to the root.
    type Key = PathBuf;

    async fn list(&self) -> Result<Vec<PathBuf>, SourceError> {
        Ok(walk::find_files(&self.root, &self.config_file_name, 1)?)
    }

    async fn load(&self, key: &PathBuf) -> Result<LoadedConfig, JobError> {
        let job_name = job_name_from_path(key, &self.config_file_name)?;
        let path = self.root.join(key);
        let document = std::fs::read(&path).map_err(|source| JobError::Read { path, source })?;
        Ok(LoadedConfig {
            job_name,
            document,
        })
    }

    fn describe(&self, key: &PathBuf) -> String {
        key.display().to_string()
    }
}

/// Derives a job name from a `.../<job name>/<config file name>` path.
///
/// ```
/// use jenkins_summary_core::summarise::job_name_from_config_path;
///
/// let name = job_name_from_config_path("path1/path2/jobname/config.xml", "config.xml").unwrap();
/// assert_eq!(name, "jobname");
/// assert!(job_name_from_config_path("config.xml", "config.xml").is_err());
/// ```
pub fn job_name_from_config_path(path: &str, config_file_name: &str) -> Result<String, NamingError> {
    let segments: Vec<&str> = path.split('/').collect();
    let [.., job_name, file_name] = segments.as_slice() else {
        return Err(NamingError::MissingJobDirectory {
            path: path.to_string(),
        });
    };
    if *file_name != config_file_name {
        return Err(NamingError::UnexpectedFileName {
            path: path.to_string(),
            expected: config_file_name.to_string(),
        });
    }
    if matches!(*job_name, "" | "." | "..") {
        return Err(NamingError::MissingJobDirectory {
            path: path.to_string(),
        });
    }
    Ok(job_name.to_string())
}

/// [`job_name_from_config_path`] for filesystem paths. A job directory whose name
/// is not valid UTF-8 is rejected rather than lossily renamed.
pub fn job_name_from_path(path: &Path, config_file_name: &str) -> Result<String, NamingError> {
    let text = path.to_str().ok_or_else(|| NamingError::NonUtf8JobName {
        path: path.to_path_buf(),
    })?;
    job_name_from_config_path(&text.replace('\\', "/"), config_file_name)
}

/// Runs classification, decoding and validation over one loaded document.
pub fn summarise_job(config: &LoadedConfig) -> Result<JobSummary, JobError> {
    let decoded = schema::decode(&config.document)?;
    let scm = validate(decoded.scm())?;
    debug!(job = %config.job_name, git_url = %scm.git_url, branch = %scm.branch, "Job validated");

    Ok(JobSummary {
        job_type: decoded.job_type(),
        job_name: config.job_name.clone(),
        git_url: scm.git_url,
        branch: scm.branch,
    })
}

/// Resolves every job of `source` into a [`SummaryReport`].
pub async fn resolve_all<S>(source: &S) -> Result<SummaryReport, SourceError>
where
    S: JobSource + ?Sized,
{
    info!("[SUMMARY] Enumerating jobs");
    let keys = source.list().await.map_err(|e| {
        error!(error = %e, "[SUMMARY][ERROR] Failed to enumerate jobs");
        e
    })?;
    info!(jobs = keys.len(), "[SUMMARY] Resolving job summaries");

    let mut report = SummaryReport::default();
    for key in keys {
        let loaded = source.load(&key).await;
        let outcome = match loaded {
            Ok(config) => summarise_job(&config).map_err(|e| (config.job_name, e)),
            Err(e) => Err((source.describe(&key), e)),
        };
        match outcome {
            Ok(summary) => {
                info!(job = %summary.job_name, job_type = %summary.job_type, "[SUMMARY] Job summarised");
                report.summaries.push(summary);
            }
            Err((job, error)) => {
                warn!(job = %job, error = %error, "[SUMMARY] Skipping job");
                report.failures.push(JobFailure { job, error });
            }
        }
    }

    info!(
        summaries = report.summaries.len(),
        failures = report.failures.len(),
        "[SUMMARY] Finished resolving job summaries"
    );
    Ok(report)
}
