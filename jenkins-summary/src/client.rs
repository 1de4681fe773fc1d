//! # Jenkins HTTP client
//!
//! Implements the core's [`JobLister`] and [`ConfigFetcher`] collaborators against
//! a live Jenkins server, plus two read-only extras: decoding a job's full
//! configuration and reading its most recent build.
//!
//! Every request carries HTTP basic auth and an explicit `Accept` header, is
//! retried according to the client's [`RetryPolicy`], and treats anything but
//! `200 OK` as a failure. Redirects are not followed.

use std::collections::HashMap;

use async_trait::async_trait;
use jenkins_summary_core::contract::{ConfigFetcher, FetchError, JobDescriptor, JobLister};
use jenkins_summary_core::schema::{self, JobConfig};
use jenkins_summary_core::JobError;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::retry::RetryPolicy;

const ACCEPT_JSON: &str = "application/json";
const ACCEPT_XML: &str = "application/xml";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid Jenkins base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: Url,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode JSON from {url}: {source}")]
    Json {
        url: Url,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Job(#[from] JobError),
}

/// Most recent build of a job, as reported by `lastBuild/api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastBuild {
    /// `SUCCESS`, `FAILURE`, ...; absent while the build is still running.
    pub result: Option<String>,
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,
    pub url: String,
}

#[derive(Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<JobDescriptor>,
}

#[derive(Clone)]
pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for JenkinsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JenkinsClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password_set", &!self.password.is_empty())
            .field("retry", &self.retry)
            .finish()
    }
}

impl JenkinsClient {
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".into()));
        }

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ClientError::Build)?;

        let username = username.into();
        info!(base_url = %parsed, username = %username, "Initialized JenkinsClient");
        Ok(Self {
            http,
            base_url: parsed,
            username,
            password: password.into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// All jobs known to the server, keyed by name.
    pub async fn jobs(&self) -> Result<HashMap<String, JobDescriptor>, ClientError> {
        let url = self.endpoint(&["api", "json", "jobs"]);
        let body = self.get_with_retry(&url, ACCEPT_JSON).await?;
        let list: JobList = serde_json::from_slice(&body).map_err(|source| ClientError::Json {
            url: url.clone(),
            source,
        })?;

        let jobs: HashMap<String, JobDescriptor> = list
            .jobs
            .into_iter()
            .map(|job| (job.name.clone(), job))
            .collect();
        info!(jobs = jobs.len(), "Retrieved job list");
        Ok(jobs)
    }

    /// Raw `config.xml` of a job.
    pub async fn config_xml(&self, job_name: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint(&["job", job_name, "config.xml"]);
        self.get_with_retry(&url, ACCEPT_XML).await
    }

    /// Fetches and decodes a job's configuration without applying the SCM checks.
    pub async fn job_config(&self, job_name: &str) -> Result<JobConfig, ClientError> {
        let document = self.config_xml(job_name).await?;
        Ok(schema::decode(&document)?)
    }

    /// Single read of a job's most recent build.
    pub async fn last_build(&self, job_name: &str) -> Result<LastBuild, ClientError> {
        let url = self.endpoint(&["job", job_name, "lastBuild", "api", "json"]);
        let body = self.get_with_retry(&url, ACCEPT_JSON).await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Json { url, source })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can carry path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_with_retry(&self, url: &Url, accept: &str) -> Result<Vec<u8>, ClientError> {
        self.retry.run(url.as_str(), || self.get(url, accept)).await
    }

    async fn get(&self, url: &Url, accept: &str) -> Result<Vec<u8>, ClientError> {
        debug!(url = %url, accept, "GET");
        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, accept)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|source| ClientError::Http {
            url: url.clone(),
            source,
        })?;

        if status != StatusCode::OK {
            let body = String::from_utf8_lossy(&body).into_owned();
            error!(url = %url, status = %status, "Jenkins returned an error. Response body: {body}");
            return Err(ClientError::Status {
                url: url.clone(),
                status,
                body,
            });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl JobLister for JenkinsClient {
    async fn list_jobs(&self) -> Result<HashMap<String, JobDescriptor>, FetchError> {
        Ok(self.jobs().await?)
    }
}

#[async_trait]
impl ConfigFetcher for JenkinsClient {
    async fn fetch_config(&self, job_name: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.config_xml(job_name).await?)
    }
}
