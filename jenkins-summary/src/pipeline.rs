//! Wires loaded [`Settings`] to a job source and runs the summary pipeline.

use anyhow::{Context, Result};
use jenkins_summary_core::summarise::{resolve_all, FilesystemSource, ServerSource, SummaryReport};
use tracing::info;

use crate::client::JenkinsClient;
use crate::load_config::{Settings, SourceSettings};

/// Resolves the summaries of every job in the configured source.
///
/// Fails only when the jobs cannot be enumerated; individual jobs that cannot
/// be summarised are listed in [`SummaryReport::failures`].
pub async fn run(settings: &Settings) -> Result<SummaryReport> {
    let report = match &settings.source {
        SourceSettings::Server {
            base_url,
            credentials,
        } => {
            let client = JenkinsClient::new(base_url, &credentials.username, &credentials.password)?
                .with_retry(settings.retry.clone());
            let source = ServerSource::new(client.clone(), client);
            resolve_all(&source)
                .await
                .with_context(|| format!("Failed to list jobs on {base_url}"))?
        }
        SourceSettings::Filesystem {
            root,
            config_file_name,
        } => {
            let source = FilesystemSource::with_file_name(root, config_file_name);
            resolve_all(&source)
                .await
                .with_context(|| format!("Failed to discover jobs under {}", root.display()))?
        }
    };

    info!(
        summaries = report.summaries.len(),
        failures = report.failures.len(),
        "Summary run complete"
    );
    Ok(report)
}
