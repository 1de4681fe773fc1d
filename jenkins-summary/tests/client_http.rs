use std::path::Path;
use std::time::Duration;

use jenkins_summary::client::{ClientError, JenkinsClient, LastBuild};
use jenkins_summary::load_config::{Credentials, Settings, SourceSettings};
use jenkins_summary::retry::RetryPolicy;
use jenkins_summary_core::contract::{ConfigFetcher, JobLister};
use jenkins_summary_core::{JobConfig, JobError, JobSummary, JobType, ValidationError};
use mockito::Server;

const MAVEN: &str = include_str!("../../jenkins-summary-core/tests/fixtures/maven.xml");
const FREESTYLE: &str = include_str!("../../jenkins-summary-core/tests/fixtures/freestyle.xml");
const MAVEN_HTTP_REMOTE: &str =
    include_str!("../../jenkins-summary-core/tests/fixtures/maven_http_remote.xml");
const UNKNOWN: &str = include_str!("../../jenkins-summary-core/tests/fixtures/unknown.xml");

// "u:p"
const BASIC_AUTH: &str = "Basic dTpw";

fn client(server: &Server) -> JenkinsClient {
    JenkinsClient::new(&server.url(), "u", "p")
        .expect("client should build")
        .with_retry(RetryPolicy::none())
}

fn jobs_body(names: &[&str]) -> String {
    let jobs: Vec<_> = names
        .iter()
        .map(|name| serde_json::json!({ "name": name, "url": format!("https://jenkins.example.com/job/{name}/") }))
        .collect();
    serde_json::json!({ "jobs": jobs }).to_string()
}

#[tokio::test]
async fn test_list_jobs_keys_by_name() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/json/jobs")
        .match_header("accept", "application/json")
        .match_header("authorization", BASIC_AUTH)
        .with_status(200)
        .with_body(jobs_body(&["widgets", "gadgets"]))
        .create_async()
        .await;

    let jobs = client(&server).list_jobs().await.expect("job list");

    mock.assert_async().await;
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs["widgets"].name, "widgets");
    assert_eq!(jobs["gadgets"].url, "https://jenkins.example.com/job/gadgets/");
}

#[tokio::test]
async fn test_fetch_config_returns_raw_document() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/job/thejob/config.xml")
        .match_header("accept", "application/xml")
        .match_header("authorization", BASIC_AUTH)
        .with_status(200)
        .with_body(MAVEN)
        .create_async()
        .await;

    let document = client(&server).fetch_config("thejob").await.expect("config");

    mock.assert_async().await;
    assert_eq!(document, MAVEN.as_bytes());
}

#[tokio::test]
async fn test_base_url_path_is_preserved() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/jenkins/job/thejob/config.xml")
        .with_status(200)
        .with_body(FREESTYLE)
        .create_async()
        .await;

    let client = JenkinsClient::new(&format!("{}/jenkins/", server.url()), "u", "p")
        .unwrap()
        .with_retry(RetryPolicy::none());
    client.config_xml("thejob").await.expect("config");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_ok_status_is_retried_then_reported() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/job/broken/config.xml")
        .with_status(500)
        .with_body("boom")
        .expect(3)
        .create_async()
        .await;

    let client = JenkinsClient::new(&server.url(), "u", "p")
        .unwrap()
        .with_retry(RetryPolicy::new(3, Duration::ZERO));
    let err = client.config_xml("broken").await.unwrap_err();

    mock.assert_async().await;
    match err {
        ClientError::Status { status, body, .. } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/job/moved/config.xml")
        .with_status(302)
        .with_header("location", "/login")
        .create_async()
        .await;

    let err = client(&server).config_xml("moved").await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ClientError::Status { status, .. } if status.as_u16() == 302));
}

#[tokio::test]
async fn test_job_config_decodes_document_with_leading_blank_line() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/job/thejob/config.xml")
        .with_status(200)
        .with_body(format!("\n{MAVEN}"))
        .create_async()
        .await;

    let config = client(&server).job_config("thejob").await.expect("decoded config");

    match config {
        JobConfig::Maven(maven) => {
            assert_eq!(maven.scm.remote_urls, vec!["ssh://example.com/proj/cool.git"]);
            assert_eq!(maven.scm.branches, vec!["*/develop"]);
            let module = maven.root_module.expect("root module");
            assert_eq!(module.group_id.as_deref(), Some("com.example.widgets"));
            assert_eq!(module.artifact_id.as_deref(), Some("widge"));
        }
        other => panic!("expected maven config, got {other:?}"),
    }
}

#[tokio::test]
async fn test_job_config_rejects_unknown_job_type() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/job/pipeline/config.xml")
        .with_status(200)
        .with_body(UNKNOWN)
        .create_async()
        .await;

    let err = client(&server).job_config("pipeline").await.unwrap_err();

    assert!(
        matches!(err, ClientError::Job(JobError::UnsupportedJobType { ref root }) if root == "flow-definition"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_last_build_reads_result_and_timestamp() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/job/thejob/lastBuild/api/json")
        .match_header("accept", "application/json")
        .match_header("authorization", BASIC_AUTH)
        .with_status(200)
        .with_body(r#"{"result":"SUCCESS","timestamp":1456425493292,"url":"https://server/job/thejob/1/","number":1}"#)
        .create_async()
        .await;

    let build = client(&server).last_build("thejob").await.expect("last build");

    mock.assert_async().await;
    assert_eq!(
        build,
        LastBuild {
            result: Some("SUCCESS".into()),
            timestamp_millis: 1456425493292,
            url: "https://server/job/thejob/1/".into(),
        }
    );
}

#[tokio::test]
async fn test_last_build_reports_bad_json() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/job/thejob/lastBuild/api/json")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = client(&server).last_build("thejob").await.unwrap_err();
    assert!(matches!(err, ClientError::Json { .. }), "got {err:?}");
}

#[test]
fn test_rejects_unusable_base_url() {
    assert!(matches!(
        JenkinsClient::new("not a url", "u", "p"),
        Err(ClientError::InvalidBaseUrl { .. })
    ));
    assert!(matches!(
        JenkinsClient::new("mailto:jenkins@example.com", "u", "p"),
        Err(ClientError::InvalidBaseUrl { .. })
    ));
}

#[test]
fn test_debug_hides_password() {
    let client = JenkinsClient::new("https://jenkins.example.com/", "u", "hunter2").unwrap();
    assert!(!format!("{client:?}").contains("hunter2"));
}

#[tokio::test]
async fn test_run_against_server_isolates_invalid_job() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/json/jobs")
        .with_status(200)
        .with_body(jobs_body(&["widgets", "insecure", "tools"]))
        .create_async()
        .await;
    server
        .mock("GET", "/job/widgets/config.xml")
        .with_status(200)
        .with_body(MAVEN)
        .create_async()
        .await;
    server
        .mock("GET", "/job/insecure/config.xml")
        .with_status(200)
        .with_body(MAVEN_HTTP_REMOTE)
        .create_async()
        .await;
    server
        .mock("GET", "/job/tools/config.xml")
        .with_status(200)
        .with_body(FREESTYLE)
        .create_async()
        .await;

    let settings = Settings {
        source: SourceSettings::Server {
            base_url: server.url(),
            credentials: Credentials {
                username: "u".into(),
                password: "p".into(),
            },
        },
        retry: RetryPolicy::none(),
    };

    let report = jenkins_summary::run(&settings).await.expect("run");

    assert_eq!(
        report.summaries,
        vec![
            JobSummary {
                job_type: JobType::Freestyle,
                job_name: "tools".into(),
                git_url: "ssh://example.com/proj/cool.git".into(),
                branch: "origin/develop".into(),
            },
            JobSummary {
                job_type: JobType::Maven,
                job_name: "widgets".into(),
                git_url: "ssh://example.com/proj/cool.git".into(),
                branch: "*/develop".into(),
            },
        ]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].job, "insecure");
    assert!(matches!(
        report.failures[0].error,
        JobError::Validation(ValidationError::UntrustedTransport { .. })
    ));
}

#[tokio::test]
async fn test_run_fails_when_job_list_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/json/jobs")
        .with_status(503)
        .create_async()
        .await;

    let settings = Settings {
        source: SourceSettings::Server {
            base_url: server.url(),
            credentials: Credentials {
                username: "u".into(),
                password: "p".into(),
            },
        },
        retry: RetryPolicy::none(),
    };

    let err = jenkins_summary::run(&settings).await.unwrap_err();
    assert!(err.to_string().contains("Failed to list jobs"), "got: {err}");
}

fn write_job(root: &Path, name: &str, document: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.xml"), document).unwrap();
}

#[tokio::test]
async fn test_run_against_filesystem_mirror() {
    jenkins_summary::telemetry::init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    write_job(tmp.path(), "widgets", MAVEN);
    write_job(tmp.path(), "pipeline", UNKNOWN);

    let settings = Settings {
        source: SourceSettings::Filesystem {
            root: tmp.path().to_path_buf(),
            config_file_name: "config.xml".into(),
        },
        retry: RetryPolicy::default(),
    };

    let report = jenkins_summary::run(&settings).await.expect("run");

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].job_name, "widgets");
    assert_eq!(report.summaries[0].job_type, JobType::Maven);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].job, "pipeline");
    assert!(matches!(report.failures[0].error, JobError::UnsupportedJobType { .. }));
}

#[tokio::test]
async fn test_run_fails_for_missing_filesystem_root() {
    let settings = Settings {
        source: SourceSettings::Filesystem {
            root: "/definitely/not/a/jenkins/home".into(),
            config_file_name: "config.xml".into(),
        },
        retry: RetryPolicy::none(),
    };

    let err = jenkins_summary::run(&settings).await.unwrap_err();
    assert!(err.to_string().contains("Failed to discover jobs"), "got: {err}");
}

#[test]
fn test_init_tracing_is_idempotent() {
    jenkins_summary::telemetry::init_tracing();
    jenkins_summary::telemetry::init_tracing();
}
