//! Schema-aware decoders for the supported job configuration documents.
//!
//! Both job types embed the same Git SCM block:
//!
//! ```xml
//! <scm class="hudson.plugins.git.GitSCM">
//!   <userRemoteConfigs>
//!     <hudson.plugins.git.UserRemoteConfig><url>ssh://host/repo.git</url></hudson.plugins.git.UserRemoteConfig>
//!   </userRemoteConfigs>
//!   <branches>
//!     <hudson.plugins.git.BranchSpec><name>*/develop</name></hudson.plugins.git.BranchSpec>
//!   </branches>
//! </scm>
//! ```
//!
//! Elements the decoders do not know about are ignored.

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{root_element_name, JobType, FREESTYLE_ROOT, MAVEN_ROOT};
use crate::error::{JobError, ParseError};

const REMOTE_CONFIG: &str = "hudson.plugins.git.UserRemoteConfig";
const BRANCH_SPEC: &str = "hudson.plugins.git.BranchSpec";
const REDEPLOY_PUBLISHER: &str = "hudson.maven.RedeployPublisher";

/// Source-control metadata, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmInfo {
    /// The `class` attribute of `<scm>`, e.g. `hudson.plugins.git.GitSCM`.
    pub class: Option<String>,
    pub remote_urls: Vec<String>,
    pub branches: Vec<String>,
}

/// Maven coordinates of the root module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootModule {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
}

/// Decoded `<maven2-moduleset>` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenJobConfig {
    pub scm: ScmInfo,
    pub root_module: Option<RootModule>,
    pub redeploy_urls: Vec<String>,
}

/// Decoded `<project>` (freestyle) job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreestyleJobConfig {
    pub scm: ScmInfo,
}

/// A decoded job configuration, one variant per supported schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobConfig {
    Maven(MavenJobConfig),
    Freestyle(FreestyleJobConfig),
}

impl JobConfig {
    pub fn job_type(&self) -> JobType {
        match self {
            JobConfig::Maven(_) => JobType::Maven,
            JobConfig::Freestyle(_) => JobType::Freestyle,
        }
    }

    pub fn scm(&self) -> &ScmInfo {
        match self {
            JobConfig::Maven(maven) => &maven.scm,
            JobConfig::Freestyle(freestyle) => &freestyle.scm,
        }
    }
}

impl MavenJobConfig {
    pub fn from_xml(document: &[u8]) -> Result<Self, ParseError> {
        let text = document_text(document)?;
        let doc = Document::parse(text)?;
        let root = expect_root(&doc, MAVEN_ROOT)?;

        let root_module = child(root, "rootModule").map(|module| RootModule {
            group_id: child_text(module, "groupId"),
            artifact_id: child_text(module, "artifactId"),
        });
        let redeploy_urls = child(root, "publishers")
            .map(|publishers| {
                children(publishers, REDEPLOY_PUBLISHER)
                    .filter_map(|publisher| child_text(publisher, "url"))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            scm: decode_scm(root, MAVEN_ROOT)?,
            root_module,
            redeploy_urls,
        })
    }
}

impl FreestyleJobConfig {
    pub fn from_xml(document: &[u8]) -> Result<Self, ParseError> {
        let text = document_text(document)?;
        let doc = Document::parse(text)?;
        let root = expect_root(&doc, FREESTYLE_ROOT)?;
        Ok(Self {
            scm: decode_scm(root, FREESTYLE_ROOT)?,
        })
    }
}

/// Classifies `document` and runs the matching decoder.
///
/// Documents whose root is neither Maven nor freestyle fail with
/// [`JobError::UnsupportedJobType`].
pub fn decode(document: &[u8]) -> Result<JobConfig, JobError> {
    let root = root_element_name(document)?;
    let job_type = JobType::from_root(&root);
    debug!(%job_type, root = %root, "Classified job configuration");

    match job_type {
        JobType::Maven => Ok(JobConfig::Maven(MavenJobConfig::from_xml(document)?)),
        JobType::Freestyle => Ok(JobConfig::Freestyle(FreestyleJobConfig::from_xml(document)?)),
        JobType::Unknown => Err(JobError::UnsupportedJobType { root }),
    }
}

/// UTF-8 view of the document with leading whitespace removed, since job
/// configurations served over HTTP often start with a blank line before the
/// XML declaration.
fn document_text(document: &[u8]) -> Result<&str, ParseError> {
    Ok(crate::classify::strip_padding(std::str::from_utf8(document)?))
}

fn expect_root<'a, 'input>(
    doc: &'a Document<'input>,
    expected: &'static str,
) -> Result<Node<'a, 'input>, ParseError> {
    let root = doc.root_element();
    let found = root.tag_name().name();
    if found != expected {
        return Err(ParseError::UnexpectedRoot {
            expected,
            found: found.to_string(),
        });
    }
    Ok(root)
}

fn decode_scm(root: Node, root_name: &'static str) -> Result<ScmInfo, ParseError> {
    let scm = child(root, "scm").ok_or(ParseError::MissingElement {
        element: "scm",
        parent: root_name,
    })?;

    let remote_urls = match child(scm, "userRemoteConfigs") {
        Some(configs) => children(configs, REMOTE_CONFIG)
            .map(|config| required_text(config, "url", REMOTE_CONFIG))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let branches = match child(scm, "branches") {
        Some(branches) => children(branches, BRANCH_SPEC)
            .map(|spec| required_text(spec, "name", BRANCH_SPEC))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(ScmInfo {
        class: scm.attribute("class").map(str::to_string),
        remote_urls,
        branches,
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// Text content of a child element; an empty element yields an empty string.
fn child_text(node: Node, name: &str) -> Option<String> {
    child(node, name).map(|n| n.text().unwrap_or_default().to_string())
}

fn required_text(node: Node, name: &'static str, parent: &'static str) -> Result<String, ParseError> {
    child_text(node, name).ok_or(ParseError::MissingElement {
        element: name,
        parent,
    })
}
