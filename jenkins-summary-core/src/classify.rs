//! Job-type detection from the root element of a configuration document.
//!
//! The document is tokenized only up to the end of the root start tag: the XML
//! declaration, comments, processing instructions and a doctype are skipped.
//! Nothing after the root start tag is read, so a broken section further down
//! cannot change the outcome.

use serde::{Deserialize, Serialize};
use xmlparser::{ElementEnd, Token, Tokenizer};

use crate::error::ParseError;

/// Root element of a Maven multi-module job.
pub const MAVEN_ROOT: &str = "maven2-moduleset";
/// Root element of a freestyle job.
pub const FREESTYLE_ROOT: &str = "project";

/// Build-system schema a job configuration follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Maven,
    Freestyle,
    Unknown,
}

impl JobType {
    /// Maps a root element local name to a job type.
    pub fn from_root(local_name: &str) -> Self {
        match local_name {
            MAVEN_ROOT => JobType::Maven,
            FREESTYLE_ROOT => JobType::Freestyle,
            _ => JobType::Unknown,
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobType::Maven => "maven",
            JobType::Freestyle => "freestyle",
            JobType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Classifies a raw configuration document by its root element.
pub fn classify(document: &[u8]) -> Result<JobType, ParseError> {
    root_element_name(document).map(|name| JobType::from_root(&name))
}

/// Local name (namespace prefix removed) of the first complete start tag in
/// `document`. The tag must be closed by `>` or `/>` with well-formed attributes.
pub fn root_element_name(document: &[u8]) -> Result<String, ParseError> {
    // Bytes after the root start tag are never inspected, so an encoding error
    // there is only reported when the root was not reached first.
    let (text, utf8_error) = match std::str::from_utf8(document) {
        Ok(text) => (text, None),
        Err(e) => (std::str::from_utf8(&document[..e.valid_up_to()]).unwrap_or(""), Some(e)),
    };
    let not_reached = |fallback: ParseError| match utf8_error {
        Some(e) => ParseError::InvalidUtf8(e),
        None => fallback,
    };

    let mut pending: Option<&str> = None;
    for token in Tokenizer::from(strip_padding(text)) {
        match token.map_err(|e| not_reached(e.into()))? {
            Token::ElementStart { local, .. } => pending = Some(local.as_str()),
            Token::ElementEnd {
                end: ElementEnd::Open | ElementEnd::Empty,
                ..
            } => {
                if let Some(name) = pending {
                    return Ok(name.to_string());
                }
            }
            _ => {}
        }
    }
    Err(not_reached(ParseError::NoRootElement))
}

/// Drops a byte-order mark and the blank lines some servers emit before the XML
/// declaration.
pub(crate) fn strip_padding(text: &str) -> &str {
    text.trim_start_matches('\u{feff}').trim_start()
}
