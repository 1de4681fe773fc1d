//! SCM shape checks applied before a job is summarised.
//!
//! A job is only supported when it builds exactly one branch of exactly one
//! repository reached over `ssh://`. Anything else is rejected outright rather
//! than approximated by picking a first entry.

use crate::error::ValidationError;
use crate::schema::ScmInfo;

/// Transport prefix a repository URL must carry.
pub const TRUSTED_SCHEME: &str = "ssh://";

/// The single repository and branch of a job that passed validation, verbatim
/// from the document (branch specs such as `*/develop` are not normalised).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedScm {
    pub git_url: String,
    pub branch: String,
}

/// Checks, in order: one branch, one remote, remote uses `ssh://`.
pub fn validate(scm: &ScmInfo) -> Result<ValidatedScm, ValidationError> {
    let [branch] = scm.branches.as_slice() else {
        return Err(ValidationError::AmbiguousBranches {
            count: scm.branches.len(),
        });
    };
    let [git_url] = scm.remote_urls.as_slice() else {
        return Err(ValidationError::AmbiguousRepositories {
            count: scm.remote_urls.len(),
        });
    };
    if !git_url.starts_with(TRUSTED_SCHEME) {
        return Err(ValidationError::UntrustedTransport {
            url: git_url.clone(),
        });
    }

    Ok(ValidatedScm {
        git_url: git_url.clone(),
        branch: branch.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scm(remotes: &[&str], branches: &[&str]) -> ScmInfo {
        ScmInfo {
            class: Some("hudson.plugins.git.GitSCM".into()),
            remote_urls: remotes.iter().map(|s| s.to_string()).collect(),
            branches: branches.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn accepts_single_ssh_remote_and_branch_verbatim() {
        let ok = validate(&scm(&["ssh://example.com/proj/cool.git"], &["*/develop"])).unwrap();
        assert_eq!(ok.git_url, "ssh://example.com/proj/cool.git");
        assert_eq!(ok.branch, "*/develop");
    }

    #[test]
    fn rejects_branch_count_other_than_one() {
        for branches in [&[][..], &["origin/a", "origin/b"][..]] {
            let err = validate(&scm(&["ssh://h/r.git"], branches)).unwrap_err();
            assert_eq!(
                err,
                ValidationError::AmbiguousBranches {
                    count: branches.len()
                }
            );
        }
    }

    #[test]
    fn rejects_remote_count_other_than_one() {
        for remotes in [&[][..], &["ssh://h/a.git", "ssh://h/b.git"][..]] {
            let err = validate(&scm(remotes, &["origin/develop"])).unwrap_err();
            assert_eq!(
                err,
                ValidationError::AmbiguousRepositories {
                    count: remotes.len()
                }
            );
        }
    }

    #[test]
    fn branch_check_runs_before_remote_check() {
        let err = validate(&scm(&[], &[])).unwrap_err();
        assert!(matches!(err, ValidationError::AmbiguousBranches { count: 0 }));
    }

    #[test]
    fn rejects_non_ssh_transports() {
        for url in ["https://example.com/r.git", "git@example.com:r.git", "SSH://h/r.git"] {
            let err = validate(&scm(&[url], &["master"])).unwrap_err();
            assert_eq!(err, ValidationError::UntrustedTransport { url: url.into() });
        }
    }
}
