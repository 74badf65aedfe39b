//! Typed error hierarchy for the committee engine.
//!
//! Constraint violations and critique issues are *data*, not errors: they
//! live in [`crate::metrics::HardConstraintReport`] and
//! [`crate::model::CommitteeIssue`]. `CommitteeError` covers the cases that
//! genuinely abort a run or reject a configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the committee pipeline and its configuration layer.
#[derive(Debug, Error)]
pub enum CommitteeError {
    /// An agent invocation failed. Propagated to the caller with no partial
    /// result.
    #[error("Agent '{agent}' failed: {source}")]
    AgentFailed {
        agent: String,
        #[source]
        source: anyhow::Error,
    },

    /// The planner did not answer within the policy timeout. Critic timeouts
    /// do not abort the run; they are recorded as blocking critique issues.
    #[error("Agent '{agent}' timed out after {timeout_secs}s")]
    AgentTimeout { agent: String, timeout_secs: u64 },

    #[error("Failed to read policy file at {path}: {source}")]
    PolicyLoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse policy file at {path}: {source}")]
    PolicyParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid policy: {message}")]
    InvalidPolicy { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_failed_carries_agent_and_source() {
        let err = CommitteeError::AgentFailed {
            agent: "risk".to_string(),
            source: anyhow::anyhow!("model unavailable"),
        };
        match &err {
            CommitteeError::AgentFailed { agent, .. } => assert_eq!(agent, "risk"),
            _ => panic!("Expected AgentFailed variant"),
        }
        assert!(err.to_string().contains("risk"));
        assert!(err.to_string().contains("model unavailable"));
    }

    #[test]
    fn agent_timeout_carries_seconds() {
        let err = CommitteeError::AgentTimeout {
            agent: "planner".to_string(),
            timeout_secs: 120,
        };
        assert!(err.to_string().contains("120"));
        assert!(matches!(err, CommitteeError::AgentTimeout { .. }));
    }

    #[test]
    fn policy_load_failed_carries_path() {
        let err = CommitteeError::PolicyLoadFailed {
            path: PathBuf::from("/etc/committee.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        match &err {
            CommitteeError::PolicyLoadFailed { path, source } => {
                assert_eq!(path, &PathBuf::from("/etc/committee.toml"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected PolicyLoadFailed"),
        }
    }

    #[test]
    fn all_variants_implement_std_error() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        let err = CommitteeError::InvalidPolicy {
            message: "quorum out of range".to_string(),
        };
        assert_std_error(&err);
        assert!(err.to_string().contains("quorum out of range"));
    }
}
