//! Issue and critique records produced by review stages.
//!
//! A critic examines a proposal and returns a [`CommitteeCritique`]: the
//! issues it found, the patches that would resolve them, the metrics it saw,
//! and its own approve/reject verdict.
//!
//! ## Example
//!
//! ```
//! use brigade::model::{CommitteeIssue, IssueSeverity};
//!
//! let issue = CommitteeIssue::new(
//!     "risk-under-order-flour",
//!     "under_order",
//!     IssueSeverity::Critical,
//!     "Flour plans 70.0 kg against a buffered minimum of 110.0",
//! )
//! .blocking()
//! .with_affected(["flour"]);
//!
//! assert!(issue.blocking);
//! assert!(issue.severity.is_critical());
//! ```

use crate::metrics::CommitteeMetrics;
use crate::model::patch::CommitteePatch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity classification for critique issues.
///
/// Severities are ordered from most to least critical.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Hard problem: the plan is wrong as written.
    Critical,
    /// Should be addressed, but the plan is workable.
    #[default]
    Warning,
    /// Observation for the audit trail.
    Info,
}

impl IssueSeverity {
    /// Check if this severity is critical.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }

    /// Check if this severity is actionable (critical or warning).
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Critical | Self::Warning)
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        write!(f, "{}", s)
    }
}

/// A single issue identified by a critic.
///
/// `blocking` issues force the run to `needs_human_review` unless a hard
/// constraint has already blocked it outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeIssue {
    pub id: String,
    /// Stable machine-readable code ("under_order", "excess_waste", ...).
    pub code: String,
    pub message: String,
    pub severity: IssueSeverity,
    #[serde(default)]
    pub blocking: bool,
    /// Ids of the demand items / orders / tasks this issue concerns.
    #[serde(default)]
    pub affected_ids: Vec<String>,
}

impl CommitteeIssue {
    /// Create a non-blocking issue.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        severity: IssueSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            message: message.into(),
            severity,
            blocking: false,
            affected_ids: Vec::new(),
        }
    }

    /// Mark this issue as blocking.
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    /// Attach the ids of the entities this issue concerns.
    pub fn with_affected<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for CommitteeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)?;
        if self.blocking {
            write!(f, " (blocking)")?;
        }
        Ok(())
    }
}

/// Complete output from one critic reviewing a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeCritique {
    pub agent_id: String,
    pub agent_name: String,
    #[serde(default)]
    pub issues: Vec<CommitteeIssue>,
    /// Patches that would resolve the issues, in application order.
    #[serde(default)]
    pub fixes: Vec<CommitteePatch>,
    /// Metrics computed on the proposal as the critic saw it (unpatched).
    pub metrics: CommitteeMetrics,
    /// The critic's own verdict: no blocking issues and hard constraints
    /// pass.
    pub approve: bool,
}

impl CommitteeCritique {
    /// Check if any issue in this critique is blocking.
    pub fn has_blocking_issues(&self) -> bool {
        self.issues.iter().any(|i| i.blocking)
    }

    /// Get all blocking issues.
    pub fn blocking_issues(&self) -> Vec<&CommitteeIssue> {
        self.issues.iter().filter(|i| i.blocking).collect()
    }

    /// Get the count of issues at a given severity.
    pub fn count_by_severity(&self, severity: IssueSeverity) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn critique_with(issues: Vec<CommitteeIssue>) -> CommitteeCritique {
        CommitteeCritique {
            agent_id: "risk".to_string(),
            agent_name: "Risk Reviewer".to_string(),
            issues,
            fixes: Vec::new(),
            metrics: CommitteeMetrics::default(),
            approve: false,
        }
    }

    #[test]
    fn severity_ordering_puts_critical_first() {
        assert!(IssueSeverity::Critical < IssueSeverity::Warning);
        assert!(IssueSeverity::Warning < IssueSeverity::Info);
    }

    #[test]
    fn severity_predicates() {
        assert!(IssueSeverity::Critical.is_critical());
        assert!(IssueSeverity::Critical.is_actionable());
        assert!(IssueSeverity::Warning.is_actionable());
        assert!(!IssueSeverity::Info.is_actionable());
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&IssueSeverity::Critical).unwrap(),
            "\"critical\""
        );
        let back: IssueSeverity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(back, IssueSeverity::Warning);
    }

    #[test]
    fn issue_builder_defaults_to_non_blocking() {
        let issue = CommitteeIssue::new("i-1", "qc_risk", IssueSeverity::Warning, "gate hot");
        assert!(!issue.blocking);
        assert!(issue.affected_ids.is_empty());

        let blocking = issue.blocking().with_affected(["gate-7"]);
        assert!(blocking.blocking);
        assert_eq!(blocking.affected_ids, vec!["gate-7".to_string()]);
    }

    #[test]
    fn issue_display_flags_blocking() {
        let issue =
            CommitteeIssue::new("i-1", "under_order", IssueSeverity::Critical, "short 40 kg")
                .blocking();
        let shown = format!("{issue}");
        assert!(shown.contains("critical"));
        assert!(shown.contains("under_order"));
        assert!(shown.contains("(blocking)"));
    }

    #[test]
    fn critique_blocking_helpers() {
        let critique = critique_with(vec![
            CommitteeIssue::new("i-1", "under_order", IssueSeverity::Critical, "short").blocking(),
            CommitteeIssue::new("i-2", "excess_waste", IssueSeverity::Warning, "heavy"),
        ]);
        assert!(critique.has_blocking_issues());
        assert_eq!(critique.blocking_issues().len(), 1);
        assert_eq!(critique.count_by_severity(IssueSeverity::Warning), 1);

        let clean = critique_with(Vec::new());
        assert!(!clean.has_blocking_issues());
    }

    #[test]
    fn critique_serialization_round_trips() {
        let critique = critique_with(vec![CommitteeIssue::new(
            "i-1",
            "shelf_life",
            IssueSeverity::Critical,
            "below minimum",
        )
        .blocking()]);
        let json = serde_json::to_string(&critique).unwrap();
        let back: CommitteeCritique = serde_json::from_str(&json).unwrap();
        assert_eq!(back, critique);
    }
}
