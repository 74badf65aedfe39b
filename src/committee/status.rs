//! Final decision status and the resolution rules.

use crate::config::{CommitteeContext, CommitteeMode};
use crate::metrics::{CommitteeMetrics, HardConstraintReport};
use crate::model::CommitteeCritique;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal state of a committee run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// The plan can proceed as patched.
    Approved,
    /// A human must review: blocking issues, a failed quorum, or an
    /// escalation threshold was crossed.
    NeedsHumanReview,
    /// A hard constraint failed; overrides every critic verdict.
    Blocked,
}

impl DecisionStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }

    pub fn requires_human(&self) -> bool {
        matches!(self, Self::NeedsHumanReview)
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Approved => "approved",
            Self::NeedsHumanReview => "needs_human_review",
            Self::Blocked => "blocked",
        };
        write!(f, "{}", s)
    }
}

/// Number of approving critics required for a committee of `total_critics`.
///
/// # Examples
///
/// ```
/// use brigade::committee::required_approvals;
///
/// assert_eq!(required_approvals(3, 0.67), 2);
/// assert_eq!(required_approvals(2, 0.5), 1);
/// assert_eq!(required_approvals(3, 1.0), 3);
/// ```
pub fn required_approvals(total_critics: usize, quorum: f64) -> usize {
    (total_critics as f64 * quorum).round() as usize
}

/// Resolve the overall run status.
///
/// Rules, in override order: hard-constraint failure blocks; any blocking
/// issue escalates; a missed quorum escalates (skipped when no critiques
/// were recorded); spend or score drifting past the escalation thresholds
/// escalates; otherwise approved.
pub fn resolve_status(
    hard_constraints: &HardConstraintReport,
    critiques: &[CommitteeCritique],
    context: &CommitteeContext,
    planner_metrics: &CommitteeMetrics,
    final_metrics: &CommitteeMetrics,
) -> DecisionStatus {
    if !hard_constraints.passed {
        return DecisionStatus::Blocked;
    }

    if critiques.iter().any(|c| c.has_blocking_issues()) {
        return DecisionStatus::NeedsHumanReview;
    }

    if !critiques.is_empty() {
        let total_critics = match context.mode {
            CommitteeMode::Triple => 3,
            _ => 2,
        };
        let approvals = critiques.iter().filter(|c| c.approve).count();
        if approvals < required_approvals(total_critics, context.policy.quorum) {
            return DecisionStatus::NeedsHumanReview;
        }
    }

    let policy = &context.policy;
    let spend_delta = (final_metrics.total_spend - planner_metrics.total_spend).abs()
        / planner_metrics.total_spend.max(1.0);
    if spend_delta >= policy.escalate_spend_delta_pct {
        return DecisionStatus::NeedsHumanReview;
    }
    if (final_metrics.score - planner_metrics.score).abs() >= policy.escalate_disagreement_score {
        return DecisionStatus::NeedsHumanReview;
    }

    DecisionStatus::Approved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitteeIssue, IssueSeverity};

    fn critique(approve: bool, blocking: bool) -> CommitteeCritique {
        let issues = if blocking {
            vec![
                CommitteeIssue::new("i-1", "under_order", IssueSeverity::Critical, "short")
                    .blocking(),
            ]
        } else {
            Vec::new()
        };
        CommitteeCritique {
            agent_id: "risk".to_string(),
            agent_name: "Risk Reviewer".to_string(),
            issues,
            fixes: Vec::new(),
            metrics: CommitteeMetrics::default(),
            approve,
        }
    }

    fn triple_context(quorum: f64) -> CommitteeContext {
        let mut context = CommitteeContext {
            mode: CommitteeMode::Triple,
            ..Default::default()
        };
        context.policy.quorum = quorum;
        context
    }

    fn passing() -> HardConstraintReport {
        HardConstraintReport::from_violations(Vec::new())
    }

    fn failing() -> HardConstraintReport {
        HardConstraintReport::from_violations(vec!["stockout probability too high".to_string()])
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DecisionStatus::NeedsHumanReview).unwrap(),
            "\"needs_human_review\""
        );
        assert_eq!(format!("{}", DecisionStatus::Blocked), "blocked");
    }

    #[test]
    fn quorum_arithmetic() {
        assert_eq!(required_approvals(3, 0.67), 2);
        assert_eq!(required_approvals(2, 0.67), 1);
        assert_eq!(required_approvals(2, 0.5), 1);
        assert_eq!(required_approvals(3, 1.0), 3);
        assert_eq!(required_approvals(2, 1.0), 2);
    }

    #[test]
    fn hard_failure_blocks_despite_unanimous_approval() {
        let critiques = vec![critique(true, false), critique(true, false)];
        let metrics = CommitteeMetrics::default();
        let status = resolve_status(
            &failing(),
            &critiques,
            &triple_context(0.67),
            &metrics,
            &metrics,
        );
        assert_eq!(status, DecisionStatus::Blocked);
    }

    #[test]
    fn blocked_iff_hard_constraints_failed() {
        let metrics = CommitteeMetrics::default();
        let context = triple_context(0.67);

        let blocked = resolve_status(&failing(), &[], &context, &metrics, &metrics);
        assert!(blocked.is_blocked());

        // even a blocking critique never yields Blocked on its own
        let critiques = vec![critique(false, true)];
        let escalated = resolve_status(&passing(), &critiques, &context, &metrics, &metrics);
        assert_eq!(escalated, DecisionStatus::NeedsHumanReview);
    }

    #[test]
    fn blocking_issue_escalates() {
        let critiques = vec![critique(true, false), critique(false, true)];
        let metrics = CommitteeMetrics::default();
        let status = resolve_status(
            &passing(),
            &critiques,
            &triple_context(0.5),
            &metrics,
            &metrics,
        );
        assert_eq!(status, DecisionStatus::NeedsHumanReview);
    }

    #[test]
    fn two_of_three_approvals_meet_a_067_quorum() {
        let critiques = vec![critique(true, false), critique(true, false)];
        let metrics = CommitteeMetrics::default();
        let status = resolve_status(
            &passing(),
            &critiques,
            &triple_context(0.67),
            &metrics,
            &metrics,
        );
        assert_eq!(status, DecisionStatus::Approved);
    }

    #[test]
    fn one_approval_misses_a_067_quorum_in_triple_mode() {
        let critiques = vec![critique(true, false), critique(false, false)];
        let metrics = CommitteeMetrics::default();
        let status = resolve_status(
            &passing(),
            &critiques,
            &triple_context(0.67),
            &metrics,
            &metrics,
        );
        assert_eq!(status, DecisionStatus::NeedsHumanReview);
    }

    #[test]
    fn quorum_is_skipped_without_critiques() {
        let metrics = CommitteeMetrics::default();
        let status = resolve_status(&passing(), &[], &triple_context(1.0), &metrics, &metrics);
        assert_eq!(status, DecisionStatus::Approved);
    }

    #[test]
    fn spend_drift_escalates() {
        let critiques = vec![critique(true, false), critique(true, false)];
        let planner = CommitteeMetrics {
            total_spend: 1000.0,
            ..Default::default()
        };
        let fin = CommitteeMetrics {
            total_spend: 1200.0,
            ..Default::default()
        };
        // 20% drift over the default 15% threshold
        let status = resolve_status(&passing(), &critiques, &triple_context(0.5), &planner, &fin);
        assert_eq!(status, DecisionStatus::NeedsHumanReview);
    }

    #[test]
    fn score_disagreement_escalates() {
        let critiques = vec![critique(true, false), critique(true, false)];
        let planner = CommitteeMetrics {
            score: 0.2,
            ..Default::default()
        };
        let fin = CommitteeMetrics {
            score: 0.6,
            ..Default::default()
        };
        let status = resolve_status(&passing(), &critiques, &triple_context(0.5), &planner, &fin);
        assert_eq!(status, DecisionStatus::NeedsHumanReview);
    }

    #[test]
    fn quiet_run_is_approved() {
        let critiques = vec![critique(true, false)];
        let metrics = CommitteeMetrics {
            total_spend: 500.0,
            score: 0.3,
            ..Default::default()
        };
        let mut context = CommitteeContext::default();
        context.policy.quorum = 0.5;
        let status = resolve_status(&passing(), &critiques, &context, &metrics, &metrics);
        assert_eq!(status, DecisionStatus::Approved);
    }
}
