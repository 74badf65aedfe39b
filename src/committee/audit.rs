//! Decision and audit-trail records for a committee run.
//!
//! Every pipeline stage appends a complete, independently cloned snapshot,
//! so a consumer can replay exactly what each critic saw and what the
//! proposal looked like after its fixes were applied.

use crate::committee::status::DecisionStatus;
use crate::config::CommitteeContext;
use crate::metrics::{CommitteeMetrics, HardConstraintReport};
use crate::model::{CommitteeCritique, CommitteeProposal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal state of a run: the patched proposal, its metrics, every
/// critique, and the hard-constraint gate outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeDecision {
    pub status: DecisionStatus,
    pub final_proposal: CommitteeProposal,
    pub metrics: CommitteeMetrics,
    pub critiques: Vec<CommitteeCritique>,
    pub hard_constraints: HardConstraintReport,
}

/// One audit-trail snapshot, taken after a pipeline stage completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeRunAuditEntry {
    /// The working proposal as of this stage.
    pub proposal: CommitteeProposal,
    /// All critiques recorded up to and including this stage.
    pub critiques: Vec<CommitteeCritique>,
    pub metrics: CommitteeMetrics,
    pub status: DecisionStatus,
    pub timestamp: DateTime<Utc>,
}

impl CommitteeRunAuditEntry {
    pub fn new(
        proposal: CommitteeProposal,
        critiques: Vec<CommitteeCritique>,
        metrics: CommitteeMetrics,
        status: DecisionStatus,
    ) -> Self {
        Self {
            proposal,
            critiques,
            metrics,
            status,
            timestamp: Utc::now(),
        }
    }
}

/// Everything a run produced, returned to the caller. Persistence, if any,
/// is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeRunResult {
    pub run_id: Uuid,
    pub context: CommitteeContext,
    /// The planner's untouched seed, for diffing against the final
    /// proposal.
    pub initial_proposal: CommitteeProposal,
    pub decision: CommitteeDecision,
    pub audit: Vec<CommitteeRunAuditEntry>,
}

impl CommitteeRunResult {
    pub fn final_status(&self) -> DecisionStatus {
        self.decision.status
    }

    /// Number of pipeline stages recorded, including the terminal entry.
    pub fn stage_count(&self) -> usize {
        self.audit.len()
    }

    /// Spend drift between the planner's seed and the final proposal, as a
    /// fraction of the seed spend.
    pub fn spend_delta_pct(&self) -> f64 {
        let initial = self.initial_proposal.total_spend();
        (self.decision.final_proposal.total_spend() - initial).abs() / initial.max(1.0)
    }
}
