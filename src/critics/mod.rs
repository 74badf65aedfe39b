//! Critic agent contracts and the built-in strategies.
//!
//! The planner seeds a proposal from raw inputs; critics examine a proposal
//! and return a critique (issues, fixes, metrics, verdict). Both are
//! pluggable: the orchestrator dispatches through these traits, so new
//! strategies slot in without orchestrator changes. Agents must be
//! deterministic given identical inputs.

pub mod history;
pub mod planner;
pub mod risk;

pub use history::HistoryAgent;
pub use planner::HeuristicPlanner;
pub use risk::RiskAgent;

use crate::config::CommitteeContext;
use crate::metrics::CommitteeMetrics;
use crate::model::{CommitteeCritique, CommitteeInputs, CommitteeProposal};
use async_trait::async_trait;

/// Output of a planning stage: the seed proposal plus the metrics the
/// planner computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerOutput {
    pub proposal: CommitteeProposal,
    pub metrics: CommitteeMetrics,
}

/// A strategy that turns raw inputs into an internally consistent seed
/// proposal.
#[async_trait]
pub trait PlannerAgent: Send + Sync {
    fn agent_id(&self) -> &str;
    fn agent_name(&self) -> &str;

    /// Produce the seed proposal. Must be deterministic, and the returned
    /// proposal's demand/purchase-order fields must already satisfy the
    /// recalculation invariants.
    async fn plan(
        &self,
        inputs: &CommitteeInputs,
        context: &CommitteeContext,
    ) -> anyhow::Result<PlannerOutput>;
}

/// A review stage that critiques a proposal and proposes fixes.
#[async_trait]
pub trait CriticAgent: Send + Sync {
    fn agent_id(&self) -> &str;
    fn agent_name(&self) -> &str;

    /// Review a proposal. `Ok(None)` means the critic declines to review
    /// this run (e.g. no relevant history) and its stage is skipped
    /// entirely. Errors propagate and abort the run.
    async fn critique(
        &self,
        proposal: &CommitteeProposal,
        inputs: &CommitteeInputs,
        context: &CommitteeContext,
    ) -> anyhow::Result<Option<CommitteeCritique>>;
}
