//! The committee orchestrator: Planner -> Risk -> (History) -> resolution.
//!
//! Stages run strictly in sequence because each critic must see the
//! previous critic's already-applied patches. The orchestrator holds no
//! shared mutable state (every stage works on its own snapshot), so
//! concurrent runs against different inputs need no locking.
//!
//! ## Usage
//!
//! ```no_run
//! use brigade::committee::generate_committee_plan;
//! use brigade::config::{CommitteeMode, ContextOptions};
//! use brigade::model::CommitteeInputs;
//!
//! # async fn example() -> Result<(), brigade::CommitteeError> {
//! let inputs = CommitteeInputs::default();
//! let result =
//!     generate_committee_plan(&inputs, ContextOptions::new(CommitteeMode::Dual)).await?;
//!
//! println!("run {} resolved {}", result.run_id, result.final_status());
//! for entry in &result.audit {
//!     println!("  {} at {}", entry.status, entry.timestamp);
//! }
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod status;

pub use audit::{CommitteeDecision, CommitteeRunAuditEntry, CommitteeRunResult};
pub use status::{DecisionStatus, required_approvals, resolve_status};

use crate::config::{CommitteeContext, CommitteeMode, ContextOptions, create_committee_context};
use crate::critics::{CriticAgent, HeuristicPlanner, HistoryAgent, PlannerAgent, RiskAgent};
use crate::errors::CommitteeError;
use crate::metrics::{CommitteeMetrics, compute_metrics, evaluate_hard_constraints};
use crate::model::{
    CommitteeCritique, CommitteeInputs, CommitteeIssue, CommitteeProposal, IssueSeverity,
};
use crate::patch::apply_patches;
use tracing::{info, warn};
use uuid::Uuid;

/// Run the full committee pipeline with the default agents.
///
/// Convenience wrapper: resolves the context from `options` and delegates
/// to [`CommitteeOrchestrator::run`].
pub async fn generate_committee_plan(
    inputs: &CommitteeInputs,
    options: ContextOptions,
) -> Result<CommitteeRunResult, CommitteeError> {
    let context = create_committee_context(options)?;
    CommitteeOrchestrator::new().run(inputs, context).await
}

/// Sequences the pipeline and resolves the final decision.
///
/// Holds the planner and critic strategies; each is replaceable through the
/// `with_*` builders, so new critics plug in without touching the
/// sequencing or resolution logic.
pub struct CommitteeOrchestrator {
    planner: Box<dyn PlannerAgent>,
    risk: Box<dyn CriticAgent>,
    history: Box<dyn CriticAgent>,
}

impl Default for CommitteeOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitteeOrchestrator {
    /// Orchestrator with the built-in strategies.
    pub fn new() -> Self {
        Self {
            planner: Box::new(HeuristicPlanner),
            risk: Box::new(RiskAgent),
            history: Box::new(HistoryAgent),
        }
    }

    /// Replace the planning strategy.
    pub fn with_planner(mut self, planner: Box<dyn PlannerAgent>) -> Self {
        self.planner = planner;
        self
    }

    /// Replace the risk critic.
    pub fn with_risk_critic(mut self, critic: Box<dyn CriticAgent>) -> Self {
        self.risk = critic;
        self
    }

    /// Replace the history critic.
    pub fn with_history_critic(mut self, critic: Box<dyn CriticAgent>) -> Self {
        self.history = critic;
        self
    }

    /// Execute one full run: plan, critique, patch, resolve, audit.
    ///
    /// There is no cycle and no retry; re-review requires a fresh
    /// invocation with updated inputs. Agent failures propagate with no
    /// partial result; a critic timeout instead becomes a blocking
    /// `critic_timeout` issue in the audit trail.
    pub async fn run(
        &self,
        inputs: &CommitteeInputs,
        context: CommitteeContext,
    ) -> Result<CommitteeRunResult, CommitteeError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, mode = %context.mode, "committee run starting");

        let timeout = context.policy.critic_timeout();
        let planned = match tokio::time::timeout(timeout, self.planner.plan(inputs, &context)).await
        {
            Err(_) => {
                return Err(CommitteeError::AgentTimeout {
                    agent: self.planner.agent_id().to_string(),
                    timeout_secs: context.policy.critic_timeout_secs,
                });
            }
            Ok(Err(source)) => {
                return Err(CommitteeError::AgentFailed {
                    agent: self.planner.agent_id().to_string(),
                    source,
                });
            }
            Ok(Ok(planned)) => planned,
        };

        let planner_metrics = planned.metrics;
        let initial_proposal = planned.proposal.clone();
        let mut working = planned.proposal;
        let mut critiques: Vec<CommitteeCritique> = Vec::new();
        let mut trail = vec![CommitteeRunAuditEntry::new(
            working.clone(),
            Vec::new(),
            planner_metrics.clone(),
            DecisionStatus::Approved,
        )];

        if context.mode != CommitteeMode::Single {
            self.critic_stage(
                self.risk.as_ref(),
                inputs,
                &context,
                &mut working,
                &mut critiques,
                &mut trail,
            )
            .await?;
        }

        if context.mode == CommitteeMode::Triple && context.policy.use_history_agent {
            self.critic_stage(
                self.history.as_ref(),
                inputs,
                &context,
                &mut working,
                &mut critiques,
                &mut trail,
            )
            .await?;
        }

        let final_metrics = compute_metrics(&working, &context);
        let hard_constraints = evaluate_hard_constraints(&working, &final_metrics, &context);
        let status = resolve_status(
            &hard_constraints,
            &critiques,
            &context,
            &planner_metrics,
            &final_metrics,
        );
        trail.push(CommitteeRunAuditEntry::new(
            working.clone(),
            critiques.clone(),
            final_metrics.clone(),
            status,
        ));
        info!(%run_id, %status, critiques = critiques.len(), "committee run resolved");

        Ok(CommitteeRunResult {
            run_id,
            context,
            initial_proposal,
            decision: CommitteeDecision {
                status,
                final_proposal: working,
                metrics: final_metrics,
                critiques,
                hard_constraints,
            },
            audit: trail,
        })
    }

    /// Run one critic: critique the working proposal, apply its fixes, and
    /// append the stage snapshot. A stage whose critic declines to review
    /// leaves no trace.
    async fn critic_stage(
        &self,
        critic: &dyn CriticAgent,
        inputs: &CommitteeInputs,
        context: &CommitteeContext,
        working: &mut CommitteeProposal,
        critiques: &mut Vec<CommitteeCritique>,
        trail: &mut Vec<CommitteeRunAuditEntry>,
    ) -> Result<(), CommitteeError> {
        let timeout = context.policy.critic_timeout();
        let critique =
            match tokio::time::timeout(timeout, critic.critique(working, inputs, context)).await {
                Err(_) => {
                    warn!(
                        agent = critic.agent_id(),
                        timeout_secs = context.policy.critic_timeout_secs,
                        "critic timed out; recording a blocking timeout issue"
                    );
                    Some(timeout_critique(
                        critic,
                        compute_metrics(working, context),
                        context.policy.critic_timeout_secs,
                    ))
                }
                Ok(Err(source)) => {
                    return Err(CommitteeError::AgentFailed {
                        agent: critic.agent_id().to_string(),
                        source,
                    });
                }
                Ok(Ok(critique)) => critique,
            };
        let Some(mut critique) = critique else {
            info!(agent = critic.agent_id(), "critic declined to review; stage skipped");
            return Ok(());
        };

        let outcome = apply_patches(std::mem::take(working), &critique.fixes, context);
        *working = outcome.proposal;
        for skipped in &outcome.skipped {
            warn!(
                agent = critic.agent_id(),
                index = skipped.index,
                reason = %skipped.reason,
                "proposed fix was dropped"
            );
            critique.issues.push(CommitteeIssue::new(
                format!("{}-patch-dropped-{}", critic.agent_id(), skipped.index),
                "patch_dropped",
                IssueSeverity::Info,
                format!(
                    "proposed fix #{} ({}) was dropped: {}",
                    skipped.index,
                    skipped.patch.describe(),
                    skipped.reason
                ),
            ));
        }

        let stage_status = if critique.approve {
            DecisionStatus::Approved
        } else {
            DecisionStatus::NeedsHumanReview
        };
        critiques.push(critique);
        trail.push(CommitteeRunAuditEntry::new(
            working.clone(),
            critiques.clone(),
            compute_metrics(working, context),
            stage_status,
        ));
        Ok(())
    }
}

/// Synthetic critique recorded when a critic misses its deadline: one
/// critical, blocking issue and an automatic rejection.
fn timeout_critique(
    critic: &dyn CriticAgent,
    metrics: CommitteeMetrics,
    timeout_secs: u64,
) -> CommitteeCritique {
    CommitteeCritique {
        agent_id: critic.agent_id().to_string(),
        agent_name: critic.agent_name().to_string(),
        issues: vec![
            CommitteeIssue::new(
                format!("{}-timeout", critic.agent_id()),
                "critic_timeout",
                IssueSeverity::Critical,
                format!(
                    "{} did not answer within {}s; its review is missing",
                    critic.agent_name(),
                    timeout_secs
                ),
            )
            .blocking(),
        ],
        fixes: Vec::new(),
        metrics,
        approve: false,
    }
}
