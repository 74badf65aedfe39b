//! Quantitative risk critic: under-orders, risk thresholds, shelf life,
//! waste ratios, QC gates, and T-24 labor exposure.

use crate::config::CommitteeContext;
use crate::critics::CriticAgent;
use crate::metrics::{
    T24_OVERTIME_RISK_THRESHOLD, compute_metrics, evaluate_hard_constraints, tasks_in_t24_window,
};
use crate::model::{
    CommitteeCritique, CommitteeInputs, CommitteeIssue, CommitteePatch, CommitteeProposal,
    IssueSeverity,
};
use async_trait::async_trait;
use tracing::debug;

/// QC gates scoring above this are called out in a warning.
const QC_RISK_ALERT: f64 = 0.75;

/// Waste volumes at or below this absolute floor are not worth trimming.
const WASTE_QTY_FLOOR: f64 = 0.5;

/// Excess-waste warnings fire at this multiple of the target waste rate.
const WASTE_RATIO_ALERT_FACTOR: f64 = 1.5;

/// Tolerance for float noise in quantity comparisons.
const QTY_TOLERANCE: f64 = 1e-9;

/// The mandatory second critic: checks every demand item against the
/// policy's buffers and thresholds and proposes quantity fixes.
///
/// Metrics and hard constraints in the returned critique describe the
/// proposal as reviewed, before any of the proposed fixes are applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct RiskAgent;

#[async_trait]
impl CriticAgent for RiskAgent {
    fn agent_id(&self) -> &str {
        "risk"
    }

    fn agent_name(&self) -> &str {
        "Risk Reviewer"
    }

    async fn critique(
        &self,
        proposal: &CommitteeProposal,
        _inputs: &CommitteeInputs,
        context: &CommitteeContext,
    ) -> anyhow::Result<Option<CommitteeCritique>> {
        let policy = &context.policy;
        let constraints = &policy.constraints;

        let mut issues: Vec<CommitteeIssue> = Vec::new();
        let mut fixes: Vec<CommitteePatch> = Vec::new();

        for item in &proposal.demand {
            let buffered_min = item.buffered_minimum(constraints.over_order_buffer);

            if item.recommended_qty + QTY_TOLERANCE < buffered_min {
                let shortfall = buffered_min - item.recommended_qty;
                issues.push(
                    CommitteeIssue::new(
                        format!("risk-under-order-{}", item.id),
                        "under_order",
                        IssueSeverity::Critical,
                        format!(
                            "{} plans {:.1} {} against a buffered minimum of {:.1} {}",
                            item.name, item.recommended_qty, item.unit, buffered_min, item.unit
                        ),
                    )
                    .blocking()
                    .with_affected([item.id.as_str()]),
                );
                fixes.push(raise_quantity_patch(
                    proposal,
                    item,
                    item.recommended_qty + shortfall,
                    format!("cover the {:.1} {} shortfall below the buffered minimum", shortfall, item.unit),
                ));
            }

            if item.adjusted_risk > constraints.max_under_order_risk {
                issues.push(
                    CommitteeIssue::new(
                        format!("risk-threshold-{}", item.id),
                        "risk_threshold",
                        IssueSeverity::Critical,
                        format!(
                            "{} carries under-order risk {:.2} above the {:.2} ceiling",
                            item.name, item.adjusted_risk, constraints.max_under_order_risk
                        ),
                    )
                    .blocking()
                    .with_affected([item.id.as_str()]),
                );
                // Never propose a reduction here: the target competes with
                // any under-order fix queued above for the same item.
                let target = (item.required_qty * (constraints.max_under_order_risk + 0.1))
                    .max(buffered_min)
                    .max(item.recommended_qty);
                fixes.push(raise_quantity_patch(
                    proposal,
                    item,
                    target,
                    "buy down the under-order risk".to_string(),
                ));
            }

            if constraints.enforce_shelf_life
                && item
                    .shelf_life_hours
                    .is_some_and(|h| h < constraints.min_shelf_life_hours)
            {
                issues.push(
                    CommitteeIssue::new(
                        format!("risk-shelf-life-{}", item.id),
                        "shelf_life",
                        IssueSeverity::Critical,
                        format!(
                            "{} shelf life is below the {:.0}h minimum; no quantity change can fix this",
                            item.name, constraints.min_shelf_life_hours
                        ),
                    )
                    .blocking()
                    .with_affected([item.id.as_str()]),
                );
            }

            if item.recommended_qty > 0.0 {
                let waste_ratio = item.projected_waste_qty / item.recommended_qty;
                if waste_ratio > WASTE_RATIO_ALERT_FACTOR * policy.target_waste_pct
                    && item.projected_waste_qty > WASTE_QTY_FLOOR
                {
                    issues.push(
                        CommitteeIssue::new(
                            format!("risk-waste-{}", item.id),
                            "excess_waste",
                            IssueSeverity::Warning,
                            format!(
                                "{} projects {:.1} {} waste ({:.0}% of the recommendation, target {:.0}%)",
                                item.name,
                                item.projected_waste_qty,
                                item.unit,
                                waste_ratio * 100.0,
                                policy.target_waste_pct * 100.0
                            ),
                        )
                        .with_affected([item.id.as_str()]),
                    );
                    fixes.push(trim_quantity_patch(proposal, item, buffered_min));
                }
            }
        }

        let hot_gates: Vec<&str> = proposal
            .quality
            .iter()
            .filter(|g| g.risk_score > QC_RISK_ALERT)
            .map(|g| g.id.as_str())
            .collect();
        if !hot_gates.is_empty() {
            issues.push(
                CommitteeIssue::new(
                    "risk-qc-gates",
                    "qc_risk",
                    IssueSeverity::Warning,
                    format!(
                        "{} QC gate(s) score above {:.2}",
                        hot_gates.len(),
                        QC_RISK_ALERT
                    ),
                )
                .with_affected(hot_gates),
            );
        }

        if constraints.enforce_t24_lock {
            let locked: Vec<&str> = tasks_in_t24_window(proposal, context)
                .into_iter()
                .filter(|t| t.overtime_risk > T24_OVERTIME_RISK_THRESHOLD)
                .map(|t| t.id.as_str())
                .collect();
            if !locked.is_empty() {
                issues.push(
                    CommitteeIssue::new(
                        "risk-t24-overtime",
                        "t24_overtime",
                        IssueSeverity::Warning,
                        format!(
                            "{} prep task(s) inside the T-24 lock window carry overtime risk above {:.2}",
                            locked.len(),
                            T24_OVERTIME_RISK_THRESHOLD
                        ),
                    )
                    .with_affected(locked),
                );
            }
        }

        let metrics = compute_metrics(proposal, context);
        let hard = evaluate_hard_constraints(proposal, &metrics, context);
        let approve = !issues.iter().any(|i| i.blocking) && hard.passed;
        debug!(
            issues = issues.len(),
            fixes = fixes.len(),
            approve,
            "risk critique complete"
        );

        Ok(Some(CommitteeCritique {
            agent_id: self.agent_id().to_string(),
            agent_name: self.agent_name().to_string(),
            issues,
            fixes,
            metrics,
            approve,
        }))
    }
}

/// Patch raising an item's effective recommendation to `target_recommended`.
///
/// Targets the item's first purchase-order line when one exists, otherwise
/// the demand recommendation itself.
fn raise_quantity_patch(
    proposal: &CommitteeProposal,
    item: &crate::model::DemandPlanItem,
    target_recommended: f64,
    reason: String,
) -> CommitteePatch {
    match proposal.find_line_for_item(&item.id) {
        Some((order, line)) => {
            let delta = (target_recommended - item.recommended_qty).max(0.0);
            CommitteePatch::AdjustPurchaseOrderQuantity {
                purchase_order_id: order.id.clone(),
                line_id: line.id.clone(),
                new_qty: line.qty + delta,
                reason,
            }
        }
        None => CommitteePatch::AdjustDemandRecommendation {
            demand_id: item.id.clone(),
            new_recommended_qty: target_recommended,
            new_under_order_risk: None,
            reason,
        },
    }
}

/// Patch trimming an item's effective recommendation down to
/// `target_recommended` (the applicator keeps it at or above the required
/// quantity).
fn trim_quantity_patch(
    proposal: &CommitteeProposal,
    item: &crate::model::DemandPlanItem,
    target_recommended: f64,
) -> CommitteePatch {
    let reason = format!(
        "trim {} back to the buffered minimum to cut projected waste",
        item.name
    );
    match proposal.find_line_for_item(&item.id) {
        Some((order, line)) => {
            let excess = (item.recommended_qty - target_recommended).max(0.0);
            CommitteePatch::AdjustPurchaseOrderQuantity {
                purchase_order_id: order.id.clone(),
                line_id: line.id.clone(),
                new_qty: (line.qty - excess).max(0.0),
                reason,
            }
        }
        None => CommitteePatch::AdjustDemandRecommendation {
            demand_id: item.id.clone(),
            new_recommended_qty: target_recommended,
            new_under_order_risk: None,
            reason,
        },
    }
}
