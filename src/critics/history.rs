//! History critic: checks the plan against past order outcomes.
//!
//! Where the risk critic reasons from live constraints, this one reasons
//! from what actually happened on previous orders: how much was consumed,
//! how much was thrown away. The heuristic here is a default strategy; any
//! [`CriticAgent`] reasoning over other historical signals can replace it.

use crate::config::CommitteeContext;
use crate::critics::CriticAgent;
use crate::metrics::{compute_metrics, evaluate_hard_constraints};
use crate::model::{
    CommitteeCritique, CommitteeInputs, CommitteeIssue, CommitteePatch, CommitteeProposal,
    IssueSeverity,
};
use async_trait::async_trait;
use tracing::debug;

/// Over-forecast warnings fire when the recommendation exceeds this multiple
/// of the historical ceiling.
const OVER_FORECAST_ALERT_FACTOR: f64 = 1.5;

/// Repeat-waste observations fire at this multiple of the target waste rate.
const WASTE_PATTERN_ALERT_FACTOR: f64 = 2.0;

/// Optional third critic, consulted in triple mode when the policy enables
/// it. Declines to review (returns `None`) when no demand item has any
/// order history.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryAgent;

struct ItemHistory {
    mean_consumed: f64,
    waste_ratio: f64,
}

fn item_history(inputs: &CommitteeInputs, item_id: &str) -> Option<ItemHistory> {
    let mut consumed_sum = 0.0;
    let mut ordered_sum = 0.0;
    let mut waste_sum = 0.0;
    let mut count = 0usize;
    for outcome in inputs.history_for(item_id) {
        consumed_sum += outcome.consumed_qty;
        ordered_sum += outcome.ordered_qty;
        waste_sum += outcome.waste_qty;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(ItemHistory {
        mean_consumed: consumed_sum / count as f64,
        waste_ratio: if ordered_sum > 0.0 {
            waste_sum / ordered_sum
        } else {
            0.0
        },
    })
}

#[async_trait]
impl CriticAgent for HistoryAgent {
    fn agent_id(&self) -> &str {
        "history"
    }

    fn agent_name(&self) -> &str {
        "History Reviewer"
    }

    async fn critique(
        &self,
        proposal: &CommitteeProposal,
        inputs: &CommitteeInputs,
        context: &CommitteeContext,
    ) -> anyhow::Result<Option<CommitteeCritique>> {
        let policy = &context.policy;
        let buffer = policy.constraints.over_order_buffer;

        let mut issues: Vec<CommitteeIssue> = Vec::new();
        let mut fixes: Vec<CommitteePatch> = Vec::new();
        let mut any_history = false;

        for item in &proposal.demand {
            let Some(history) = item_history(inputs, &item.id) else {
                continue;
            };
            any_history = true;

            // What the past says this item actually needs, buffered, but
            // never below the policy's own floor.
            let historical_ceiling = (history.mean_consumed * (1.0 + buffer))
                .max(item.buffered_minimum(buffer));

            if item.recommended_qty > OVER_FORECAST_ALERT_FACTOR * historical_ceiling {
                issues.push(
                    CommitteeIssue::new(
                        format!("history-over-forecast-{}", item.id),
                        "history_over_forecast",
                        IssueSeverity::Warning,
                        format!(
                            "{} plans {:.1} {} but past services consumed {:.1} {} on average",
                            item.name,
                            item.recommended_qty,
                            item.unit,
                            history.mean_consumed,
                            item.unit
                        ),
                    )
                    .with_affected([item.id.as_str()]),
                );
                fixes.push(match proposal.find_line_for_item(&item.id) {
                    Some((order, line)) => {
                        let excess = (item.recommended_qty - historical_ceiling).max(0.0);
                        CommitteePatch::AdjustPurchaseOrderQuantity {
                            purchase_order_id: order.id.clone(),
                            line_id: line.id.clone(),
                            new_qty: (line.qty - excess).max(0.0),
                            reason: format!(
                                "align {} with historical consumption",
                                item.name
                            ),
                        }
                    }
                    None => CommitteePatch::AdjustDemandRecommendation {
                        demand_id: item.id.clone(),
                        new_recommended_qty: historical_ceiling,
                        new_under_order_risk: None,
                        reason: format!("align {} with historical consumption", item.name),
                    },
                });
            }

            if history.waste_ratio > WASTE_PATTERN_ALERT_FACTOR * policy.target_waste_pct
                && item.projected_waste_qty > 0.0
            {
                issues.push(
                    CommitteeIssue::new(
                        format!("history-waste-pattern-{}", item.id),
                        "history_waste_pattern",
                        IssueSeverity::Info,
                        format!(
                            "{} wasted {:.0}% of past orders and this plan still projects overage",
                            item.name,
                            history.waste_ratio * 100.0
                        ),
                    )
                    .with_affected([item.id.as_str()]),
                );
            }
        }

        if !any_history {
            debug!("no order history for any demand item; declining to review");
            return Ok(None);
        }

        let metrics = compute_metrics(proposal, context);
        let hard = evaluate_hard_constraints(proposal, &metrics, context);
        let approve = !issues.iter().any(|i| i.blocking) && hard.passed;
        debug!(issues = issues.len(), approve, "history critique complete");

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommitteeContext;
    use crate::model::{
        CommitteePurchaseOrder, CommitteePurchaseOrderLine, DemandPlanItem, OrderOutcome,
    };
    use crate::patch::apply_patches;

    fn demand_item(id: &str, required: f64, recommended: f64) -> DemandPlanItem {
        DemandPlanItem {
            id: id.to_string(),
            name: id.to_string(),
            unit: "kg".to_string(),
            required_qty: required,
            on_hand_qty: 0.0,
            recommended_qty: recommended,
            planned_purchase_qty: recommended,
            overage_qty: (recommended - required).max(0.0),
            projected_waste_qty: (recommended - required).max(0.0),
            projected_waste_cost: (recommended - required).max(0.0) * 2.0,
            under_order_risk: 0.1,
            adjusted_risk: 0.1,
            shelf_life_hours: None,
            waste_cost_per_unit: 2.0,
        }
    }

    fn order_for(item_id: &str, qty: f64) -> CommitteePurchaseOrder {
        CommitteePurchaseOrder {
            id: format!("po-{item_id}"),
            lines: vec![CommitteePurchaseOrderLine {
                id: format!("l-{item_id}"),
                item_id: item_id.to_string(),
                qty,
                unit_cost: 2.0,
            }],
        }
    }

    fn outcome(item_id: &str, ordered: f64, consumed: f64, waste: f64) -> OrderOutcome {
        OrderOutcome {
            item_id: item_id.to_string(),
            ordered_qty: ordered,
            consumed_qty: consumed,
            waste_qty: waste,
        }
    }

    #[tokio::test]
    async fn declines_without_relevant_history() {
        let proposal = CommitteeProposal {
            demand: vec![demand_item("flour", 100.0, 110.0)],
            ..Default::default()
        };
        let inputs = CommitteeInputs {
            order_history: vec![outcome("butter", 20.0, 20.0, 0.0)],
            ..Default::default()
        };
        let result = HistoryAgent
            .critique(&proposal, &inputs, &CommitteeContext::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn over_forecast_gets_warning_and_trim() {
        // past services consumed ~40, plan recommends 200
        let proposal = CommitteeProposal {
            demand: vec![demand_item("flour", 100.0, 200.0)],
            purchase_orders: vec![order_for("flour", 200.0)],
            ..Default::default()
        };
        let inputs = CommitteeInputs {
            order_history: vec![
                outcome("flour", 50.0, 40.0, 10.0),
                outcome("flour", 45.0, 40.0, 5.0),
            ],
            ..Default::default()
        };
        let context = CommitteeContext::default();
        let result = HistoryAgent
            .critique(&proposal, &inputs, &context)
            .await
            .unwrap()
            .unwrap();

        let over: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.code == "history_over_forecast")
            .collect();
        assert_eq!(over.len(), 1);
        assert!(!over[0].blocking);
        assert_eq!(result.fixes.len(), 1);
        // the approve verdict describes the unpatched proposal
        assert!(result.approve);

        // trimming lands on the policy floor, not on raw history
        let patched = apply_patches(proposal, &result.fixes, &context);
        let item = &patched.proposal.demand[0];
        assert!((item.recommended_qty - 110.0).abs() < 1e-6);
        assert!(item.recommended_qty >= item.required_qty);
    }

    #[tokio::test]
    async fn plan_matching_history_passes_quietly() {
        let proposal = CommitteeProposal {
            demand: vec![demand_item("flour", 100.0, 110.0)],
            purchase_orders: vec![order_for("flour", 110.0)],
            ..Default::default()
        };
        let inputs = CommitteeInputs {
            order_history: vec![outcome("flour", 110.0, 105.0, 5.0)],
            ..Default::default()
        };
        let result = HistoryAgent
            .critique(&proposal, &inputs, &CommitteeContext::default())
            .await
            .unwrap()
            .unwrap();
        assert!(result.issues.is_empty());
        assert!(result.fixes.is_empty());
        assert!(result.approve);
    }

    #[tokio::test]
    async fn repeat_waste_pattern_is_an_info_observation() {
        let proposal = CommitteeProposal {
            demand: vec![demand_item("flour", 100.0, 112.0)],
            purchase_orders: vec![order_for("flour", 112.0)],
            ..Default::default()
        };
        // 30% of past orders wasted, well over 2x the 8% target
        let inputs = CommitteeInputs {
            order_history: vec![outcome("flour", 100.0, 70.0, 30.0)],
            ..Default::default()
        };
        let result = HistoryAgent
            .critique(&proposal, &inputs, &CommitteeContext::default())
            .await
            .unwrap()
            .unwrap();

        let pattern: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.code == "history_waste_pattern")
            .collect();
        assert_eq!(pattern.len(), 1);
        assert_eq!(pattern[0].severity, IssueSeverity::Info);
        assert!(!pattern[0].blocking);
        assert!(result.fixes.is_empty());
    }
}
