//! Patch application and derived-state recalculation.
//!
//! [`apply_patches`] applies a critic's fixes in list order, then re-derives
//! every dependent quantity (purchase totals, demand recommendations, waste
//! projections, adjusted risk) so the proposal stays internally consistent.
//! A patch referencing a nonexistent order/line/task/demand id never errors:
//! it is skipped and reported in [`PatchOutcome::skipped`] so dropped fixes
//! stay visible to audit consumers.

use crate::config::{CommitteeContext, ConstraintConfig};
use crate::model::patch::CommitteePatch;
use crate::model::proposal::CommitteeProposal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Shortfalls below this are treated as zero in the shortage heuristic.
const QTY_EPSILON: f64 = 1e-9;

/// A patch that could not be applied because its target does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPatch {
    /// Position of the patch in the submitted batch.
    pub index: usize,
    pub patch: CommitteePatch,
    pub reason: String,
}

/// Result of applying a patch batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub proposal: CommitteeProposal,
    pub skipped: Vec<SkippedPatch>,
}

/// Apply a batch of patches and re-derive all dependent quantities.
///
/// An empty batch returns the proposal unchanged by move: no copy is made
/// and no recalculation runs. Otherwise patches apply in list order; ones
/// with unresolvable references are collected into `skipped` while the rest
/// of the batch still applies. The function is pure: identical arguments
/// produce identical output.
pub fn apply_patches(
    proposal: CommitteeProposal,
    patches: &[CommitteePatch],
    context: &CommitteeContext,
) -> PatchOutcome {
    if patches.is_empty() {
        return PatchOutcome {
            proposal,
            skipped: Vec::new(),
        };
    }

    let mut proposal = proposal;
    let mut skipped = Vec::new();
    for (index, patch) in patches.iter().enumerate() {
        match apply_one(&mut proposal, patch) {
            Ok(()) => debug!(index, patch = %patch, "applied patch"),
            Err(reason) => {
                warn!(index, patch = %patch, %reason, "skipping unapplicable patch");
                skipped.push(SkippedPatch {
                    index,
                    patch: patch.clone(),
                    reason,
                });
            }
        }
    }

    sanitize_purchase_orders(&mut proposal);
    recalc_demand_summaries(&mut proposal, &context.policy.constraints);

    PatchOutcome { proposal, skipped }
}

fn apply_one(proposal: &mut CommitteeProposal, patch: &CommitteePatch) -> Result<(), String> {
    match patch {
        CommitteePatch::AdjustPurchaseOrderQuantity {
            purchase_order_id,
            line_id,
            new_qty,
            ..
        } => {
            let Some(order) = proposal
                .purchase_orders
                .iter_mut()
                .find(|o| o.id == *purchase_order_id)
            else {
                return Err(format!("purchase order '{purchase_order_id}' not found"));
            };
            let Some(line) = order.lines.iter_mut().find(|l| l.id == *line_id) else {
                return Err(format!(
                    "line '{line_id}' not found in purchase order '{purchase_order_id}'"
                ));
            };
            line.qty = new_qty.max(0.0);
            Ok(())
        }
        CommitteePatch::AdjustDemandRecommendation {
            demand_id,
            new_recommended_qty,
            new_under_order_risk,
            ..
        } => {
            let Some(item) = proposal.demand.iter_mut().find(|d| d.id == *demand_id) else {
                return Err(format!("demand item '{demand_id}' not found"));
            };
            item.recommended_qty = new_recommended_qty.max(item.required_qty);
            item.planned_purchase_qty = (item.recommended_qty - item.on_hand_qty).max(0.0);
            item.overage_qty = (item.recommended_qty - item.required_qty).max(0.0);
            item.projected_waste_qty = item.overage_qty;
            item.projected_waste_cost = item.projected_waste_qty * item.waste_cost_per_unit;
            if let Some(risk) = new_under_order_risk {
                item.adjusted_risk = risk.clamp(0.0, 1.0);
            }
            Ok(())
        }
        CommitteePatch::AddNote { note } => {
            proposal.notes.push(note.clone());
            Ok(())
        }
        CommitteePatch::UpdatePrepTaskWindow {
            task_id,
            start_at,
            end_at,
        } => {
            let Some(task) = proposal.prep_tasks.iter_mut().find(|t| t.id == *task_id) else {
                return Err(format!("prep task '{task_id}' not found"));
            };
            task.start_at = *start_at;
            task.end_at = *end_at;
            Ok(())
        }
    }
}

/// Drop zero/negative-quantity lines, then drop orders left with no lines.
pub fn sanitize_purchase_orders(proposal: &mut CommitteeProposal) {
    for order in &mut proposal.purchase_orders {
        order.lines.retain(|l| l.qty > 0.0);
    }
    proposal.purchase_orders.retain(|o| !o.is_empty());
}

/// Re-derive every demand item's dependent fields from the current order
/// book. This is the single source of truth for demand-derived state.
///
/// Items referenced by at least one purchase line take their planned
/// purchase from the order book; items referenced by none keep their
/// current `planned_purchase_qty`, so a demand-recommendation patch can
/// stand for purchases made outside the order book.
pub fn recalc_demand_summaries(proposal: &mut CommitteeProposal, constraints: &ConstraintConfig) {
    let purchased: HashMap<String, f64> = proposal
        .purchase_orders
        .iter()
        .flat_map(|o| &o.lines)
        .fold(HashMap::new(), |mut acc, line| {
            *acc.entry(line.item_id.clone()).or_insert(0.0) += line.qty;
            acc
        });

    for item in &mut proposal.demand {
        let planned = purchased
            .get(&item.id)
            .copied()
            .unwrap_or(item.planned_purchase_qty);
        item.planned_purchase_qty = planned.max(0.0);
        item.recommended_qty = item.on_hand_qty + item.planned_purchase_qty;
        item.overage_qty = (item.recommended_qty - item.required_qty).max(0.0);
        item.projected_waste_qty = item.overage_qty;
        item.projected_waste_cost = item.projected_waste_qty * item.waste_cost_per_unit;

        let shortfall =
            (item.buffered_minimum(constraints.over_order_buffer) - item.recommended_qty).max(0.0);
        item.adjusted_risk = if shortfall <= QTY_EPSILON {
            item.under_order_risk / 2.0
        } else {
            item.under_order_risk + shortfall / (item.required_qty + 1.0)
        }
        .clamp(0.0, 1.0);
    }
}
