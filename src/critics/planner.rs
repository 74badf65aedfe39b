//! Default planning strategy: seed a proposal from the forecast, the
//! inventory snapshot, and any pre-existing purchase commitments.

use crate::config::CommitteeContext;
use crate::critics::{PlannerAgent, PlannerOutput};
use crate::metrics::compute_metrics;
use crate::model::{
    CommitteeInputs, CommitteeProposal, CommitteePurchaseOrder, CommitteePurchaseOrderLine,
    DemandPlanItem,
};
use crate::patch::{recalc_demand_summaries, sanitize_purchase_orders};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Order id used for the planner's generated draft order.
const DRAFT_ORDER_ID: &str = "po-draft";

/// Deterministic seed planner.
///
/// Carries existing purchase orders over unchanged and drafts one
/// additional order covering each item's buffered shortfall at the forecast
/// unit cost. The returned proposal has been through the shared
/// recalculation, so its derived fields are consistent from the start.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicPlanner;

#[async_trait]
impl PlannerAgent for HeuristicPlanner {
    fn agent_id(&self) -> &str {
        "planner"
    }

    fn agent_name(&self) -> &str {
        "Planner"
    }

    async fn plan(
        &self,
        inputs: &CommitteeInputs,
        context: &CommitteeContext,
    ) -> anyhow::Result<PlannerOutput> {
        let buffer = context.policy.constraints.over_order_buffer;

        let committed: HashMap<&str, f64> = inputs
            .existing_purchase_orders
            .iter()
            .flat_map(|o| &o.lines)
            .fold(HashMap::new(), |mut acc, line| {
                *acc.entry(line.item_id.as_str()).or_insert(0.0) += line.qty;
                acc
            });

        let mut demand = Vec::with_capacity(inputs.demand_forecast.len());
        let mut draft_lines = Vec::new();
        for (idx, forecast) in inputs.demand_forecast.iter().enumerate() {
            let on_hand = inputs.on_hand(&forecast.id);
            let already_committed = committed.get(forecast.id.as_str()).copied().unwrap_or(0.0);
            let target = forecast.required_qty * (1.0 + buffer);
            let shortfall = (target - on_hand - already_committed).max(0.0);
            if shortfall > 0.0 {
                draft_lines.push(CommitteePurchaseOrderLine {
                    id: format!("draft-line-{}", idx + 1),
                    item_id: forecast.id.clone(),
                    qty: shortfall,
                    unit_cost: forecast.unit_cost,
                });
            }

            demand.push(DemandPlanItem {
                id: forecast.id.clone(),
                name: forecast.name.clone(),
                unit: forecast.unit.clone(),
                required_qty: forecast.required_qty,
                on_hand_qty: on_hand,
                recommended_qty: 0.0,
                planned_purchase_qty: 0.0,
                overage_qty: 0.0,
                projected_waste_qty: 0.0,
                projected_waste_cost: 0.0,
                under_order_risk: forecast.under_order_risk,
                adjusted_risk: forecast.under_order_risk,
                shelf_life_hours: forecast.shelf_life_hours,
                waste_cost_per_unit: forecast.waste_cost_per_unit,
            });
        }

        let mut purchase_orders = inputs.existing_purchase_orders.clone();
        if !draft_lines.is_empty() {
            debug!(lines = draft_lines.len(), "drafting supplemental purchase order");
            purchase_orders.push(CommitteePurchaseOrder {
                id: DRAFT_ORDER_ID.to_string(),
                lines: draft_lines,
            });
        }

        let mut proposal = CommitteeProposal {
            demand,
            purchase_orders,
            quality: inputs.quality_gates.clone(),
            prep_tasks: inputs.prep_tasks.clone(),
            notes: Vec::new(),
        };
        sanitize_purchase_orders(&mut proposal);
        recalc_demand_summaries(&mut proposal, &context.policy.constraints);

        let metrics = compute_metrics(&proposal, context);
        Ok(PlannerOutput { proposal, metrics })
    }
}
