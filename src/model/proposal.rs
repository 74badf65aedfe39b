//! The proposal aggregate: demand plan, purchase orders, QC gates, prep
//! tasks, and free-form notes.
//!
//! Derived fields on [`DemandPlanItem`] (`recommended_qty`, `overage_qty`,
//! waste projections, `adjusted_risk`) are only ever written by the patch
//! applicator's recalculation pass; nothing else may set them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingredient/SKU's demand plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPlanItem {
    pub id: String,
    pub name: String,
    /// Unit of measure ("kg", "each", ...).
    pub unit: String,
    /// Immutable requirement for the service window.
    pub required_qty: f64,
    pub on_hand_qty: f64,
    /// Always `on_hand_qty + planned_purchase_qty`; re-derived, never set.
    pub recommended_qty: f64,
    pub planned_purchase_qty: f64,
    /// `max(recommended_qty - required_qty, 0)`.
    pub overage_qty: f64,
    pub projected_waste_qty: f64,
    pub projected_waste_cost: f64,
    /// Baseline under-order probability supplied with the forecast.
    pub under_order_risk: f64,
    /// Recomputed from the shortage heuristic after every patch batch.
    pub adjusted_risk: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf_life_hours: Option<f64>,
    pub waste_cost_per_unit: f64,
}

impl DemandPlanItem {
    /// The minimum quantity this item should plan for, given an over-order
    /// buffer fraction.
    pub fn buffered_minimum(&self, over_order_buffer: f64) -> f64 {
        self.required_qty * (1.0 + over_order_buffer)
    }
}

/// One line of a purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteePurchaseOrderLine {
    pub id: String,
    pub item_id: String,
    pub qty: f64,
    pub unit_cost: f64,
}

impl CommitteePurchaseOrderLine {
    pub fn line_cost(&self) -> f64 {
        self.qty * self.unit_cost
    }
}

/// A purchase order under committee review.
///
/// After any mutation, lines with `qty <= 0` are removed and orders left
/// with zero lines are removed entirely (see
/// [`crate::patch::sanitize_purchase_orders`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteePurchaseOrder {
    pub id: String,
    pub lines: Vec<CommitteePurchaseOrderLine>,
}

impl CommitteePurchaseOrder {
    pub fn total_cost(&self) -> f64 {
        self.lines.iter().map(|l| l.line_cost()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A quality-control gate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGate {
    pub id: String,
    /// Failure risk, 0-1.
    pub risk_score: f64,
}

/// A scheduled prep task with its labor-risk profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepTask {
    pub id: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub labor_hours: f64,
    /// Probability this task runs into overtime, 0-1.
    pub overtime_risk: f64,
}

/// The unit of critique and mutation: a complete purchasing/production plan
/// snapshot.
///
/// Every pipeline stage operates on its own clone so prior audit snapshots
/// stay immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitteeProposal {
    pub demand: Vec<DemandPlanItem>,
    pub purchase_orders: Vec<CommitteePurchaseOrder>,
    pub quality: Vec<QualityGate>,
    pub prep_tasks: Vec<PrepTask>,
    pub notes: Vec<String>,
}

impl CommitteeProposal {
    /// Look up a demand item by id.
    pub fn find_demand(&self, id: &str) -> Option<&DemandPlanItem> {
        self.demand.iter().find(|d| d.id == id)
    }

    /// Total quantity purchased for an item across every order.
    pub fn total_purchased_for(&self, item_id: &str) -> f64 {
        self.purchase_orders
            .iter()
            .flat_map(|o| &o.lines)
            .filter(|l| l.item_id == item_id)
            .map(|l| l.qty)
            .sum()
    }

    /// The first purchase-order line referencing an item, with its order.
    ///
    /// Critics target this line when proposing quantity adjustments.
    pub fn find_line_for_item(
        &self,
        item_id: &str,
    ) -> Option<(&CommitteePurchaseOrder, &CommitteePurchaseOrderLine)> {
        self.purchase_orders.iter().find_map(|order| {
            order
                .lines
                .iter()
                .find(|l| l.item_id == item_id)
                .map(|l| (order, l))
        })
    }

    /// Sum of all purchase-order line costs.
    pub fn total_spend(&self) -> f64 {
        self.purchase_orders.iter().map(|o| o.total_cost()).sum()
    }

    /// Sum of scheduled labor hours across prep tasks.
    pub fn total_labor_hours(&self) -> f64 {
        self.prep_tasks.iter().map(|t| t.labor_hours).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, item_id: &str, qty: f64, unit_cost: f64) -> CommitteePurchaseOrderLine {
        CommitteePurchaseOrderLine {
            id: id.to_string(),
            item_id: item_id.to_string(),
            qty,
            unit_cost,
        }
    }

    fn proposal_with_orders() -> CommitteeProposal {
        CommitteeProposal {
            purchase_orders: vec![
                CommitteePurchaseOrder {
                    id: "po-1".to_string(),
                    lines: vec![line("l-1", "flour", 20.0, 1.5), line("l-2", "butter", 5.0, 8.0)],
                },
                CommitteePurchaseOrder {
                    id: "po-2".to_string(),
                    lines: vec![line("l-3", "flour", 10.0, 1.6)],
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn total_purchased_sums_across_orders() {
        let proposal = proposal_with_orders();
        assert_eq!(proposal.total_purchased_for("flour"), 30.0);
        assert_eq!(proposal.total_purchased_for("butter"), 5.0);
        assert_eq!(proposal.total_purchased_for("saffron"), 0.0);
    }

    #[test]
    fn find_line_returns_first_matching_line() {
        let proposal = proposal_with_orders();
        let (order, found) = proposal.find_line_for_item("flour").unwrap();
        assert_eq!(order.id, "po-1");
        assert_eq!(found.id, "l-1");
        assert!(proposal.find_line_for_item("saffron").is_none());
    }

    #[test]
    fn total_spend_sums_line_costs() {
        let proposal = proposal_with_orders();
        // 20*1.5 + 5*8 + 10*1.6
        assert!((proposal.total_spend() - 86.0).abs() < 1e-9);
    }

    #[test]
    fn buffered_minimum_applies_over_order_buffer() {
        let item = DemandPlanItem {
            id: "flour".to_string(),
            name: "Flour".to_string(),
            unit: "kg".to_string(),
            required_qty: 100.0,
            on_hand_qty: 0.0,
            recommended_qty: 0.0,
            planned_purchase_qty: 0.0,
            overage_qty: 0.0,
            projected_waste_qty: 0.0,
            projected_waste_cost: 0.0,
            under_order_risk: 0.2,
            adjusted_risk: 0.2,
            shelf_life_hours: None,
            waste_cost_per_unit: 1.0,
        };
        assert!((item.buffered_minimum(0.1) - 110.0).abs() < 1e-9);
        assert_eq!(item.buffered_minimum(0.0), 100.0);
    }

    #[test]
    fn proposal_serialization_round_trips() {
        let proposal = proposal_with_orders();
        let json = serde_json::to_string(&proposal).unwrap();
        let back: CommitteeProposal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proposal);
    }
}
