//! Caller-supplied inputs to a committee run.
//!
//! The engine never fetches data itself: demand forecasts, the inventory
//! snapshot, pre-existing purchase orders, QC gate states, the prep
//! schedule, and historical order outcomes all arrive assembled by
//! collaborators.

use crate::model::proposal::{CommitteePurchaseOrder, PrepTask, QualityGate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One forecast row: what an item needs for the service window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecastItem {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub required_qty: f64,
    /// Catalog unit cost used when drafting purchase lines.
    pub unit_cost: f64,
    /// Baseline under-order probability for this item, 0-1.
    pub under_order_risk: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf_life_hours: Option<f64>,
    pub waste_cost_per_unit: f64,
}

/// A past order and how it played out; substrate for the history critic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub item_id: String,
    pub ordered_qty: f64,
    pub consumed_qty: f64,
    pub waste_qty: f64,
}

/// Everything a committee run consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitteeInputs {
    pub demand_forecast: Vec<DemandForecastItem>,
    /// Current on-hand quantity keyed by item id.
    #[serde(default)]
    pub inventory: HashMap<String, f64>,
    #[serde(default)]
    pub existing_purchase_orders: Vec<CommitteePurchaseOrder>,
    #[serde(default)]
    pub quality_gates: Vec<QualityGate>,
    #[serde(default)]
    pub prep_tasks: Vec<PrepTask>,
    #[serde(default)]
    pub order_history: Vec<OrderOutcome>,
}

impl CommitteeInputs {
    /// On-hand quantity for an item; zero when the snapshot has no entry.
    pub fn on_hand(&self, item_id: &str) -> f64 {
        self.inventory.get(item_id).copied().unwrap_or(0.0)
    }

    /// Historical outcomes recorded for an item.
    pub fn history_for(&self, item_id: &str) -> impl Iterator<Item = &OrderOutcome> {
        self.order_history.iter().filter(move |o| o.item_id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_hand_defaults_to_zero() {
        let mut inputs = CommitteeInputs::default();
        inputs.inventory.insert("flour".to_string(), 12.5);
        assert_eq!(inputs.on_hand("flour"), 12.5);
        assert_eq!(inputs.on_hand("saffron"), 0.0);
    }

    #[test]
    fn history_for_filters_by_item() {
        let inputs = CommitteeInputs {
            order_history: vec![
                OrderOutcome {
                    item_id: "flour".to_string(),
                    ordered_qty: 100.0,
                    consumed_qty: 90.0,
                    waste_qty: 10.0,
                },
                OrderOutcome {
                    item_id: "butter".to_string(),
                    ordered_qty: 20.0,
                    consumed_qty: 20.0,
                    waste_qty: 0.0,
                },
            ],
            ..Default::default()
        };
        assert_eq!(inputs.history_for("flour").count(), 1);
        assert_eq!(inputs.history_for("saffron").count(), 0);
    }
}
