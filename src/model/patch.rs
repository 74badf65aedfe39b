//! Typed edit operations critics propose against a proposal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single corrective edit to a [`crate::model::CommitteeProposal`].
///
/// The set of variants is closed so the applicator's dispatch is exhaustive
/// and compiler-checked. Patches are value objects: applying the same patch
/// to the same proposal always produces the same result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommitteePatch {
    /// Set a purchase-order line's quantity (clamped at zero by the
    /// applicator).
    AdjustPurchaseOrderQuantity {
        purchase_order_id: String,
        line_id: String,
        new_qty: f64,
        reason: String,
    },
    /// Raise or trim an item's recommended quantity (never below the
    /// required quantity) and optionally re-pin its baseline risk.
    AdjustDemandRecommendation {
        demand_id: String,
        new_recommended_qty: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_under_order_risk: Option<f64>,
        reason: String,
    },
    /// Append a free-form note to the proposal.
    AddNote { note: String },
    /// Overwrite a prep task's scheduled window.
    UpdatePrepTaskWindow {
        task_id: String,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    },
}

impl CommitteePatch {
    /// Short human-readable description for logs and audit output.
    pub fn describe(&self) -> String {
        match self {
            Self::AdjustPurchaseOrderQuantity {
                purchase_order_id,
                line_id,
                new_qty,
                ..
            } => format!("set {purchase_order_id}/{line_id} qty to {new_qty:.2}"),
            Self::AdjustDemandRecommendation {
                demand_id,
                new_recommended_qty,
                ..
            } => format!("set {demand_id} recommendation to {new_recommended_qty:.2}"),
            Self::AddNote { note } => format!("note: {note}"),
            Self::UpdatePrepTaskWindow { task_id, .. } => {
                format!("reschedule prep task {task_id}")
            }
        }
    }
}

impl fmt::Display for CommitteePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
