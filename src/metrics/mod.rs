//! Pure scoring and hard-constraint evaluation over proposal snapshots.
//!
//! [`compute_metrics`] blends the weighted risk/cost dimensions into a
//! single composite score (lower is better), the scalar compared across
//! critique stages to detect disagreement. [`evaluate_hard_constraints`]
//! is independent of the soft score: its violations are structured strings,
//! and any violation forces the final decision to `blocked` regardless of
//! critic approvals.

use crate::config::CommitteeContext;
use crate::model::proposal::{CommitteeProposal, PrepTask};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Overtime risk above which a prep task inside the T-24 lock window draws
/// scrutiny.
pub const T24_OVERTIME_RISK_THRESHOLD: f64 = 0.25;

/// Quantitative summary of one proposal snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitteeMetrics {
    pub total_spend: f64,
    /// Maximum adjusted risk across demand items, clamped 0-1.
    pub stockout_probability: f64,
    pub projected_waste_cost: f64,
    pub projected_waste_qty: f64,
    pub shelf_life_violations: usize,
    /// Mean QC gate risk score.
    pub quality_risk: f64,
    /// Expected overtime exposure: sum of `overtime_risk * labor_hours`.
    pub overtime_hours: f64,
    /// Weighted composite across all dimensions; lower is better.
    pub score: f64,
}

/// Outcome of the hard-constraint gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardConstraintReport {
    pub passed: bool,
    pub violations: Vec<String>,
}

impl HardConstraintReport {
    pub fn from_violations(violations: Vec<String>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }
}

/// Compute the full metrics set for a proposal snapshot.
pub fn compute_metrics(proposal: &CommitteeProposal, context: &CommitteeContext) -> CommitteeMetrics {
    let policy = &context.policy;
    let constraints = &policy.constraints;

    let total_spend = proposal.total_spend();
    let projected_waste_qty: f64 = proposal.demand.iter().map(|d| d.projected_waste_qty).sum();
    let projected_waste_cost: f64 = proposal.demand.iter().map(|d| d.projected_waste_cost).sum();

    let stockout_probability = proposal
        .demand
        .iter()
        .map(|d| d.adjusted_risk)
        .fold(0.0_f64, f64::max)
        .clamp(0.0, 1.0);

    let shelf_life_violations = if constraints.enforce_shelf_life {
        proposal
            .demand
            .iter()
            .filter(|d| {
                d.shelf_life_hours
                    .is_some_and(|h| h < constraints.min_shelf_life_hours)
            })
            .count()
    } else {
        0
    };

    let quality_risk = if proposal.quality.is_empty() {
        0.0
    } else {
        proposal.quality.iter().map(|g| g.risk_score).sum::<f64>()
            / proposal.quality.len() as f64
    };

    let overtime_hours: f64 = proposal
        .prep_tasks
        .iter()
        .map(|t| t.overtime_risk * t.labor_hours)
        .sum();

    // Normalize each dimension to a comparable 0-~1 range before weighting.
    let cost_norm = total_spend / estimated_required_spend(proposal).max(1.0);
    let waste_norm = projected_waste_cost / total_spend.max(1.0);
    let shelf_flag = if shelf_life_violations > 0 { 1.0 } else { 0.0 };
    let labor_norm = overtime_hours / proposal.total_labor_hours().max(1.0);

    let weights = &policy.weights;
    let score = weights.cost * cost_norm
        + weights.stockout * stockout_probability
        + weights.waste * waste_norm
        + weights.shelf * shelf_flag
        + weights.qc * quality_risk
        + weights.labor * labor_norm;

    CommitteeMetrics {
        total_spend,
        stockout_probability,
        projected_waste_cost,
        projected_waste_qty,
        shelf_life_violations,
        quality_risk,
        overtime_hours,
        score,
    }
}

/// Baseline spend required to cover the demand plan exactly.
///
/// The per-item unit cost is estimated from the mean unit cost of purchase
/// lines referencing the item, falling back to the item's waste cost per
/// unit when nothing in the order book prices it.
fn estimated_required_spend(proposal: &CommitteeProposal) -> f64 {
    proposal
        .demand
        .iter()
        .map(|item| {
            let (cost_sum, count) = proposal
                .purchase_orders
                .iter()
                .flat_map(|o| &o.lines)
                .filter(|l| l.item_id == item.id)
                .fold((0.0_f64, 0usize), |(sum, n), l| (sum + l.unit_cost, n + 1));
            let unit_cost = if count > 0 {
                cost_sum / count as f64
            } else {
                item.waste_cost_per_unit
            };
            item.required_qty * unit_cost
        })
        .sum()
}

/// Evaluate the non-negotiable gates for a proposal snapshot.
pub fn evaluate_hard_constraints(
    proposal: &CommitteeProposal,
    metrics: &CommitteeMetrics,
    context: &CommitteeContext,
) -> HardConstraintReport {
    let constraints = &context.policy.constraints;
    let mut violations = Vec::new();

    if metrics.stockout_probability > constraints.max_under_order_risk {
        violations.push(format!(
            "stockout probability {:.2} exceeds the maximum of {:.2}",
            metrics.stockout_probability, constraints.max_under_order_risk
        ));
    }

    if constraints.enforce_shelf_life {
        let offenders: Vec<&str> = proposal
            .demand
            .iter()
            .filter(|d| {
                d.shelf_life_hours
                    .is_some_and(|h| h < constraints.min_shelf_life_hours)
            })
            .map(|d| d.name.as_str())
            .collect();
        if !offenders.is_empty() {
            violations.push(format!(
                "shelf life below {:.0}h for: {}",
                constraints.min_shelf_life_hours,
                offenders.join(", ")
            ));
        }
    }

    if constraints.enforce_t24_lock {
        let locked: Vec<&str> = tasks_in_t24_window(proposal, context)
            .into_iter()
            .filter(|t| t.overtime_risk > T24_OVERTIME_RISK_THRESHOLD)
            .map(|t| t.title.as_str())
            .collect();
        if !locked.is_empty() {
            violations.push(format!(
                "prep tasks inside the T-24 lock window carry overtime risk above {:.2}: {}",
                T24_OVERTIME_RISK_THRESHOLD,
                locked.join(", ")
            ));
        }
    }

    HardConstraintReport::from_violations(violations)
}

/// Prep tasks starting within the configured lock window before the service
/// date. Empty when no service date is set.
pub fn tasks_in_t24_window<'a>(
    proposal: &'a CommitteeProposal,
    context: &CommitteeContext,
) -> Vec<&'a PrepTask> {
    let Some(service_date) = context.service_date else {
        return Vec::new();
    };
    let window_secs = (context.policy.constraints.t24_lock_hours * 3600.0) as i64;
    let lock_start = service_date - Duration::seconds(window_secs);
    proposal
        .prep_tasks
        .iter()
        .filter(|t| t.start_at >= lock_start && t.start_at <= service_date)
        .collect()
}
