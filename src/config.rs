//! Committee policy and context configuration.
//!
//! The policy is operator-tunable configuration, not hardcoded engine
//! behavior. It can be built in code, or loaded from a `committee.toml`
//! where every table and key is optional and falls back to the defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! quorum = 0.67
//! escalate_spend_delta_pct = 0.15
//! escalate_disagreement_score = 0.25
//! target_waste_pct = 0.08
//! use_history_agent = true
//! critic_timeout_secs = 120
//!
//! [weights]
//! cost = 0.3
//! stockout = 0.25
//! waste = 0.2
//! shelf = 0.1
//! qc = 0.1
//! labor = 0.05
//!
//! [constraints]
//! max_under_order_risk = 0.35
//! enforce_shelf_life = true
//! min_shelf_life_hours = 24.0
//! enforce_t24_lock = true
//! t24_lock_hours = 24.0
//! over_order_buffer = 0.1
//! ```

use crate::errors::CommitteeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How many critics sit on the committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitteeMode {
    /// Planner only; no critique stages run.
    Single,
    /// Planner + risk critic (default).
    #[default]
    Dual,
    /// Planner + risk critic + history critic (when enabled by policy).
    Triple,
}

impl fmt::Display for CommitteeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitteeMode::Single => write!(f, "single"),
            CommitteeMode::Dual => write!(f, "dual"),
            CommitteeMode::Triple => write!(f, "triple"),
        }
    }
}

impl std::str::FromStr for CommitteeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(CommitteeMode::Single),
            "dual" => Ok(CommitteeMode::Dual),
            "triple" => Ok(CommitteeMode::Triple),
            _ => anyhow::bail!(
                "Invalid committee mode '{}'. Valid values: single, dual, triple",
                s
            ),
        }
    }
}

/// Per-dimension weights for the composite risk/cost score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_weight_cost")]
    pub cost: f64,
    #[serde(default = "default_weight_stockout")]
    pub stockout: f64,
    #[serde(default = "default_weight_waste")]
    pub waste: f64,
    #[serde(default = "default_weight_shelf")]
    pub shelf: f64,
    #[serde(default = "default_weight_qc")]
    pub qc: f64,
    #[serde(default = "default_weight_labor")]
    pub labor: f64,
}

fn default_weight_cost() -> f64 {
    0.3
}
fn default_weight_stockout() -> f64 {
    0.25
}
fn default_weight_waste() -> f64 {
    0.2
}
fn default_weight_shelf() -> f64 {
    0.1
}
fn default_weight_qc() -> f64 {
    0.1
}
fn default_weight_labor() -> f64 {
    0.05
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            cost: default_weight_cost(),
            stockout: default_weight_stockout(),
            waste: default_weight_waste(),
            shelf: default_weight_shelf(),
            qc: default_weight_qc(),
            labor: default_weight_labor(),
        }
    }
}

/// Hard-constraint thresholds. Violations block the run outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintConfig {
    /// Maximum tolerated stockout probability, 0-1.
    #[serde(default = "default_max_under_order_risk")]
    pub max_under_order_risk: f64,
    #[serde(default = "default_true")]
    pub enforce_shelf_life: bool,
    #[serde(default = "default_min_shelf_life_hours")]
    pub min_shelf_life_hours: f64,
    #[serde(default = "default_true")]
    pub enforce_t24_lock: bool,
    /// Width of the pre-service lock window, in hours.
    #[serde(default = "default_t24_lock_hours")]
    pub t24_lock_hours: f64,
    /// Over-order buffer fraction applied to every required quantity.
    #[serde(default = "default_over_order_buffer")]
    pub over_order_buffer: f64,
}

fn default_max_under_order_risk() -> f64 {
    0.35
}
fn default_true() -> bool {
    true
}
fn default_min_shelf_life_hours() -> f64 {
    24.0
}
fn default_t24_lock_hours() -> f64 {
    24.0
}
fn default_over_order_buffer() -> f64 {
    0.1
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            max_under_order_risk: default_max_under_order_risk(),
            enforce_shelf_life: true,
            min_shelf_life_hours: default_min_shelf_life_hours(),
            enforce_t24_lock: true,
            t24_lock_hours: default_t24_lock_hours(),
            over_order_buffer: default_over_order_buffer(),
        }
    }
}

/// Operator-tunable committee policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteePolicy {
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub constraints: ConstraintConfig,
    /// Fraction of critics that must approve, 0-1.
    #[serde(default = "default_quorum")]
    pub quorum: f64,
    /// Escalate when final spend drifts from the planner's by this fraction.
    #[serde(default = "default_escalate_spend_delta_pct")]
    pub escalate_spend_delta_pct: f64,
    /// Escalate when the composite score moves by at least this much.
    #[serde(default = "default_escalate_disagreement_score")]
    pub escalate_disagreement_score: f64,
    /// Acceptable waste fraction of the recommended quantity.
    #[serde(default = "default_target_waste_pct")]
    pub target_waste_pct: f64,
    #[serde(default = "default_true")]
    pub use_history_agent: bool,
    /// Per-agent call timeout, in seconds.
    #[serde(default = "default_critic_timeout_secs")]
    pub critic_timeout_secs: u64,
}

fn default_quorum() -> f64 {
    0.5
}
fn default_escalate_spend_delta_pct() -> f64 {
    0.15
}
fn default_escalate_disagreement_score() -> f64 {
    0.25
}
fn default_target_waste_pct() -> f64 {
    0.08
}
fn default_critic_timeout_secs() -> u64 {
    120
}

impl Default for CommitteePolicy {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            constraints: ConstraintConfig::default(),
            quorum: default_quorum(),
            escalate_spend_delta_pct: default_escalate_spend_delta_pct(),
            escalate_disagreement_score: default_escalate_disagreement_score(),
            target_waste_pct: default_target_waste_pct(),
            use_history_agent: true,
            critic_timeout_secs: default_critic_timeout_secs(),
        }
    }
}

impl CommitteePolicy {
    /// Load a policy from a TOML file. Missing tables and keys fall back to
    /// the defaults.
    pub fn load_from(path: &Path) -> Result<Self, CommitteeError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| CommitteeError::PolicyLoadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let policy: Self =
            toml::from_str(&content).map_err(|source| CommitteeError::PolicyParseFailed {
                path: path.to_path_buf(),
                source,
            })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check that fractions are fractions and durations are non-negative.
    pub fn validate(&self) -> Result<(), CommitteeError> {
        let unit_range = [
            ("quorum", self.quorum),
            (
                "constraints.max_under_order_risk",
                self.constraints.max_under_order_risk,
            ),
            ("target_waste_pct", self.target_waste_pct),
        ];
        for (field, value) in unit_range {
            if !(0.0..=1.0).contains(&value) {
                return Err(CommitteeError::InvalidPolicy {
                    message: format!("{field} must be within [0, 1], got {value}"),
                });
            }
        }
        let non_negative = [
            (
                "constraints.min_shelf_life_hours",
                self.constraints.min_shelf_life_hours,
            ),
            (
                "constraints.t24_lock_hours",
                self.constraints.t24_lock_hours,
            ),
            (
                "constraints.over_order_buffer",
                self.constraints.over_order_buffer,
            ),
            ("escalate_spend_delta_pct", self.escalate_spend_delta_pct),
            (
                "escalate_disagreement_score",
                self.escalate_disagreement_score,
            ),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(CommitteeError::InvalidPolicy {
                    message: format!("{field} must be non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// The per-agent call timeout as a [`Duration`].
    pub fn critic_timeout(&self) -> Duration {
        Duration::from_secs(self.critic_timeout_secs)
    }
}

/// Resolved context for one committee run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitteeContext {
    pub mode: CommitteeMode,
    pub policy: CommitteePolicy,
    /// Service date anchoring the T-24 lock window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_date: Option<DateTime<Utc>>,
}

/// Options for [`create_committee_context`].
///
/// An explicit `policy` wins over `policy_file`, which wins over the
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub mode: CommitteeMode,
    pub service_date: Option<DateTime<Utc>>,
    pub policy_file: Option<PathBuf>,
    pub policy: Option<CommitteePolicy>,
}

impl ContextOptions {
    pub fn new(mode: CommitteeMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_service_date(mut self, service_date: DateTime<Utc>) -> Self {
        self.service_date = Some(service_date);
        self
    }

    pub fn with_policy(mut self, policy: CommitteePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_policy_file(mut self, path: PathBuf) -> Self {
        self.policy_file = Some(path);
        self
    }
}

/// Resolve mode, policy, and service date into a run context.
pub fn create_committee_context(
    options: ContextOptions,
) -> Result<CommitteeContext, CommitteeError> {
    let policy = match (options.policy, options.policy_file) {
        (Some(policy), _) => {
            policy.validate()?;
            policy
        }
        (None, Some(path)) => CommitteePolicy::load_from(&path)?,
        (None, None) => CommitteePolicy::default(),
    };
    Ok(CommitteeContext {
        mode: options.mode,
        policy,
        service_date: options.service_date,
    })
}
