//! Domain model for committee proposals, critiques, and inputs.
//!
//! Everything here is plain serde data: the proposal aggregate that critics
//! review and patch, the typed edit operations, the issue/critique records
//! produced by each review stage, and the caller-supplied inputs the engine
//! consumes. [`CommitteeProposal`] is `Clone`, and cloning is the mechanism
//! that gives every pipeline stage its own independent snapshot.

pub mod critique;
pub mod inputs;
pub mod patch;
pub mod proposal;

pub use critique::{CommitteeCritique, CommitteeIssue, IssueSeverity};
pub use inputs::{CommitteeInputs, DemandForecastItem, OrderOutcome};
pub use patch::CommitteePatch;
pub use proposal::{
    CommitteeProposal, CommitteePurchaseOrder, CommitteePurchaseOrderLine, DemandPlanItem,
    PrepTask, QualityGate,
};
