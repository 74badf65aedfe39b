//! Deterministic purchasing committee decision engine.
//!
//! A draft purchasing/production plan is seeded by a planner, reviewed by a
//! sequence of critic agents that each propose corrective patches, and
//! resolved into an approve / escalate / block verdict together with a full
//! audit trail of every intermediate snapshot. Entry point:
//! [`committee::generate_committee_plan`].

pub mod committee;
pub mod config;
pub mod critics;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod patch;

pub use committee::{CommitteeOrchestrator, generate_committee_plan};
pub use errors::CommitteeError;
