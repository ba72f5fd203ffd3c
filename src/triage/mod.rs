//! Protocol decision engine.
//!
//! `normalize -> decision_tree -> escalation -> assemble`, driven by
//! [`DefaultTriageEngine`]. Every stage is a pure function over its inputs.

pub mod assemble;
pub mod decision_tree;
pub mod engine;
pub mod escalation;
pub mod normalize;
pub mod policy;
pub mod types;

pub use assemble::assemble;
pub use decision_tree::{condition_matches, evaluate_nodes, resolve_interventions};
pub use engine::{evaluate, DefaultTriageEngine};
pub use escalation::classify;
pub use normalize::{normalize_answer, normalize_responses};
pub use policy::{FollowUpDelays, TriagePolicy};
pub use types::*;
