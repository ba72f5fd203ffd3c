pub mod condition;
pub mod enums;
pub mod ids;
pub mod protocol;
pub mod responses;
pub mod symptoms;

pub use condition::{Condition, ConditionValue, Operator};
pub use enums::*;
pub use ids::Id;
pub use protocol::{DecisionNode, Intervention, Protocol, ProtocolVersion, Question};
pub use responses::Responses;
pub use symptoms::{SymptomMap, SymptomValue};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid condition '{condition}': {reason}")]
    InvalidCondition { condition: String, reason: String },

    #[error("Invalid decision node {node_id}: {reason}")]
    InvalidNode { node_id: String, reason: String },

    #[error("Protocol load failed ({0}): {1}")]
    Load(String, String),

    #[error("Protocol parse failed ({0}): {1}")]
    Parse(String, String),

    #[error("Protocol {protocol_id} rejected: {reason}")]
    Rejected { protocol_id: String, reason: String },

    #[error("Protocol not found: {0}")]
    NotFound(Id),

    #[error("Internal lock failed")]
    LockFailed,
}
