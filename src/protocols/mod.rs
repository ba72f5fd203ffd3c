//! Protocol definitions: bundled documents, the in-memory store the engine
//! looks active protocols up in, authoring validation and call briefs.

pub mod brief;
pub mod builtin;
pub mod store;
pub mod validation;

pub use brief::{AnswerHint, BriefQuestion, CallBrief, EscalationCondition};
pub use builtin::{builtin_protocol, builtin_protocols};
pub use store::{InMemoryProtocolStore, ProtocolStore};
pub use validation::{has_errors, validate_protocol, IssueKind, IssueSeverity, ProtocolIssue};
