//! Authoring checks for protocol documents.
//!
//! The engine tolerates every defect reported here; validation exists so
//! authors find out at load time instead of from a silent triage miss.
//! Only defects that make answers ambiguous or ranges meaningless are
//! errors; the rest are warnings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{AnswerType, Condition, Id, Protocol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateQuestionId,
    DuplicateNodeId,
    DuplicateInterventionId,
    UnknownIntervention,
    DanglingNextNode,
    MissingSymptomKey,
    UnansweredSymptomKey,
    ChoiceWithoutChoices,
    InvertedRange,
    EmptyMembership,
    NoDecisionNodes,
}

impl IssueKind {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            Self::DuplicateQuestionId | Self::InvertedRange => IssueSeverity::Error,
            _ => IssueSeverity::Warning,
        }
    }
}

/// One finding against a protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolIssue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    /// Question, node or intervention the issue is about.
    pub subject: Option<Id>,
    pub message: String,
}

impl ProtocolIssue {
    fn new(kind: IssueKind, subject: Option<&Id>, message: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            subject: subject.cloned(),
            message,
        }
    }
}

pub fn has_errors(issues: &[ProtocolIssue]) -> bool {
    issues.iter().any(|i| i.severity == IssueSeverity::Error)
}

/// Check a protocol for authoring defects, in document order.
pub fn validate_protocol(protocol: &Protocol) -> Vec<ProtocolIssue> {
    let mut issues = Vec::new();
    check_questions(protocol, &mut issues);
    check_nodes(protocol, &mut issues);
    check_interventions(protocol, &mut issues);
    issues
}

fn check_questions(protocol: &Protocol, issues: &mut Vec<ProtocolIssue>) {
    let mut seen = HashSet::new();
    for q in &protocol.questions {
        if !seen.insert(&q.id) {
            issues.push(ProtocolIssue::new(
                IssueKind::DuplicateQuestionId,
                Some(&q.id),
                format!("question id {} appears more than once", q.id),
            ));
        }
        if q.answer_type == AnswerType::Choice && q.choices.is_empty() {
            issues.push(ProtocolIssue::new(
                IssueKind::ChoiceWithoutChoices,
                Some(&q.id),
                format!("choice question {} lists no choices", q.id),
            ));
        }
        if let (Some(min), Some(max)) = (q.min, q.max) {
            if min > max {
                issues.push(ProtocolIssue::new(
                    IssueKind::InvertedRange,
                    Some(&q.id),
                    format!("question {} has min {min} above max {max}", q.id),
                ));
            }
        }
    }
}

fn check_nodes(protocol: &Protocol, issues: &mut Vec<ProtocolIssue>) {
    if protocol.decision_nodes.is_empty() {
        issues.push(ProtocolIssue::new(
            IssueKind::NoDecisionNodes,
            None,
            "protocol has no decision nodes; every assessment will be routine".into(),
        ));
        return;
    }

    let answered: HashSet<&str> = protocol
        .questions
        .iter()
        .filter_map(|q| q.symptom_key.as_deref())
        .collect();
    let node_ids: HashSet<&Id> = protocol.decision_nodes.iter().map(|n| &n.id).collect();

    let mut seen = HashSet::new();
    for node in &protocol.decision_nodes {
        if !seen.insert(&node.id) {
            issues.push(ProtocolIssue::new(
                IssueKind::DuplicateNodeId,
                Some(&node.id),
                format!("node id {} appears more than once", node.id),
            ));
        }

        if !node.condition.is_default() {
            match node.symptom_key.as_deref() {
                None => issues.push(ProtocolIssue::new(
                    IssueKind::MissingSymptomKey,
                    Some(&node.id),
                    format!("node {} has no symptom key and can never match", node.id),
                )),
                Some(key) if !answered.contains(key) => issues.push(ProtocolIssue::new(
                    IssueKind::UnansweredSymptomKey,
                    Some(&node.id),
                    format!("node {} tests '{key}', which no question produces", node.id),
                )),
                Some(_) => {}
            }
        }

        if matches!(&node.condition, Condition::In(members) if members.is_empty()) {
            issues.push(ProtocolIssue::new(
                IssueKind::EmptyMembership,
                Some(&node.id),
                format!("node {} tests membership in an empty list", node.id),
            ));
        }

        if let Some(next) = &node.next_node_id {
            if !node_ids.contains(next) {
                issues.push(ProtocolIssue::new(
                    IssueKind::DanglingNextNode,
                    Some(&node.id),
                    format!("node {} points to missing node {next}", node.id),
                ));
            }
        }

        for id in &node.intervention_ids {
            if protocol.intervention(id).is_none() {
                issues.push(ProtocolIssue::new(
                    IssueKind::UnknownIntervention,
                    Some(&node.id),
                    format!("node {} triggers undefined intervention {id}", node.id),
                ));
            }
        }
    }
}

fn check_interventions(protocol: &Protocol, issues: &mut Vec<ProtocolIssue>) {
    let mut seen = HashSet::new();
    for intervention in &protocol.interventions {
        if !seen.insert(&intervention.id) {
            issues.push(ProtocolIssue::new(
                IssueKind::DuplicateInterventionId,
                Some(&intervention.id),
                format!("intervention id {} appears more than once", intervention.id),
            ));
        }
    }
}
