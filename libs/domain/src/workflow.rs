//! Workflow domain models
//!
//! Two distinct things live here, deliberately kept in one module because they
//! share identifiers and are always read together:
//! - `Workflow`: the persisted record a project points at (name, type, raw config).
//! - `WorkflowDefinition` / `TransitionDefinition` / `WorkflowInstance`: the static
//!   and live shapes the state machine engine (`wovra-engine`) operates on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typeshare::typeshare;

use crate::enums::WorkflowType;
use crate::ids::WorkflowId;

/// A project-level workflow record
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub workflow_id: WorkflowId,
    pub name: String,
    pub workflow_type: WorkflowType,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The wildcard source-state marker: a transition bearing it fires from any state.
pub const ANY_STATE: &str = "*";

/// A single named edge in a `WorkflowDefinition`.
///
/// `sources` may contain [`ANY_STATE`] instead of (or alongside) concrete state
/// names. `pipeline` names a pipeline registered with the pipeline execution
/// engine to run as part of firing this transition; `guard` is a template-style
/// boolean expression evaluated against the merged instance/call data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDefinition {
    pub name: String,
    pub sources: Vec<String>,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(default)]
    pub auto: bool,
}

impl TransitionDefinition {
    /// Whether this transition can fire out of `state`.
    #[must_use]
    pub fn matches_source(&self, state: &str) -> bool {
        self.sources.iter().any(|s| s == ANY_STATE || s == state)
    }
}

/// The static declaration of a state machine: an identifier, an initial state,
/// and the ordered list of transitions that may move an instance between states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub initial_state: String,
    pub states: Vec<String>,
    pub transitions: Vec<TransitionDefinition>,
}

impl WorkflowDefinition {
    /// All transitions declared with a given name, in declaration order.
    pub fn transitions_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a TransitionDefinition> {
        self.transitions.iter().filter(move |t| t.name == name)
    }

    /// All `Auto` transitions that could fire out of `state`, in declaration order.
    pub fn auto_transitions_from<'a>(
        &'a self,
        state: &'a str,
    ) -> impl Iterator<Item = &'a TransitionDefinition> {
        self.transitions
            .iter()
            .filter(move |t| t.auto && t.matches_source(state))
    }

    /// A definition is terminal at `state` if no transition actually moves it
    /// elsewhere. A transition whose source matches `state` but whose target
    /// is `state` itself (a wildcard self-loop, say) doesn't count as leaving it.
    #[must_use]
    pub fn is_terminal(&self, state: &str) -> bool {
        !self
            .transitions
            .iter()
            .any(|t| t.matches_source(state) && t.target != state)
    }
}

/// One entry in a `WorkflowInstance`'s append-only history.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub from_state: String,
    pub to_state: String,
    pub transition_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A live, uniquely identified instance of a `WorkflowDefinition`.
///
/// Owned exclusively by the state machine engine: callers only ever see
/// deep-copied snapshots returned from `GetInstance`.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: String,
    pub definition_id: String,
    pub current_state: String,
    pub data: HashMap<String, Value>,
    pub history: Vec<HistoryEntry>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl WorkflowInstance {
    pub fn new(id: String, definition_id: String, initial_state: String, data: HashMap<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id,
            definition_id,
            current_state: initial_state,
            data,
            history: Vec::new(),
            completed: false,
            created_at: now,
            last_updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_source_matches_any_state() {
        let t = TransitionDefinition {
            name: "cancel".into(),
            sources: vec![ANY_STATE.to_string()],
            target: "cancelled".into(),
            pipeline: None,
            guard: None,
            auto: false,
        };
        assert!(t.matches_source("pending"));
        assert!(t.matches_source("anything"));
    }

    #[test]
    fn concrete_source_matches_only_listed_states() {
        let t = TransitionDefinition {
            name: "approve".into(),
            sources: vec!["review".into()],
            target: "approved".into(),
            pipeline: None,
            guard: None,
            auto: false,
        };
        assert!(t.matches_source("review"));
        assert!(!t.matches_source("pending"));
    }

    #[test]
    fn terminal_state_has_no_outgoing_transitions() {
        let def = WorkflowDefinition {
            id: "order".into(),
            initial_state: "pending".into(),
            states: vec!["pending".into(), "done".into()],
            transitions: vec![TransitionDefinition {
                name: "finish".into(),
                sources: vec!["pending".into()],
                target: "done".into(),
                pipeline: None,
                guard: None,
                auto: false,
            }],
        };
        assert!(!def.is_terminal("pending"));
        assert!(def.is_terminal("done"));
    }
}
