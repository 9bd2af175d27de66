//! The StructuredPlan schema — the fixed five-field shape every chat
//! exchange ultimately produces.
//!
//! All five keys are always present in any value returned to a caller.
//! The resolver (in the engine crate) guarantees this even when the backend
//! violates its output contract; this type only defines the shape.

use serde::{Deserialize, Serialize};

/// A structured learning plan: conversational message plus four list
/// sections.
///
/// `message` is required for a successful decode; the list fields default to
/// empty so a partial-but-valid backend object still deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredPlan {
    /// The conversational reply, markdown allowed
    pub message: String,

    /// Actionable to-do items
    #[serde(default)]
    pub checklist: Vec<String>,

    /// Milestone-ordered learning path
    #[serde(default)]
    pub roadmap: Vec<String>,

    /// Day/week schedule entries
    #[serde(default)]
    pub schedule: Vec<String>,

    /// Links and study materials
    #[serde(default)]
    pub resources: Vec<String>,
}

impl StructuredPlan {
    /// A plan carrying only a conversational message.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            checklist: Vec::new(),
            roadmap: Vec::new(),
            schedule: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// True when every list section is empty.
    pub fn is_message_only(&self) -> bool {
        self.checklist.is_empty()
            && self.roadmap.is_empty()
            && self.schedule.is_empty()
            && self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_exactly_five_keys() {
        let plan = StructuredPlan::message_only("hi");
        let value = serde_json::to_value(&plan).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            ["checklist", "message", "resources", "roadmap", "schedule"]
        );
    }

    #[test]
    fn partial_object_decodes_with_empty_lists() {
        let plan: StructuredPlan = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(plan.message, "hi");
        assert!(plan.is_message_only());
    }

    #[test]
    fn missing_message_fails_to_decode() {
        let result = serde_json::from_str::<StructuredPlan>(r#"{"checklist":["a"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn round_trip_preserves_all_sections() {
        let plan = StructuredPlan {
            message: "Here is your plan".into(),
            checklist: vec!["Install Python".into()],
            roadmap: vec!["Syntax".into(), "OOP".into()],
            schedule: vec!["Day 1: basics".into()],
            resources: vec!["https://docs.python.org/3".into()],
        };
        let json = serde_json::to_string(&plan).unwrap();
        let back: StructuredPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
