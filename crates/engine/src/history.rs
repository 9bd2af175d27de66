//! History reconstruction.
//!
//! Rebuilds the role-tagged dialogue for one principal from stored turns.
//! Pure: a function of the records at read time, never touching the store.

use crate::resolver;
use learnmate_core::generator::PromptMessage;
use learnmate_core::turn::{Role, TurnRecord};

/// Reconstruct the dialogue from `(created_at, id)`-ordered turn records.
///
/// User turns replay verbatim. Assistant turns that decode as a structured
/// plan collapse to the plan's `message`: only the conversational portion of
/// a past reply is relevant context for the next one, and re-feeding whole
/// checklists and roadmaps would grow the prompt without bound. Turns that
/// do not decode replay verbatim instead, so reconstruction never fails.
pub fn reconstruct(turns: &[TurnRecord]) -> Vec<PromptMessage> {
    turns
        .iter()
        .map(|turn| match turn.role {
            Role::Assistant => {
                let text = resolver::decode_message(&turn.raw_content)
                    .unwrap_or_else(|| turn.raw_content.clone());
                PromptMessage::assistant(text)
            }
            _ => PromptMessage {
                role: turn.role,
                text: turn.raw_content.clone(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use learnmate_core::turn::PrincipalId;

    fn record(id: i64, role: Role, raw: &str) -> TurnRecord {
        TurnRecord {
            id,
            principal_id: PrincipalId::new("alice"),
            role,
            raw_content: raw.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn user_turns_replay_verbatim() {
        let turns = vec![record(1, Role::User, "I want to learn Python in 7 days")];
        let history = reconstruct(&turns);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "I want to learn Python in 7 days");
    }

    #[test]
    fn structured_assistant_turns_collapse_to_message() {
        let raw = r#"{"message":"Here is your plan","roadmap":["Syntax","OOP"]}"#;
        let turns = vec![
            record(1, Role::User, "teach me"),
            record(2, Role::Assistant, raw),
        ];
        let history = reconstruct(&turns);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].text, "Here is your plan");
    }

    #[test]
    fn fenced_assistant_turns_also_collapse() {
        let raw = "```json\n{\"message\":\"fenced reply\"}\n```";
        let turns = vec![record(1, Role::Assistant, raw)];
        let history = reconstruct(&turns);
        assert_eq!(history[0].text, "fenced reply");
    }

    #[test]
    fn undecodable_assistant_turns_replay_verbatim() {
        let turns = vec![record(1, Role::Assistant, "I am not sure what you mean.")];
        let history = reconstruct(&turns);
        assert_eq!(history[0].text, "I am not sure what you mean.");
    }

    #[test]
    fn order_is_preserved() {
        let turns = vec![
            record(1, Role::User, "first"),
            record(2, Role::Assistant, "second"),
            record(3, Role::User, "third"),
        ];
        let history = reconstruct(&turns);
        let texts: Vec<_> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn lone_trailing_user_turn_is_tolerated() {
        // An orphaned user turn (assistant append failed) still reconstructs.
        let turns = vec![
            record(1, Role::User, "hello"),
            record(2, Role::Assistant, r#"{"message":"hi"}"#),
            record(3, Role::User, "and then the store hiccuped"),
        ];
        let history = reconstruct(&turns);
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].role, Role::User);
    }

    #[test]
    fn empty_turn_list_reconstructs_empty() {
        assert!(reconstruct(&[]).is_empty());
    }
}
