//! Prompt assembly.
//!
//! Combines the fixed system instruction, the reconstructed history, and the
//! new user turn into one ordered generation request. Pure, no I/O.

use learnmate_core::generator::PromptMessage;

/// Version of the system instruction contract. Bump when the schema wording
/// or the worked example changes.
pub const PROMPT_VERSION: &str = "2025-08-01";

/// The fixed system instruction.
///
/// Describes the assistant's role, mandates the five-key output schema with
/// no surrounding text, and gives one literal worked example of compliant
/// output. A versioned constant, not user-configurable input.
pub const SYSTEM_INSTRUCTION: &str = r#"You are Learnmate, an expert AI learning guide.

Your goal is to help users create, understand, and follow personalized learning plans. You are friendly, encouraging, and an expert in any topic the user wants to learn. When the user asks for a learning plan, ask for the topic and their available time if you do not know them yet, then generate a comprehensive plan.

Output contract, which you must follow on every reply:
Respond with a single valid JSON object and nothing else. No prose before or after it, no code fences. The object has exactly these five keys:
- "message": a conversational reply in markdown
- "checklist": an array of actionable to-do strings
- "roadmap": an array of milestone strings in learning order
- "schedule": an array of day-by-day or week-by-week schedule strings
- "resources": an array of links or study material strings

When a section does not apply to the current reply, use an empty array for it, but always include all five keys.

Example of a compliant reply:
{"message": "Great choice! Here is a one-week Python starter plan.", "checklist": ["Install Python 3", "Set up an editor"], "roadmap": ["Syntax basics", "Data structures", "A small project"], "schedule": ["Day 1-2: syntax and types", "Day 3-4: collections and functions", "Day 5-7: build a CLI tool"], "resources": ["https://docs.python.org/3/tutorial/"]}"#;

/// Assemble an ordered request: exactly one system entry first, then the
/// history in order, then the new user turn last.
pub fn assemble(
    system_instruction: &str,
    history: &[PromptMessage],
    new_user_text: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(system_instruction));
    messages.extend_from_slice(history);
    messages.push(PromptMessage::user(new_user_text));
    messages
}
