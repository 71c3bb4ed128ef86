//! Prompts for LLM-based modernization of chapter text.
//!
//! Callers can override the system prompt via
//! [`crate::config::ModernizeConfig::system_prompt`]; the constant here is
//! used only when no override is provided.

/// Default system prompt: rewrite 1970s/80s compiler-writing prose in current
/// terminology and report each substitution.
pub const MODERNIZE_SYSTEM_PROMPT: &str = r#"You are an assistant that modernizes compiler-writing text from the 1970s into current terminology.
Return strictly valid JSON with keys:
- "modern" (string): the modernized text (preserve meaning).
- "mappings" (array): each item { "old": "<original phrase>", "modern": "<modern phrase>", "explanation": "<one-sentence explanation>" }.
Return only valid JSON in the response body."#;

/// Build the user message wrapping the text to modernize.
pub fn modernize_user_message(text: &str) -> String {
    format!("Text:\n```\n{text}\n```\nReturn only valid JSON.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_names_both_keys() {
        assert!(MODERNIZE_SYSTEM_PROMPT.contains("\"modern\""));
        assert!(MODERNIZE_SYSTEM_PROMPT.contains("\"mappings\""));
    }

    #[test]
    fn user_message_fences_the_text() {
        let msg = modernize_user_message("The cradle is a skeleton.");
        assert!(msg.starts_with("Text:\n```\nThe cradle is a skeleton.\n```"));
        assert!(msg.ends_with("Return only valid JSON."));
    }
}
