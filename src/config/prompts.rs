//! Canned prompts sent by the quick actions and the local greeting
//!
//! The quick-action prompts can be overridden from the client TOML file:
//!
//! ```toml
//! [prompts]
//! quiz = "Quiz me on Rust lifetimes"
//! cheatsheet = "Make me a cheatsheet of what we covered"
//! ```

use serde::{Deserialize, Serialize};

/// Quick-action prompt texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickPrompts {
    /// Sent by "Quiz Me!"
    #[serde(default = "default_quiz")]
    pub quiz: String,

    /// Sent by "Cheatsheet"
    #[serde(default = "default_cheatsheet")]
    pub cheatsheet: String,

    /// Sent by "Explore Resources"
    #[serde(default = "default_resources")]
    pub resources: String,
}

fn default_quiz() -> String {
    builtin::QUIZ_ME.to_string()
}

fn default_cheatsheet() -> String {
    builtin::CHEATSHEET.to_string()
}

fn default_resources() -> String {
    builtin::EXPLORE_RESOURCES.to_string()
}

impl Default for QuickPrompts {
    fn default() -> Self {
        Self {
            quiz: default_quiz(),
            cheatsheet: default_cheatsheet(),
            resources: default_resources(),
        }
    }
}

/// Built-in texts that don't require a config file
pub mod builtin {
    /// First greeting line of an empty conversation
    pub const GREETING: &str =
        "Hello! I am your Agentic AI Tutor. How can I help you learn today?";

    /// Second greeting line of an empty conversation
    pub const CAPABILITIES: &str = "I'm not just a chatbot. I have **Long-term Memory** to remember our past lessons, **Agency** to take initiative, and I can use **Tools** to help you learn better. I'll even automatically summarize our chat and start a new session if we talk too much, so we never lose context! Try asking me to remember something about you.";

    pub const QUIZ_ME: &str = "Quiz me on what we've been discussing.";

    pub const CHEATSHEET: &str = "Create a cheatsheet summarizing what we've been discussing.";

    pub const EXPLORE_RESOURCES: &str =
        "Find learning resources about what we've been discussing.";

    /// Inline bubble shown when a send fails
    pub const CONNECTION_ERROR: &str = "Error: Could not connect to the tutor.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let prompts: QuickPrompts = toml::from_str(r#"quiz = "Quiz me on borrowing""#).unwrap();
        assert_eq!(prompts.quiz, "Quiz me on borrowing");
        assert_eq!(prompts.cheatsheet, builtin::CHEATSHEET);
        assert_eq!(prompts.resources, builtin::EXPLORE_RESOURCES);
    }
}
