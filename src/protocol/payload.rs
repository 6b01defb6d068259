//! Structured payloads carried inside sentinel blocks

use serde::{Deserialize, Serialize};

/// XP a question is worth when the payload doesn't say
pub const DEFAULT_XP_REWARD: u32 = 100;

fn default_xp_reward() -> u32 {
    DEFAULT_XP_REWARD
}

/// One multiple-choice question.
///
/// The backend writes snake_case keys; camelCase is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,

    pub options: Vec<String>,

    #[serde(alias = "correctAnswer")]
    pub correct_answer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    #[serde(alias = "xpReward", default = "default_xp_reward")]
    pub xp_reward: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Payload of a `:::quiz` block: one question or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizPayload {
    Single(QuizQuestion),
    Many(Vec<QuizQuestion>),
}

impl QuizPayload {
    pub fn questions(&self) -> &[QuizQuestion] {
        match self {
            QuizPayload::Single(q) => std::slice::from_ref(q),
            QuizPayload::Many(qs) => qs,
        }
    }

    pub fn into_questions(self) -> Vec<QuizQuestion> {
        match self {
            QuizPayload::Single(q) => vec![q],
            QuizPayload::Many(qs) => qs,
        }
    }

    pub fn len(&self) -> usize {
        self.questions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions().is_empty()
    }
}

/// Payload of a `:::cheatsheet` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatsheetPayload {
    pub topic: String,
    pub html: String,
}

/// Payload of a `:::resources` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesPayload {
    pub query: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}
