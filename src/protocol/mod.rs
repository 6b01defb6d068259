//! Sentinel block extraction for assistant messages
//!
//! Assistant replies may embed structured payloads between sentinel lines:
//!
//! ```text
//! Here is a quick check of what we covered.
//!
//! :::quiz
//! {"question": "...", "options": ["a", "b"], "correct_answer": "a", "xp_reward": 100}
//! :::
//! ```
//!
//! [`extract`] splits such a message into its leading prose and at most one
//! payload per block kind. Extraction never fails: if any block carries
//! malformed JSON, or no block is closed, the whole message is treated as
//! plain text.

mod payload;

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

pub use payload::{
    CheatsheetPayload, QuizPayload, QuizQuestion, Resource, ResourcesPayload, DEFAULT_XP_REWARD,
};

/// The kinds of sentinel block the client understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Quiz,
    Cheatsheet,
    Resources,
}

impl BlockKind {
    /// All kinds, in dispatch order
    pub const ALL: [BlockKind; 3] = [BlockKind::Quiz, BlockKind::Cheatsheet, BlockKind::Resources];

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Quiz => "quiz",
            BlockKind::Cheatsheet => "cheatsheet",
            BlockKind::Resources => "resources",
        }
    }

    /// Opening marker as it appears on the wire
    pub fn marker(self) -> String {
        format!(":::{}", self.name())
    }

    fn pattern(self) -> &'static Regex {
        static QUIZ: OnceLock<Regex> = OnceLock::new();
        static CHEATSHEET: OnceLock<Regex> = OnceLock::new();
        static RESOURCES: OnceLock<Regex> = OnceLock::new();

        let cell = match self {
            BlockKind::Quiz => &QUIZ,
            BlockKind::Cheatsheet => &CHEATSHEET,
            BlockKind::Resources => &RESOURCES,
        };
        cell.get_or_init(|| block_regex(self.name()))
    }
}

/// Opening marker, then the body up to the first line holding only `:::`
fn block_regex(name: &str) -> Regex {
    let pattern = format!(
        r"(?s):::{}\b[ \t]*(.*?)\r?\n[ \t]*:::[ \t]*(?:\r?\n|$)",
        regex::escape(name)
    );
    Regex::new(&pattern).expect("sentinel block pattern is valid")
}

fn any_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r":::(?:quiz|cheatsheet|resources)\b").expect("marker pattern is valid")
    })
}

/// A parsed sentinel block
#[derive(Debug, Clone, PartialEq)]
pub enum Block<'a> {
    Quiz(&'a QuizPayload),
    Cheatsheet(&'a CheatsheetPayload),
    Resources(&'a ResourcesPayload),
}

impl Block<'_> {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Quiz(_) => BlockKind::Quiz,
            Block::Cheatsheet(_) => BlockKind::Cheatsheet,
            Block::Resources(_) => BlockKind::Resources,
        }
    }
}

/// A message split into leading prose and structured payloads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMessage {
    pub text: String,
    pub quiz: Option<QuizPayload>,
    pub cheatsheet: Option<CheatsheetPayload>,
    pub resources: Option<ResourcesPayload>,
}

impl ExtractedMessage {
    /// The message as plain text, no blocks
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn has_blocks(&self) -> bool {
        self.quiz.is_some() || self.cheatsheet.is_some() || self.resources.is_some()
    }

    /// Blocks in dispatch order (quiz, cheatsheet, resources), regardless of
    /// where they appeared in the source text
    pub fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks = Vec::with_capacity(3);
        if let Some(ref quiz) = self.quiz {
            blocks.push(Block::Quiz(quiz));
        }
        if let Some(ref cheatsheet) = self.cheatsheet {
            blocks.push(Block::Cheatsheet(cheatsheet));
        }
        if let Some(ref resources) = self.resources {
            blocks.push(Block::Resources(resources));
        }
        blocks
    }

    pub fn kinds(&self) -> Vec<BlockKind> {
        self.blocks().iter().map(Block::kind).collect()
    }
}

/// Why a message fell back to plain text
#[derive(Debug, thiserror::Error)]
enum BlockError {
    #[error("{kind} block is not valid JSON: {source}")]
    Json {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("quiz block has no questions")]
    EmptyQuiz,
}

/// Split `content` into leading text and sentinel payloads.
///
/// Only the first block of each kind is captured. Anything after the first
/// marker that is not inside a captured block is dropped.
pub fn extract(content: &str) -> ExtractedMessage {
    let Some(first) = any_marker().find(content) else {
        return ExtractedMessage::plain(content);
    };

    match extract_blocks(content) {
        Ok(mut extracted) if extracted.has_blocks() => {
            extracted.text = content[..first.start()].trim().to_string();
            extracted
        }
        Ok(_) => {
            tracing::debug!("sentinel marker without a closed block, rendering as text");
            ExtractedMessage::plain(content)
        }
        Err(e) => {
            tracing::warn!("falling back to plain text: {}", e);
            ExtractedMessage::plain(content)
        }
    }
}

fn extract_blocks(content: &str) -> Result<ExtractedMessage, BlockError> {
    let quiz: Option<QuizPayload> = parse_block(content, BlockKind::Quiz)?;
    if quiz.as_ref().is_some_and(QuizPayload::is_empty) {
        return Err(BlockError::EmptyQuiz);
    }

    Ok(ExtractedMessage {
        text: String::new(),
        quiz,
        cheatsheet: parse_block(content, BlockKind::Cheatsheet)?,
        resources: parse_block(content, BlockKind::Resources)?,
    })
}

fn parse_block<T: DeserializeOwned>(content: &str, kind: BlockKind) -> Result<Option<T>, BlockError> {
    let Some(captures) = kind.pattern().captures(content) else {
        return Ok(None);
    };
    let body = captures.get(1).map_or("", |m| m.as_str()).trim();

    serde_json::from_str(body)
        .map(Some)
        .map_err(|source| BlockError::Json {
            kind: kind.name(),
            source,
        })
}
