//! Render dispatch: extracted message -> widgets
//!
//! Widgets always come out in the same order, text first, then quiz,
//! cheatsheet and resources, no matter how the blocks were laid out in the
//! reply.

pub mod cheatsheet;
pub mod resources;
pub mod terminal;

use crate::protocol::{self, Block, ExtractedMessage};
use crate::quiz::QuizSession;

pub use cheatsheet::{html_to_text, save_download, CheatsheetCard};
pub use resources::{ResourcesCard, EMPTY_RESOURCES};

/// Something the front end can draw
#[derive(Debug, Clone)]
pub enum Widget {
    /// Markdown paragraph
    Text(String),
    Quiz(QuizSession),
    Cheatsheet(CheatsheetCard),
    Resources(ResourcesCard),
}

impl Widget {
    pub fn name(&self) -> &'static str {
        match self {
            Widget::Text(_) => "text",
            Widget::Quiz(_) => "quiz",
            Widget::Cheatsheet(_) => "cheatsheet",
            Widget::Resources(_) => "resources",
        }
    }
}

/// Turn an extracted message into widgets
pub fn dispatch(message: &ExtractedMessage) -> Vec<Widget> {
    let mut widgets = Vec::new();

    if !message.text.trim().is_empty() {
        widgets.push(Widget::Text(message.text.clone()));
    }

    for block in message.blocks() {
        match block {
            Block::Quiz(payload) => match QuizSession::from_payload(payload.clone()) {
                Ok(session) => widgets.push(Widget::Quiz(session)),
                Err(e) => tracing::warn!("skipping quiz widget: {}", e),
            },
            Block::Cheatsheet(payload) => {
                widgets.push(Widget::Cheatsheet(CheatsheetCard::from(payload.clone())))
            }
            Block::Resources(payload) => {
                widgets.push(Widget::Resources(ResourcesCard::from(payload.clone())))
            }
        }
    }

    widgets
}

/// Extract and dispatch raw message content in one go
pub fn widgets_for(content: &str) -> Vec<Widget> {
    dispatch(&protocol::extract(content))
}
