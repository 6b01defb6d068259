//! Cheatsheet card: text preview plus local download and print

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::effects::Effect;
use crate::protocol::CheatsheetPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheatsheetCard {
    pub topic: String,
    pub html: String,
}

impl From<CheatsheetPayload> for CheatsheetCard {
    fn from(payload: CheatsheetPayload) -> Self {
        Self {
            topic: payload.topic,
            html: payload.html,
        }
    }
}

impl CheatsheetCard {
    /// `Ownership Rules` -> `Ownership_Rules_cheatsheet.html`
    pub fn file_name(&self) -> String {
        let topic = self.topic.split_whitespace().collect::<Vec<_>>().join("_");
        format!("{}_cheatsheet.html", topic)
    }

    pub fn download(&self) -> Effect {
        Effect::Download {
            file_name: self.file_name(),
            contents: self.html.clone(),
        }
    }

    pub fn print(&self) -> Effect {
        Effect::Print {
            title: format!("{} Cheatsheet", self.topic),
            html: self.html.clone(),
        }
    }

    /// Readable text rendition of the HTML. Nothing in the document is run.
    pub fn preview(&self) -> String {
        html_to_text(&self.html)
    }
}

/// Write a downloaded document into `dir`, returning the full path
pub async fn save_download(dir: &Path, file_name: &str, contents: &str) -> std::io::Result<PathBuf> {
    let name = Path::new(file_name)
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty file name"))?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, contents).await?;
    tracing::info!("saved {}", path.display());
    Ok(path)
}

/// Strip markup, dropping `script`, `style` and `head` content entirely
pub fn html_to_text(html: &str) -> String {
    static HIDDEN: OnceLock<Regex> = OnceLock::new();
    static BREAKS: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();

    let hidden = HIDDEN.get_or_init(|| {
        Regex::new(r"(?is)<(script|style|head)\b.*?</(script|style|head)\s*>").expect("valid pattern")
    });
    let breaks = BREAKS.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|section|table|ul|ol)\s*>").expect("valid pattern")
    });
    let tags = TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid pattern"));

    let text = hidden.replace_all(html, "");
    let text = breaks.replace_all(&text, "\n");
    let text = tags.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
