//! Plain terminal rendering of messages and widgets
//!
//! Styling goes through `console`, which drops colours automatically when
//! stdout is not a terminal.

use std::sync::OnceLock;

use console::style;
use regex::{Captures, Regex};

use super::{widgets_for, CheatsheetCard, ResourcesCard, Widget, EMPTY_RESOURCES};
use crate::conversation::{Message, Role};
use crate::quiz::{QuizSession, QuizState, HINT_PENALTY};

/// Cheatsheet preview lines shown inline
const PREVIEW_LINES: usize = 20;

/// Render one transcript entry
pub fn message(message: &Message) -> String {
    match message.role {
        Role::User => format!("{} {}", style("you ›").blue().bold(), message.content),
        Role::System => format!("{} {}", style("!").yellow().bold(), style(&message.content).yellow()),
        Role::Assistant => {
            let body = widgets_for(&message.content)
                .iter()
                .map(widget)
                .collect::<Vec<_>>()
                .join("\n\n");
            format!("{}\n{}", style("tutor ›").magenta().bold(), body)
        }
    }
}

pub fn widget(widget: &Widget) -> String {
    match widget {
        Widget::Text(text) => markdown(text),
        Widget::Quiz(session) => quiz(session),
        Widget::Cheatsheet(card) => cheatsheet(card),
        Widget::Resources(card) => resources(card),
    }
}

/// Light markdown: headings, bullets, `**bold**` and `code`
pub fn markdown(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if let Some(heading) = trimmed.strip_prefix('#') {
                let heading = heading.trim_start_matches('#').trim();
                style(inline(heading)).bold().underlined().to_string()
            } else if let Some(item) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                format!("  • {}", inline(item))
            } else {
                inline(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn inline(text: &str) -> String {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    static CODE: OnceLock<Regex> = OnceLock::new();

    let bold = BOLD.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid pattern"));
    let code = CODE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("valid pattern"));

    let text = bold.replace_all(text, |caps: &Captures| style(&caps[1]).bold().to_string());
    code.replace_all(&text, |caps: &Captures| style(&caps[1]).cyan().to_string())
        .into_owned()
}

pub fn quiz(session: &QuizSession) -> String {
    let mut out = Vec::new();

    let Some(question) = session.current() else {
        let summary = session.summary();
        out.push(style("Quiz complete!").green().bold().to_string());
        out.push(format!(
            "Score: {}/{} ({}%)",
            summary.correct,
            summary.total,
            summary.percentage()
        ));
        out.push(format!("Total XP earned: {}", style(summary.total_xp).magenta().bold()));
        return out.join("\n");
    };

    out.push(format!(
        "{}  {}",
        style(format!("Question {} of {}", session.index() + 1, session.len())).dim(),
        style(format!("{} XP available", session.available_xp())).magenta().bold()
    ));
    out.push(style(format!("> {}", question.question)).bold().to_string());

    let answered = match session.state() {
        QuizState::Answered { selected, .. } => Some(selected),
        _ => None,
    };

    for (i, option) in question.options.iter().enumerate() {
        let is_correct = *option == question.correct_answer;
        let line = match answered {
            Some(_) if is_correct => style(format!("  {}. {} ✓", i + 1, option)).green().to_string(),
            Some(selected) if selected == i => style(format!("  {}. {} ✗", i + 1, option)).red().to_string(),
            Some(_) => style(format!("  {}. {}", i + 1, option)).dim().to_string(),
            None => format!("  {}. {}", i + 1, option),
        };
        out.push(line);
    }

    if session.hint_used() {
        if let Some(ref hint) = question.hint {
            out.push(format!("{} {}", style("Hint:").cyan().bold(), hint));
        }
    }

    match session.state() {
        QuizState::Answering if !session.hint_used() => out.push(
            style(format!(
                "/answer <n> to answer, /hint to reveal a hint (-{} XP)",
                HINT_PENALTY
            ))
            .dim()
            .to_string(),
        ),
        QuizState::Answering => out.push(style("/answer <n> to answer").dim().to_string()),
        QuizState::Answered { correct, .. } => {
            let verdict = if correct { "✅ Correct" } else { "❌ Incorrect" };
            out.push(style(verdict).bold().to_string());
            if let Some(ref explanation) = question.explanation {
                out.push(explanation.clone());
            }
            let next = if session.index() + 1 < session.len() {
                "/next for the next question"
            } else {
                "/next to finish"
            };
            out.push(style(next).dim().to_string());
        }
        QuizState::Finished => {}
    }

    out.join("\n")
}

pub fn cheatsheet(card: &CheatsheetCard) -> String {
    let mut out = vec![format!(
        "{} {}",
        style("Cheatsheet:").dim(),
        style(&card.topic).bold()
    )];

    let preview = card.preview();
    let lines: Vec<&str> = preview.lines().collect();
    for line in lines.iter().take(PREVIEW_LINES) {
        out.push(format!("  │ {}", line));
    }
    if lines.len() > PREVIEW_LINES {
        out.push(format!("  │ … {} more lines", lines.len() - PREVIEW_LINES));
    }

    out.push(style("/download to save as HTML, /print to print").dim().to_string());
    out.join("\n")
}

pub fn resources(card: &ResourcesCard) -> String {
    let mut out = vec![format!(
        "{} Results for \"{}\"",
        style("Learning Resources").dim(),
        card.query
    )];

    if card.is_empty() {
        out.push(style(EMPTY_RESOURCES).dim().to_string());
        return out.join("\n");
    }

    for (i, resource) in card.resources.iter().enumerate() {
        out.push(format!("  {}. {}", i + 1, style(&resource.title).bold()));
        out.push(format!("     {}", style(&resource.url).green()));
        if !resource.description.is_empty() {
            out.push(format!("     {}", resource.description));
        }
    }
    out.push(style("/open-link <n> to open in your browser").dim().to_string());
    out.join("\n")
}
