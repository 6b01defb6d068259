//! Text rendering of the side panels: chat list, users, profile, settings

use console::style;

use crate::app::{category_icon, ProfileView, SettingsView};
use crate::conversation::{Conversation, ConversationId};
use crate::gateway::{UserId, UserInfo};

pub fn conversations(list: &[Conversation], active: Option<ConversationId>) -> String {
    if list.is_empty() {
        return style("No conversations yet. /new starts one.").dim().to_string();
    }

    list.iter()
        .map(|conv| {
            let marker = if Some(conv.id) == active { "▸" } else { " " };
            let date = conv
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            format!(
                "{} {:>4}  {}  {}",
                marker,
                conv.id,
                style(&conv.title).bold(),
                style(date).dim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn users(list: &[UserInfo], current: UserId) -> String {
    list.iter()
        .map(|user| {
            let marker = if user.id == current { "▸" } else { " " };
            format!("{} {:>4}  {}", marker, user.id, user.username)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn profile(user: &UserInfo, view: &ProfileView) -> String {
    let mut out = vec![style(&user.username).bold().to_string()];

    match view.stats {
        Some(ref stats) => {
            out.push(format!(
                "Level {} · {}",
                stats.level,
                style(&stats.level_title).magenta()
            ));
            out.push(format!(
                "{} {}/{} XP ({:.0}%), {} total",
                progress_bar(stats.progress_percent),
                stats.current_xp,
                stats.xp_for_next_level,
                stats.progress_percent,
                stats.total_xp
            ));
            if view.has_streak() {
                out.push(format!("🔥 {} day streak", stats.streak_days));
            }
        }
        None => out.push(style("No stats yet").dim().to_string()),
    }

    out.push(String::new());
    out.push(format!("{} ({})", style("Memories").bold(), view.memories.len()));
    if view.memories.is_empty() {
        out.push(style("  Nothing remembered yet").dim().to_string());
    }
    for memory in &view.memories {
        out.push(format!("  {} {}", category_icon(&memory.category), memory.content));
    }
    out.join("\n")
}

fn progress_bar(percent: f64) -> String {
    const WIDTH: usize = 20;
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * WIDTH as f64).round() as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(WIDTH - filled))
}

pub fn settings(view: &SettingsView) -> String {
    let mut out = vec![style("Model provider").bold().to_string()];
    for provider in &view.providers {
        let marker = if provider.id == view.provider { "▸" } else { " " };
        let key_note = match (provider.requires_key, view.has_api_key) {
            (true, true) => " (key saved)",
            (true, false) => " (needs API key)",
            _ => "",
        };
        out.push(format!(
            "{} {:<8} {}{}",
            marker,
            provider.id,
            provider.name,
            style(key_note).dim()
        ));
    }
    out.push(style("/provider <id> [api key] to switch").dim().to_string());
    out.join("\n")
}
