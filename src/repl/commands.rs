//! Slash-command parsing

use thiserror::Error;

use crate::app::QuickAction;
use crate::conversation::ConversationId;
use crate::gateway::UserId;

pub const HELP: &str = "\
Chat
  <text>                 send a message
  /quiz                  ask for a quiz on the current topic
  /cheatsheet            ask for a cheatsheet
  /resources             ask for learning resources
  /enhance <text>        let the tutor improve a prompt, then /send it
  /send                  send the enhanced prompt

Quiz
  /answer <n|text>       pick option n, or the option with this text
  /hint                  reveal the hint (costs XP)
  /next                  next question, or finish the quiz

Cards
  /download              save the cheatsheet as HTML
  /print                 print the cheatsheet
  /open-link <n>         open resource n

Conversations
  /new                   start a new chat
  /guest                 start a guest chat (nothing is remembered)
  /list                  list your chats
  /open <id>             open a chat
  /rename <title>        rename the open chat
  /delete [id]           delete a chat (the open one by default)
  /clear-chats           delete all your chats

Account
  /users                 list users
  /user <id>             switch user
  /profile               show XP, streak and memories
  /forget                delete all memories
  /settings              show model providers
  /provider <id> [key]   switch model provider
  /back                  leave the profile or settings panel

  /help                  this help
  /quit                  exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Quick(QuickAction),
    Enhance(String),
    SendDraft,
    Answer(usize),
    AnswerText(String),
    Hint,
    Next,
    Download,
    Print,
    OpenLink(usize),
    New,
    Guest,
    List,
    Open(ConversationId),
    Rename(String),
    Delete(Option<ConversationId>),
    ClearChats,
    Users,
    SwitchUser(UserId),
    Profile,
    Forget,
    Settings,
    Provider { id: String, api_key: Option<String> },
    Back,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),

    #[error("/{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("/{command}: '{value}' is not a valid number")]
    InvalidNumber { command: &'static str, value: String },
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "quiz" => Command::Quick(QuickAction::QuizMe),
        "cheatsheet" => Command::Quick(QuickAction::Cheatsheet),
        "resources" => Command::Quick(QuickAction::ExploreResources),
        "enhance" => Command::Enhance(required(args, "enhance", "a prompt")?.to_string()),
        "send" => Command::SendDraft,
        "answer" => answer(args)?,
        "hint" => Command::Hint,
        "next" => Command::Next,
        "download" => Command::Download,
        "print" => Command::Print,
        "open-link" => Command::OpenLink(position(args, "open-link")?),
        "new" => Command::New,
        "guest" => Command::Guest,
        "list" | "chats" => Command::List,
        "open" => Command::Open(number(required(args, "open", "a chat id")?, "open")?),
        "rename" => Command::Rename(required(args, "rename", "a title")?.to_string()),
        "delete" => Command::Delete(if args.is_empty() {
            None
        } else {
            Some(number(args, "delete")?)
        }),
        "clear-chats" => Command::ClearChats,
        "users" => Command::Users,
        "user" => Command::SwitchUser(number(required(args, "user", "a user id")?, "user")?),
        "profile" => Command::Profile,
        "forget" => Command::Forget,
        "settings" => Command::Settings,
        "provider" => {
            let mut parts = required(args, "provider", "a provider id")?.split_whitespace();
            let id = parts.next().unwrap_or_default().to_string();
            Command::Provider {
                id,
                api_key: parts.next().map(str::to_string),
            }
        }
        "back" => Command::Back,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(
    args: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    if args.is_empty() {
        Err(CommandError::MissingArgument { command, argument })
    } else {
        Ok(args)
    }
}

fn number(value: &str, command: &'static str) -> Result<i64, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidNumber {
        command,
        value: value.to_string(),
    })
}

/// One-based position as typed, converted to a zero-based index
fn position(args: &str, command: &'static str) -> Result<usize, CommandError> {
    let raw = required(args, command, "a number")?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::InvalidNumber {
            command,
            value: raw.to_string(),
        }),
    }
}

/// A number picks by position; anything else is taken as the option text
fn answer(args: &str) -> Result<Command, CommandError> {
    let raw = required(args, "answer", "a number or option text")?;
    if raw.parse::<i64>().is_ok() {
        position(raw, "answer").map(Command::Answer)
    } else {
        Ok(Command::AnswerText(raw.to_string()))
    }
}
