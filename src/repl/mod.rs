//! Interactive terminal front end
//!
//! Reads commands line by line and carries out the [`Effect`]s the
//! application hands back. Sends run on spawned tasks so the prompt stays
//! usable while the tutor is thinking; their results come back over a
//! channel and are applied on the loop, one at a time.

pub mod commands;
mod panels;

use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::Duration;

use console::style;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;

use crate::app::{App, AppError, ChatSession, PendingSend, QuizAdvance, View};
use crate::conversation::ConversationId;
use crate::effects::{Effect, ToastKind};
use crate::gateway::{GatewayError, SendMessageResponse};
use crate::quiz::AnswerOutcome;
use crate::render::{self, terminal};

pub use commands::{parse, Command, CommandError, HELP};

/// Background work finishing
enum Event {
    Reply(PendingSend, Result<SendMessageResponse, GatewayError>),
    Rollover(ConversationId),
}

pub struct Repl<R, W> {
    app: App,
    input: Lines<R>,
    out: W,
    events_tx: mpsc::UnboundedSender<Event>,
    events: mpsc::UnboundedReceiver<Event>,
    /// Spawned sends and rollover timers not yet reported back
    outstanding: usize,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(app: App, input: R, out: W) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            app,
            input: input.lines(),
            out,
            events_tx,
            events,
            outstanding: 0,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn into_parts(self) -> (App, W) {
        (self.app, self.out)
    }

    /// Run until `/quit` or end of input, then wait for outstanding work
    pub async fn run(&mut self) -> io::Result<()> {
        let started = self.start().await;
        self.report(started)?;

        loop {
            self.prompt()?;
            tokio::select! {
                line = self.input.next_line() => {
                    let Some(line) = line? else { break };
                    match commands::parse(&line) {
                        Ok(None) => {}
                        Ok(Some(Command::Quit)) => break,
                        Ok(Some(command)) => {
                            let result = self.execute(command).await;
                            self.report(result)?;
                        }
                        Err(e) => self.report(Err(AppError::Validation(e.to_string())))?,
                    }
                }
                Some(event) = self.events.recv() => {
                    let result = self.handle(event).await;
                    self.report(result)?;
                }
            }
        }

        self.drain().await
    }

    async fn start(&mut self) -> Result<(), AppError> {
        let url = self.app.config().api_url.clone();
        writeln!(self.out, "{}", style("AI Tutor").magenta().bold())?;
        match self.app.backend().health().await {
            Ok(banner) => writeln!(self.out, "{}", style(format!("{} · {}", banner, url)).dim())?,
            Err(e) => {
                tracing::warn!("health check failed: {}", e);
                self.toast(ToastKind::Error, &format!("Backend unreachable at {}", url))?;
            }
        }

        let effects = self.app.start().await;
        self.apply(effects).await?;
        writeln!(
            self.out,
            "Chatting as {}. /new starts a chat, /help lists commands.",
            style(self.app.current_user().username).bold()
        )?;
        Ok(())
    }

    async fn drain(&mut self) -> io::Result<()> {
        while self.outstanding > 0 {
            let Some(event) = self.events.recv().await else {
                break;
            };
            let result = self.handle(event).await;
            self.report(result)?;
        }
        Ok(())
    }

    /// Show handler errors; only terminal I/O failures end the loop
    fn report(&mut self, result: Result<(), AppError>) -> io::Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(AppError::Io(e)) => Err(e),
            Err(e) => writeln!(self.out, "{}", style(format!("✗ {}", e)).red()),
        }
    }

    fn prompt(&mut self) -> io::Result<()> {
        let marker = if self.app.is_busy() { "…" } else { "›" };
        write!(self.out, "{} ", style(marker).dim())?;
        self.out.flush()
    }

    async fn execute(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::Say(text) => {
                let pending = self.app.begin_send(&text)?;
                self.spawn_send(pending);
            }
            Command::Quick(action) => {
                let pending = self.app.quick_action(action)?;
                self.show_last_message()?;
                self.spawn_send(pending);
            }
            Command::Enhance(text) => {
                let enhanced = self.app.enhance_prompt(&text).await?;
                writeln!(self.out, "{}\n{}", style("Enhanced prompt:").cyan().bold(), enhanced)?;
                if self.app.chat().is_some() {
                    writeln!(self.out, "{}", style("/send to send it").dim())?;
                }
            }
            Command::SendDraft => {
                let draft = self
                    .app
                    .chat()
                    .and_then(ChatSession::draft)
                    .map(str::to_string)
                    .ok_or(AppError::Unavailable("Nothing to send, use /enhance first"))?;
                let pending = self.app.begin_send(&draft)?;
                self.app.take_draft();
                self.show_last_message()?;
                self.spawn_send(pending);
            }
            Command::Answer(index) => {
                let outcome = self.app.answer(index)?;
                self.show_answer(&outcome)?;
            }
            Command::AnswerText(option) => {
                let outcome = self.app.answer_text(&option)?;
                self.show_answer(&outcome)?;
            }
            Command::Hint => {
                if self.app.hint()?.is_none() {
                    writeln!(self.out, "{}", style("No hint for this question").dim())?;
                }
                self.show_quiz()?;
            }
            Command::Next => match self.app.advance_quiz()? {
                QuizAdvance::Next(_) => self.show_quiz()?,
                QuizAdvance::Finished { report, .. } => {
                    self.show_quiz()?;
                    self.show_last_message()?;
                    self.spawn_send(report);
                }
            },
            Command::Download => {
                let effect = self.app.download_cheatsheet()?;
                self.apply(vec![effect]).await?;
            }
            Command::Print => {
                let effect = self.app.print_cheatsheet()?;
                self.apply(vec![effect]).await?;
            }
            Command::OpenLink(index) => {
                let effect = self.app.open_resource(index)?;
                self.apply(vec![effect]).await?;
            }
            Command::New => {
                self.app.new_chat(false).await?;
                self.show_transcript()?;
            }
            Command::Guest => {
                self.app.new_chat(true).await?;
                self.apply(vec![Effect::info("Guest chat: nothing here is remembered")])
                    .await?;
                self.show_transcript()?;
            }
            Command::List => self.show_conversations()?,
            Command::Open(id) => {
                let opened = self.app.open_conversation(id).await;
                self.show_transcript()?;
                opened?;
            }
            Command::Rename(title) => {
                let id = self
                    .app
                    .active_conversation_id()
                    .ok_or(AppError::NoActiveConversation)?;
                self.app.rename_conversation(id, &title).await?;
                self.toast(ToastKind::Success, &format!("Renamed to {}", title.trim()))?;
            }
            Command::Delete(id) => {
                let id = match id {
                    Some(id) => id,
                    None => self
                        .app
                        .active_conversation_id()
                        .ok_or(AppError::NoActiveConversation)?,
                };
                let effect = self.app.request_delete_conversation(id);
                self.apply(vec![effect]).await?;
            }
            Command::ClearChats => {
                let effect = self.app.request_delete_all_conversations();
                self.apply(vec![effect]).await?;
            }
            Command::Users => {
                self.app.load_users().await?;
                let text = panels::users(self.app.users(), self.app.user_id());
                writeln!(self.out, "{}", text)?;
            }
            Command::SwitchUser(id) => {
                self.app.switch_user(id).await?;
                let name = self.app.current_user().username;
                writeln!(self.out, "Now chatting as {}", style(name).bold())?;
                self.show_conversations()?;
            }
            Command::Profile => {
                let effects = self.app.open_profile().await;
                self.apply(effects).await?;
                self.show_profile()?;
            }
            Command::Forget => {
                let effect = self.app.request_flush_memories();
                self.apply(vec![effect]).await?;
                self.show_profile()?;
            }
            Command::Settings => {
                self.app.open_settings().await?;
                self.show_settings()?;
            }
            Command::Provider { id, api_key } => {
                let effect = self.app.select_provider(&id, api_key.as_deref()).await?;
                self.apply(vec![effect]).await?;
            }
            Command::Back => {
                self.app.close_panel();
                self.show_transcript()?;
            }
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => {}
        }
        Ok(())
    }

    async fn handle(&mut self, event: Event) -> Result<(), AppError> {
        self.outstanding = self.outstanding.saturating_sub(1);
        match event {
            Event::Reply(pending, result) => {
                let shown = self.app.active_conversation_id() == Some(pending.conversation_id);
                let effects = self.app.finish_send(pending, result);
                if shown {
                    self.show_last_message()?;
                }
                self.apply(effects).await
            }
            Event::Rollover(id) => {
                let opened = self.app.complete_rollover(id).await;
                self.show_transcript()?;
                opened
            }
        }
    }

    /// Carry out effects in order; confirmed actions append their own
    async fn apply(&mut self, effects: Vec<Effect>) -> Result<(), AppError> {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Confirm(action) => {
                    if self.confirm(action.prompt()).await? {
                        queue.extend(self.app.confirm(action).await?);
                    } else {
                        writeln!(self.out, "{}", style("Cancelled").dim())?;
                    }
                }
                Effect::Toast { kind, text } => self.toast(kind, &text)?,
                Effect::Reload => self.show_conversations()?,
                Effect::OpenUrl(url) => {
                    tracing::info!(%url, "opening resource");
                    writeln!(self.out, "Open in your browser: {}", style(url).green().underlined())?;
                }
                Effect::Print { title, html } => {
                    writeln!(self.out, "{}", style(title).bold().underlined())?;
                    writeln!(self.out, "{}", render::html_to_text(&html))?;
                }
                Effect::Download {
                    file_name,
                    contents,
                } => {
                    let dir = self.app.config().download_dir.clone();
                    match render::save_download(&dir, &file_name, &contents).await {
                        Ok(path) => {
                            self.toast(ToastKind::Success, &format!("Saved {}", path.display()))?
                        }
                        Err(e) => {
                            tracing::error!("failed to save {}: {}", file_name, e);
                            self.toast(ToastKind::Error, &format!("Could not save {}: {}", file_name, e))?;
                        }
                    }
                }
                Effect::ScheduleRollover {
                    conversation_id,
                    after,
                } => {
                    writeln!(self.out, "{}", style("Moving to a fresh conversation…").dim())?;
                    self.spawn_rollover(conversation_id, after);
                }
            }
        }
        Ok(())
    }

    async fn confirm(&mut self, prompt: &str) -> Result<bool, AppError> {
        write!(self.out, "{} [y/N] ", prompt)?;
        self.out.flush()?;
        let answer = self.input.next_line().await?.unwrap_or_default();
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn spawn_send(&mut self, pending: PendingSend) {
        let backend = self.app.backend();
        let tx = self.events_tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let result = pending.run(backend.as_ref()).await;
            // Receiver only goes away when the loop has exited
            let _ = tx.send(Event::Reply(pending, result));
        });
    }

    fn spawn_rollover(&mut self, id: ConversationId, after: Duration) {
        let tx = self.events_tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(Event::Rollover(id));
        });
    }

    // ========== Output ==========

    fn toast(&mut self, kind: ToastKind, text: &str) -> io::Result<()> {
        let line = match kind {
            ToastKind::Info => style(text.to_string()).cyan(),
            ToastKind::Success => style(format!("✓ {}", text)).green(),
            ToastKind::Error => style(format!("✗ {}", text)).red(),
        };
        writeln!(self.out, "{}", line)
    }

    fn show_transcript(&mut self) -> io::Result<()> {
        let Some(chat) = self.app.chat() else {
            return Ok(());
        };
        let text = chat
            .transcript()
            .messages()
            .iter()
            .map(terminal::message)
            .collect::<Vec<_>>()
            .join("\n\n");
        writeln!(self.out, "{}", text)
    }

    fn show_last_message(&mut self) -> io::Result<()> {
        let Some(message) = self.app.chat().and_then(|c| c.transcript().last()) else {
            return Ok(());
        };
        let text = terminal::message(message);
        writeln!(self.out, "{}", text)
    }

    fn show_answer(&mut self, outcome: &AnswerOutcome) -> io::Result<()> {
        if outcome.awarded_xp > 0 {
            writeln!(self.out, "{}", style(format!("+{} XP", outcome.awarded_xp)).magenta().bold())?;
        }
        self.show_quiz()
    }

    fn show_quiz(&mut self) -> io::Result<()> {
        let Some(quiz) = self.app.chat().and_then(ChatSession::quiz) else {
            return Ok(());
        };
        let text = terminal::quiz(quiz);
        writeln!(self.out, "{}", text)
    }

    fn show_conversations(&mut self) -> io::Result<()> {
        let text = panels::conversations(self.app.conversations(), self.app.active_conversation_id());
        writeln!(self.out, "{}", text)
    }

    fn show_profile(&mut self) -> io::Result<()> {
        let user = self.app.current_user();
        let View::Profile(profile) = self.app.view() else {
            return Ok(());
        };
        let text = panels::profile(&user, profile);
        writeln!(self.out, "{}", text)
    }

    fn show_settings(&mut self) -> io::Result<()> {
        let View::Settings(settings) = self.app.view() else {
            return Ok(());
        };
        let text = panels::settings(settings);
        writeln!(self.out, "{}", text)
    }
}
