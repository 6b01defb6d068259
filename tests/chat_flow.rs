//! End-to-end chat flows: App and Repl over the real HTTP gateway

mod common;

use std::sync::Arc;
use std::time::Duration;

use tutor_client::app::{App, AppError, QuickAction, QuizAdvance, View};
use tutor_client::config::{prompts_builtin, Config};
use tutor_client::conversation::Role;
use tutor_client::effects::{Effect, PendingAction};
use tutor_client::repl::Repl;
use tutor_client::HttpGateway;

fn config(url: &str) -> Config {
    Config {
        api_url: url.to_string(),
        rollover_delay_ms: 20,
        ..Config::default()
    }
}

fn app(url: &str) -> App {
    App::new(Arc::new(HttpGateway::new(url)), config(url))
}

fn last(app: &App) -> (Role, String) {
    let message = app.chat().unwrap().transcript().last().unwrap();
    (message.role, message.content.clone())
}

#[tokio::test]
async fn test_hello_round_trip() {
    let mock = common::spawn().await;
    let mut app = app(&mock.url);
    assert!(app.start().await.is_empty());

    let id = app.new_chat(false).await.unwrap();
    app.send("hello").await.unwrap();

    let messages = app.chat().unwrap().transcript().messages().to_vec();
    // greeting pair, then the exchange
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].content, "hello");
    assert_eq!(last(&app), (Role::Assistant, "You said: hello".into()));
    assert_eq!(mock.sent(), vec![(id, "hello".to_string())]);

    // Reopening shows the stored history instead of the greeting
    app.open_conversation(id).await.unwrap();
    assert_eq!(app.chat().unwrap().transcript().len(), 2);
}

#[tokio::test]
async fn test_rollover_moves_to_new_conversation() {
    let mock = common::spawn().await;
    let first = mock.seed_conversation(1, "Long Chat");
    let mut app = app(&mock.url);
    app.open_conversation(first).await.unwrap();

    let effects = app.send("one more, please rollover").await.unwrap();
    let [Effect::ScheduleRollover {
        conversation_id,
        after,
    }] = effects.as_slice()
    else {
        panic!("expected a rollover, got {:?}", effects);
    };
    assert_eq!(*after, Duration::from_millis(20));
    assert_eq!(last(&app), (Role::System, common::ROLLOVER_NOTICE.into()));
    assert_eq!(app.conversations()[0].title, "Continued Chat");

    app.follow_rollover(*conversation_id, *after).await.unwrap();
    assert_eq!(app.active_conversation_id(), Some(*conversation_id));
    assert!(app.conversations().iter().any(|c| c.id == first));
}

#[tokio::test]
async fn test_quiz_reply_runs_to_completion() {
    let mock = common::spawn().await;
    let mut app = app(&mock.url);
    let id = app.new_chat(false).await.unwrap();

    let pending = app.quick_action(QuickAction::QuizMe).unwrap();
    let result = pending.run(app.backend().as_ref()).await;
    app.finish_send(pending, result);

    let quiz = app.chat().unwrap().quiz().unwrap();
    assert_eq!(quiz.len(), 2);
    assert_eq!(quiz.available_xp(), 100);

    assert!(app.answer(0).unwrap().correct);
    assert_eq!(app.advance_quiz().unwrap(), QuizAdvance::Next(1));
    assert_eq!(app.hint().unwrap(), None);
    let outcome = app.answer(0).unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.correct_answer, "Returns early");

    let QuizAdvance::Finished { summary, report } = app.advance_quiz().unwrap() else {
        panic!("quiz should be over");
    };
    assert_eq!(
        report.message,
        "[SYSTEM] Quiz completed: 1/2 correct (50%), earned 100 XP"
    );
    assert_eq!(summary.total_xp, 100);

    let result = report.run(app.backend().as_ref()).await;
    app.finish_send(report, result);
    assert_eq!(last(&app), (Role::Assistant, "Great work on the quiz!".into()));
    assert_eq!(
        mock.sent().last().unwrap(),
        &(id, "[SYSTEM] Quiz completed: 1/2 correct (50%), earned 100 XP".to_string())
    );

    // The report reads the same after a reload as it did live
    let live = app.chat().unwrap().transcript().messages().to_vec();
    app.open_conversation(id).await.unwrap();
    let reloaded = app.chat().unwrap().transcript().messages().to_vec();
    assert_eq!(reloaded, live[2..].to_vec());
    assert_eq!(reloaded[2].role, Role::System);
}

#[tokio::test]
async fn test_repl_answers_by_option_text() {
    let mock = common::spawn().await;
    console::set_colors_enabled(false);

    // Quit waits for the quiz reply, so the second run starts with it in place
    let input: &[u8] = b"/new\n/quiz\n/quit\n";
    let mut repl = Repl::new(app(&mock.url), input, Vec::new());
    repl.run().await.unwrap();
    let (app, _) = repl.into_parts();

    let input: &[u8] = b"/answer let\n/next\n/answer Panics\n/answer Returns early\n/quit\n";
    let mut repl = Repl::new(app, input, Vec::new());
    repl.run().await.unwrap();
    let (app, out) = repl.into_parts();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("+100 XP"));
    assert!(out.contains("This question has already been answered"));
    let quiz = app.chat().unwrap().quiz().unwrap();
    assert_eq!(quiz.correct_count(), 1);
    assert_eq!(quiz.total_xp(), 100);
}

#[tokio::test]
async fn test_cheatsheet_download_lands_in_download_dir() {
    let mock = common::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&mock.url);
    config.download_dir = dir.path().join("sheets");
    let app = App::new(Arc::new(HttpGateway::new(&mock.url)), config);
    console::set_colors_enabled(false);

    let input: &[u8] = b"/new\n/cheatsheet\n/quit\n";
    let mut repl = Repl::new(app, input, Vec::new());
    repl.run().await.unwrap();
    let (app, out) = repl.into_parts();
    assert!(String::from_utf8(out).unwrap().contains("Cheatsheet: Rust Traits"));
    assert_eq!(app.chat().unwrap().cheatsheet().unwrap().topic, "Rust Traits");

    let input: &[u8] = b"/download\n/quit\n";
    let mut repl = Repl::new(app, input, Vec::new());
    repl.run().await.unwrap();
    let (_, out) = repl.into_parts();
    assert!(String::from_utf8(out).unwrap().contains("Saved"));

    let saved = std::fs::read_to_string(dir.path().join("sheets/Rust_Traits_cheatsheet.html")).unwrap();
    assert!(saved.contains("<h1>Traits</h1>"));
}

#[tokio::test]
async fn test_unreachable_backend_shows_error_bubble() {
    let mut app = app("http://127.0.0.1:9");
    assert!(!app.start().await.is_empty());

    let err = app.open_conversation(7).await.unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));
    assert_eq!(app.active_conversation_id(), Some(7));

    app.send("anyone there?").await.unwrap();
    assert_eq!(
        last(&app),
        (Role::System, prompts_builtin::CONNECTION_ERROR.into())
    );
    assert!(!app.is_busy());
}

#[tokio::test]
async fn test_delete_and_clear_after_confirmation() {
    let mock = common::spawn().await;
    let keep = mock.seed_conversation(1, "Keep");
    let doomed = mock.seed_conversation(1, "Drop");
    let mut app = app(&mock.url);
    app.start().await;
    app.open_conversation(doomed).await.unwrap();

    let effect = app.request_delete_conversation(doomed);
    let Effect::Confirm(action) = effect else {
        panic!("delete must ask first");
    };
    assert_eq!(action.prompt(), "Delete this conversation?");
    assert_eq!(mock.conversation_ids(1).len(), 2);

    assert_eq!(app.confirm(action).await.unwrap(), vec![Effect::Reload]);
    assert_eq!(mock.conversation_ids(1), vec![keep]);
    assert!(app.chat().is_none());
    assert_eq!(app.conversations().len(), 1);

    app.confirm(PendingAction::DeleteAllConversations)
        .await
        .unwrap();
    assert!(mock.conversation_ids(1).is_empty());
    assert!(app.conversations().is_empty());
}

#[tokio::test]
async fn test_profile_and_flush() {
    let mock = common::spawn().await;
    let mut app = app(&mock.url);

    assert!(app.open_profile().await.is_empty());
    let View::Profile(profile) = app.view() else {
        panic!("expected the profile view");
    };
    assert_eq!(profile.stats.as_ref().unwrap().level, 3);
    assert!(profile.has_streak());
    assert_eq!(profile.memories.len(), 2);

    let effects = app.confirm(PendingAction::FlushMemories).await.unwrap();
    assert_eq!(effects, vec![Effect::success("All memories have been cleared!")]);

    app.switch_user(2).await.unwrap();
    app.open_profile().await;
    let View::Profile(profile) = app.view() else {
        panic!("expected the profile view");
    };
    assert!(profile.stats.is_none());
    assert!(profile.memories.is_empty());
}

#[tokio::test]
async fn test_provider_switch() {
    let mock = common::spawn().await;
    let mut app = app(&mock.url);
    app.open_settings().await.unwrap();

    let err = app.select_provider("groq", None).await.unwrap_err();
    assert_eq!(err.to_string(), "GROQ API key is required");

    let effect = app.select_provider("groq", Some("gsk_live")).await.unwrap();
    assert_eq!(effect, Effect::success("Switched to groq"));

    // The key is stored now, so switching back and forth needs none
    app.select_provider("claude", None).await.unwrap();
    app.select_provider("groq", None).await.unwrap();
    assert_eq!(
        mock.state.lock().unwrap().settings.get(&1).unwrap().0,
        "groq"
    );
}

#[tokio::test]
async fn test_enhanced_prompt_becomes_draft() {
    let mock = common::spawn().await;
    let mut app = app(&mock.url);
    app.new_chat(false).await.unwrap();

    let enhanced = app.enhance_prompt("closures").await.unwrap();
    assert!(enhanced.starts_with("Explain closures step by step"));
    assert_eq!(app.chat().unwrap().draft(), Some(enhanced.as_str()));
}

#[tokio::test]
async fn test_repl_session() {
    let mock = common::spawn().await;
    let input: &[u8] = b"/new\nhello\n/rename Borrowing\n/list\n/frobnicate\n/quit\n";

    console::set_colors_enabled(false);
    let mut repl = Repl::new(app(&mock.url), input, Vec::new());
    repl.run().await.unwrap();
    let (app, out) = repl.into_parts();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("Agentic AI Tutor Backend Running"));
    assert!(out.contains("Hello! I am your Agentic AI Tutor."));
    assert!(out.contains("You said: hello"));
    assert!(out.contains("Renamed to Borrowing"));
    assert!(out.contains("Unknown command: /frobnicate"));
    assert_eq!(app.conversations()[0].title, "Borrowing");
}

#[tokio::test]
async fn test_repl_delete_needs_yes() {
    let mock = common::spawn().await;
    let first = mock.seed_conversation(1, "First");
    let second = mock.seed_conversation(1, "Second");
    let input = format!("/delete {}\nn\n/delete {}\ny\n/quit\n", first, second);

    console::set_colors_enabled(false);
    let mut repl = Repl::new(app(&mock.url), input.as_bytes(), Vec::new());
    repl.run().await.unwrap();
    let (_, out) = repl.into_parts();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("Delete this conversation? [y/N]"));
    assert!(out.contains("Cancelled"));
    assert_eq!(mock.conversation_ids(1), vec![first]);
}

#[tokio::test]
async fn test_repl_follows_rollover() {
    let mock = common::spawn().await;
    let input: &[u8] = b"/new\nplease rollover now\n/quit\n";

    console::set_colors_enabled(false);
    let mut repl = Repl::new(app(&mock.url), input, Vec::new());
    repl.run().await.unwrap();
    let (app, out) = repl.into_parts();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains(common::ROLLOVER_NOTICE));
    let newest = *mock.conversation_ids(1).first().unwrap();
    assert_eq!(app.active_conversation_id(), Some(newest));
}
