//! Tutor client - terminal front end for the AI tutor backend
//!
//! The tutor answers in markdown and may embed structured blocks (quizzes,
//! cheatsheets, resource lists) between `:::kind` sentinels. This crate pulls
//! those blocks out of replies, turns them into interactive widgets and keeps
//! the conversation state in sync with the backend over HTTP.

pub mod app;
pub mod config;
pub mod conversation;
pub mod effects;
pub mod gateway;
pub mod protocol;
pub mod quiz;
pub mod render;
pub mod repl;

pub use app::{App, AppError};
pub use config::Config;
pub use effects::Effect;
pub use gateway::{Backend, GatewayError, HttpGateway};
