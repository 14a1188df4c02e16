//! Source code for the ideas bot: users send it ideas in private messages,
//! and admins look through them, delete them and reply to their authors.

/// Who is allowed to manage ideas.
mod admins;

/// Configuration file.
mod config;

/// Error types.
mod error;

/// Idea storage.
mod ideas;

/// Rendering ideas for admins.
mod listing;

/// Figuring out where replies to ideas go.
mod reply;

/// Operations on ideas, independent of Telegram.
mod service;

/// Functions that handle events from Telegram.
mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;
