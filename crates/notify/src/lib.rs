//! Alert delivery sinks.
//!
//! Two implementations of the core `AlertSink` trait: a JSON file the
//! Discord bot polls, and a direct Discord webhook. Both are constructed
//! from explicit configuration at startup.

pub mod discord;
pub mod file;

pub use discord::DiscordWebhookSink;
pub use file::FileAlertSink;
