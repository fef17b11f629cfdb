//! Polls the homework review API and reports status changes to a Telegram
//! chat.
pub mod api;
pub mod config;
pub mod detector;
pub mod error;
pub mod homework;
pub mod notifier;
pub mod poller;
