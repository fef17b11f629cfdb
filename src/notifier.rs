use async_trait::async_trait;
use std::fmt;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::info;

use crate::error::CycleError;

/// Delivers plain-text messages to the single configured chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), CycleError>;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat: Recipient,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat: Recipient) -> Self {
        Self { bot, chat }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), CycleError> {
        self.bot
            .send_message(self.chat.clone(), text)
            .await
            .map_err(|err| CycleError::Delivery(err.to_string()))?;
        info!(message = %text, "bot sent a message");
        Ok(())
    }
}

/// Parse a chat destination: a numeric chat id or an `@channel` username.
pub fn parse_recipient(raw: &str) -> Option<Recipient> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Some(Recipient::Id(ChatId(id)));
    }
    match raw.strip_prefix('@') {
        Some(name) if !name.is_empty() && !name.contains(char::is_whitespace) => {
            Some(Recipient::ChannelUsername(raw.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_chat_ids() {
        assert_eq!(parse_recipient("12345"), Some(Recipient::Id(ChatId(12345))));
        assert_eq!(
            parse_recipient(" -100200300 "),
            Some(Recipient::Id(ChatId(-100200300)))
        );
    }

    #[test]
    fn channel_usernames() {
        assert_eq!(
            parse_recipient("@reviews"),
            Some(Recipient::ChannelUsername("@reviews".into()))
        );
        assert_eq!(parse_recipient("@"), None);
        assert_eq!(parse_recipient("reviews"), None);
        assert_eq!(parse_recipient(""), None);
    }
}
