//! Telegram delivery channel.

use async_trait::async_trait;
use teloxide::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// External delivery channel for fired alerts.
#[async_trait]
pub trait Courier: Send + Sync {
    async fn send(&self, bot_token: &str, chat_id: i64, text: &str) -> Result<(), CourierError>;
}

/// Delivers through the Telegram bot API. The bot token lives in the
/// notification record, so a session is built per send.
pub struct TelegramCourier;

#[async_trait]
impl Courier for TelegramCourier {
    async fn send(&self, bot_token: &str, chat_id: i64, text: &str) -> Result<(), CourierError> {
        let bot = Bot::new(bot_token);
        bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}
