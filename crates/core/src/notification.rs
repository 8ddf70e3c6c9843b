//! Delivery channel records.

use chrono::{DateTime, Utc};

/// Where and how to deliver a fired alert.
///
/// The Telegram pair drives the current channel; the SMTP block is reserved
/// for future channels and is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub telegram_bot_id: String,
    pub telegram_chat_id: i64,
    pub smtp_host: String,
    pub smtp_port: i32,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_from: String,
    pub smtp_encryption_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// True when the Telegram channel is fully configured.
    pub fn has_telegram(&self) -> bool {
        !self.telegram_bot_id.is_empty() && self.telegram_chat_id != 0
    }
}

/// Admin API account. Read-only for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
