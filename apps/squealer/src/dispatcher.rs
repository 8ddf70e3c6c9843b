//! Alert consumption and delivery.

use crate::telegram::Courier;
use moexmon_core::AlertMessage;
use moexmon_store::WatchStore;
use tracing::{debug, error, warn};

/// Durable consumer identity. Reusing this name across restarts is what
/// lets an undelivered alert survive a process crash.
pub const DURABLE_NAME: &str = "Squealer";

/// Stream that owns the alert subjects.
pub const ALERT_STREAM: &str = "alerts";

/// Pattern the stream captures.
pub const ALERT_SUBJECTS: &str = "alerts.*";

/// Subject the monitor publishes on.
pub const ALERT_SUBJECT: &str = "alerts.MOEX";

/// Handle one alert payload: decode, correlate, deliver.
///
/// The caller acknowledges the message before this runs, so every failure
/// here is logged and dropped rather than redelivered. Calls are isolated
/// units; the bus may run several concurrently.
pub async fn handle_alert<S, C>(store: &S, courier: &C, payload: &[u8])
where
    S: WatchStore,
    C: Courier,
{
    let alert = match AlertMessage::from_bytes(payload) {
        Ok(alert) => alert,
        Err(e) => {
            error!(error = %e, "failed to decode alert message");
            return;
        }
    };
    debug!(
        subject = %alert.subject,
        notification_id = alert.notification_id,
        "received alert"
    );

    let notification = match store.get_notification(alert.notification_id as i64).await {
        Ok(notification) => notification,
        Err(e) => {
            error!(
                notification_id = alert.notification_id,
                error = %e,
                "failed to resolve notification"
            );
            return;
        }
    };

    if notification.has_telegram() {
        if let Err(e) = courier
            .send(
                &notification.telegram_bot_id,
                notification.telegram_chat_id,
                &alert.subject,
            )
            .await
        {
            error!(notification_id = notification.id, error = %e, "failed to deliver alert");
        }
    } else {
        warn!(
            notification_id = notification.id,
            "no delivery channel configured for notification"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::CourierError;
    use async_trait::async_trait;
    use chrono::Utc;
    use moexmon_core::{Notification, WatchlistItem};
    use moexmon_store::StoreError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockStore {
        notifications: HashMap<i64, Notification>,
    }

    #[async_trait]
    impl WatchStore for MockStore {
        async fn list_active_watch(&self) -> Result<Vec<WatchlistItem>, StoreError> {
            Ok(Vec::new())
        }

        async fn list_all_watch(&self) -> Result<Vec<WatchlistItem>, StoreError> {
            Ok(Vec::new())
        }

        async fn set_inactive(&self, _ticker: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get_notification(&self, id: i64) -> Result<Notification, StoreError> {
            self.notifications
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotificationNotFound(id))
        }
    }

    #[derive(Default)]
    struct MockCourier {
        sent: Mutex<Vec<(String, i64, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Courier for MockCourier {
        async fn send(
            &self,
            bot_token: &str,
            chat_id: i64,
            text: &str,
        ) -> Result<(), CourierError> {
            if self.fail {
                return Err(CourierError::Api(teloxide::RequestError::RetryAfter(
                    teloxide::types::Seconds::from_seconds(1),
                )));
            }
            self.sent
                .lock()
                .unwrap()
                .push((bot_token.to_string(), chat_id, text.to_string()));
            Ok(())
        }
    }

    fn notification(id: i64, bot: &str, chat: i64) -> Notification {
        Notification {
            id,
            telegram_bot_id: bot.to_string(),
            telegram_chat_id: chat,
            smtp_host: String::new(),
            smtp_port: 0,
            smtp_user: String::new(),
            smtp_pass: String::new(),
            smtp_from: String::new(),
            smtp_encryption_type: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn alert_bytes(subject: &str, notification_id: u64) -> Vec<u8> {
        AlertMessage {
            subject: subject.to_string(),
            notification_id,
        }
        .to_bytes()
        .unwrap()
    }

    #[tokio::test]
    async fn test_alert_is_delivered() {
        let store = MockStore {
            notifications: HashMap::from([(7, notification(7, "123:token", 42))]),
        };
        let courier = MockCourier::default();
        let payload = alert_bytes("The price for SBER is above 250.00", 7);

        handle_alert(&store, &courier, &payload).await;

        let sent = courier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "123:token");
        assert_eq!(sent[0].1, 42);
        assert_eq!(sent[0].2, "The price for SBER is above 250.00");
    }

    #[tokio::test]
    async fn test_unconfigured_channel_sends_nothing() {
        let store = MockStore {
            notifications: HashMap::from([(7, notification(7, "", 0))]),
        };
        let courier = MockCourier::default();
        let payload = alert_bytes("The price for SBER is above 250.00", 7);

        handle_alert(&store, &courier, &payload).await;

        assert!(courier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_notification_is_dropped() {
        let store = MockStore {
            notifications: HashMap::new(),
        };
        let courier = MockCourier::default();
        let payload = alert_bytes("The price for SBER is above 250.00", 99);

        handle_alert(&store, &courier, &payload).await;

        assert!(courier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_dropped() {
        let store = MockStore {
            notifications: HashMap::from([(7, notification(7, "123:token", 42))]),
        };
        let courier = MockCourier::default();

        handle_alert(&store, &courier, &[0xff, 0x01, 0x02]).await;

        assert!(courier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_panic() {
        let store = MockStore {
            notifications: HashMap::from([(7, notification(7, "123:token", 42))]),
        };
        let courier = MockCourier {
            fail: true,
            ..Default::default()
        };
        let payload = alert_bytes("The price for SBER is above 250.00", 7);

        handle_alert(&store, &courier, &payload).await;

        assert!(courier.sent.lock().unwrap().is_empty());
    }
}
