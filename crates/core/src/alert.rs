//! Alert payload and its wire encoding.

use crate::WatchlistItem;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the alert wire codec.
#[derive(Debug, Error)]
pub enum AlertCodecError {
    #[error("failed to encode alert: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode alert: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Payload published on the bus when a watch condition fires.
///
/// Encoded as a MessagePack map keyed by field name so that readers skip
/// keys they do not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "NotificationId")]
    pub notification_id: u64,
}

impl AlertMessage {
    /// Build the alert for a fired watchlist item.
    pub fn for_item(item: &WatchlistItem) -> Self {
        Self {
            subject: format!(
                "The price for {} is {} {:.2}",
                item.ticker, item.condition, item.target_price
            ),
            notification_id: item.notification_id as u64,
        }
    }

    /// Encode to the wire format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AlertCodecError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Decode from the wire format. Unknown keys are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AlertCodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_roundtrip() {
        let alert = AlertMessage {
            subject: "The price for SBER is above 250.50".to_string(),
            notification_id: 7,
        };
        let bytes = alert.to_bytes().unwrap();
        let decoded = AlertMessage::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, alert);
    }

    #[test]
    fn test_subject_format() {
        let item = WatchlistItem {
            ticker: "SBER".to_string(),
            asset_class: "stock".to_string(),
            notification_id: 7,
            target_price: 250.0,
            condition: "above".to_string(),
            active: true,
        };
        let alert = AlertMessage::for_item(&item);
        assert_eq!(alert.subject, "The price for SBER is above 250.00");
        assert_eq!(alert.notification_id, 7);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        #[derive(Serialize)]
        struct Extended<'a> {
            #[serde(rename = "Subject")]
            subject: &'a str,
            #[serde(rename = "NotificationId")]
            notification_id: u64,
            #[serde(rename = "Severity")]
            severity: u32,
        }

        let bytes = rmp_serde::to_vec_named(&Extended {
            subject: "The price for GAZP is below 150.00",
            notification_id: 3,
            severity: 9,
        })
        .unwrap();

        let decoded = AlertMessage::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.subject, "The price for GAZP is below 150.00");
        assert_eq!(decoded.notification_id, 3);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(AlertMessage::from_bytes(&[0xff, 0x00, 0x13]).is_err());
    }
}
