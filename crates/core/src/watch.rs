//! Watchlist items and their evaluation rules.

use serde::{Deserialize, Serialize};

/// Partition of securities by trading engine/board tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stock,
    Bond,
    Currency,
}

impl AssetClass {
    /// Parse the class token stored in the asset table.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stock" => Some(AssetClass::Stock),
            "bond" => Some(AssetClass::Bond),
            "currency" => Some(AssetClass::Currency),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Stock => "stock",
            AssetClass::Bond => "bond",
            AssetClass::Currency => "currency",
        }
    }
}

/// Comparison applied between the observed price and the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Above,
    Below,
}

impl Condition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "above" => Some(Condition::Above),
            "below" => Some(Condition::Below),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Above => "above",
            Condition::Below => "below",
        }
    }
}

/// A user-declared alert rule for one security.
///
/// `asset_class` and `condition` carry the raw tokens from the store; rows
/// originate from the admin API, so unknown tokens are tolerated here and
/// resolved (or skipped) at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub ticker: String,
    pub asset_class: String,
    pub notification_id: i64,
    pub target_price: f64,
    pub condition: String,
    pub active: bool,
}

impl WatchlistItem {
    /// Evaluate the rule against an observed price.
    ///
    /// Both comparisons are strict; unknown condition tokens never fire.
    pub fn matches(&self, price: f64) -> bool {
        match Condition::parse(&self.condition) {
            Some(Condition::Above) => price > self.target_price,
            Some(Condition::Below) => price < self.target_price,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(condition: &str, target: f64) -> WatchlistItem {
        WatchlistItem {
            ticker: "SBER".to_string(),
            asset_class: "stock".to_string(),
            notification_id: 7,
            target_price: target,
            condition: condition.to_string(),
            active: true,
        }
    }

    #[test]
    fn test_asset_class_parse() {
        assert_eq!(AssetClass::parse("stock"), Some(AssetClass::Stock));
        assert_eq!(AssetClass::parse("bond"), Some(AssetClass::Bond));
        assert_eq!(AssetClass::parse("currency"), Some(AssetClass::Currency));
        assert_eq!(AssetClass::parse("fund"), None);
        assert_eq!(AssetClass::parse(""), None);
    }

    #[test]
    fn test_condition_parse() {
        assert_eq!(Condition::parse("above"), Some(Condition::Above));
        assert_eq!(Condition::parse("below"), Some(Condition::Below));
        assert_eq!(Condition::parse("between"), None);
    }

    #[test]
    fn test_above_is_strict() {
        let it = item("above", 250.0);
        assert!(it.matches(250.01));
        assert!(!it.matches(250.0));
        assert!(!it.matches(249.99));
    }

    #[test]
    fn test_below_is_strict() {
        let it = item("below", 150.0);
        assert!(it.matches(149.99));
        assert!(!it.matches(150.0));
        assert!(!it.matches(150.01));
    }

    #[test]
    fn test_unknown_condition_never_fires() {
        let it = item("between", 100.0);
        assert!(!it.matches(0.0));
        assert!(!it.matches(100.0));
        assert!(!it.matches(1_000_000.0));
    }
}
