//! Error types for exchange queries.

use thiserror::Error;

/// Errors that can occur while fetching a price.
#[derive(Debug, Error)]
pub enum MoexError {
    #[error("asset {0} not found on the exchange")]
    AssetNotFound(String),

    #[error("unsupported asset type: {0}")]
    UnsupportedAssetType(String),

    #[error("malformed price data for {0}")]
    InvalidPriceData(String),

    #[error("exchange transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for MoexError {
    fn from(err: reqwest::Error) -> Self {
        MoexError::Transport(err.to_string())
    }
}

impl MoexError {
    /// True for absences the watchlist itself explains (missing security,
    /// bad asset class token). These are logged but not counted against
    /// the network failure counter.
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            MoexError::AssetNotFound(_) | MoexError::UnsupportedAssetType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_classification() {
        assert!(MoexError::AssetNotFound("XYZ".into()).is_semantic());
        assert!(MoexError::UnsupportedAssetType("fund".into()).is_semantic());
        assert!(!MoexError::InvalidPriceData("SBER".into()).is_semantic());
        assert!(!MoexError::Transport("HTTP 500".into()).is_semantic());
    }
}
