//! REST client for the MOEX ISS quotes endpoint.

use crate::MoexError;
use async_trait::async_trait;
use moexmon_core::AssetClass;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const BASE_URL: &str = "https://iss.moex.com";

/// Anything that can produce the most recent price for a security.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the last trade price for one (ticker, asset class).
    async fn fetch_price(&self, ticker: &str, asset_class: &str) -> Result<f64, MoexError>;
}

/// ISS marketdata response, trimmed to the single column we request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MarketdataPage {
    marketdata: Marketdata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Marketdata {
    data: Vec<Vec<serde_json::Value>>,
}

/// Trading (market, board) tuple for an asset class.
///
/// The engine segment stays `stock` for every class, currency included;
/// the legacy URL shape is load-bearing for downstream fixtures.
fn market_board(class: AssetClass) -> (&'static str, &'static str) {
    match class {
        AssetClass::Stock => ("shares", "TQBR"),
        AssetClass::Bond => ("bonds", "TQCB"),
        AssetClass::Currency => ("currency", "CETS"),
    }
}

/// Extract `marketdata.data[0][0]` from a response body.
fn parse_price(body: &[u8], ticker: &str) -> Result<f64, MoexError> {
    let page: MarketdataPage = serde_json::from_slice(body)
        .map_err(|e| MoexError::Transport(format!("malformed exchange response: {e}")))?;

    let row = match page.marketdata.data.first() {
        Some(row) => row,
        None => return Err(MoexError::AssetNotFound(ticker.to_string())),
    };

    row.first()
        .and_then(|cell| cell.as_f64())
        .ok_or_else(|| MoexError::InvalidPriceData(ticker.to_string()))
}

/// REST client against the public ISS endpoint. Stateless apart from the
/// shared connection pool inside [`reqwest::Client`].
pub struct MoexClient {
    http: reqwest::Client,
    base_url: String,
}

impl MoexClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different host. Used by fixture tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn price_url(&self, ticker: &str, class: AssetClass) -> String {
        let (market, board) = market_board(class);
        format!(
            "{}/iss/engines/stock/markets/{}/boards/{}/securities/{}.json\
             ?iss.meta=off&iss.only=marketdata&marketdata.columns=LAST",
            self.base_url, market, board, ticker
        )
    }
}

impl Default for MoexClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for MoexClient {
    async fn fetch_price(&self, ticker: &str, asset_class: &str) -> Result<f64, MoexError> {
        let class = AssetClass::parse(asset_class)
            .ok_or_else(|| MoexError::UnsupportedAssetType(asset_class.to_string()))?;

        let url = self.price_url(ticker, class);
        debug!(url = %url, "querying exchange");

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(MoexError::Transport(format!(
                "exchange returned HTTP {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        parse_price(&body, ticker)
    }
}

/// In-memory price source for tests and offline runs.
#[derive(Debug, Default)]
pub struct FakeClient {
    prices: HashMap<String, f64>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&mut self, ticker: &str, price: f64) {
        self.prices.insert(ticker.to_string(), price);
    }
}

#[async_trait]
impl PriceSource for FakeClient {
    async fn fetch_price(&self, ticker: &str, asset_class: &str) -> Result<f64, MoexError> {
        AssetClass::parse(asset_class)
            .ok_or_else(|| MoexError::UnsupportedAssetType(asset_class.to_string()))?;
        self.prices
            .get(ticker)
            .copied()
            .ok_or_else(|| MoexError::AssetNotFound(ticker.to_string()))
    }
}
