use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use dayahead_domain::{Market, PriceSeries, TargetDay, TimeWindow, ValidatedSeries};
use rust_decimal::Decimal;
use shaku::Interface;
use std::path::PathBuf;

#[async_trait]
pub trait PriceSeriesGateway: Interface {
    async fn fetch_day_ahead_prices(
        &self,
        market: &Market,
        window: &TimeWindow,
    ) -> Result<PriceSeries, GatewayError>;
}

#[async_trait]
pub trait PriceRepository: Interface {
    /// Deterministic artifact location for a market day.
    fn artifact_path(&self, market: &Market, day: &TargetDay) -> PathBuf;

    async fn exists(&self, market: &Market, day: &TargetDay) -> Result<bool, RepositoryError>;

    /// Writes the series unless an artifact for its day is already present.
    async fn save(
        &self,
        market: &Market,
        series: &ValidatedSeries,
    ) -> Result<SaveOutcome, RepositoryError>;

    async fn load(
        &self,
        market: &Market,
        day: &TargetDay,
    ) -> Result<Vec<StoredPrice>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { path: PathBuf, rows: usize },
    AlreadyPresent { path: PathBuf },
}

/// A persisted row, carrying the offset it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredPrice {
    pub timestamp: DateTime<FixedOffset>,
    pub price: Decimal,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Authentication rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("Unexpected HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("No matching data: {0}")]
    NoMatchingData(String),

    #[error("API error {code}: {text}")]
    Api { code: String, text: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(String),

    #[error("Malformed artifact {path}: {reason}")]
    MalformedArtifact { path: PathBuf, reason: String },
}
