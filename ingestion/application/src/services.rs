use crate::ports::{PriceRepository, PriceSeriesGateway, SaveOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dayahead_domain::{
    validate, Market, Rejection, TargetDay, TimeWindowError, ValidationPolicy,
};
use shaku::{Component, Interface};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait DayAheadService: Interface {
    /// Ingests the day following `now` in the market's local calendar.
    async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError>;

    async fn run(&self) -> Result<RunOutcome, PipelineError> {
        self.run_at(Utc::now()).await
    }
}

#[derive(Component)]
#[shaku(interface = DayAheadService)]
pub struct DayAheadServiceImpl {
    #[shaku(inject)]
    gateway: Arc<dyn PriceSeriesGateway>,
    #[shaku(inject)]
    repository: Arc<dyn PriceRepository>,
    market: Market,
    policy: ValidationPolicy,
}

impl DayAheadServiceImpl {
    pub fn new(
        gateway: Arc<dyn PriceSeriesGateway>,
        repository: Arc<dyn PriceRepository>,
        market: Market,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            gateway,
            repository,
            market,
            policy,
        }
    }
}

#[async_trait]
impl DayAheadService for DayAheadServiceImpl {
    async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        let day = TargetDay::tomorrow(now, self.market.timezone())?;
        let window = day.window()?;
        info!(
            "Target day {} for market {}: {} to {} ({}h)",
            day,
            self.market.code(),
            window.start().to_rfc3339(),
            window.end().to_rfc3339(),
            window.hours()
        );

        // Skip the API call entirely when the day is already on disk.
        if self.repository.exists(&self.market, &day).await? {
            let path = self.repository.artifact_path(&self.market, &day);
            info!("Prices for {} already present at {}", day, path.display());
            return Ok(RunOutcome::AlreadyPresent { path });
        }

        let series = self
            .gateway
            .fetch_day_ahead_prices(&self.market, &window)
            .await?;
        info!("Fetched {} price points", series.len());

        let validated = match validate(series, &day, &self.policy) {
            Ok(validated) => validated,
            Err(rejection) => {
                warn!("Prices for {} not yet complete: {}", day, rejection);
                return Ok(RunOutcome::Incomplete { day, rejection });
            }
        };

        if validated.trimmed_leading() {
            warn!("Dropped leading price point from the previous day");
        }
        if validated.trimmed_trailing() {
            warn!("Dropped trailing price point from the following day");
        }

        match self.repository.save(&self.market, &validated).await? {
            SaveOutcome::Written { path, rows } => {
                info!("Saved {} prices for {} to {}", rows, day, path.display());
                Ok(RunOutcome::Written { path, rows })
            }
            SaveOutcome::AlreadyPresent { path } => {
                info!("Prices for {} already present at {}", day, path.display());
                Ok(RunOutcome::AlreadyPresent { path })
            }
        }
    }
}

/// Terminal state of a successful run. Only `Written` produced new data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written { path: PathBuf, rows: usize },
    AlreadyPresent { path: PathBuf },
    Incomplete { day: TargetDay, rejection: Rejection },
}

impl RunOutcome {
    pub fn wrote_data(&self) -> bool {
        matches!(self, RunOutcome::Written { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Time window error: {0}")]
    TimeWindowError(#[from] TimeWindowError),

    #[error("Gateway error: {0}")]
    GatewayError(#[from] crate::ports::GatewayError),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] crate::ports::RepositoryError),
}
