pub mod ports;
pub mod services;

pub use ports::{
    GatewayError, PriceRepository, PriceSeriesGateway, RepositoryError, SaveOutcome, StoredPrice,
};
pub use services::{DayAheadService, DayAheadServiceImpl, PipelineError, RunOutcome};
