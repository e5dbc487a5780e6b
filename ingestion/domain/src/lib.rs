pub mod market;
pub mod price_series;
pub mod target_day;
pub mod validation;

pub use market::Market;
pub use price_series::{PricePoint, PriceSeries, PriceSeriesError};
pub use target_day::{TargetDay, TimeWindow, TimeWindowError};
pub use validation::{validate, Rejection, ValidatedSeries, ValidationPolicy, DEFAULT_MIN_POINTS};
