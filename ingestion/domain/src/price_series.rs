use chrono::DateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePoint {
    timestamp: DateTime<Tz>,
    price: Decimal,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Tz>, price: Decimal) -> Self {
        Self { timestamp, price }
    }

    pub fn timestamp(&self) -> DateTime<Tz> {
        self.timestamp
    }

    /// Price per MWh in the currency of the publishing market.
    pub fn price(&self) -> Decimal {
        self.price
    }
}

/// Price points in strictly increasing timestamp order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, PriceSeriesError> {
        for pair in points.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(PriceSeriesError::NotIncreasing {
                    previous: pair[0].timestamp.to_rfc3339(),
                    next: pair[1].timestamp.to_rfc3339(),
                });
            }
        }

        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn into_points(self) -> Vec<PricePoint> {
        self.points
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PriceSeriesError {
    #[error("Timestamps must be strictly increasing: {next} follows {previous}")]
    NotIncreasing { previous: String, next: String },
}
