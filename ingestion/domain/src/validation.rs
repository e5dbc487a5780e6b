use crate::{PricePoint, PriceSeries, TargetDay};

/// Hourly resolution plus one record of boundary slack.
pub const DEFAULT_MIN_POINTS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    min_points: usize,
}

impl ValidationPolicy {
    pub fn new(min_points: usize) -> Self {
        Self { min_points }
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_POINTS)
    }
}

/// Series whose every point falls on its target day, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSeries {
    day: TargetDay,
    points: Vec<PricePoint>,
    trimmed_leading: bool,
    trimmed_trailing: bool,
}

impl ValidatedSeries {
    pub fn day(&self) -> &TargetDay {
        &self.day
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn trimmed_leading(&self) -> bool {
        self.trimmed_leading
    }

    pub fn trimmed_trailing(&self) -> bool {
        self.trimmed_trailing
    }
}

/// Reasons a fetched series is not yet usable. Not an error: the auction
/// result is treated as unpublished and the run ends without writing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Only {found} price points published, at least {required} required")]
    TooFewPoints { found: usize, required: usize },
    #[error("No price points left after trimming neighbouring days")]
    EmptyAfterTrim,
    #[error("Price point {timestamp} falls outside the target day")]
    OutsideTargetDay { timestamp: String },
}

pub fn validate(
    series: PriceSeries,
    day: &TargetDay,
    policy: &ValidationPolicy,
) -> Result<ValidatedSeries, Rejection> {
    if series.len() < policy.min_points {
        return Err(Rejection::TooFewPoints {
            found: series.len(),
            required: policy.min_points,
        });
    }

    let mut points = series.into_points();

    // Only the edges are trimmed, one record each at most.
    let trimmed_leading = points
        .first()
        .is_some_and(|p| !day.contains(&p.timestamp()));
    if trimmed_leading {
        points.remove(0);
    }

    let trimmed_trailing = points
        .last()
        .is_some_and(|p| !day.contains(&p.timestamp()));
    if trimmed_trailing {
        points.pop();
    }

    if points.is_empty() {
        return Err(Rejection::EmptyAfterTrim);
    }

    if let Some(stray) = points.iter().find(|p| !day.contains(&p.timestamp())) {
        return Err(Rejection::OutsideTargetDay {
            timestamp: stray.timestamp().to_rfc3339(),
        });
    }

    Ok(ValidatedSeries {
        day: *day,
        points,
        trimmed_leading,
        trimmed_trailing,
    })
}
