use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use dayahead_application::{GatewayError, PriceSeriesGateway};
use dayahead_domain::{Market, PricePoint, PriceSeries, TimeWindow};
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use shaku::Component;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu/api";

const DAY_AHEAD_PRICES_DOCUMENT: &str = "A44";
const NO_MATCHING_DATA_CODE: &str = "999";
const PERIOD_FORMAT: &str = "%Y%m%d%H%M";
/// A week of one-minute slots. Day-ahead periods span a delivery day.
const MAX_PERIOD_SLOTS: i64 = 7 * 24 * 60;

/// ENTSO-E Transparency Platform client for day-ahead auction prices.
#[derive(Component)]
#[shaku(interface = PriceSeriesGateway)]
pub struct EntsoePriceGateway {
    client: Client,
    base_url: String,
    api_key: String,
    /// Resolution kept when a document carries several; 0 selects the finest.
    preferred_resolution_minutes: i64,
}

impl EntsoePriceGateway {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        preferred_resolution_minutes: i64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            preferred_resolution_minutes,
        }
    }

    fn request_url(&self, market: &Market, window: &TimeWindow) -> Result<Url, GatewayError> {
        let period_start = window
            .start()
            .with_timezone(&Utc)
            .format(PERIOD_FORMAT)
            .to_string();
        let period_end = window
            .end()
            .with_timezone(&Utc)
            .format(PERIOD_FORMAT)
            .to_string();

        Url::parse_with_params(
            &self.base_url,
            &[
                ("securityToken", self.api_key.as_str()),
                ("documentType", DAY_AHEAD_PRICES_DOCUMENT),
                ("in_Domain", market.eic()),
                ("out_Domain", market.eic()),
                ("periodStart", period_start.as_str()),
                ("periodEnd", period_end.as_str()),
            ],
        )
        .map_err(|e| GatewayError::Transport(format!("Invalid base URL {}: {}", self.base_url, e)))
    }
}

#[async_trait]
impl PriceSeriesGateway for EntsoePriceGateway {
    async fn fetch_day_ahead_prices(
        &self,
        market: &Market,
        window: &TimeWindow,
    ) -> Result<PriceSeries, GatewayError> {
        let url = self.request_url(market, window)?;
        info!(
            "Requesting day-ahead prices for {} ({}) from {} to {}",
            market.code(),
            market.eic(),
            window.start().to_rfc3339(),
            window.end().to_rfc3339()
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.without_url().to_string()))?;
        debug!("ENTSO-E responded with HTTP {} ({} bytes)", status, body.len());

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Unauthorized(status.as_u16()));
        }

        if body.contains("<Acknowledgement_MarketDocument") {
            return Err(parse_acknowledgement(&body));
        }

        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let points = parse_publication(
            &body,
            market.timezone(),
            self.preferred_resolution_minutes,
        )?;

        let fetched = points.len();
        let points = clip_to_window(points, window);
        if points.len() < fetched {
            debug!(
                "Discarded {} points outside the requested window",
                fetched - points.len()
            );
        }

        PriceSeries::new(points).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct PublicationDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
struct TimeSeries {
    #[serde(rename = "Period", default)]
    periods: Vec<Period>,
}

#[derive(Debug, Deserialize)]
struct Period {
    #[serde(rename = "timeInterval")]
    time_interval: TimeInterval,
    resolution: String,
    #[serde(rename = "Point", default)]
    points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct TimeInterval {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct Point {
    position: u32,
    #[serde(rename = "price.amount")]
    price_amount: String,
}

#[derive(Debug, Deserialize)]
struct AcknowledgementDocument {
    #[serde(rename = "Reason", default)]
    reasons: Vec<Reason>,
}

#[derive(Debug, Deserialize)]
struct Reason {
    code: String,
    #[serde(default)]
    text: String,
}

/// Flattens a publication document into zone-local points of a single
/// resolution, sorted and unique by instant.
fn parse_publication(
    body: &str,
    timezone: Tz,
    preferred_resolution_minutes: i64,
) -> Result<Vec<PricePoint>, GatewayError> {
    let document: PublicationDocument = quick_xml::de::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

    let mut by_resolution: BTreeMap<i64, Vec<(DateTime<Utc>, Decimal)>> = BTreeMap::new();
    for period in document.time_series.iter().flat_map(|ts| ts.periods.iter()) {
        let (step, points) = expand_period(period)?;
        by_resolution
            .entry(step.num_minutes())
            .or_default()
            .extend(points);
    }

    let selected = if by_resolution.contains_key(&preferred_resolution_minutes) {
        preferred_resolution_minutes
    } else {
        match by_resolution.keys().next() {
            Some(finest) => *finest,
            None => {
                warn!("Publication document contains no price periods");
                return Ok(Vec::new());
            }
        }
    };
    if by_resolution.len() > 1 {
        debug!(
            "Document carries resolutions {:?} min, using {} min",
            by_resolution.keys().collect::<Vec<_>>(),
            selected
        );
    }

    let mut points = by_resolution.remove(&selected).unwrap_or_default();
    points.sort_by_key(|(at, _)| *at);
    points.dedup_by_key(|(at, _)| *at);

    Ok(points
        .into_iter()
        .map(|(at, price)| PricePoint::new(at.with_timezone(&timezone), price))
        .collect())
}

/// Keeps the window's points plus one neighbour on each edge: the last point
/// before the start and the point at the end instant. Boundary records are
/// the validator's call. `points` must be sorted.
fn clip_to_window(points: Vec<PricePoint>, window: &TimeWindow) -> Vec<PricePoint> {
    let first_inside = points.partition_point(|p| p.timestamp() < window.start());
    let past_end = points.partition_point(|p| p.timestamp() <= window.end());

    points
        .into_iter()
        .take(past_end)
        .skip(first_inside.saturating_sub(1))
        .collect()
}

/// Expands a period into one price per slot. Omitted positions (A03 curves)
/// repeat the preceding price.
fn expand_period(
    period: &Period,
) -> Result<(TimeDelta, Vec<(DateTime<Utc>, Decimal)>), GatewayError> {
    let start = parse_instant(&period.time_interval.start)?;
    let end = parse_instant(&period.time_interval.end)?;
    let step = parse_resolution(&period.resolution)?;

    if end <= start {
        return Err(GatewayError::MalformedResponse(format!(
            "Empty period {} - {}",
            period.time_interval.start, period.time_interval.end
        )));
    }
    let slots = (end - start).num_minutes() / step.num_minutes();
    if slots > MAX_PERIOD_SLOTS {
        return Err(GatewayError::MalformedResponse(format!(
            "Period {} - {} at {} spans {} slots",
            period.time_interval.start, period.time_interval.end, period.resolution, slots
        )));
    }

    let mut published = period
        .points
        .iter()
        .map(|p| Ok((p.position, parse_price(&p.price_amount)?)))
        .collect::<Result<Vec<_>, GatewayError>>()?;
    published.sort_by_key(|(position, _)| *position);

    let mut published = published.into_iter().peekable();
    let mut current = None;
    let mut expanded = Vec::with_capacity(slots as usize);
    for slot in 0..slots {
        let position = slot as u32 + 1;
        while let Some((_, price)) = published.next_if(|(p, _)| *p <= position) {
            current = Some(price);
        }
        if let Some(price) = current {
            expanded.push((start + step * slot as i32, price));
        }
    }

    Ok((step, expanded))
}

fn parse_acknowledgement(body: &str) -> GatewayError {
    let document: AcknowledgementDocument = match quick_xml::de::from_str(body) {
        Ok(document) => document,
        Err(e) => return GatewayError::MalformedResponse(e.to_string()),
    };

    match document.reasons.into_iter().next() {
        Some(reason) if reason.code == NO_MATCHING_DATA_CODE => {
            GatewayError::NoMatchingData(reason.text)
        }
        Some(reason) => GatewayError::Api {
            code: reason.code,
            text: reason.text,
        },
        None => GatewayError::MalformedResponse("Acknowledgement without reason".to_string()),
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, GatewayError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| GatewayError::MalformedResponse(format!("Invalid instant {raw}: {e}")))
}

fn parse_resolution(raw: &str) -> Result<TimeDelta, GatewayError> {
    let minutes = raw.strip_prefix("PT").and_then(|rest| {
        if let Some(m) = rest.strip_suffix('M') {
            m.parse::<i64>().ok()
        } else if let Some(h) = rest.strip_suffix('H') {
            h.parse::<i64>().ok().map(|h| h * 60)
        } else {
            None
        }
    });

    match minutes {
        Some(m) if m > 0 => Ok(TimeDelta::minutes(m)),
        _ => Err(GatewayError::MalformedResponse(format!(
            "Unsupported resolution {raw}"
        ))),
    }
}

fn parse_price(raw: &str) -> Result<Decimal, GatewayError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| GatewayError::MalformedResponse(format!("Invalid price {raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::Europe::Helsinki;
    use dayahead_domain::TargetDay;
    use rust_decimal_macros::dec;

    fn document(time_series: &[&str]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3">
  <mRID>doc</mRID>
  <type>A44</type>
  {}
</Publication_MarketDocument>"#,
            time_series.join("\n")
        )
    }

    fn series(start: &str, end: &str, resolution: &str, points: &[(u32, &str)]) -> String {
        let points: String = points
            .iter()
            .map(|(position, price)| {
                format!(
                    "<Point><position>{position}</position><price.amount>{price}</price.amount></Point>"
                )
            })
            .collect();
        format!(
            r#"<TimeSeries>
    <mRID>1</mRID>
    <curveType>A03</curveType>
    <Period>
      <timeInterval><start>{start}</start><end>{end}</end></timeInterval>
      <resolution>{resolution}</resolution>
      {points}
    </Period>
  </TimeSeries>"#
        )
    }

    #[test]
    fn test_points_placed_by_position_and_resolution() {
        let body = document(&[&series(
            "2024-05-14T21:00Z",
            "2024-05-15T00:00Z",
            "PT60M",
            &[(1, "10.5"), (2, "11"), (3, "-0.25")],
        )]);

        let points = parse_publication(&body, Helsinki, 60).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].timestamp().to_rfc3339(), "2024-05-15T00:00:00+03:00");
        assert_eq!(points[2].timestamp().to_rfc3339(), "2024-05-15T02:00:00+03:00");
        assert_eq!(points[2].price(), dec!(-0.25));
    }

    #[test]
    fn test_omitted_positions_repeat_previous_price() {
        let body = document(&[&series(
            "2024-05-14T21:00Z",
            "2024-05-15T03:00Z",
            "PT60M",
            &[(1, "20"), (4, "30")],
        )]);

        let points = parse_publication(&body, Helsinki, 60).unwrap();
        let prices: Vec<Decimal> = points.iter().map(|p| p.price()).collect();

        assert_eq!(
            prices,
            vec![dec!(20), dec!(20), dec!(20), dec!(30), dec!(30), dec!(30)]
        );
    }

    #[test]
    fn test_preferred_resolution_selected() {
        let body = document(&[
            &series(
                "2024-05-14T21:00Z",
                "2024-05-14T22:00Z",
                "PT15M",
                &[(1, "1"), (2, "2"), (3, "3"), (4, "4")],
            ),
            &series("2024-05-14T21:00Z", "2024-05-14T22:00Z", "PT60M", &[(1, "2.5")]),
        ]);

        let hourly = parse_publication(&body, Helsinki, 60).unwrap();
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].price(), dec!(2.5));

        let finest = parse_publication(&body, Helsinki, 0).unwrap();
        assert_eq!(finest.len(), 4);
    }

    #[test]
    fn test_overlapping_periods_deduplicated() {
        let body = document(&[
            &series("2024-05-14T21:00Z", "2024-05-14T23:00Z", "PT60M", &[(1, "1"), (2, "2")]),
            &series("2024-05-14T22:00Z", "2024-05-15T00:00Z", "PT60M", &[(1, "9"), (2, "3")]),
        ]);

        let points = parse_publication(&body, Helsinki, 60).unwrap();

        assert_eq!(points.len(), 3);
        assert!(points.windows(2).all(|w| w[0].timestamp() < w[1].timestamp()));
    }

    #[test]
    fn test_invalid_price_is_malformed() {
        let body = document(&[&series(
            "2024-05-14T21:00Z",
            "2024-05-14T22:00Z",
            "PT60M",
            &[(1, "n/a")],
        )]);

        assert!(matches!(
            parse_publication(&body, Helsinki, 60),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_oversized_period_is_malformed() {
        let body = document(&[&series(
            "2023-01-01T00:00Z",
            "2025-01-01T00:00Z",
            "PT1M",
            &[(1, "5")],
        )]);

        assert!(matches!(
            parse_publication(&body, Helsinki, 1),
            Err(GatewayError::MalformedResponse(message)) if message.contains("slots")
        ));
    }

    #[test]
    fn test_clip_keeps_one_neighbour_per_edge() {
        let day = TargetDay::new(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(), Helsinki);
        let window = day.window().unwrap();
        let points: Vec<PricePoint> = (0..30)
            .map(|i| {
                PricePoint::new(
                    window.start() - TimeDelta::hours(3) + TimeDelta::hours(i),
                    Decimal::from(i),
                )
            })
            .collect();

        let clipped = clip_to_window(points, &window);

        assert_eq!(clipped.len(), 26);
        assert_eq!(clipped[0].timestamp(), window.start() - TimeDelta::hours(1));
        assert_eq!(clipped[25].timestamp(), window.end());
    }

    #[test]
    fn test_clip_without_prior_point_starts_at_window() {
        let day = TargetDay::new(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(), Helsinki);
        let window = day.window().unwrap();
        let points: Vec<PricePoint> = (0..10)
            .map(|i| PricePoint::new(window.start() + TimeDelta::hours(i), Decimal::from(i)))
            .collect();

        let clipped = clip_to_window(points, &window);

        assert_eq!(clipped.len(), 10);
        assert_eq!(clipped[0].timestamp(), window.start());
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("PT60M").unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_resolution("PT15M").unwrap(), TimeDelta::minutes(15));
        assert_eq!(parse_resolution("PT1H").unwrap(), TimeDelta::hours(1));
        assert!(parse_resolution("P1D").is_err());
        assert!(parse_resolution("PT0M").is_err());
    }

    #[test]
    fn test_acknowledgement_mapping() {
        let no_data = r#"<Acknowledgement_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0">
  <mRID>ack</mRID>
  <Reason><code>999</code><text>No matching data found for Data item Day-ahead Prices</text></Reason>
</Acknowledgement_MarketDocument>"#;
        assert!(matches!(
            parse_acknowledgement(no_data),
            GatewayError::NoMatchingData(text) if text.starts_with("No matching data")
        ));

        let other = no_data.replace("<code>999</code>", "<code>A59</code>");
        assert!(matches!(
            parse_acknowledgement(&other),
            GatewayError::Api { code, .. } if code == "A59"
        ));
    }
}
