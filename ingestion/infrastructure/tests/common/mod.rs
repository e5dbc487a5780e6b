#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone};
use chrono_tz::{Europe::Helsinki, Tz};
use dayahead_domain::{validate, PricePoint, PriceSeries, TargetDay, ValidatedSeries, ValidationPolicy};
use rust_decimal::Decimal;

/// An hourly ENTSO-E period with one point per listed price.
pub fn hourly_period(start: &str, end: &str, prices: &[Decimal]) -> String {
    let points: String = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            format!(
                "<Point><position>{}</position><price.amount>{}</price.amount></Point>",
                i + 1,
                price
            )
        })
        .collect();

    format!(
        r#"<TimeSeries>
    <mRID>1</mRID>
    <businessType>A62</businessType>
    <currency_Unit.name>EUR</currency_Unit.name>
    <price_Measure_Unit.name>MWH</price_Measure_Unit.name>
    <curveType>A01</curveType>
    <Period>
      <timeInterval>
        <start>{start}</start>
        <end>{end}</end>
      </timeInterval>
      <resolution>PT60M</resolution>
      {points}
    </Period>
  </TimeSeries>"#
    )
}

pub fn publication_document(time_series: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3">
  <mRID>a1b2c3</mRID>
  <revisionNumber>1</revisionNumber>
  <type>A44</type>
  <period.timeInterval>
    <start>2024-05-13T22:00Z</start>
    <end>2024-05-15T22:00Z</end>
  </period.timeInterval>
  {}
</Publication_MarketDocument>"#,
        time_series.join("\n  ")
    )
}

pub fn acknowledgement_document(code: &str, text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Acknowledgement_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0">
  <mRID>ack-1</mRID>
  <createdDateTime>2024-05-14T07:30:00Z</createdDateTime>
  <Reason>
    <code>{code}</code>
    <text>{text}</text>
  </Reason>
</Acknowledgement_MarketDocument>"#
    )
}

pub fn prices(count: usize, base_cents: i64) -> Vec<Decimal> {
    (0..count)
        .map(|i| Decimal::new(base_cents + i as i64 * 137, 2))
        .collect()
}

/// Two CET delivery-day periods around 2024-05-15, as the platform
/// publishes them for the Finnish zone.
pub fn may_15_document() -> String {
    publication_document(&[
        hourly_period("2024-05-13T22:00Z", "2024-05-14T22:00Z", &prices(24, 3_000)),
        hourly_period("2024-05-14T22:00Z", "2024-05-15T22:00Z", &prices(24, 4_000)),
    ])
}

pub fn target_day(y: i32, m: u32, d: u32) -> TargetDay {
    TargetDay::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), Helsinki)
}

/// Consecutive hourly points from the day's local midnight, validated as-is.
pub fn validated_day(day: &TargetDay, count: usize) -> ValidatedSeries {
    let midnight: DateTime<Tz> = Helsinki
        .from_local_datetime(&day.date().and_hms_opt(0, 0, 0).unwrap())
        .unwrap();
    let points: Vec<PricePoint> = prices(count, 2_500)
        .into_iter()
        .enumerate()
        .map(|(i, price)| PricePoint::new(midnight + TimeDelta::hours(i as i64), price))
        .collect();

    validate(
        PriceSeries::new(points).unwrap(),
        day,
        &ValidationPolicy::new(count),
    )
    .unwrap()
}
