use chrono::NaiveDate;
use core_types::DailyAggregate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of a performance series as handed to API clients.
///
/// `range_performance` is expressed as a fractional return from the first
/// date of the range (0.05 means +5%), not as the raw cumulative multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub value_date: NaiveDate,
    pub value: Decimal,
    pub range_performance: Decimal,
}

impl From<&DailyAggregate> for PerformancePoint {
    fn from(day: &DailyAggregate) -> Self {
        Self {
            value_date: day.value_date,
            value: day.value,
            range_performance: day.range_performance - Decimal::ONE,
        }
    }
}

impl PerformancePoint {
    pub fn from_series(series: &[DailyAggregate]) -> Vec<Self> {
        series.iter().map(Self::from).collect()
    }
}

/// Headline numbers for a whole series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_value: Decimal,
    pub end_value: Decimal,
    /// Sum of the qualifying cash flows that landed on valuation dates.
    pub net_flows: Decimal,
    /// Compounded organic return over the range, as a fraction.
    pub range_performance: Decimal,
    pub days: usize,
}

impl RangeSummary {
    /// Returns `None` for an empty series.
    pub fn from_series(series: &[DailyAggregate]) -> Option<Self> {
        let first = series.first()?;
        let last = series.last()?;
        Some(Self {
            start_date: first.value_date,
            end_date: last.value_date,
            start_value: first.value,
            end_value: last.value,
            // The first day's flow is already inside its opening value.
            net_flows: series.iter().skip(1).map(|d| d.transaction_value).sum(),
            range_performance: last.range_performance - Decimal::ONE,
            days: series.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32, value: Decimal, flow: Decimal, range: Decimal) -> DailyAggregate {
        DailyAggregate {
            value_date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            value,
            prior_value: value,
            transaction_value: flow,
            day_performance: Decimal::ONE,
            range_performance: range,
        }
    }

    #[test]
    fn points_report_range_performance_as_a_delta() {
        let series = vec![
            day(1, dec!(100), dec!(0), dec!(1)),
            day(2, dec!(110), dec!(0), dec!(1.1)),
        ];
        let points = PerformancePoint::from_series(&series);

        assert_eq!(points[0].range_performance, dec!(0));
        assert_eq!(points[1].range_performance, dec!(0.1));
        assert_eq!(points[1].value, dec!(110));
    }

    #[test]
    fn points_serialize_dates_as_calendar_strings() {
        let point = PerformancePoint::from(&day(9, dec!(100), dec!(0), dec!(1.25)));
        let json = serde_json::to_value(&point).unwrap();

        assert_eq!(json["value_date"], "2024-01-09");
        assert_eq!(json["range_performance"], 0.25);
    }

    #[test]
    fn summary_of_empty_series_is_none() {
        assert!(RangeSummary::from_series(&[]).is_none());
    }

    #[test]
    fn summary_spans_first_to_last_day() {
        let series = vec![
            day(1, dec!(100), dec!(25), dec!(1)),
            day(2, dec!(140), dec!(30), dec!(1.1)),
            day(3, dec!(150), dec!(-5), dec!(1.2)),
        ];
        let summary = RangeSummary::from_series(&series).unwrap();

        assert_eq!(summary.start_value, dec!(100));
        assert_eq!(summary.end_value, dec!(150));
        assert_eq!(summary.net_flows, dec!(25));
        assert_eq!(summary.range_performance, dec!(0.2));
        assert_eq!(summary.days, 3);
    }
}
