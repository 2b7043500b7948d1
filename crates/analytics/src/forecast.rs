//! Linear trend forecasting

use chrono::{Duration, NaiveDate};
use indicator_types::ForecastSettings;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::statistics::{linear_fit, round2};

/// Default number of projected points
pub const DEFAULT_PERIODS: usize = 4;

/// Default spacing between projected points
pub const DEFAULT_STEP_DAYS: u32 = 7;

/// One point of a forecast chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Observed value; only set on the connector point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    pub forecast: f64,
    pub is_forecast: bool,
}

/// Project `periods` weekly points from a chronological series
pub fn forecast(series: &[(NaiveDate, f64)], periods: usize) -> Vec<ForecastPoint> {
    forecast_with_step(series, periods, DEFAULT_STEP_DAYS)
}

/// Project using configured settings
pub fn forecast_with_settings(
    series: &[(NaiveDate, f64)],
    settings: &ForecastSettings,
) -> Vec<ForecastPoint> {
    forecast_with_step(series, settings.periods, settings.step_days)
}

/// Project `periods` points spaced `step_days` apart
///
/// The first point repeats the last observation so the projected line joins
/// the actual series. Returns nothing with fewer than two finite values.
pub fn forecast_with_step(
    series: &[(NaiveDate, f64)],
    periods: usize,
    step_days: u32,
) -> Vec<ForecastPoint> {
    let valid: Vec<(NaiveDate, f64)> = series
        .iter()
        .copied()
        .filter(|(_, v)| v.is_finite())
        .collect();

    if valid.len() < series.len() {
        warn!(
            dropped = series.len() - valid.len(),
            "Ignoring non-finite values in forecast input"
        );
    }

    let values: Vec<f64> = valid.iter().map(|(_, v)| *v).collect();
    let (Some(fit), Some(&(last_date, last_value))) = (linear_fit(&values), valid.last()) else {
        return Vec::new();
    };

    let last_index = (values.len() - 1) as f64;
    let mut points = Vec::with_capacity(periods + 1);
    points.push(ForecastPoint {
        date: last_date,
        actual: Some(last_value),
        forecast: round2(last_value),
        is_forecast: false,
    });

    for i in 1..=periods {
        let offset = Duration::days(i as i64 * step_days as i64);
        let Some(date) = last_date.checked_add_signed(offset) else {
            break;
        };
        points.push(ForecastPoint {
            date,
            actual: None,
            forecast: round2(fit.at(last_index + i as f64)),
            is_forecast: true,
        });
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_too_few_points() {
        assert!(forecast(&[], 4).is_empty());
        assert!(forecast(&[(date(1, 1), 5.0)], 4).is_empty());
        assert!(forecast(&[(date(1, 1), 5.0), (date(1, 8), f64::NAN)], 4).is_empty());
    }

    #[test]
    fn test_two_point_extrapolation() {
        let series = [(date(1, 1), 10.0), (date(1, 8), 13.0)];
        let points = forecast(&series, 4);
        assert_eq!(points.len(), 5);

        let connector = &points[0];
        assert_eq!(connector.date, date(1, 8));
        assert_eq!(connector.actual, Some(13.0));
        assert_eq!(connector.forecast, 13.0);
        assert!(!connector.is_forecast);

        for (i, point) in points.iter().enumerate().skip(1) {
            let expected = 10.0 + 3.0 * (1 + i) as f64;
            assert!((point.forecast - expected).abs() < 0.005);
            assert_eq!(point.date, date(1, 8) + Duration::days(7 * i as i64));
            assert!(point.is_forecast);
            assert!(point.actual.is_none());
        }
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        let series = [(date(1, 1), 1.0), (date(1, 2), 1.0), (date(1, 3), 2.0)];
        // slope 0.5, intercept 0.8333..
        let points = forecast(&series, 1);
        assert_eq!(points[1].forecast, 2.33);
    }

    #[test]
    fn test_non_finite_values_dropped() {
        let series = [
            (date(1, 1), 2.0),
            (date(1, 8), f64::INFINITY),
            (date(1, 15), 4.0),
            (date(1, 22), 6.0),
        ];
        let points = forecast(&series, 2);
        assert_eq!(points[0].date, date(1, 22));
        assert_eq!(points[1].forecast, 8.0);
        assert_eq!(points[2].forecast, 10.0);
    }

    #[test]
    fn test_custom_step_and_settings() {
        let series = [(date(1, 1), 0.0), (date(1, 2), 1.0)];
        let settings = ForecastSettings {
            periods: 3,
            step_days: 30,
        };
        let points = forecast_with_settings(&series, &settings);
        assert_eq!(points.len(), 4);
        assert_eq!(points[3].date, date(1, 2) + Duration::days(90));
        assert_eq!(points[3].forecast, 4.0);
    }

    #[test]
    fn test_deterministic() {
        let series: Vec<(NaiveDate, f64)> = (0..10)
            .map(|i| (date(1, 1) + Duration::days(7 * i), (i as f64).sin() * 10.0))
            .collect();
        assert_eq!(forecast(&series, DEFAULT_PERIODS), forecast(&series, DEFAULT_PERIODS));
    }
}
