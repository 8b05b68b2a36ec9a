//! Aggregations over a user's sensor readings.
//!
//! Every function takes `now` explicitly; callers pass `Utc::now()` and tests
//! pin it.

use chrono::{DateTime, Duration, DurationRound, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reading::{Metric, SensorReading};

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Readings created at or after `now - hours`.
pub fn recent(
    readings: &[SensorReading],
    now: DateTime<Utc>,
    hours: i64,
) -> impl Iterator<Item = &SensorReading> {
    let since = now - Duration::hours(hours);
    readings.iter().filter(move |r| r.created_at >= since)
}

fn between(
    readings: &[SensorReading],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> impl Iterator<Item = &SensorReading> {
    readings
        .iter()
        .filter(move |r| r.created_at >= start && r.created_at <= end)
}

pub fn average(
    readings: &[SensorReading],
    metric: Metric,
    now: DateTime<Utc>,
    hours: i64,
) -> Option<f64> {
    mean(recent(readings, now, hours).map(|r| r.value(metric)))
}

/// Percentage change of the last `hours` against the `hours` before them.
///
/// Zero when either period has no data or the previous average is zero.
pub fn trend(readings: &[SensorReading], metric: Metric, now: DateTime<Utc>, hours: i64) -> f64 {
    let current = average(readings, metric, now, hours);
    let previous = mean(
        between(
            readings,
            now - Duration::hours(hours * 2),
            now - Duration::hours(hours),
        )
        .map(|r| r.value(metric)),
    );

    match (current, previous) {
        (Some(current), Some(previous)) if previous != 0.0 => {
            (current - previous) / previous * 100.0
        }
        _ => 0.0,
    }
}

/// Summary served by the device statistics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStatistics {
    pub average_temperature: Option<f64>,
    pub average_humidity: Option<f64>,
    pub temperature_trend: f64,
    pub humidity_trend: f64,
    pub total_readings: usize,
}

pub fn statistics(readings: &[SensorReading], now: DateTime<Utc>, hours: i64) -> SensorStatistics {
    SensorStatistics {
        average_temperature: average(readings, Metric::Temperature, now, hours),
        average_humidity: average(readings, Metric::Humidity, now, hours),
        temperature_trend: trend(readings, Metric::Temperature, now, hours),
        humidity_trend: trend(readings, Metric::Humidity, now, hours),
        total_readings: recent(readings, now, hours).count(),
    }
}

/// One chart bucket. Averages are `None` for buckets without readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

fn bucket(
    readings: &[SensorReading],
    start: DateTime<Utc>,
    len: Duration,
    label: String,
) -> SeriesPoint {
    let end = start + len;
    let in_bucket: Vec<&SensorReading> = readings
        .iter()
        .filter(|r| r.created_at >= start && r.created_at < end)
        .collect();

    SeriesPoint {
        label,
        temperature: mean(in_bucket.iter().map(|r| r.temperature)).map(round1),
        humidity: mean(in_bucket.iter().map(|r| r.humidity)).map(round1),
    }
}

fn start_of_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::hours(1)).unwrap_or(at)
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// 24 clock-hour buckets, oldest first, ending with the current hour.
pub fn hourly_series(readings: &[SensorReading], now: DateTime<Utc>) -> Vec<SeriesPoint> {
    let current = start_of_hour(now);
    (0..24)
        .rev()
        .map(|offset| {
            let start = current - Duration::hours(offset);
            bucket(readings, start, Duration::hours(1), start.format("%H:%M").to_string())
        })
        .collect()
}

/// 7 calendar-day buckets, oldest first, ending with today.
pub fn daily_series(readings: &[SensorReading], now: DateTime<Utc>) -> Vec<SeriesPoint> {
    let today = start_of_day(now);
    (0..7)
        .rev()
        .map(|offset| {
            let start = today - Duration::days(offset);
            bucket(readings, start, Duration::days(1), start.format("%b %-d").to_string())
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// Min/max/avg over the last 24 hours.
pub fn range_stats(readings: &[SensorReading], metric: Metric, now: DateTime<Utc>) -> RangeStats {
    let values: Vec<f64> = recent(readings, now, 24).map(|r| r.value(metric)).collect();
    if values.is_empty() {
        return RangeStats::default();
    }

    RangeStats {
        min: values.iter().copied().reduce(f64::min).map(round1),
        max: values.iter().copied().reduce(f64::max).map(round1),
        avg: mean(values.iter().copied()).map(round1),
    }
}

/// Chart range selectable from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    OneHour,
    TwelveHours,
    #[default]
    Day,
    Week,
}

impl Period {
    /// Unknown or missing values fall back to a day.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("1h") => Self::OneHour,
            Some("12h") => Self::TwelveHours,
            Some("7d") => Self::Week,
            _ => Self::Day,
        }
    }

    pub fn hours(self) -> i64 {
        match self {
            Self::OneHour => 1,
            Self::TwelveHours => 12,
            Self::Day => 24,
            Self::Week => 24 * 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPoint {
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
}

/// Raw readings inside `period`, oldest first.
pub fn period_series(
    readings: &[SensorReading],
    now: DateTime<Utc>,
    period: Period,
) -> Vec<PeriodPoint> {
    let mut points: Vec<&SensorReading> = recent(readings, now, period.hours()).collect();
    points.sort_by_key(|r| r.created_at);
    points
        .into_iter()
        .map(|r| PeriodPoint {
            time: r.created_at.format("%H:%M").to_string(),
            temperature: round1(r.temperature),
            humidity: round1(r.humidity),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::reading::NewReading;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 14, 30, 0).unwrap()
    }

    fn reading(temperature: f64, humidity: f64, at: DateTime<Utc>) -> SensorReading {
        SensorReading::new(
            "user_1",
            NewReading {
                temperature,
                humidity,
                location: None,
                device_id: None,
            },
            at,
        )
    }

    fn hourly_fixture() -> Vec<SensorReading> {
        [20.0, 22.0, 24.0, 26.0, 28.0]
            .into_iter()
            .zip([40.0, 45.0, 50.0, 55.0, 60.0])
            .enumerate()
            .map(|(i, (t, h))| reading(t, h, now() - Duration::hours(i as i64)))
            .collect()
    }

    #[test]
    fn averages_over_recent_window() {
        let readings = hourly_fixture();
        assert_eq!(average(&readings, Metric::Temperature, now(), 24), Some(24.0));
        assert_eq!(average(&readings, Metric::Humidity, now(), 24), Some(50.0));
        assert_eq!(average(&[], Metric::Humidity, now(), 24), None);
    }

    #[test]
    fn recent_excludes_older_readings() {
        let readings = vec![
            reading(20.0, 40.0, now() - Duration::hours(25)),
            reading(25.0, 50.0, now() - Duration::hours(12)),
        ];
        assert_eq!(recent(&readings, now(), 24).count(), 1);
    }

    #[test]
    fn statistics_count_window_readings() {
        let stats = statistics(&hourly_fixture(), now(), 24);
        assert_eq!(stats.total_readings, 5);
        assert_eq!(stats.average_temperature, Some(24.0));
        assert_eq!(stats.temperature_trend, 0.0);
    }

    #[test]
    fn trend_compares_with_previous_period() {
        let readings = vec![
            reading(20.0, 50.0, now() - Duration::hours(30)),
            reading(22.0, 40.0, now() - Duration::hours(2)),
        ];
        let temp = trend(&readings, Metric::Temperature, now(), 24);
        let humidity = trend(&readings, Metric::Humidity, now(), 24);
        assert!((temp - 10.0).abs() < 1e-9);
        assert!((humidity + 20.0).abs() < 1e-9);
    }

    #[test]
    fn trend_is_zero_without_previous_data() {
        let readings = vec![reading(22.0, 40.0, now())];
        assert_eq!(trend(&readings, Metric::Temperature, now(), 24), 0.0);
    }

    #[test]
    fn hourly_series_has_24_buckets_ending_now() {
        let readings = vec![
            reading(23.45, 50.0, now() - Duration::minutes(10)),
            reading(23.55, 52.0, now() - Duration::minutes(20)),
        ];
        let series = hourly_series(&readings, now());
        assert_eq!(series.len(), 24);
        assert_eq!(series[0].label, "15:00");
        let last = series.last().unwrap();
        assert_eq!(last.label, "14:00");
        assert_eq!(last.temperature, Some(23.5));
        assert_eq!(last.humidity, Some(51.0));
        assert_eq!(series[0].temperature, None);
    }

    #[test]
    fn daily_series_labels_calendar_days() {
        let readings = vec![reading(20.0, 40.0, now() - Duration::days(6))];
        let series = daily_series(&readings, now());
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].label, "Mar 4");
        assert_eq!(series[0].temperature, Some(20.0));
        assert_eq!(series[6].label, "Mar 10");
        assert_eq!(series[6].temperature, None);
    }

    #[test]
    fn range_stats_empty_and_populated() {
        assert_eq!(range_stats(&[], Metric::Temperature, now()), RangeStats::default());

        let stats = range_stats(&hourly_fixture(), Metric::Temperature, now());
        assert_eq!(stats.min, Some(20.0));
        assert_eq!(stats.max, Some(28.0));
        assert_eq!(stats.avg, Some(24.0));
    }

    #[test]
    fn period_parsing_defaults_to_day() {
        assert_eq!(Period::parse(Some("1h")).hours(), 1);
        assert_eq!(Period::parse(Some("12h")).hours(), 12);
        assert_eq!(Period::parse(Some("7d")).hours(), 168);
        assert_eq!(Period::parse(Some("bogus")), Period::Day);
        assert_eq!(Period::parse(None).hours(), 24);
    }

    #[test]
    fn period_series_is_ascending_and_rounded() {
        let readings = hourly_fixture();
        let series = period_series(&readings, now(), Period::Day);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].temperature, 28.0);
        assert_eq!(series[0].time, "10:30");
        assert_eq!(series[4].temperature, 20.0);
    }
}
