//! Forecast aggregation: calendar-day grouping, day summaries and chart
//! series over the 3-hour forecast list.

use chrono::{DateTime, Datelike, Local, NaiveDate, Offset, TimeZone, Utc};
use serde::Serialize;

use crate::client::WeatherSource;
use crate::display::day_label;
use crate::types::{Condition, ForecastCity, ForecastEntry, ForecastResponse, LoadState};

const HOUR: i64 = 3600;

/// Forecast entries sharing one calendar day, in original order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub entries: Vec<ForecastEntry>,
}

impl DayGroup {
    /// Display key, `DD.MM.YYYY`.
    pub fn key(&self) -> String {
        date_key(self.date)
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Aggregated statistics for one forecast day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Time of the first sample of the day
    pub starts_at: DateTime<Utc>,
    pub temp: TemperatureRange,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind: f64,
    pub visibility: f64,
    /// Most frequent condition of the day
    pub weather: Option<Condition>,
    /// Unix seconds
    pub sunrise: i64,
    /// Unix seconds
    pub sunset: i64,
    /// False when sunrise/sunset are a synthetic estimate
    pub sun_data_available: bool,
}

/// One selectable day in the forecast view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTab {
    pub date: NaiveDate,
    /// `DD.MM.YYYY`
    pub key: String,
    /// "Bugün", "Yarın" or the weekday name
    pub label: &'static str,
}

/// Parallel label/value arrays for a temperature chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    /// Two-digit local hour per sample
    pub labels: Vec<String>,
    /// Rounded temperature per sample
    pub values: Vec<i64>,
}

/// Group entries by local calendar day.
///
/// Groups appear in order of their first entry, so a time-ordered input
/// yields chronologically ordered groups.
pub fn group_by_day<Tz: TimeZone>(entries: &[ForecastEntry], tz: &Tz) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for entry in entries {
        let date = local_date(entry, tz);
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.entries.push(entry.clone()),
            None => groups.push(DayGroup {
                date,
                entries: vec![entry.clone()],
            }),
        }
    }
    groups
}

/// Labels are local two-digit hours, values are temperatures rounded half up.
pub fn chart_series<Tz: TimeZone>(entries: &[ForecastEntry], tz: &Tz) -> ChartSeries {
    let labels = entries
        .iter()
        .map(|e| {
            e.timestamp()
                .with_timezone(tz)
                .naive_local()
                .format("%H")
                .to_string()
        })
        .collect();
    let values = entries.iter().map(|e| round_half_up(e.main.temp)).collect();
    ChartSeries { labels, values }
}

/// Summarize one day's entries. `None` for an empty slice.
///
/// Sun times: the forecast city's values for `today`; otherwise the first
/// entry of that day carrying sun data; otherwise a synthetic estimate
/// (06:00 + n min / 18:00 - n min local, n = day-of-year mod 10) with
/// `sun_data_available = false`.
pub fn summarize<Tz: TimeZone>(
    entries: &[ForecastEntry],
    city: &ForecastCity,
    tz: &Tz,
    today: NaiveDate,
) -> Option<DaySummary> {
    let first = entries.first()?;
    let date = local_date(first, tz);
    let count = entries.len() as f64;
    let mean = |f: fn(&ForecastEntry) -> f64| entries.iter().map(f).sum::<f64>() / count;

    let temp = TemperatureRange {
        min: entries
            .iter()
            .map(|e| e.main.temp_min)
            .fold(f64::INFINITY, f64::min),
        max: entries
            .iter()
            .map(|e| e.main.temp_max)
            .fold(f64::NEG_INFINITY, f64::max),
        avg: mean(|e| e.main.temp),
    };

    let (sunrise, sunset, sun_data_available) = if date == today {
        (city.sunrise, city.sunset, true)
    } else if let Some(sun) = entries
        .iter()
        .filter(|e| local_date(e, tz) == date)
        .find_map(ForecastEntry::sun_times)
    {
        let sunrise = if sun.sunrise != 0 { sun.sunrise } else { city.sunrise };
        let sunset = if sun.sunset != 0 { sun.sunset } else { city.sunset };
        (sunrise, sunset, true)
    } else {
        let midnight = local_midnight(date, tz, first);
        let shift = i64::from(date.ordinal() % 10) * 60;
        (midnight + 6 * HOUR + shift, midnight + 18 * HOUR - shift, false)
    };

    Some(DaySummary {
        date,
        starts_at: first.timestamp(),
        temp,
        feels_like: mean(|e| e.main.feels_like),
        humidity: mean(|e| e.main.humidity),
        pressure: mean(|e| e.main.pressure),
        wind: mean(|e| e.wind.speed),
        visibility: mean(|e| e.visibility),
        weather: representative_condition(entries),
        sunrise,
        sunset,
        sun_data_available,
    })
}

/// Mode of the condition categories; ties go to the category seen first.
/// The returned condition is the first entry's with the winning category.
fn representative_condition(entries: &[ForecastEntry]) -> Option<Condition> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for condition in entries.iter().filter_map(ForecastEntry::condition) {
        match counts.iter_mut().find(|(main, _)| *main == condition.main) {
            Some((_, n)) => *n += 1,
            None => counts.push((condition.main.as_str(), 1)),
        }
    }

    let mut winner: Option<(&str, usize)> = None;
    for (main, n) in counts {
        if winner.map_or(true, |(_, best)| n > best) {
            winner = Some((main, n));
        }
    }
    let (main, _) = winner?;

    entries
        .iter()
        .filter_map(ForecastEntry::condition)
        .find(|c| c.main == main)
        .cloned()
}

fn local_date<Tz: TimeZone>(entry: &ForecastEntry, tz: &Tz) -> NaiveDate {
    entry.timestamp().with_timezone(tz).date_naive()
}

/// Unix time of local midnight on `date`.
fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz, reference: &ForecastEntry) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(midnight) => midnight.timestamp(),
        // Midnight skipped by a DST jump: use the offset in effect for the
        // day's first sample.
        None => {
            let offset = tz
                .offset_from_utc_datetime(&reference.timestamp().naive_utc())
                .fix()
                .local_minus_utc();
            naive.and_utc().timestamp() - i64::from(offset)
        }
    }
}

/// Nearest integer, halves toward +∞.
fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor as i64 + 1
    } else {
        floor as i64
    }
}

/// A fetched forecast, grouped by the viewer's calendar days.
#[derive(Debug, Clone)]
pub struct ForecastDayAggregator<Tz: TimeZone = Local> {
    forecast: ForecastResponse,
    days: Vec<DayGroup>,
    tz: Tz,
    today: NaiveDate,
}

impl ForecastDayAggregator<Local> {
    /// Group using the host time zone and today's local date.
    pub fn new(forecast: ForecastResponse) -> Self {
        let today = Local::now().date_naive();
        Self::with_timezone(forecast, Local, today)
    }
}

impl<Tz: TimeZone> ForecastDayAggregator<Tz> {
    pub fn with_timezone(forecast: ForecastResponse, tz: Tz, today: NaiveDate) -> Self {
        let days = group_by_day(&forecast.list, &tz);
        Self {
            forecast,
            days,
            tz,
            today,
        }
    }

    pub fn forecast(&self) -> &ForecastResponse {
        &self.forecast
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Day groups in chronological order.
    pub fn group_by_day(&self) -> &[DayGroup] {
        &self.days
    }

    /// Entries of the `index`-th day present, empty if out of range.
    pub fn select_day(&self, index: usize) -> &[ForecastEntry] {
        self.days
            .get(index)
            .map(|g| g.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn summarize(&self, entries: &[ForecastEntry]) -> Option<DaySummary> {
        summarize(entries, &self.forecast.city, &self.tz, self.today)
    }

    pub fn chart_series(&self, entries: &[ForecastEntry]) -> ChartSeries {
        chart_series(entries, &self.tz)
    }

    pub fn summarize_day(&self, index: usize) -> Option<DaySummary> {
        self.summarize(self.select_day(index))
    }
}

/// Forecast detail view state: `idle -> loading -> (ready | error)`.
///
/// A new `load` replaces whatever the previous one produced.
pub struct ForecastSession<Tz: TimeZone = Local> {
    tz: Tz,
    today: Option<NaiveDate>,
    state: LoadState,
    forecast: Option<ForecastDayAggregator<Tz>>,
    error: Option<String>,
    selected: usize,
}

impl Default for ForecastSession<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastSession<Local> {
    pub fn new() -> Self {
        Self::build(Local, None)
    }
}

impl<Tz: TimeZone> ForecastSession<Tz> {
    /// Session in a fixed time zone with a pinned "today".
    pub fn with_timezone(tz: Tz, today: NaiveDate) -> Self {
        Self::build(tz, Some(today))
    }

    fn build(tz: Tz, today: Option<NaiveDate>) -> Self {
        Self {
            tz,
            today,
            state: LoadState::Idle,
            forecast: None,
            error: None,
            selected: 0,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn forecast(&self) -> Option<&ForecastDayAggregator<Tz>> {
        self.forecast.as_ref()
    }

    /// Fetch the forecast for `city`. The selected day resets to the first.
    pub async fn load(&mut self, source: &dyn WeatherSource, city: &str) -> LoadState {
        self.state = LoadState::Loading;
        self.error = None;
        self.selected = 0;

        match source.forecast_by_name(city).await {
            Ok(forecast) => {
                let today = self
                    .today
                    .unwrap_or_else(|| Utc::now().with_timezone(&self.tz).date_naive());
                let aggregator =
                    ForecastDayAggregator::with_timezone(forecast, self.tz.clone(), today);
                tracing::debug!(
                    "Forecast for {} covers {} days",
                    city,
                    aggregator.group_by_day().len()
                );
                self.forecast = Some(aggregator);
                self.state = LoadState::Ready;
            }
            Err(e) => {
                tracing::warn!("Forecast for {} failed: {:?}", city, e);
                self.forecast = None;
                self.error = Some(e.to_string());
                self.state = LoadState::Error;
            }
        }
        self.state
    }

    /// Available days, in order.
    pub fn days(&self) -> Vec<DayTab> {
        let Some(forecast) = self.forecast.as_ref() else {
            return Vec::new();
        };
        forecast
            .group_by_day()
            .iter()
            .map(|g| DayTab {
                date: g.date,
                key: g.key(),
                label: day_label(g.date, forecast.today()),
            })
            .collect()
    }

    pub fn selected_day(&self) -> usize {
        self.selected
    }

    pub fn select_day(&mut self, index: usize) {
        self.selected = index;
    }

    pub fn selected_summary(&self) -> Option<DaySummary> {
        self.forecast.as_ref()?.summarize_day(self.selected)
    }

    pub fn selected_chart(&self) -> ChartSeries {
        self.forecast
            .as_ref()
            .map(|f| f.chart_series(f.select_day(self.selected)))
            .unwrap_or_default()
    }
}
