//! Presentation helpers shared by the city list and forecast views.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Weekday};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Condition icon on the upstream CDN.
pub fn icon_url(code: &str) -> String {
    format!("{}/{}.png", ICON_BASE_URL, code)
}

/// Double-resolution variant of [`icon_url`].
pub fn icon_url_2x(code: &str) -> String {
    format!("{}/{}@2x.png", ICON_BASE_URL, code)
}

/// Emoji for an icon code, `🌤️` for anything unknown.
pub fn icon_emoji(code: &str) -> &'static str {
    match code {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" | "02n" => "⛅",
        "03d" | "03n" | "04d" | "04n" => "☁️",
        "09d" | "09n" => "🌧️",
        "10d" | "10n" => "🌦️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => "🌤️",
    }
}

/// Turkish label for a known upstream description.
///
/// Unknown descriptions are returned as-is.
pub fn localized_description(description: &str) -> &str {
    match description {
        "clear sky" => "Açık",
        "few clouds" => "Az Bulutlu",
        "scattered clouds" => "Parçalı Bulutlu",
        "broken clouds" => "Çok Bulutlu",
        "overcast clouds" => "Bulutlu",
        "light rain" => "Hafif Yağmurlu",
        "moderate rain" => "Orta Şiddetli Yağmurlu",
        "heavy rain" => "Şiddetli Yağmurlu",
        "shower rain" => "Sağanak Yağışlı",
        "thunderstorm" => "Gök Gürültülü Fırtına",
        "snow" => "Karlı",
        "mist" | "fog" => "Sisli",
        other => other,
    }
}

/// "Bugün", "Yarın" or the Turkish weekday name.
pub fn day_label(date: NaiveDate, today: NaiveDate) -> &'static str {
    if date == today {
        return "Bugün";
    }
    if today.succ_opt() == Some(date) {
        return "Yarın";
    }
    match date.weekday() {
        Weekday::Mon => "Pazartesi",
        Weekday::Tue => "Salı",
        Weekday::Wed => "Çarşamba",
        Weekday::Thu => "Perşembe",
        Weekday::Fri => "Cuma",
        Weekday::Sat => "Cumartesi",
        Weekday::Sun => "Pazar",
    }
}

/// `HH:MM` local time of a unix timestamp, empty for out-of-range input.
pub fn format_clock<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.with_timezone(tz).naive_local().format("%H:%M").to_string())
        .unwrap_or_default()
}
