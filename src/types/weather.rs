//! Weather types and WMO code normalization

use serde::{Deserialize, Serialize};

/// Fallback condition for codes outside the WMO whitelist.
pub const UNKNOWN_CONDITION: &str = "unknown";

/// Maximum number of hourly forecast entries carried in a [`Weather`].
pub const MAX_HOURLY_FORECAST: usize = 6;

/// WMO weather interpretation codes with a known condition entry.
///
/// See <https://open-meteo.com/en/docs>.
pub const WMO_CODES: [i64; 28] = [
    0, 1, 2, 3, 45, 48, 51, 53, 55, 56, 57, 61, 63, 65, 66, 67, 71, 73, 75, 77, 80, 81, 82, 85,
    86, 95, 96, 99,
];

/// Current conditions plus a short hourly outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Normalized condition code, see [`weather_condition`].
    pub condition: String,
    /// Localized condition description.
    pub condition_text: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_forecast: Option<Vec<HourlyForecast>>,
}

/// One hour of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    pub time: String,
    pub temperature: f64,
    pub weather_code: i64,
    pub condition_text: String,
}

/// Raw forecast as reported by a weather provider, before localization.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub current: CurrentConditions,
    /// Upcoming hours, oldest first.
    pub hourly: Vec<HourlyPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub weather_code: i64,
    pub humidity: Option<f64>,
    pub uv_index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub time: String,
    pub temperature: f64,
    pub weather_code: i64,
}

/// Map a WMO code to its normalized condition string.
///
/// Whitelisted codes map to their decimal form; everything else maps to
/// [`UNKNOWN_CONDITION`].
pub fn weather_condition(code: i64) -> String {
    if WMO_CODES.contains(&code) {
        code.to_string()
    } else {
        UNKNOWN_CONDITION.to_string()
    }
}

/// Map a WMO code to an emoji icon for display.
pub fn weather_icon(code: i64) -> &'static str {
    match code {
        0 | 1 => "☀️",
        2 => "🌤️",
        3 => "⛅",
        45 | 48 => "🌫️",
        51 | 53 | 55 | 61 | 63 | 65 => "🌧️",
        56 | 57 | 66 | 67 => "🌨️",
        71 | 73 | 75 | 77 | 85 | 86 => "❄️",
        80..=82 => "🌦️",
        95 | 96 | 99 => "⛈️",
        _ => "🌡️",
    }
}
