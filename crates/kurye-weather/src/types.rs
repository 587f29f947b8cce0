use serde::{Deserialize, Serialize};

use crate::conditions::{condition_from_code, icon_for};

/// Coarse weather condition, used for colouring and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Condition {
    Clear,
    Clouds,
    Mist,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
}

impl Condition {
    /// Accent colour for the condition as a hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Condition::Clear => "#FFD700",
            Condition::Clouds => "#87CEEB",
            Condition::Rain => "#4682B4",
            Condition::Drizzle => "#6495ED",
            Condition::Thunderstorm => "#2F4F4F",
            Condition::Snow => "#F0F8FF",
            Condition::Mist | Condition::Fog => "#D3D3D3",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    /// Degrees Celsius, rounded.
    pub temperature: i32,
    pub description: String,
    pub icon: &'static str,
    /// Relative humidity in percent.
    pub humidity: u32,
    /// Metres per second, rounded.
    pub wind_speed: i32,
    pub city: String,
    pub country: String,
    pub feels_like: i32,
    pub condition: Condition,
}

impl WeatherReading {
    /// What the dashboard shows when no live reading is available.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            temperature: 22,
            description: "clear".to_owned(),
            icon: "sunny",
            humidity: 60,
            wind_speed: 5,
            city: "İstanbul".to_owned(),
            country: "TR".to_owned(),
            feels_like: 24,
            condition: Condition::Clear,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentResponse {
    pub location: WireLocation,
    pub current: WireCurrent,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLocation {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCurrent {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: u32,
    pub wind_kph: f64,
    pub is_day: u8,
    pub condition: WireCondition,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCondition {
    pub text: String,
    pub code: u32,
}

#[allow(clippy::cast_possible_truncation)]
fn round(value: f64) -> i32 {
    value.round() as i32
}

impl From<CurrentResponse> for WeatherReading {
    fn from(raw: CurrentResponse) -> Self {
        let CurrentResponse { location, current } = raw;
        let code = current.condition.code;
        Self {
            temperature: round(current.temp_c),
            description: current.condition.text,
            icon: icon_for(code, current.is_day == 1),
            humidity: current.humidity,
            wind_speed: round(current.wind_kph / 3.6),
            city: location.name,
            country: location.country,
            feels_like: round(current.feelslike_c),
            condition: condition_from_code(code),
        }
    }
}
