//! Current-weather lookups for the dashboard. Lookups never fail: any
//! problem yields [`WeatherReading::fallback`].

pub mod client;
pub mod conditions;
pub mod error;
pub mod types;

pub use client::WeatherClient;
pub use conditions::{clean_city_name, condition_from_code, icon_for};
pub use error::WeatherError;
pub use types::{Condition, WeatherReading};
