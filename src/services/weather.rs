// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current weather for the dashboard, from open-meteo.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// City centre of Angers.
pub const CITY_LATITUDE: f64 = 47.47;
pub const CITY_LONGITUDE: f64 = -0.55;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    weathercode: i32,
}

/// Label and icon name shown for a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherDescription {
    pub label: &'static str,
    pub icon: &'static str,
}

/// Weather summary returned to the app.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct WeatherReport {
    pub temp: f64,
    pub code: i32,
    pub desc: String,
    pub icon: String,
}

/// Map a WMO code to a French label and icon.
pub fn describe_weather(code: i32) -> WeatherDescription {
    let (label, icon) = match code {
        0 => ("Ciel dégagé", "sun-o"),
        1..=3 => ("Partiellement nuageux", "cloud"),
        45..=48 => ("Brouillard", "align-justify"),
        51..=67 => ("Pluie", "tint"),
        // Thunderstorm codes (95+) are reported as snow as well.
        c if c >= 71 => ("Neige", "snowflake-o"),
        _ => ("Météo variable", "cloud"),
    };
    WeatherDescription { label, icon }
}

/// open-meteo forecast client.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the current weather at the city centre.
    ///
    /// Returns `None` when the API answers without a current reading.
    pub async fn current(&self) -> Result<Option<WeatherReport>, AppError> {
        let url = format!("{}/forecast", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", CITY_LATITUDE.to_string()),
                ("longitude", CITY_LONGITUDE.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::OpenData(format!("Weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::OpenData(format!(
                "Weather API returned HTTP {}",
                response.status()
            )));
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| AppError::OpenData(format!("Weather JSON parse error: {}", e)))?;

        Ok(forecast.current_weather.map(|w| {
            let desc = describe_weather(w.weathercode);
            WeatherReport {
                temp: w.temperature,
                code: w.weathercode,
                desc: desc.label.to_string(),
                icon: desc.icon.to_string(),
            }
        }))
    }
}
