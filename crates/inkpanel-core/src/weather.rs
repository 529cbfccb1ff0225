//! Weather data shown on the clock screen.

use serde::Deserialize;

use crate::error::WeatherError;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// Fahrenheit.
    pub temp: f32,
    pub temp_min: f32,
    pub temp_max: f32,
    pub description: String,
    pub location: String,
}

impl WeatherReport {
    /// One-line summary, e.g. `61.3F clear sky`.
    pub fn summary(&self) -> String {
        format!("{:.1}F {}", self.temp, self.description)
    }

    /// Decode an OpenWeatherMap "current weather" response (imperial units).
    pub fn from_openweather(body: &[u8]) -> Result<Self, WeatherError> {
        let raw: OpenWeather =
            serde_json::from_slice(body).map_err(|err| WeatherError::Parse(err.to_string()))?;
        let description = raw
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .unwrap_or_default();
        Ok(Self {
            temp: raw.main.temp,
            temp_min: raw.main.temp_min,
            temp_max: raw.main.temp_max,
            description,
            location: raw.name,
        })
    }
}

pub trait WeatherSource: Send {
    fn poll(&mut self) -> Result<WeatherReport, WeatherError>;
}

impl<W: WeatherSource + ?Sized> WeatherSource for Box<W> {
    fn poll(&mut self) -> Result<WeatherReport, WeatherError> {
        (**self).poll()
    }
}

#[derive(Deserialize)]
struct OpenWeather {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Readings,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

#[derive(Deserialize)]
struct Readings {
    temp: f32,
    temp_min: f32,
    temp_max: f32,
}
