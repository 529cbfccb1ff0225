//! OpenWeatherMap client for the clock screen.

use embedded_svc::http::client::Client as HttpClient;
use embedded_svc::http::Headers;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use inkpanel_core::{WeatherError, WeatherReport, WeatherSource};

const ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current-weather responses are well under this.
const MAX_RESPONSE_BYTES: usize = 8 * 1024;

pub struct WeatherQuery {
    pub api_key: String,
    pub lat: String,
    pub lon: String,
}

impl WeatherQuery {
    /// Query baked in at build time, if complete.
    pub fn from_build_env() -> Option<Self> {
        Some(Self {
            api_key: option_env!("WEATHER_API_KEY")?.to_string(),
            lat: option_env!("WEATHER_LAT")?.to_string(),
            lon: option_env!("WEATHER_LON")?.to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}?appid={}&lat={}&lon={}&units=imperial",
            ENDPOINT, self.api_key, self.lat, self.lon
        )
    }
}

pub struct HttpWeather {
    query: Option<WeatherQuery>,
    client: Option<HttpClient<EspHttpConnection>>,
}

impl HttpWeather {
    pub fn new(query: Option<WeatherQuery>) -> Self {
        if query.is_none() {
            log::warn!("Weather API not configured; clock screen shows no weather");
        }
        Self {
            query,
            client: None,
        }
    }

    /// Connections are created lazily and dropped after a failure.
    fn client(&mut self) -> Result<&mut HttpClient<EspHttpConnection>, WeatherError> {
        if self.client.is_none() {
            let config = HttpConfiguration {
                use_global_ca_store: true,
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            };
            let conn = EspHttpConnection::new(&config)
                .map_err(|err| WeatherError::Http(format!("{:?}", err)))?;
            self.client = Some(HttpClient::wrap(conn));
        }
        self.client
            .as_mut()
            .ok_or_else(|| WeatherError::Http(String::from("http client init failed")))
    }

    fn http_get(&mut self, url: &str) -> Result<Vec<u8>, WeatherError> {
        let client = self.client()?;
        let request = client
            .get(url)
            .map_err(|err| WeatherError::Http(format!("{:?}", err)))?;
        let mut response = request
            .submit()
            .map_err(|err| WeatherError::Network(format!("{:?}", err)))?;

        let status = response.status();
        if status != 200 {
            return Err(WeatherError::Http(format!("HTTP {}", status)));
        }

        let content_length = response.content_len().unwrap_or(0) as usize;
        if content_length > MAX_RESPONSE_BYTES {
            return Err(WeatherError::ResponseTooLarge(content_length));
        }

        let mut body = Vec::with_capacity(content_length.clamp(1024, MAX_RESPONSE_BYTES));
        let mut buf = [0u8; 1024];
        loop {
            let read = response
                .read(&mut buf)
                .map_err(|err| WeatherError::Network(format!("{:?}", err)))?;
            if read == 0 {
                break;
            }
            if body.len() + read > MAX_RESPONSE_BYTES {
                return Err(WeatherError::ResponseTooLarge(body.len() + read));
            }
            body.extend_from_slice(&buf[..read]);
        }
        Ok(body)
    }
}

impl WeatherSource for HttpWeather {
    fn poll(&mut self) -> Result<WeatherReport, WeatherError> {
        let url = match &self.query {
            Some(query) => query.url(),
            None => return Err(WeatherError::NotConfigured),
        };
        let result = self
            .http_get(&url)
            .and_then(|body| WeatherReport::from_openweather(&body));
        if result.is_err() {
            self.client = None;
        }
        result
    }
}
