use crate::error::{Result, WeatherProviderError};
use crate::WeatherProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use wxmon_common::types::{UnitSystem, WeatherSnapshot};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI.com error code for "no matching location found".
const CODE_NO_MATCHING_LOCATION: i64 = 1006;

/// Client for the WeatherAPI.com `current.json` endpoint.
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl WeatherApiClient {
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Result<Self> {
        if api_key.is_empty() {
            return Err(WeatherProviderError::Config(
                "weather API key is not set".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn fetch_current(
        &self,
        location_name: &str,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot> {
        let url = format!("{}/current.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", location_name),
                ("aqi", "yes"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(WeatherProviderError::RateLimited);
        }

        let body = response.text().await?;
        if !status.is_success() {
            // WeatherAPI wraps failures as {"error": {"code", "message"}}
            if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&body) {
                if err.error.code == CODE_NO_MATCHING_LOCATION {
                    return Err(WeatherProviderError::UnknownLocation(
                        location_name.to_string(),
                    ));
                }
                return Err(WeatherProviderError::Api {
                    code: err.error.code,
                    message: err.error.message,
                });
            }
            return Err(WeatherProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CurrentResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            location = location_name,
            temp = ?parsed.current.temp_c,
            "Fetched current conditions"
        );
        Ok(parsed.current.into_snapshot(units))
    }

    fn provider_name(&self) -> &str {
        "weatherapi"
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: Option<f64>,
    temp_f: Option<f64>,
    humidity: Option<f64>,
    wind_kph: Option<f64>,
    wind_mph: Option<f64>,
    precip_mm: Option<f64>,
    precip_in: Option<f64>,
    air_quality: Option<AirQuality>,
}

#[derive(Debug, Deserialize)]
struct AirQuality {
    #[serde(rename = "us-epa-index")]
    us_epa_index: Option<f64>,
}

impl CurrentConditions {
    fn into_snapshot(self, units: UnitSystem) -> WeatherSnapshot {
        let (temperature, wind_speed, precipitation) = match units {
            UnitSystem::Metric => (self.temp_c, self.wind_kph, self.precip_mm),
            UnitSystem::Imperial => (self.temp_f, self.wind_mph, self.precip_in),
        };
        WeatherSnapshot {
            temperature,
            precipitation,
            wind_speed,
            humidity: self.humidity,
            aqi: self.air_quality.and_then(|aq| aq.us_epa_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_BODY: &str = r#"{
        "location": {"name": "Hanoi", "country": "Vietnam"},
        "current": {
            "temp_c": 36.5,
            "temp_f": 97.7,
            "humidity": 62,
            "wind_kph": 18.4,
            "wind_mph": 11.4,
            "precip_mm": 0.3,
            "precip_in": 0.01,
            "air_quality": {"pm2_5": 41.2, "us-epa-index": 3}
        }
    }"#;

    #[test]
    fn parses_metric_snapshot() {
        let parsed: CurrentResponse = serde_json::from_str(SAMPLE_BODY).unwrap();
        let snapshot = parsed.current.into_snapshot(UnitSystem::Metric);
        assert_eq!(snapshot.temperature, Some(36.5));
        assert_eq!(snapshot.wind_speed, Some(18.4));
        assert_eq!(snapshot.precipitation, Some(0.3));
        assert_eq!(snapshot.humidity, Some(62.0));
        assert_eq!(snapshot.aqi, Some(3.0));
    }

    #[test]
    fn parses_imperial_snapshot() {
        let parsed: CurrentResponse = serde_json::from_str(SAMPLE_BODY).unwrap();
        let snapshot = parsed.current.into_snapshot(UnitSystem::Imperial);
        assert_eq!(snapshot.temperature, Some(97.7));
        assert_eq!(snapshot.wind_speed, Some(11.4));
        assert_eq!(snapshot.precipitation, Some(0.01));
    }

    #[test]
    fn missing_air_quality_block_yields_no_aqi() {
        let body = r#"{"current": {"temp_c": 20.0}}"#;
        let parsed: CurrentResponse = serde_json::from_str(body).unwrap();
        let snapshot = parsed.current.into_snapshot(UnitSystem::Metric);
        assert_eq!(snapshot.temperature, Some(20.0));
        assert_eq!(snapshot.aqi, None);
        assert_eq!(snapshot.humidity, None);
    }

    #[test]
    fn error_body_parses() {
        let body = r#"{"error": {"code": 1006, "message": "No matching location found."}}"#;
        let err: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(err.error.code, CODE_NO_MATCHING_LOCATION);
    }

    #[test]
    fn empty_api_key_is_a_config_error() {
        let result = WeatherApiClient::new("", DEFAULT_BASE_URL, 10);
        assert!(matches!(result, Err(WeatherProviderError::Config(_))));
    }
}
