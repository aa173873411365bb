//! Open-Meteo forecast client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::types::HOURLY_VARIABLES;
use crate::{Forecast, WeatherError};

/// Default public Open-Meteo endpoint. No API key is needed.
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of forecasts by coordinate.
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Forecast, WeatherError>;
}

/// Client for the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    forecast_url: Url,
}

impl OpenMeteoClient {
    /// Create a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let invalid = |reason: String| WeatherError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }
        let mut forecast_url = base;
        forecast_url
            .path_segments_mut()
            .map_err(|_| invalid("not a base URL".to_string()))?
            .pop_if_empty()
            .extend(["v1", "forecast"]);

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .build()?;

        Ok(Self { http, forecast_url })
    }

    /// Full forecast endpoint, without query.
    pub fn forecast_url(&self) -> &Url {
        &self.forecast_url
    }
}

#[async_trait]
impl WeatherFetcher for OpenMeteoClient {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Forecast, WeatherError> {
        debug!(latitude, longitude, "fetching forecast");

        let response = self
            .http
            .get(self.forecast_url.clone())
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenMeteoClient {
        OpenMeteoClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_forecast_url_joins_path() {
        let client = OpenMeteoClient::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            client.forecast_url().as_str(),
            "https://api.open-meteo.com/v1/forecast"
        );

        let trailing = OpenMeteoClient::new("http://localhost:8080/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            trailing.forecast_url().as_str(),
            "http://localhost:8080/v1/forecast"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            OpenMeteoClient::new("not a url", DEFAULT_TIMEOUT),
            Err(WeatherError::InvalidUrl { .. })
        ));
        assert!(matches!(
            OpenMeteoClient::new("mailto:someone@example.com", DEFAULT_TIMEOUT),
            Err(WeatherError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_sends_expected_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "52.52"))
            .and(query_param("longitude", "13.41"))
            .and(query_param("current_weather", "true"))
            .and(query_param("hourly", HOURLY_VARIABLES))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_weather": { "temperature": 14.2, "windspeed": 11.5 },
                "hourly": { "relativehumidity_2m": [81], "precipitation": [0.1] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let forecast = client_for(&server).fetch(52.52, 13.41).await.unwrap();
        assert_eq!(forecast.current_weather.unwrap().temperature, Some(14.2));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Latitude must be in range of -90 to 90°."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch(123.0, 0.0).await.unwrap_err();
        match err {
            WeatherError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Latitude"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_undecodable_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch(1.0, 2.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = OpenMeteoClient::new(&server.uri(), Duration::from_millis(200)).unwrap();
        let err = client.fetch(1.0, 2.0).await.unwrap_err();
        match err {
            WeatherError::Http(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
