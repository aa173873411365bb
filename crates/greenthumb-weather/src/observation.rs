//! Mapping a forecast onto a stored observation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use greenthumb_store::{Garden, WeatherObservation};

use crate::{Forecast, ObservationError};

/// Condition label written on every observation. The forecast's weather code
/// is not mapped to a label.
pub const DEFAULT_CONDITION: &str = "Clear";

/// Build the observation for `garden` from a fetched forecast.
///
/// Temperature and wind speed come from the current conditions and default
/// to zero when the API reports `null`. Humidity and precipitation are the
/// first hour of the hourly series, since the API has no point value for
/// either. A series that is absent defaults to zero; one that is present
/// but empty, or whose first value is `null`, is an error.
pub fn observation_from_forecast(
    garden: &Garden,
    forecast: &Forecast,
    now: DateTime<Utc>,
) -> Result<WeatherObservation, ObservationError> {
    let current = forecast
        .current_weather
        .as_ref()
        .ok_or(ObservationError::MissingCurrent)?;

    let hourly = forecast.hourly.as_ref();
    let humidity = first_hour(
        hourly.and_then(|h| h.relativehumidity_2m.as_deref()),
        "relativehumidity_2m",
    )?;
    let precipitation = first_hour(
        hourly.and_then(|h| h.precipitation.as_deref()),
        "precipitation",
    )?;

    Ok(WeatherObservation {
        id: Uuid::new_v4(),
        garden_id: garden.id,
        temperature: current.temperature.unwrap_or(0.0),
        humidity,
        precipitation,
        wind_speed: current.windspeed.unwrap_or(0.0),
        condition: DEFAULT_CONDITION.to_string(),
        recorded_at: now,
    })
}

fn first_hour(series: Option<&[Option<f64>]>, name: &'static str) -> Result<f64, ObservationError> {
    match series {
        None => Ok(0.0),
        Some(values) => values
            .first()
            .copied()
            .flatten()
            .ok_or(ObservationError::EmptySeries { series: name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CurrentWeather, HourlySeries};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn garden() -> Garden {
        Garden::new("Allotment", 51.5, -0.12)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap()
    }

    fn forecast(humidity: Option<Vec<Option<f64>>>, precipitation: Option<Vec<Option<f64>>>) -> Forecast {
        Forecast {
            current_weather: Some(CurrentWeather {
                temperature: Some(14.2),
                windspeed: Some(11.5),
                ..CurrentWeather::default()
            }),
            hourly: Some(HourlySeries {
                relativehumidity_2m: humidity,
                precipitation,
                ..HourlySeries::default()
            }),
            ..Forecast::default()
        }
    }

    // === Unit Tests ===

    #[test]
    fn test_full_forecast() {
        let garden = garden();
        let obs = observation_from_forecast(
            &garden,
            &forecast(Some(vec![Some(81.0), Some(90.0)]), Some(vec![Some(0.3), Some(2.0)])),
            now(),
        )
        .unwrap();

        assert_eq!(obs.garden_id, garden.id);
        assert_eq!(obs.temperature, 14.2);
        assert_eq!(obs.wind_speed, 11.5);
        assert_eq!(obs.humidity, 81.0);
        assert_eq!(obs.precipitation, 0.3);
        assert_eq!(obs.condition, "Clear");
        assert_eq!(obs.recorded_at, now());
    }

    #[test]
    fn test_missing_current_conditions() {
        let mut f = forecast(Some(vec![Some(81.0)]), Some(vec![Some(0.0)]));
        f.current_weather = None;
        assert_eq!(
            observation_from_forecast(&garden(), &f, now()),
            Err(ObservationError::MissingCurrent)
        );
    }

    #[test]
    fn test_null_current_readings_default_to_zero() {
        let mut f = forecast(None, None);
        f.current_weather = Some(CurrentWeather::default());
        let obs = observation_from_forecast(&garden(), &f, now()).unwrap();
        assert_eq!(obs.temperature, 0.0);
        assert_eq!(obs.wind_speed, 0.0);
    }

    #[test]
    fn test_absent_hourly_defaults_to_zero() {
        let mut f = forecast(None, None);
        f.hourly = None;
        let obs = observation_from_forecast(&garden(), &f, now()).unwrap();
        assert_eq!(obs.humidity, 0.0);
        assert_eq!(obs.precipitation, 0.0);
    }

    #[test]
    fn test_empty_series_is_an_error() {
        assert_eq!(
            observation_from_forecast(&garden(), &forecast(Some(vec![]), None), now()),
            Err(ObservationError::EmptySeries {
                series: "relativehumidity_2m"
            })
        );
    }

    #[test]
    fn test_null_first_hour_is_an_error() {
        assert_eq!(
            observation_from_forecast(
                &garden(),
                &forecast(Some(vec![Some(70.0)]), Some(vec![None, Some(1.0)])),
                now()
            ),
            Err(ObservationError::EmptySeries {
                series: "precipitation"
            })
        );
    }

    #[test]
    fn test_each_observation_gets_a_fresh_id() {
        let f = forecast(Some(vec![Some(50.0)]), Some(vec![Some(0.0)]));
        let a = observation_from_forecast(&garden(), &f, now()).unwrap();
        let b = observation_from_forecast(&garden(), &f, now()).unwrap();
        assert_ne!(a.id, b.id);
    }

    // === Property-Based Tests ===

    proptest! {
        // Only the first hour is read, whatever follows it.
        #[test]
        fn first_hour_wins(
            humidity in proptest::collection::vec(0.0f64..100.0, 1..48),
            rain in proptest::collection::vec(0.0f64..50.0, 1..48),
        ) {
            let f = forecast(
                Some(humidity.iter().copied().map(Some).collect()),
                Some(rain.iter().copied().map(Some).collect()),
            );
            let obs = observation_from_forecast(&garden(), &f, now()).unwrap();
            prop_assert_eq!(obs.humidity, humidity[0]);
            prop_assert_eq!(obs.precipitation, rain[0]);
        }
    }
}
