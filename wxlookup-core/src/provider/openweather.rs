use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::{
    Config, FetchError, WeatherRecord, time_format::format_local, timezone::TimezoneResolver,
};

use super::WeatherProvider;

#[derive(Debug)]
pub struct OpenWeatherProvider {
    config: Config,
    http: Client,
    resolver: TimezoneResolver,
}

impl OpenWeatherProvider {
    pub fn new(config: &Config, resolver: TimezoneResolver) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { config: config.clone(), http, resolver })
    }

    /// Provider using the embedded timezone polygons.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config, TimezoneResolver::polygon())
    }

    pub fn with_resolver(mut self, resolver: TimezoneResolver) -> Self {
        self.resolver = resolver;
        self
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        let timeout_secs = self.config.timeout.as_secs();
        debug!(city, url = %self.config.base_url, "requesting current weather");

        let res = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("q", city),
                ("appid", self.config.api_key.as_str()),
                ("units", self.config.units.as_str()),
                ("lang", self.config.lang.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::from_transport(e, timeout_secs))?;

        let status = res.status();
        if !status.is_success() {
            // The reason is the standard phrase for the code, not the server's own text.
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown Status").to_owned(),
            });
        }

        let body = res.text().await.map_err(|e| FetchError::from_transport(e, timeout_secs))?;
        let parsed: Value = serde_json::from_str(&body)?;

        self.record_from_json(&parsed)
    }

    fn record_from_json(&self, json: &Value) -> Result<WeatherRecord, FetchError> {
        let city = field(json, "/name", "name")?
            .as_str()
            .ok_or_else(|| invalid("name"))?
            .to_owned();

        let temperature =
            field(json, "/main/temp", "main.temp")?.as_f64().ok_or_else(|| invalid("main.temp"))?;

        let humidity = field(json, "/main/humidity", "main.humidity")
            .and_then(|v| as_percent(v).ok_or_else(|| invalid("main.humidity")))?;

        let condition = field(json, "/weather/0/description", "weather[0].description")?
            .as_str()
            .ok_or_else(|| invalid("weather[0].description"))?
            .to_owned();

        let dt = field(json, "/dt", "dt")?.as_i64().ok_or_else(|| invalid("dt"))?;

        let coord = field(json, "/coord", "coord")?
            .as_object()
            .ok_or_else(|| invalid("coord"))?;
        let lat = coord.get("lat").and_then(Value::as_f64);
        let lon = coord.get("lon").and_then(Value::as_f64);

        let timezone = self.resolver.resolve(lat, lon);
        let local_time = format_local(dt, &timezone)?;

        Ok(WeatherRecord { city, temperature, humidity, condition, local_time })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        self.fetch_current(city).await
    }
}

/// Fetch a required value by JSON pointer; `name` is how the field is reported.
fn field<'a>(json: &'a Value, pointer: &str, name: &str) -> Result<&'a Value, FetchError> {
    json.pointer(pointer)
        .filter(|v| !v.is_null())
        .ok_or_else(|| FetchError::MissingField(name.to_owned()))
}

fn invalid(name: &str) -> FetchError {
    FetchError::InvalidField(name.to_owned())
}

fn as_percent(value: &Value) -> Option<u8> {
    let whole = value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))?;

    u8::try_from(whole).ok().filter(|pct| *pct <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::tests::FixedLookup;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    const ENDPOINT: &str = "/data/2.5/weather";

    fn sample_body() -> Value {
        json!({
            "coord": { "lon": 0, "lat": 0 },
            "weather": [{ "main": "Clear", "description": "clear sky" }],
            "main": { "temp": 22.5, "humidity": 55 },
            "dt": 1609459200,
            "name": "TestCity",
            "cod": 200
        })
    }

    fn provider_for(server: &MockServer, zone: Option<&str>) -> OpenWeatherProvider {
        let cfg = Config::new("DUMMY_KEY").with_base_url(format!("{}{ENDPOINT}", server.uri()));
        let resolver = TimezoneResolver::new(Box::new(FixedLookup::answering(zone)));
        OpenWeatherProvider::new(&cfg, resolver).unwrap()
    }

    async fn serve(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn success_builds_full_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .and(query_param("q", "TestCity"))
            .and(query_param("appid", "DUMMY_KEY"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let record = provider_for(&server, None).get_weather("TestCity").await.unwrap();

        assert_eq!(
            record,
            WeatherRecord {
                city: "TestCity".into(),
                temperature: 22.5,
                humidity: 55,
                condition: "clear sky".into(),
                local_time: "01-Jan-21 12:00 AM UTC".into(),
            }
        );
    }

    #[tokio::test]
    async fn success_with_polygon_lookup_at_null_island() {
        let server = MockServer::start().await;
        serve(&server, ResponseTemplate::new(200).set_body_json(sample_body())).await;

        let cfg = Config::new("DUMMY_KEY").with_base_url(format!("{}{ENDPOINT}", server.uri()));
        let provider = OpenWeatherProvider::from_config(&cfg).unwrap();
        let record = provider.get_weather("TestCity").await.unwrap();

        assert!(
            record.local_time == "01-Jan-21 12:00 AM UTC"
                || record.local_time == "01-Jan-21 12:00 AM GMT",
            "unexpected local time {}",
            record.local_time
        );
    }

    #[tokio::test]
    async fn local_time_uses_resolved_zone() {
        let server = MockServer::start().await;
        let mut body = sample_body();
        body["coord"] = json!({ "lat": 35.68, "lon": 139.69 });
        serve(&server, ResponseTemplate::new(200).set_body_json(body)).await;

        let record = provider_for(&server, Some("Asia/Tokyo")).get_weather("Tokyo").await.unwrap();
        assert_eq!(record.local_time, "01-Jan-21 09:00 AM JST");
    }

    #[tokio::test]
    async fn missing_latitude_falls_back_to_utc() {
        let server = MockServer::start().await;
        let mut body = sample_body();
        body["coord"] = json!({ "lon": 139.69 });
        serve(&server, ResponseTemplate::new(200).set_body_json(body)).await;

        let record = provider_for(&server, Some("Asia/Tokyo")).get_weather("Tokyo").await.unwrap();
        assert_eq!(record.local_time, "01-Jan-21 12:00 AM UTC");
    }

    #[tokio::test]
    async fn http_error_reports_status_and_reason() {
        let server = MockServer::start().await;
        serve(&server, ResponseTemplate::new(404)).await;

        let err = provider_for(&server, None).get_weather("Nowhere").await.unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 404, .. }));

        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("Not Found"));
    }

    #[tokio::test]
    async fn nonstandard_status_has_placeholder_reason() {
        let server = MockServer::start().await;
        serve(&server, ResponseTemplate::new(599)).await;

        let err = provider_for(&server, None).get_weather("City").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP Error: 599 - Unknown Status");
    }

    #[test]
    fn with_resolver_replaces_lookup() {
        let cfg = Config::new("KEY");
        let first = TimezoneResolver::new(Box::new(FixedLookup::answering(Some("Asia/Tokyo"))));
        let second = TimezoneResolver::new(Box::new(FixedLookup::answering(Some("Europe/Paris"))));

        let provider = OpenWeatherProvider::new(&cfg, first).unwrap().with_resolver(second);
        assert_eq!(provider.resolver.resolve(Some(48.85), Some(2.35)), "Europe/Paris");
    }

    #[tokio::test]
    async fn missing_temperature_names_the_field() {
        let server = MockServer::start().await;
        let broken = json!({
            "name": "City",
            "main": {},
            "weather": [],
            "dt": 123456789,
            "coord": { "lat": 0, "lon": 0 }
        });
        serve(&server, ResponseTemplate::new(200).set_body_json(broken)).await;

        let err = provider_for(&server, None).get_weather("City").await.unwrap_err();
        assert!(matches!(&err, FetchError::MissingField(f) if f == "main.temp"));
        assert!(err.to_string().contains("Missing expected field `main.temp`"));
    }

    #[tokio::test]
    async fn empty_weather_list_is_missing_description() {
        let server = MockServer::start().await;
        let mut body = sample_body();
        body["weather"] = json!([]);
        serve(&server, ResponseTemplate::new(200).set_body_json(body)).await;

        let err = provider_for(&server, None).get_weather("City").await.unwrap_err();
        assert!(matches!(&err, FetchError::MissingField(f) if f == "weather[0].description"));
    }

    #[tokio::test]
    async fn missing_coord_object_is_a_data_error() {
        let server = MockServer::start().await;
        let mut body = sample_body();
        body.as_object_mut().unwrap().remove("coord");
        serve(&server, ResponseTemplate::new(200).set_body_json(body)).await;

        let err = provider_for(&server, None).get_weather("City").await.unwrap_err();
        assert!(matches!(&err, FetchError::MissingField(f) if f == "coord"));
    }

    #[tokio::test]
    async fn wrong_type_is_invalid_field() {
        let server = MockServer::start().await;
        let mut body = sample_body();
        body["main"]["temp"] = json!("warm");
        serve(&server, ResponseTemplate::new(200).set_body_json(body)).await;

        let err = provider_for(&server, None).get_weather("City").await.unwrap_err();
        assert!(matches!(&err, FetchError::InvalidField(f) if f == "main.temp"));
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let server = MockServer::start().await;
        serve(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

        let err = provider_for(&server, None).get_weather("City").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        serve(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(sample_body())
                .set_delay(Duration::from_secs(3)),
        )
        .await;

        let cfg = Config::new("DUMMY_KEY")
            .with_base_url(format!("{}{ENDPOINT}", server.uri()))
            .with_timeout(Duration::from_secs(1));
        let resolver = TimezoneResolver::new(Box::new(FixedLookup::answering(None)));
        let provider = OpenWeatherProvider::new(&cfg, resolver).unwrap();

        let err = provider.get_weather("TestCity").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { secs: 1 }));
        assert_eq!(err.to_string(), "Error: Request timed out (1 seconds)");
    }

    #[tokio::test]
    async fn refused_connection_is_connection_error() {
        // Nothing listens on port 1.
        let cfg = Config::new("DUMMY_KEY").with_base_url("http://127.0.0.1:1/data/2.5/weather");
        let resolver = TimezoneResolver::new(Box::new(FixedLookup::answering(None)));
        let provider = OpenWeatherProvider::new(&cfg, resolver).unwrap();

        let err = provider.get_weather("TestCity").await.unwrap_err();
        assert!(matches!(err, FetchError::Connection), "got {err:?}");
        assert_eq!(err.to_string(), "Error: Unable to connect to the OpenWeatherMap API");
    }

    #[tokio::test]
    async fn malformed_url_is_generic_request_error() {
        let cfg = Config::new("DUMMY_KEY").with_base_url("not a url");
        let resolver = TimezoneResolver::new(Box::new(FixedLookup::answering(None)));
        let provider = OpenWeatherProvider::new(&cfg, resolver).unwrap();

        let err = provider.get_weather("TestCity").await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)), "got {err:?}");
        assert!(err.to_string().starts_with("Network Error:"));
    }

    #[test]
    fn percent_accepts_whole_numbers_only() {
        assert_eq!(as_percent(&json!(55)), Some(55));
        assert_eq!(as_percent(&json!(55.0)), Some(55));
        assert_eq!(as_percent(&json!(55.5)), None);
        assert_eq!(as_percent(&json!(101)), None);
        assert_eq!(as_percent(&json!(-1)), None);
    }
}
