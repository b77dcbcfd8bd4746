//! Client for the RapidAPI "carfax-checks" record service.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use opentelemetry::KeyValue;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error};

use super::{LookupError, RecordLookup};
use crate::error::{Error, Result};
use crate::model::lookup::LookupResult;
use crate::telemetry::metrics;
use crate::vin::Vin;

pub const DEFAULT_BASE_URL: &str = "https://carfax-checks.p.rapidapi.com";
const DEFAULT_USER_AGENT: &str = "vinhunt/0.1 (VIN research bot)";

/// Settings for [`CarfaxChecksClient`].
#[derive(Debug)]
pub struct LookupConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout: Duration,
}

/// Looks up `GET {base_url}/checkrecords/{vin}` with RapidAPI auth headers.
pub struct CarfaxChecksClient {
    client: Client,
    base_url: String,
}

impl CarfaxChecksClient {
    /// Build the client. The `x-rapidapi-host` header is taken from the
    /// base URL's host.
    ///
    /// # Errors
    /// Returns an error if the base URL has no host, the key is not a valid
    /// header value, or the HTTP client cannot be created.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let url = reqwest::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("bad lookup base URL {base_url}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config(format!("lookup base URL has no host: {base_url}")))?;

        let mut key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| Error::Config("RAPIDAPI_KEY is not a valid header value".to_string()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert("x-rapidapi-key", key);
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(host)
                .map_err(|_| Error::Config(format!("bad lookup host: {host}")))?,
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl RecordLookup for CarfaxChecksClient {
    async fn lookup(&self, vin: &Vin) -> std::result::Result<LookupResult, LookupError> {
        let started = Instant::now();
        let response = self
            .client
            .get(format!("{}/checkrecords/{vin}", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            error!(%vin, status = status.as_u16(), %body, "lookup request failed");
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        metrics::lookup_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("service", "carfax-checks")],
        );
        debug!(%vin, %body, "lookup response");

        let parsed: CheckRecordsResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::Decode(e.to_string()))?;
        Ok(parsed.into_result())
    }
}

/// Response body. The service sends more fields (images, auction flags)
/// which are ignored.
#[derive(Debug, Deserialize)]
struct CheckRecordsResponse {
    vin: Option<String>,
    carfax_records: Option<i32>,
    autocheck_records: Option<i32>,
    vehicle: Option<String>,
}

impl CheckRecordsResponse {
    /// An absent or empty echoed VIN means the service has no vehicle.
    fn into_result(self) -> LookupResult {
        match self.vin.as_deref() {
            Some(v) if !v.is_empty() => LookupResult {
                name: self.vehicle.unwrap_or_default(),
                carfax_records: self.carfax_records.unwrap_or(-1),
                autocheck_records: self.autocheck_records.unwrap_or(-1),
            },
            _ => LookupResult::not_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> LookupResult {
        serde_json::from_str::<CheckRecordsResponse>(json)
            .unwrap()
            .into_result()
    }

    #[test]
    fn full_response_is_normalised() {
        let result = parse(
            r#"{"vin":"1C6RD6FT1CS310366","autocheck_records":37,"carfax_records":33,
                "vehicle":"2012 RAM 1500 EXPRESS","auction_record":true,"image_count":11}"#,
        );
        assert_eq!(result.name, "2012 RAM 1500 EXPRESS");
        assert_eq!(result.carfax_records, 33);
        assert_eq!(result.autocheck_records, 37);
        assert!(result.success());
    }

    #[test]
    fn empty_vin_means_not_found() {
        let result = parse(r#"{"vin":"","carfax_records":0,"autocheck_records":0}"#);
        assert_eq!(result, LookupResult::not_found());
    }

    #[test]
    fn missing_vin_means_not_found() {
        assert_eq!(parse("{}"), LookupResult::not_found());
    }

    #[test]
    fn rejects_base_url_without_host() {
        let config = LookupConfig {
            base_url: "not a url".to_string(),
            api_key: SecretString::from("key".to_string()),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(
            CarfaxChecksClient::new(&config),
            Err(Error::Config(_))
        ));
    }
}
