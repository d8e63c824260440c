//! Fetches hourly forecasts from the Open-Meteo API.
//!
//! Responses are cached on disk for an hour and transient failures (connection errors,
//! HTTP 429 and 5xx) are retried with exponential backoff.

use crate::extract::error::ExtractError;
use crate::types::columns::HOURLY_VARIABLES;
use crate::types::raw_forecast::{Coordinates, HourlyData, RawForecast};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use chrono::{Days, NaiveDate, Utc};
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_LATITUDE: f64 = 52.52;
pub const DEFAULT_LONGITUDE: f64 = 13.41;
pub const DEFAULT_DAYS_AHEAD: u32 = 1;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Deserialize)]
struct ForecastResponse {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    elevation: f64,
    #[serde(default)]
    utc_offset_seconds: f64,
    hourly: HourlyData,
}

/// Decodes an Open-Meteo forecast body into a [`RawForecast`].
///
/// The API's `hourly.time` becomes the record's `date` sequence and the top-level location
/// fields become its `coordinates`. Other top-level keys (units, timezone) are ignored.
pub fn parse_response(body: &[u8]) -> Result<RawForecast, serde_json::Error> {
    let response: ForecastResponse = serde_json::from_slice(body)?;
    Ok(RawForecast {
        coordinates: Coordinates {
            latitude: response.latitude,
            longitude: response.longitude,
            elevation: response.elevation,
            utc_offset_seconds: response.utc_offset_seconds,
        },
        hourly: response.hourly,
    })
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Client for the Open-Meteo forecast endpoint.
///
/// # Examples
///
/// ```no_run
/// use forecast_features::OpenMeteoExtractor;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = OpenMeteoExtractor::builder()
///     .latitude(53.87)
///     .longitude(-1.91)
///     .days_ahead(2)
///     .build();
/// let record = extractor.extract().await?;
/// println!("{} hourly samples", record.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenMeteoExtractor {
    client: Client,
    latitude: f64,
    longitude: f64,
    days_ahead: u32,
    hourly_variables: Vec<String>,
    base_url: String,
    cache_dir: Option<PathBuf>,
    use_cache: bool,
    cache_ttl: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl Default for OpenMeteoExtractor {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[bon]
impl OpenMeteoExtractor {
    /// Creates an extractor.
    ///
    /// Every parameter is optional. The defaults request the 21 catalogue variables for
    /// Berlin (52.52, 13.41) from today through tomorrow and cache bodies for an hour in
    /// the user cache directory unless `cache_dir` is given. Failed requests are retried
    /// up to 5 times, starting at a 200 ms backoff.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_LATITUDE)] latitude: f64,
        #[builder(default = DEFAULT_LONGITUDE)] longitude: f64,
        #[builder(default = DEFAULT_DAYS_AHEAD)] days_ahead: u32,
        #[builder(default = HOURLY_VARIABLES.iter().map(|v| v.to_string()).collect())]
        hourly_variables: Vec<String>,
        #[builder(into, default = DEFAULT_BASE_URL.to_string())] base_url: String,
        cache_dir: Option<PathBuf>,
        #[builder(default = true)] use_cache: bool,
        #[builder(default = DEFAULT_CACHE_TTL)] cache_ttl: Duration,
        #[builder(default = DEFAULT_MAX_RETRIES)] max_retries: u32,
        #[builder(default = DEFAULT_BACKOFF)] backoff: Duration,
        client: Option<Client>,
    ) -> Self {
        Self {
            client: client.unwrap_or_default(),
            latitude,
            longitude,
            days_ahead,
            hourly_variables,
            base_url,
            cache_dir,
            use_cache,
            cache_ttl,
            max_retries,
            backoff,
        }
    }

    /// Fetches the forecast from today (UTC) through `days_ahead` days later.
    pub async fn extract(&self) -> Result<RawForecast, ExtractError> {
        let start = Utc::now().date_naive();
        let end = start + Days::new(u64::from(self.days_ahead));
        self.extract_range(start, end).await
    }

    /// Fetches the forecast for `start..=end`, serving a fresh cached body if one exists.
    pub async fn extract_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawForecast, ExtractError> {
        let cache_path = if self.use_cache {
            Some(self.cache_path(start, end).await?)
        } else {
            None
        };

        if let Some(path) = &cache_path {
            if let Some(body) = self.read_fresh_cache(path).await {
                match parse_response(&body) {
                    Ok(record) => {
                        info!("Cache hit for forecast at {:?}", path);
                        return Ok(record);
                    }
                    Err(e) => warn!("Ignoring unreadable cached forecast {:?}: {}", path, e),
                }
            }
        }

        let body = self.fetch_body(start, end).await?;
        let record = parse_response(&body)?;
        info!(
            "Fetched {} hourly samples for ({}, {})",
            record.len(),
            self.latitude,
            self.longitude
        );

        if let Some(path) = cache_path {
            Self::write_cache(body, path).await?;
        }
        Ok(record)
    }

    fn query(&self, start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("hourly", self.hourly_variables.join(",")),
            ("timezone", "auto".to_string()),
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ]
    }

    /// Delay before retry number `attempt` (0-based): `backoff * 2^attempt`.
    fn retry_delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    async fn fetch_body(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<u8>, ExtractError> {
        let url = self.base_url.clone();
        let query = self.query(start, end);
        let mut attempt = 0;
        loop {
            info!("Requesting forecast from {} (attempt {})", url, attempt + 1);
            match self.client.get(&url).query(&query).send().await {
                Ok(response) if response.status().is_success() => {
                    return Self::read_body(response, &url).await;
                }
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable(status) || attempt >= self.max_retries {
                        warn!("HTTP error for {}: {}", url, status);
                        return Err(ExtractError::HttpStatus { url, status });
                    }
                    warn!("HTTP {} from {}, retrying", status, url);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(ExtractError::NetworkRequest(url, e));
                    }
                    warn!("Request to {} failed, retrying: {}", url, e);
                }
            }
            tokio::time::sleep(self.retry_delay(attempt)).await;
            attempt += 1;
        }
    }

    async fn read_body(response: Response, url: &str) -> Result<Vec<u8>, ExtractError> {
        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .await
            .map_err(|e| ExtractError::BodyRead(url.to_string(), e))?;
        debug!("Read {} bytes from {}", body.len(), url);
        Ok(body)
    }

    /// Hex SHA-256 of the endpoint and every query pair, so extractors that differ in any
    /// request parameter never share a cache entry.
    fn request_key(&self, start: NaiveDate, end: NaiveDate) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.base_url.as_bytes());
        for (name, value) in self.query(start, end) {
            hasher.update(b"\n");
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub(crate) async fn cache_path(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PathBuf, ExtractError> {
        let dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => get_cache_dir().map_err(ExtractError::CacheDirResolution)?,
        };
        ensure_cache_dir_exists(&dir)
            .await
            .map_err(|e| ExtractError::CacheDirCreation(dir.clone(), e))?;
        let key = self.request_key(start, end);
        Ok(dir.join(format!(
            "forecast_{}_{}_{}.json",
            start,
            end,
            &key[..16]
        )))
    }

    async fn read_fresh_cache(&self, path: &Path) -> Option<Vec<u8>> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        let age = metadata.modified().ok()?.elapsed().ok()?;
        if age >= self.cache_ttl {
            debug!("Cached forecast {:?} is stale ({:?} old)", path, age);
            return None;
        }
        tokio::fs::read(path).await.ok()
    }

    async fn write_cache(body: Vec<u8>, path: PathBuf) -> Result<(), ExtractError> {
        tokio::task::spawn_blocking(move || {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let mut file = NamedTempFile::new_in(dir)
                .map_err(|e| ExtractError::CacheWrite(path.clone(), e))?;
            file.write_all(&body)
                .map_err(|e| ExtractError::CacheWrite(path.clone(), e))?;
            file.persist(&path)
                .map_err(|e| ExtractError::CacheWrite(path.clone(), e.error))?;
            debug!("Cached forecast body at {:?}", path);
            Ok::<(), ExtractError>(())
        })
        .await??;
        Ok(())
    }
}
