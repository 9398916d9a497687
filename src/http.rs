//! HTTP client for a Google-Directions-compatible routing API.
//!
//! This module provides the production [`RouteProvider`]:
//! - Connection pooling through a shared `reqwest` client
//! - A private tokio runtime so the synchronous pipeline can block on requests
//! - A per-request timeout from [`DirectionsConfig`]
//!
//! No retries are attempted; a failed lookup is reported as
//! [`RideError::RouteUnavailable`] and retry policy is left to the caller.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use tokio::runtime::{Builder, Runtime};

use crate::{GpsPoint, OptimalRoute, RideError, RouteProvider};

/// Environment variable holding the directions API key.
pub const API_KEY_ENV: &str = "DIRECTIONS_API_KEY";

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// Connection settings for the directions service.
#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    pub api_key: String,
    /// Endpoint URL. Default: Google Directions JSON endpoint
    pub base_url: String,
    /// Travel mode passed to the service. Default: "walking"
    pub mode: String,
    /// Whole-request timeout in seconds. Default: 30
    pub timeout_secs: u64,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            mode: "walking".to_string(),
            timeout_secs: 30,
        }
    }
}

impl DirectionsConfig {
    /// Default configuration with the API key taken from [`API_KEY_ENV`].
    ///
    /// Returns `None` if the variable is unset or empty.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())?;
        Some(Self {
            api_key,
            ..Self::default()
        })
    }
}

/// API response for the directions endpoint
#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    duration: ApiValue,
    distance: ApiValue,
}

#[derive(Debug, Deserialize)]
struct ApiValue {
    value: u32,
}

/// Decode a directions reply into the first leg of the first route.
fn parse_directions(body: &[u8]) -> Result<OptimalRoute, RideError> {
    let data: DirectionsResponse = serde_json::from_slice(body)
        .map_err(|e| RideError::RouteUnavailable(format!("JSON parse error: {}", e)))?;

    if data.status != "OK" {
        let detail = data.error_message.unwrap_or_default();
        return Err(RideError::RouteUnavailable(
            format!("directions status {} {}", data.status, detail).trim_end().to_string(),
        ));
    }

    let leg = data
        .routes
        .first()
        .and_then(|r| r.legs.first())
        .ok_or_else(|| RideError::RouteUnavailable("no route in response".to_string()))?;

    Ok(OptimalRoute {
        duration_s: leg.duration.value,
        distance_m: leg.distance.value,
    })
}

/// Format a coordinate the way the directions API expects ("lat,lng").
fn format_location(p: &GpsPoint) -> String {
    format!("{},{}", p.latitude, p.longitude)
}

/// Blocking directions client.
pub struct DirectionsClient {
    client: Client,
    runtime: Runtime,
    config: DirectionsConfig,
}

impl DirectionsClient {
    /// Create a new client for the given configuration.
    pub fn new(config: DirectionsConfig) -> Result<Self, RideError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RideError::RouteUnavailable(format!("Failed to create HTTP client: {}", e)))?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| RideError::RouteUnavailable(format!("Runtime error: {}", e)))?;

        info!(
            "[DirectionsClient] Using {} (mode: {}, timeout: {}s)",
            config.base_url, config.mode, config.timeout_secs
        );

        Ok(Self { client, runtime, config })
    }

    /// Look up the optimal route asynchronously.
    pub async fn fetch_route(&self, start: GpsPoint, end: GpsPoint) -> Result<OptimalRoute, RideError> {
        let req_start = Instant::now();
        let origin = format_location(&start);
        let destination = format_location(&end);

        // Phase 1: Send request, receive headers
        let resp = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("origin", origin.as_str()),
                ("destination", destination.as_str()),
                ("mode", self.config.mode.as_str()),
                ("departure_time", "now"),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("[Directions {} -> {}] Request error: {}", origin, destination, e);
                RideError::RouteUnavailable(format!("Request error: {}", e))
            })?;

        let headers_elapsed = req_start.elapsed();
        let status = resp.status();
        if !status.is_success() {
            warn!("[Directions {} -> {}] HTTP {}", origin, destination, status);
            return Err(RideError::RouteUnavailable(format!("HTTP {}", status)));
        }

        // Phase 2: Download response body
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| RideError::RouteUnavailable(format!("Body download error: {}", e)))?;

        // Phase 3: JSON deserialization
        let route = parse_directions(&bytes)?;

        debug!(
            "[Directions {} -> {}] headers={:?} total={:?} {}s/{}m",
            origin,
            destination,
            headers_elapsed,
            req_start.elapsed(),
            route.duration_s,
            route.distance_m
        );

        Ok(route)
    }
}

impl RouteProvider for DirectionsClient {
    fn optimal_route(&self, start: GpsPoint, end: GpsPoint) -> Result<OptimalRoute, RideError> {
        self.runtime.block_on(self.fetch_route(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directions_ok() {
        let body = br#"{
            "status": "OK",
            "routes": [
                {"legs": [{"duration": {"value": 754, "text": "13 mins"},
                           "distance": {"value": 2310, "text": "2.3 km"}}]}
            ]
        }"#;
        let route = parse_directions(body).unwrap();
        assert_eq!(route, OptimalRoute { duration_s: 754, distance_m: 2310 });
    }

    #[test]
    fn test_parse_directions_bad_status() {
        let body = br#"{"status": "REQUEST_DENIED", "error_message": "bad key", "routes": []}"#;
        match parse_directions(body) {
            Err(RideError::RouteUnavailable(msg)) => {
                assert!(msg.contains("REQUEST_DENIED"));
                assert!(msg.contains("bad key"));
            }
            other => panic!("expected RouteUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_directions_no_routes() {
        let body = br#"{"status": "OK", "routes": []}"#;
        assert!(matches!(parse_directions(body), Err(RideError::RouteUnavailable(_))));
    }

    #[test]
    fn test_parse_directions_garbage() {
        assert!(matches!(
            parse_directions(b"<html>"),
            Err(RideError::RouteUnavailable(_))
        ));
    }

    #[test]
    fn test_format_location() {
        assert_eq!(format_location(&GpsPoint::new(40.5, -73.25)), "40.5,-73.25");
    }

    #[test]
    fn test_default_config() {
        let config = DirectionsConfig::default();
        assert_eq!(config.mode, "walking");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.base_url.starts_with("https://"));
    }
}
