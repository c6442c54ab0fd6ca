//! Google Routes API v2 adapter.
//!
//! Translates route-computation requests into HTTP calls with fail-fast
//! validation, classified errors and retry/backoff. The planner consumes it
//! through the [`RouteOptimizer`] trait.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{RoutesError, RoutesErrorKind};
use crate::external::retry::RetryPolicy;
use crate::models::booking::GeoPoint;
use crate::traits::RouteOptimizer;

const ROUTES_COMPUTE_PATH: &str = "/directions/v2:computeRoutes";
const ROUTE_MATRIX_PATH: &str = "/distanceMatrix/v2:computeRouteMatrix";

const ROUTES_FIELD_MASK: &str = "routes.duration,routes.distanceMeters,routes.polyline.encodedPolyline,routes.legs,routes.optimizedIntermediateWaypointIndex";
const ROUTE_MATRIX_FIELD_MASK: &str =
    "originIndex,destinationIndex,status,condition,distanceMeters,duration";

/// The Routes API rejects requests with more intermediates than this.
pub const MAX_INTERMEDIATE_WAYPOINTS: usize = 25;

#[derive(Debug, Clone)]
pub struct RoutesConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://routes.googleapis.com".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1_000),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_lng: Option<LatLng>,
}

/// A routing location given as coordinates, a place id or a free-text
/// address. At least one representation must be present to be valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Waypoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_stopover: Option<bool>,
}

impl Waypoint {
    pub fn from_geo(point: GeoPoint) -> Self {
        Self {
            location: Some(Location {
                lat_lng: Some(LatLng {
                    latitude: point.lat,
                    longitude: point.lng,
                }),
            }),
            ..Self::default()
        }
    }

    pub fn from_place(place_id: impl Into<String>) -> Self {
        Self {
            place_id: Some(place_id.into()),
            ..Self::default()
        }
    }

    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn with_stopover(mut self) -> Self {
        self.vehicle_stopover = Some(true);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    Drive,
    Walk,
    Bicycle,
    TwoWheeler,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingPreference {
    TrafficUnaware,
    TrafficAware,
    TrafficAwareOptimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Units {
    Metric,
    Imperial,
}

/// Serialized as-is into the request body; absent options are omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputeRoutesInput {
    pub origin: Waypoint,
    pub destination: Waypoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intermediates: Vec<Waypoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_mode: Option<TravelMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_preference: Option<RoutingPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize_waypoint_order: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_alternative_routes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Polyline {
    pub encoded_polyline: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteLeg {
    pub distance_meters: Option<i64>,
    pub duration: Option<String>,
    pub polyline: Option<Polyline>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedRoute {
    pub legs: Vec<RouteLeg>,
    pub distance_meters: Option<i64>,
    /// Total travel time encoded as `"<seconds>s"`.
    pub duration: Option<String>,
    pub polyline: Option<Polyline>,
    /// Permutation of the intermediates chosen by the optimizer.
    pub optimized_intermediate_waypoint_index: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputeRoutesResponse {
    pub routes: Vec<ComputedRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatrixOrigin {
    pub waypoint: Waypoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatrixDestination {
    pub waypoint: Waypoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputeRouteMatrixInput {
    pub origins: Vec<RouteMatrixOrigin>,
    pub destinations: Vec<RouteMatrixDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_mode: Option<TravelMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_preference: Option<RoutingPreference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteMatrixElement {
    pub origin_index: Option<usize>,
    pub destination_index: Option<usize>,
    pub condition: Option<String>,
    pub distance_meters: Option<i64>,
    pub duration: Option<String>,
}

/// One request in a rate-limited batch, identified by a caller-chosen id.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub request_id: String,
    pub input: ComputeRoutesInput,
}

#[derive(Debug)]
pub struct BatchItemResult {
    pub request_id: String,
    pub result: Result<ComputeRoutesResponse, RoutesError>,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub concurrency: usize,
    pub delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            delay: Duration::from_millis(200),
        }
    }
}

/// Parses a `"<seconds>s"` duration as returned by the Routes API.
pub fn parse_duration_seconds(raw: &str) -> Option<i64> {
    raw.strip_suffix('s')?.parse().ok()
}

fn classify_status(status: u16, message: Option<String>) -> RoutesError {
    match status {
        400 => RoutesError::new(
            RoutesErrorKind::InvalidRequest,
            message.unwrap_or_else(|| "invalid request to routing api".to_string()),
        ),
        403 => RoutesError::new(
            RoutesErrorKind::RequestDenied,
            message.unwrap_or_else(|| "routing api request was denied".to_string()),
        ),
        404 => RoutesError::new(
            RoutesErrorKind::ZeroResults,
            "no routes found for the provided waypoints",
        ),
        429 => RoutesError::retryable(RoutesErrorKind::QuotaExceeded, "routing api quota exceeded"),
        500 | 502 | 503 => RoutesError::retryable(
            RoutesErrorKind::ApiError,
            message.unwrap_or_else(|| "routing api service error".to_string()),
        ),
        504 => RoutesError::retryable(RoutesErrorKind::Timeout, "routing api request timed out"),
        other => RoutesError::retryable(
            RoutesErrorKind::ApiError,
            message.unwrap_or_else(|| format!("unexpected status {other} from routing api")),
        ),
    }
}

fn validate_waypoint(waypoint: &Waypoint, label: &str) -> Result<(), RoutesError> {
    let lat_lng = waypoint.location.as_ref().and_then(|loc| loc.lat_lng);
    let has_form =
        lat_lng.is_some() || waypoint.place_id.is_some() || waypoint.address.is_some();

    if !has_form {
        return Err(RoutesError::new(
            RoutesErrorKind::InvalidWaypoint,
            format!("{label} must have a latLng, placeId or address"),
        ));
    }

    if let Some(LatLng {
        latitude,
        longitude,
    }) = lat_lng
    {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(RoutesError::new(
                RoutesErrorKind::InvalidWaypoint,
                format!("{label} coordinates must be finite numbers"),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(RoutesError::new(
                RoutesErrorKind::InvalidWaypoint,
                format!("{label} latitude must be between -90 and 90"),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(RoutesError::new(
                RoutesErrorKind::InvalidWaypoint,
                format!("{label} longitude must be between -180 and 180"),
            ));
        }
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: Option<String>,
}

fn provider_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ProviderErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|detail| detail.message)
}

fn map_transport_error(err: reqwest::Error) -> RoutesError {
    if err.is_timeout() {
        RoutesError::retryable(RoutesErrorKind::Timeout, "routing api request timed out")
    } else {
        RoutesError::retryable(RoutesErrorKind::NetworkError, err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GoogleRoutesClient {
    config: RoutesConfig,
    http: reqwest::Client,
}

impl GoogleRoutesClient {
    pub fn new(config: RoutesConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http })
    }

    fn validate_api_key(&self) -> Result<(), RoutesError> {
        if self.config.api_key.trim().is_empty() {
            return Err(RoutesError::new(
                RoutesErrorKind::MissingApiKey,
                "routing api key is not configured",
            ));
        }
        Ok(())
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.max_retries,
            base_delay: self.config.retry_base_delay,
        }
    }

    async fn send_once<T>(
        &self,
        url: &str,
        field_mask: &str,
        body: &impl Serialize,
        attempt: u32,
    ) -> Result<T, RoutesError>
    where
        T: DeserializeOwned,
    {
        debug!(attempt, url, "sending routing api request");

        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .header("X-Goog-Api-Key", &self.config.api_key)
            .header("X-Goog-FieldMask", field_mask)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_transport_error)?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, provider_error_message(&bytes)));
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            RoutesError::new(
                RoutesErrorKind::ApiError,
                format!("failed to decode routing api response: {err}"),
            )
        })
    }

    pub async fn compute_routes(
        &self,
        input: &ComputeRoutesInput,
    ) -> Result<ComputeRoutesResponse, RoutesError> {
        self.validate_api_key()?;
        validate_waypoint(&input.origin, "origin")?;
        validate_waypoint(&input.destination, "destination")?;
        for (idx, waypoint) in input.intermediates.iter().enumerate() {
            validate_waypoint(waypoint, &format!("intermediate waypoint {}", idx + 1))?;
        }
        if input.intermediates.len() > MAX_INTERMEDIATE_WAYPOINTS {
            return Err(RoutesError::new(
                RoutesErrorKind::MaxWaypointsExceeded,
                format!("at most {MAX_INTERMEDIATE_WAYPOINTS} intermediate waypoints allowed"),
            ));
        }

        let url = format!("{}{}", self.config.base_url, ROUTES_COMPUTE_PATH);
        let response: ComputeRoutesResponse = self
            .retry_policy()
            .run(|attempt| self.send_once(&url, ROUTES_FIELD_MASK, input, attempt))
            .await?;

        if response.routes.is_empty() {
            warn!("routing api returned no routes");
            return Err(RoutesError::new(
                RoutesErrorKind::ZeroResults,
                "no routes found for the provided waypoints",
            ));
        }

        info!(
            route_count = response.routes.len(),
            distance_meters = response.routes[0].distance_meters,
            "routes computed"
        );
        Ok(response)
    }

    pub async fn compute_route_matrix(
        &self,
        input: &ComputeRouteMatrixInput,
    ) -> Result<Vec<RouteMatrixElement>, RoutesError> {
        self.validate_api_key()?;

        if input.origins.is_empty() {
            return Err(RoutesError::new(
                RoutesErrorKind::InvalidRequest,
                "at least one origin is required",
            ));
        }
        if input.destinations.is_empty() {
            return Err(RoutesError::new(
                RoutesErrorKind::InvalidRequest,
                "at least one destination is required",
            ));
        }
        for (idx, origin) in input.origins.iter().enumerate() {
            validate_waypoint(&origin.waypoint, &format!("origin {}", idx + 1))?;
        }
        for (idx, destination) in input.destinations.iter().enumerate() {
            validate_waypoint(&destination.waypoint, &format!("destination {}", idx + 1))?;
        }

        let url = format!("{}{}", self.config.base_url, ROUTE_MATRIX_PATH);
        let elements: Vec<RouteMatrixElement> = self
            .retry_policy()
            .run(|attempt| self.send_once(&url, ROUTE_MATRIX_FIELD_MASK, input, attempt))
            .await?;

        info!(element_count = elements.len(), "route matrix computed");
        Ok(elements)
    }

    /// Processes `items` in fixed-size concurrent windows with a delay
    /// between windows to respect provider rate limits. Item failures are
    /// collected inline; the batch call itself never fails.
    pub async fn batch_compute_routes(
        &self,
        items: &[BatchItem],
        options: BatchOptions,
    ) -> Vec<BatchItemResult> {
        info!(count = items.len(), "batch computing routes");

        let concurrency = options.concurrency.max(1);
        let mut results = Vec::with_capacity(items.len());

        for window in items.chunks(concurrency) {
            let window_results =
                futures::future::join_all(window.iter().map(|item| async move {
                    BatchItemResult {
                        request_id: item.request_id.clone(),
                        result: self.compute_routes(&item.input).await,
                    }
                }))
                .await;
            results.extend(window_results);

            if results.len() < items.len() {
                sleep(options.delay).await;
            }
        }

        let successful = results.iter().filter(|r| r.result.is_ok()).count();
        info!(
            total = items.len(),
            successful,
            failed = items.len() - successful,
            "batch route computation complete"
        );
        results
    }
}

#[async_trait]
impl RouteOptimizer for GoogleRoutesClient {
    async fn compute_routes(
        &self,
        input: &ComputeRoutesInput,
    ) -> Result<ComputeRoutesResponse, RoutesError> {
        GoogleRoutesClient::compute_routes(self, input).await
    }
}
