//! # Ride Metrics
//!
//! Trip segmentation and behavioral feature extraction from GPS ride traces.
//!
//! This library provides:
//! - Removal of trailing "bad lock" breadcrumbs
//! - Per-point displacement and heading annotation
//! - A single-pass stop/resume/dwell/progress state machine per ride
//! - Enrichment with an optimal route from a pluggable routing service
//! - Batch processing that isolates per-ride failures
//!
//! ## Features
//!
//! - **`parallel`** - Process rides in parallel with rayon
//! - **`http`** - HTTP directions client implementing [`RouteProvider`]
//! - **`serde`** - Serialize feature table records
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use ride_metrics::{GpsPoint, MetricsConfig, OptimalRoute, RawPoint, RideError, Ride, process_ride};
//!
//! // ~111m between breadcrumbs, 15s apart
//! let points: Vec<RawPoint> = (0..6)
//!     .map(|i| RawPoint::new(40.0 + i as f64 * 0.001, -73.0, i, "bike"))
//!     .collect();
//! let ride = Ride::new("route-1", points);
//!
//! // Any closure can stand in for the routing service
//! let router = |_start: GpsPoint, _end: GpsPoint| -> Result<OptimalRoute, RideError> {
//!     Ok(OptimalRoute { duration_s: 60, distance_m: 500 })
//! };
//!
//! let metrics = process_ride(&ride, &router, &MetricsConfig::default()).unwrap();
//! println!("{} stops, {:.1} mph in ride", metrics.trip.stop_count, metrics.inride_speed_mph);
//! ```

use log::{info, warn};
use thiserror::Error;

pub mod geo_utils;

// Bad-lock removal
pub mod cleaning;
pub use cleaning::strip_bad_locks;

// Displacement and heading annotation
pub mod kinematics;
pub use kinematics::annotate;

// Stop/resume/dwell/progress state machine
pub mod segmentation;
pub use segmentation::{segment, SegmentState};

// Ratios and final record
pub mod assembly;
pub use assembly::assemble;

// Routing collaborator
pub mod routing;
pub use routing::{CachedRouteProvider, OptimalRoute, RouteProvider};

// Feature table rows
pub mod table;
pub use table::MetricsRecord;

// HTTP module for directions lookup
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{DirectionsClient, DirectionsConfig};

// ============================================================================
// Errors
// ============================================================================

/// Per-ride failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RideError {
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("insufficient data: {points} point(s) after cleaning")]
    InsufficientData { points: usize },
    #[error("degenerate ride: {quantity} is zero")]
    DegenerateRide { quantity: &'static str },
    #[error("optimal route unavailable: {0}")]
    RouteUnavailable(String),
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use ride_metrics::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A single breadcrumb as delivered by the track parser.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Position in the ride; one unit is one sample interval
    pub sequence_index: u32,
    /// Point type tag from the source track
    pub point_type: String,
}

impl RawPoint {
    pub fn new(latitude: f64, longitude: f64, sequence_index: u32, point_type: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            sequence_index,
            point_type: point_type.into(),
        }
    }

    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// A breadcrumb with its motion relative to the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedPoint {
    pub point: RawPoint,
    /// Distance from the previous point in meters (0 for the first point)
    pub displacement_m: f64,
    /// Last known heading in degrees `[0, 360)`, `None` until the rider first moves
    pub heading_deg: Option<f64>,
}

/// All breadcrumbs of one ride, in sequence order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ride {
    pub route_id: String,
    pub points: Vec<RawPoint>,
}

impl Ride {
    pub fn new(route_id: impl Into<String>, points: Vec<RawPoint>) -> Self {
        Self {
            route_id: route_id.into(),
            points,
        }
    }
}

/// Aggregate metrics of one ride.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TripMetrics {
    pub route_id: String,
    /// Sum of point displacements in meters
    pub actual_distance_m: f64,
    pub actual_time_s: f64,
    /// Time spent at or below the stationary threshold
    pub dwell_time_s: f64,
    /// Time spent moving towards the destination
    pub toward_destination_time_s: f64,
    /// Actual time minus dwell time
    pub in_ride_time_s: f64,
    /// Mid-ride stops; may be -1 when clamping is disabled
    pub stop_count: i32,
}

/// Trip metrics with the optimal route and derived ratios.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnrichedMetrics {
    pub trip: TripMetrics,
    pub optimal_time_s: f64,
    pub optimal_distance_m: f64,
    /// 1 if the ride had any mid-ride stop, else 0
    pub stops_bool: u8,
    pub dist_ratio: f64,
    pub time_ratio: f64,
    pub dwell_ratio: f64,
    pub todest_ratio: f64,
    pub inride_speed_mph: f64,
}

/// How progress towards the destination is judged for a moving sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProgressMode {
    /// Crow-flies distance from the start did not decrease
    #[default]
    CrowFlies,
    /// The ride's end point lies ahead of the current heading
    HalfPlane,
}

/// Configuration for ride segmentation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsConfig {
    /// Displacement below which a sample counts as stationary.
    /// Used for bad-lock removal, stop/resume and dwell. Default: 30.0 meters
    pub stationary_threshold_m: f64,

    /// Displacement above which heading is recomputed and progress is counted.
    /// Default: 30.0 meters
    pub movement_threshold_m: f64,

    /// Time between consecutive breadcrumbs. Default: 15.0 seconds
    pub sample_interval_s: f64,

    /// Floor the stop count at zero after the end-of-ride correction.
    /// Default: true
    pub clamp_stop_count: bool,

    /// Progress-towards-destination heuristic. Default: crow-flies
    pub progress_mode: ProgressMode,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            stationary_threshold_m: 30.0,
            movement_threshold_m: 30.0,
            sample_interval_s: 15.0,
            clamp_stop_count: true,
            progress_mode: ProgressMode::CrowFlies,
        }
    }
}

/// A ride that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct RideFailure {
    pub route_id: String,
    pub error: RideError,
}

/// Outcome of a batch run: successful rides and collected failures, both sorted by route id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub metrics: Vec<EnrichedMetrics>,
    pub failures: Vec<RideFailure>,
}

impl BatchReport {
    /// Feature table rows for the successful rides.
    pub fn records(&self) -> Vec<MetricsRecord> {
        self.metrics.iter().map(MetricsRecord::from).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn from_results(results: Vec<(String, Result<EnrichedMetrics, RideError>)>) -> Self {
        let mut report = Self::default();
        for (route_id, result) in results {
            match result {
                Ok(metrics) => report.metrics.push(metrics),
                Err(error) => {
                    warn!("[RideMetrics] Ride {} failed: {}", route_id, error);
                    report.failures.push(RideFailure { route_id, error });
                }
            }
        }
        report.metrics.sort_by(|a, b| a.trip.route_id.cmp(&b.trip.route_id));
        report.failures.sort_by(|a, b| a.route_id.cmp(&b.route_id));
        report
    }
}

// ============================================================================
// Core Functions
// ============================================================================

/// Run the full pipeline for one ride.
///
/// Cleans, annotates and segments the ride, then looks up the optimal route
/// between the cleaned start and end points and derives the final ratios.
/// The routing service is only called for rides whose ratios can be computed.
///
/// # Errors
///
/// Any [`RideError`]; see the individual stages.
pub fn process_ride<P>(
    ride: &Ride,
    provider: &P,
    config: &MetricsConfig,
) -> Result<EnrichedMetrics, RideError>
where
    P: RouteProvider + ?Sized,
{
    let cleaned = strip_bad_locks(&ride.points, config)?;
    let annotated = annotate(cleaned, config)?;
    let trip = segment(&ride.route_id, &annotated, config)?;
    assembly::check_denominators(&trip)?;

    let (start, end) = segmentation::endpoints(&annotated)
        .ok_or(RideError::InsufficientData { points: annotated.len() })?;
    let route = provider.optimal_route(start, end)?;

    assemble(trip, route)
}

/// Process a batch of rides sequentially.
///
/// A failing ride never aborts the batch; its error is recorded in
/// [`BatchReport::failures`].
///
/// # Example
/// ```
/// use ride_metrics::{GpsPoint, MetricsConfig, OptimalRoute, RawPoint, Ride, RideError, process_rides};
///
/// let moving: Vec<RawPoint> = (0..4)
///     .map(|i| RawPoint::new(40.0 + i as f64 * 0.001, -73.0, i, "bike"))
///     .collect();
/// let parked = vec![RawPoint::new(40.0, -73.0, 0, "bike"); 3];
///
/// let rides = vec![Ride::new("a", moving), Ride::new("b", parked)];
/// let router = |_s: GpsPoint, _e: GpsPoint| -> Result<OptimalRoute, RideError> {
///     Ok(OptimalRoute { duration_s: 40, distance_m: 300 })
/// };
///
/// let report = process_rides(&rides, &router, &MetricsConfig::default());
/// assert_eq!(report.metrics.len(), 1);
/// assert_eq!(report.failures[0].route_id, "b");
/// ```
pub fn process_rides<P>(rides: &[Ride], provider: &P, config: &MetricsConfig) -> BatchReport
where
    P: RouteProvider + ?Sized,
{
    info!("[RideMetrics] Processing {} rides sequentially", rides.len());
    let start = std::time::Instant::now();

    let results = rides
        .iter()
        .map(|ride| (ride.route_id.clone(), process_ride(ride, provider, config)))
        .collect();
    let report = BatchReport::from_results(results);

    info!(
        "[RideMetrics] Done: {} ok, {} failed in {:?}",
        report.metrics.len(),
        report.failures.len(),
        start.elapsed()
    );
    report
}

/// Process a batch of rides using parallel processing.
///
/// Same as [`process_rides`] but rides are distributed over the rayon thread
/// pool. Each ride is still processed sequentially on one thread.
#[cfg(feature = "parallel")]
pub fn process_rides_parallel<P>(rides: &[Ride], provider: &P, config: &MetricsConfig) -> BatchReport
where
    P: RouteProvider + ?Sized,
{
    use rayon::prelude::*;

    info!("[RideMetrics] Processing {} rides in parallel", rides.len());
    let start = std::time::Instant::now();

    let results = rides
        .par_iter()
        .map(|ride| (ride.route_id.clone(), process_ride(ride, provider, config)))
        .collect();
    let report = BatchReport::from_results(results);

    info!(
        "[RideMetrics] Done: {} ok, {} failed in {:?}",
        report.metrics.len(),
        report.failures.len(),
        start.elapsed()
    );
    report
}

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use crate::geo_utils::EARTH_RADIUS_M;
    use crate::RawPoint;

    /// Build a ride travelling along the -73° meridian from 40°N.
    ///
    /// Each step moves that many meters north (negative: south), one sample apart.
    pub(crate) fn meridian_track(steps: &[f64]) -> Vec<RawPoint> {
        let meters_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        let mut latitude = 40.0;
        let mut points = vec![RawPoint::new(latitude, -73.0, 0, "bike")];
        for (i, step) in steps.iter().enumerate() {
            latitude += step / meters_per_degree;
            points.push(RawPoint::new(latitude, -73.0, i as u32 + 1, "bike"));
        }
        points
    }
}

// ============================================================================
// Tests
// ============================================================================
