//! # Trip Segmentation
//!
//! Single-pass state machine that turns an annotated ride into aggregate
//! [`TripMetrics`].
//!
//! ## States
//!
//! The rider is either *in ride* or *stopped*. The pass starts stopped and:
//!
//! | Transition | Condition (T = stationary threshold) |
//! |------------|--------------------------------------|
//! | stop | current and previous displacement `< T` while in ride |
//! | resume | current and previous displacement `>= T` while stopped |
//!
//! Alongside the transitions, every sample is classified:
//!
//! - **dwell** when its displacement is `<= T`
//! - **toward destination** when it moved more than the movement threshold,
//!   has a heading, and makes progress according to [`ProgressMode`]
//!
//! A ride that finishes stopped has one stop too many (the final halt is the
//! end of the ride, not a stop), so the count is corrected once the pass ends.

use log::debug;

use crate::geo_utils::{destination_ahead, haversine_distance};
use crate::{AnnotatedPoint, GpsPoint, MetricsConfig, ProgressMode, RideError, TripMetrics};

/// Previous-displacement value before the first sample.
///
/// Large enough that the first sample can never complete a stop.
const DISPLACEMENT_SENTINEL: f64 = 1e10;

/// Running state of the segmentation pass.
///
/// Counters are in samples; they are converted to seconds by
/// [`SegmentState::into_metrics`].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentState {
    pub in_ride: bool,
    pub prev_displacement: f64,
    pub prev_crowflies: f64,
    pub actual_distance: f64,
    pub stop_count: i32,
    pub dwell_samples: u32,
    pub toward_destination_samples: u32,
}

impl Default for SegmentState {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentState {
    pub fn new() -> Self {
        Self {
            in_ride: false,
            prev_displacement: DISPLACEMENT_SENTINEL,
            prev_crowflies: 0.0,
            actual_distance: 0.0,
            stop_count: 0,
            dwell_samples: 0,
            toward_destination_samples: 0,
        }
    }

    /// Stopped after two consecutive stationary samples while riding.
    /// Returns `true` when the transition fired.
    pub fn detect_stop(&mut self, displacement: f64, threshold: f64) -> bool {
        if displacement < threshold && self.prev_displacement < threshold && self.in_ride {
            self.stop_count += 1;
            self.in_ride = false;
            return true;
        }
        false
    }

    /// Riding again after two consecutive moving samples while stopped.
    /// Returns `true` when the transition fired.
    pub fn detect_resume(&mut self, displacement: f64, threshold: f64) -> bool {
        if displacement >= threshold && self.prev_displacement >= threshold && !self.in_ride {
            self.in_ride = true;
            return true;
        }
        false
    }

    pub fn accumulate_dwell(&mut self, displacement: f64, threshold: f64) {
        if displacement <= threshold {
            self.dwell_samples += 1;
        }
    }

    pub fn accumulate_progress(&mut self, progressing: bool) {
        if progressing {
            self.toward_destination_samples += 1;
        }
    }

    /// Drop the stop recorded by the final halt of a ride that ends stopped.
    pub fn correct_boundary(&mut self) {
        if !self.in_ride {
            self.stop_count -= 1;
        }
    }

    /// Convert sample counters into durations.
    ///
    /// `last_sequence_index` is the sequence index of the last point in the ride.
    pub fn into_metrics(
        self,
        route_id: &str,
        last_sequence_index: u32,
        config: &MetricsConfig,
    ) -> TripMetrics {
        let interval = config.sample_interval_s;
        let actual_time_s = last_sequence_index as f64 * interval;
        let dwell_time_s = self.dwell_samples as f64 * interval;
        let stop_count = if config.clamp_stop_count {
            self.stop_count.max(0)
        } else {
            self.stop_count
        };

        TripMetrics {
            route_id: route_id.to_string(),
            actual_distance_m: self.actual_distance,
            actual_time_s,
            dwell_time_s,
            toward_destination_time_s: self.toward_destination_samples as f64 * interval,
            in_ride_time_s: actual_time_s - dwell_time_s,
            stop_count,
        }
    }
}

/// Run the segmentation pass over an annotated ride.
///
/// The first point only fixes the start location; every later point is fed
/// through the state machine in order.
///
/// # Errors
///
/// - [`RideError::InsufficientData`] if the ride has fewer than 2 points
/// - [`RideError::InvalidCoordinate`] if a crow-flies distance cannot be computed
///
/// # Example
///
/// ```rust
/// use ride_metrics::{MetricsConfig, RawPoint, annotate, segment};
///
/// let points: Vec<RawPoint> = (0..5)
///     .map(|i| RawPoint::new(40.0 + i as f64 * 0.001, -73.0, i, "bike"))
///     .collect();
///
/// let config = MetricsConfig::default();
/// let annotated = annotate(&points, &config).unwrap();
/// let trip = segment("route-1", &annotated, &config).unwrap();
///
/// assert_eq!(trip.stop_count, 0);
/// assert_eq!(trip.actual_time_s, 60.0);
/// assert_eq!(trip.dwell_time_s, 0.0);
/// ```
pub fn segment(
    route_id: &str,
    points: &[AnnotatedPoint],
    config: &MetricsConfig,
) -> Result<TripMetrics, RideError> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => (first, last),
        _ => return Err(RideError::InsufficientData { points: points.len() }),
    };

    let start = first.point.position();
    let end = last.point.position();
    let stationary = config.stationary_threshold_m;
    let mut state = SegmentState::new();

    for (i, point) in points.iter().enumerate().skip(1) {
        let displacement = point.displacement_m;
        state.actual_distance += displacement;

        if state.detect_stop(displacement, stationary) {
            debug!("[Segment {}] stop #{} at point {}", route_id, state.stop_count, i);
        }
        if state.detect_resume(displacement, stationary) {
            debug!("[Segment {}] resumed at point {}", route_id, i);
        }
        state.accumulate_dwell(displacement, stationary);

        let crowflies = match config.progress_mode {
            ProgressMode::CrowFlies => Some(haversine_distance(&start, &point.point.position())?),
            ProgressMode::HalfPlane => None,
        };

        let moving = displacement > config.movement_threshold_m;
        let progressing = match (point.heading_deg, crowflies) {
            (Some(_), Some(crowflies)) if moving => crowflies >= state.prev_crowflies,
            (Some(heading), None) if moving => {
                destination_ahead(heading, &point.point.position(), &end)
            }
            _ => false,
        };
        state.accumulate_progress(progressing);

        state.prev_displacement = displacement;
        if let Some(crowflies) = crowflies {
            state.prev_crowflies = crowflies;
        }
    }

    state.correct_boundary();

    debug!(
        "[Segment {}] {} points: {:.0}m, {} stops (raw), {} dwell samples, {} progress samples",
        route_id,
        points.len(),
        state.actual_distance,
        state.stop_count,
        state.dwell_samples,
        state.toward_destination_samples
    );

    Ok(state.into_metrics(route_id, last.point.sequence_index, config))
}

/// Start and end coordinates of a ride, used for the optimal-route lookup.
pub(crate) fn endpoints(points: &[AnnotatedPoint]) -> Option<(GpsPoint, GpsPoint)> {
    Some((points.first()?.point.position(), points.last()?.point.position()))
}
