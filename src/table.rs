//! Flat feature table handed to the storage collaborator.
//!
//! Column names follow the feature table consumed by the clustering model.

use crate::EnrichedMetrics;

/// One row of the ride feature table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsRecord {
    pub route_id: String,
    pub opt_dist: f64,
    pub actu_dist: f64,
    pub opt_time: f64,
    pub actu_time: f64,
    pub dwell_time: f64,
    pub todest_time: f64,
    pub inride_time: f64,
    pub num_stops: i32,
    pub stops_bool: u8,
    pub dist_ratio: f64,
    pub time_ratio: f64,
    pub dwell_ratio: f64,
    pub todest_ratio: f64,
    pub inride_mph: f64,
}

impl From<&EnrichedMetrics> for MetricsRecord {
    fn from(m: &EnrichedMetrics) -> Self {
        Self {
            route_id: m.trip.route_id.clone(),
            opt_dist: m.optimal_distance_m,
            actu_dist: m.trip.actual_distance_m,
            opt_time: m.optimal_time_s,
            actu_time: m.trip.actual_time_s,
            dwell_time: m.trip.dwell_time_s,
            todest_time: m.trip.toward_destination_time_s,
            inride_time: m.trip.in_ride_time_s,
            num_stops: m.trip.stop_count,
            stops_bool: m.stops_bool,
            dist_ratio: m.dist_ratio,
            time_ratio: m.time_ratio,
            dwell_ratio: m.dwell_ratio,
            todest_ratio: m.todest_ratio,
            inride_mph: m.inride_speed_mph,
        }
    }
}
