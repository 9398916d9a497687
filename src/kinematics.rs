//! Per-point kinematic annotation.
//!
//! Attaches displacement and heading to every breadcrumb of a ride in one
//! forward pass.

use crate::geo_utils::{haversine_distance, initial_bearing};
use crate::{AnnotatedPoint, MetricsConfig, RawPoint, RideError};

/// Annotate a ride with displacement and heading.
///
/// - The first point has zero displacement and no heading.
/// - Every later point carries its great-circle distance from the previous point.
/// - Heading is recomputed only when that displacement exceeds
///   `config.movement_threshold_m`; otherwise the previous heading (possibly
///   still `None`) carries forward.
///
/// # Errors
///
/// Returns [`RideError::InvalidCoordinate`] if any point has an invalid coordinate.
pub fn annotate(
    points: &[RawPoint],
    config: &MetricsConfig,
) -> Result<Vec<AnnotatedPoint>, RideError> {
    let mut annotated: Vec<AnnotatedPoint> = Vec::with_capacity(points.len());
    let mut heading: Option<f64> = None;

    for (i, point) in points.iter().enumerate() {
        let displacement_m = if i == 0 {
            // Validate the lone first point too
            haversine_distance(&point.position(), &point.position())?
        } else {
            let prev = points[i - 1].position();
            let current = point.position();
            let displacement = haversine_distance(&prev, &current)?;
            if displacement > config.movement_threshold_m {
                heading = Some(initial_bearing(&prev, &current));
            }
            displacement
        };

        annotated.push(AnnotatedPoint {
            point: point.clone(),
            displacement_m,
            heading_deg: heading,
        });
    }

    Ok(annotated)
}
