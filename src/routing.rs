//! Optimal-route lookup.
//!
//! The pipeline asks a [`RouteProvider`] for the fastest route between the start
//! and end of each ride. Providers are injected so the lookup can be an HTTP
//! service in production and a closure in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use crate::{GpsPoint, RideError};

/// Fastest route between two points, as reported by a routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimalRoute {
    /// Estimated travel time in seconds
    pub duration_s: u32,
    /// Route length in meters
    pub distance_m: u32,
}

/// Capability to look up the optimal route between two coordinates.
///
/// Implementations must report failures as [`RideError::RouteUnavailable`]
/// instead of falling back to a default route.
pub trait RouteProvider: Send + Sync {
    fn optimal_route(&self, start: GpsPoint, end: GpsPoint) -> Result<OptimalRoute, RideError>;
}

impl<F> RouteProvider for F
where
    F: Fn(GpsPoint, GpsPoint) -> Result<OptimalRoute, RideError> + Send + Sync,
{
    fn optimal_route(&self, start: GpsPoint, end: GpsPoint) -> Result<OptimalRoute, RideError> {
        self(start, end)
    }
}

/// Exact-coordinate cache key.
type EndpointKey = [u64; 4];

fn endpoint_key(start: &GpsPoint, end: &GpsPoint) -> EndpointKey {
    [
        start.latitude.to_bits(),
        start.longitude.to_bits(),
        end.latitude.to_bits(),
        end.longitude.to_bits(),
    ]
}

/// Memoising wrapper around another provider.
///
/// Lookups are keyed by the exact (start, end) pair. Only successful lookups
/// are cached, so a transient failure can succeed on a later call.
pub struct CachedRouteProvider<P> {
    inner: P,
    cache: Mutex<HashMap<EndpointKey, OptimalRoute>>,
}

impl<P: RouteProvider> CachedRouteProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached routes.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: RouteProvider> RouteProvider for CachedRouteProvider<P> {
    fn optimal_route(&self, start: GpsPoint, end: GpsPoint) -> Result<OptimalRoute, RideError> {
        let key = endpoint_key(&start, &end);

        if let Ok(cache) = self.cache.lock() {
            if let Some(route) = cache.get(&key) {
                debug!("[RouteCache] hit for {:?} -> {:?}", start, end);
                return Ok(*route);
            }
        }

        // Lock is released during the lookup; concurrent misses may both query
        let route = self.inner.optimal_route(start, end)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, route);
        }

        Ok(route)
    }
}
