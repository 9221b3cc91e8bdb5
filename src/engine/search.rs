use std::time::Instant;

use tracing::debug;

use crate::model::*;
use crate::observability::{
    CANDIDATES_EVALUATED_TOTAL, CANDIDATES_REJECTED_TOTAL, SEARCH_DURATION_SECONDS, SEARCH_RESULTS,
};
use crate::store::{ReservationProvider, ResourceProvider, StoreError};

use super::availability::available_capacity;
use super::hours::is_open_for_window;
use super::proximity::{distance_km, within_radius};

/// Why a candidate was dropped. Used as the metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Closed,
    OutOfRadius,
    InsufficientCapacity,
}

impl Rejection {
    pub fn label(self) -> &'static str {
        match self {
            Rejection::Closed => "closed",
            Rejection::OutOfRadius => "out_of_radius",
            Rejection::InsufficientCapacity => "insufficient_capacity",
        }
    }
}

/// Rank every candidate that can take `request.bag_count` bags for the whole window,
/// nearest first (ties by stashpoint id).
///
/// `request` must already be validated. Provider errors are returned unchanged and no
/// partial result is produced.
pub async fn search(
    request: &SearchRequest,
    resources: &dyn ResourceProvider,
    reservations: &dyn ReservationProvider,
) -> Result<Vec<SearchResult>, StoreError> {
    debug_assert!(request.pickup > request.dropoff);
    debug_assert!(request.bag_count > 0);

    let started = Instant::now();
    let window = request.window();
    let dropoff_tod = request.dropoff_time_of_day();
    let pickup_tod = request.pickup_time_of_day();

    let candidates = resources.list_candidates().await?;
    metrics::counter!(CANDIDATES_EVALUATED_TOTAL).increment(candidates.len() as u64);

    let mut results = Vec::new();
    for stashpoint in candidates {
        if !is_open_for_window(stashpoint.open_from, stashpoint.open_until, dropoff_tod, pickup_tod) {
            reject(&stashpoint, Rejection::Closed);
            continue;
        }

        let distance = distance_km(request.point, stashpoint.point());
        if !within_radius(distance, request.radius_km) {
            reject(&stashpoint, Rejection::OutOfRadius);
            continue;
        }

        let overlapping = reservations
            .overlapping_reservations(stashpoint.id, window)
            .await?;
        let available = available_capacity(stashpoint.capacity, &window, &overlapping);
        if request.bag_count > available {
            reject(&stashpoint, Rejection::InsufficientCapacity);
            continue;
        }

        results.push(SearchResult {
            stashpoint,
            distance_km: distance,
            available_capacity: available,
        });
    }

    results.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.stashpoint.id.cmp(&b.stashpoint.id))
    });

    metrics::histogram!(SEARCH_RESULTS).record(results.len() as f64);
    metrics::histogram!(SEARCH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    Ok(results)
}

fn reject(stashpoint: &Stashpoint, reason: Rejection) {
    debug!(stashpoint = %stashpoint.id, reason = reason.label(), "candidate rejected");
    metrics::counter!(CANDIDATES_REJECTED_TOTAL, "reason" => reason.label()).increment(1);
}
