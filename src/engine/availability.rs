use crate::model::*;

// ── Capacity Availability ─────────────────────────────────────────

/// Peak concurrent bag demand inside `window`.
///
/// Sweep line over `(+bag_count at dropoff, -bag_count at pickup)` events:
/// - events before `window.start` are moved to `window.start` (already active),
/// - events at or after `window.end` are dropped (never take effect inside),
/// - at equal instants releases apply before arrivals, so a reservation ending
///   exactly when another begins is not simultaneous occupancy.
///
/// Cancelled, non-overlapping and inverted reservations contribute nothing, so the
/// input may be pre-filtered by the store or not.
pub fn peak_demand(window: &Span, reservations: &[Reservation]) -> u64 {
    let mut events: Vec<(Ms, i64)> = Vec::with_capacity(reservations.len() * 2);
    for r in reservations {
        if !r.is_active() || r.bag_count == 0 {
            continue;
        }
        let Some(span) = r.span() else { continue };
        if !span.overlaps(window) {
            continue;
        }
        let bags = i64::from(r.bag_count);
        events.push((span.start.max(window.start), bags));
        if span.end < window.end {
            events.push((span.end, -bags));
        }
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut running: i64 = 0;
    let mut peak: i64 = 0;
    for (_, delta) in &events {
        running += delta;
        peak = peak.max(running);
    }

    peak as u64
}

/// Capacity free at the worst instant of `window`, floored at zero.
pub fn available_capacity(capacity: u32, window: &Span, reservations: &[Reservation]) -> u32 {
    let peak = peak_demand(window, reservations);
    u64::from(capacity).saturating_sub(peak) as u32
}

/// Whether a new reservation of `bag_count` fits throughout `window`.
pub fn admits(capacity: u32, window: &Span, reservations: &[Reservation], bag_count: u32) -> bool {
    bag_count <= available_capacity(capacity, window, reservations)
}
