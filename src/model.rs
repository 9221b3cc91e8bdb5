use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds. The only instant type inside the engine.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// `None` unless `start < end`.
    pub fn try_new(start: Ms, end: Ms) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lng, p.lat)
    }
}

pub fn valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

pub fn valid_longitude(lng: f64) -> bool {
    lng.is_finite() && (-180.0..=180.0).contains(&lng)
}

/// A location offering bag storage. Serialized as-is into search responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stashpoint {
    pub id: Ulid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Max bags held at once. A static ceiling, not a live counter.
    pub capacity: u32,
    pub open_from: NaiveTime,
    pub open_until: NaiveTime,
}

impl Stashpoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Demand for `bag_count` slots at one stashpoint over `[dropoff_time, pickup_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub stashpoint_id: Ulid,
    pub dropoff_time: DateTime<Utc>,
    pub pickup_time: DateTime<Utc>,
    pub bag_count: u32,
    #[serde(default)]
    pub is_cancelled: bool,
}

impl Reservation {
    /// Occupied interval, or `None` for an inverted/empty record.
    pub fn span(&self) -> Option<Span> {
        Span::try_new(
            self.dropoff_time.timestamp_millis(),
            self.pickup_time.timestamp_millis(),
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_cancelled
    }
}

/// A validated search. Timestamps keep the caller's UTC offset so the wall-clock
/// time-of-day used for opening hours is the one the caller wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub point: GeoPoint,
    pub radius_km: Option<f64>,
    pub dropoff: DateTime<FixedOffset>,
    pub pickup: DateTime<FixedOffset>,
    pub bag_count: u32,
}

impl SearchRequest {
    pub fn window(&self) -> Span {
        Span::new(self.dropoff.timestamp_millis(), self.pickup.timestamp_millis())
    }

    pub fn dropoff_time_of_day(&self) -> NaiveTime {
        self.dropoff.time()
    }

    pub fn pickup_time_of_day(&self) -> NaiveTime {
        self.pickup.time()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub stashpoint: Stashpoint,
    pub distance_km: f64,
    pub available_capacity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn span_try_new_rejects_inverted() {
        assert!(Span::try_new(200, 100).is_none());
        assert!(Span::try_new(100, 100).is_none());
        assert_eq!(Span::try_new(100, 101), Some(Span::new(100, 101)));
    }

    #[test]
    fn reservation_span_in_millis() {
        let r = Reservation {
            id: Ulid::new(),
            stashpoint_id: Ulid::new(),
            dropoff_time: at(9, 0),
            pickup_time: at(10, 30),
            bag_count: 2,
            is_cancelled: false,
        };
        let span = r.span().unwrap();
        assert_eq!(span.end - span.start, 90 * 60_000);
        assert_eq!(span.start, at(9, 0).timestamp_millis());
    }

    #[test]
    fn inverted_reservation_has_no_span() {
        let r = Reservation {
            id: Ulid::new(),
            stashpoint_id: Ulid::new(),
            dropoff_time: at(10, 0),
            pickup_time: at(9, 0),
            bag_count: 1,
            is_cancelled: false,
        };
        assert!(r.span().is_none());
    }

    #[test]
    fn request_time_of_day_keeps_caller_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let req = SearchRequest {
            point: GeoPoint::new(51.5, -0.12),
            radius_km: None,
            dropoff: plus_two.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            pickup: plus_two.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap(),
            bag_count: 1,
        };
        assert_eq!(req.dropoff_time_of_day(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(req.pickup_time_of_day(), NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        // 09:00+02:00 is 07:00Z
        assert_eq!(req.window().start, at(7, 0).timestamp_millis());
    }

    #[test]
    fn coordinate_ranges() {
        assert!(valid_latitude(90.0));
        assert!(!valid_latitude(90.5));
        assert!(!valid_latitude(f64::NAN));
        assert!(valid_longitude(-180.0));
        assert!(!valid_longitude(181.0));
        assert!(!valid_longitude(f64::INFINITY));
    }

    #[test]
    fn search_result_flattens_stashpoint() {
        let sp = Stashpoint {
            id: Ulid::new(),
            name: "Kings Cross".into(),
            address: "1 Euston Rd".into(),
            latitude: 51.53,
            longitude: -0.12,
            capacity: 10,
            open_from: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            open_until: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        };
        let result = SearchResult {
            stashpoint: sp,
            distance_km: 1.5,
            available_capacity: 6,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["name"], "Kings Cross");
        assert_eq!(json["capacity"], 10);
        assert_eq!(json["open_from"], "08:00:00");
        assert_eq!(json["available_capacity"], 6);
        assert_eq!(json["distance_km"], 1.5);
    }
}
