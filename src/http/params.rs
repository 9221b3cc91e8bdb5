use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::model::*;

use super::error::ValidationError;

/// Raw `GET /` query string. Every field is taken as text so that missing and
/// malformed values produce our own messages rather than an extractor rejection.
#[derive(Debug, Default)]
pub struct SearchParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius_km: Option<String>,
    pub dropoff: Option<String>,
    pub pickup: Option<String>,
    pub bag_count: Option<String>,
}

impl SearchParams {
    /// Collect known fields from decoded query pairs. A repeated key keeps its first
    /// value; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "lat" => &mut params.lat,
                "lng" => &mut params.lng,
                "radius_km" => &mut params.radius_km,
                "dropoff" => &mut params.dropoff,
                "pickup" => &mut params.pickup,
                "bag_count" => &mut params.bag_count,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    /// Validate in parameter order, failing on the first bad one.
    pub fn into_request(self) -> Result<SearchRequest, ValidationError> {
        let lat = parse_f64(self.lat.as_deref())
            .filter(|v| valid_latitude(*v))
            .ok_or(ValidationError::Lat)?;
        let lng = parse_f64(self.lng.as_deref())
            .filter(|v| valid_longitude(*v))
            .ok_or(ValidationError::Lng)?;

        let radius_km = match self.radius_km.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<f64>()
                    .ok()
                    .filter(|r| r.is_finite() && *r >= 0.0)
                    .ok_or(ValidationError::RadiusKm)?,
            ),
        };

        let dropoff = self.dropoff.as_deref().ok_or(ValidationError::MissingDropoff)?;
        let dropoff = parse_iso_datetime(dropoff).ok_or(ValidationError::MalformedDropoff)?;
        let pickup = self.pickup.as_deref().ok_or(ValidationError::MissingPickup)?;
        let pickup = parse_iso_datetime(pickup).ok_or(ValidationError::MalformedPickup)?;
        if pickup <= dropoff {
            return Err(ValidationError::PickupNotAfterDropoff);
        }

        let bag_count = self
            .bag_count
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
            .ok_or(ValidationError::BagCount)?;

        Ok(SearchRequest {
            point: GeoPoint::new(lat, lng),
            radius_km,
            dropoff,
            pickup,
            bag_count,
        })
    }
}

fn parse_f64(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// ISO-8601 datetime at minute precision or finer. A `Z` suffix or explicit offset is
/// kept; a naive datetime (or bare date, read as midnight) is taken as UTC.
pub fn parse_iso_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Some(utc) = raw.strip_suffix(['Z', 'z']) {
        return parse_naive(utc).map(|naive| naive.and_utc().fixed_offset());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    parse_naive(raw)
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc().fixed_offset())
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
