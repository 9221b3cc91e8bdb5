//! Read-side collaborator interfaces the search pipeline pulls from.
//!
//! The engine never talks to storage directly: it asks a [`ResourceProvider`] for
//! candidates and a [`ReservationProvider`] for each candidate's overlapping
//! reservations. [`InMemoryStore`] implements both.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::{InMemoryStore, Seed};

use async_trait::async_trait;
use ulid::Ulid;

use crate::model::{Reservation, Span, Stashpoint};

#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Every stashpoint that may be considered for a search.
    async fn list_candidates(&self) -> Result<Vec<Stashpoint>, StoreError>;
}

#[async_trait]
pub trait ReservationProvider: Send + Sync {
    /// Non-cancelled reservations on `stashpoint_id` with
    /// `dropoff_time < window.end && pickup_time > window.start`.
    async fn overlapping_reservations(
        &self,
        stashpoint_id: Ulid,
        window: Span,
    ) -> Result<Vec<Reservation>, StoreError>;
}
