use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::{ReservationProvider, ResourceProvider, StoreError};

pub type SharedStashpointState = Arc<RwLock<StashpointState>>;

#[derive(Debug, Clone)]
pub struct StashpointState {
    pub stashpoint: Stashpoint,
    /// Sorted by `dropoff_time`.
    pub reservations: Vec<Reservation>,
}

impl StashpointState {
    pub fn new(stashpoint: Stashpoint) -> Self {
        Self {
            stashpoint,
            reservations: Vec::new(),
        }
    }

    /// Insert reservation maintaining sort order by dropoff time.
    pub fn insert_reservation(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.dropoff_time, |r| r.dropoff_time)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    /// Active reservations overlapping the window.
    /// Uses binary search to skip reservations dropped off at or after `window.end`.
    pub fn overlapping(&self, window: &Span) -> impl Iterator<Item = &Reservation> {
        let right_bound = self
            .reservations
            .partition_point(|r| r.dropoff_time.timestamp_millis() < window.end);
        self.reservations[..right_bound].iter().filter(move |r| {
            r.is_active() && r.pickup_time.timestamp_millis() > window.start
        })
    }
}

/// On-disk seed format: `{ "stashpoints": [...], "reservations": [...] }`.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub stashpoints: Vec<Stashpoint>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

pub struct InMemoryStore {
    stashpoints: DashMap<Ulid, SharedStashpointState>,
    /// Reverse lookup: reservation id → stashpoint id
    reservation_to_stashpoint: DashMap<Ulid, Ulid>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            stashpoints: DashMap::new(),
            reservation_to_stashpoint: DashMap::new(),
        }
    }

    pub fn stashpoint_count(&self) -> usize {
        self.stashpoints.len()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservation_to_stashpoint.len()
    }

    pub fn get_stashpoint(&self, id: &Ulid) -> Option<SharedStashpointState> {
        self.stashpoints.get(id).map(|e| e.value().clone())
    }

    pub fn insert_stashpoint(&self, stashpoint: Stashpoint) -> Result<(), StoreError> {
        validate_stashpoint(&stashpoint)?;
        if self.stashpoints.len() >= MAX_STASHPOINTS {
            return Err(StoreError::LimitExceeded("too many stashpoints"));
        }
        match self.stashpoints.entry(stashpoint.id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(stashpoint.id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(RwLock::new(StashpointState::new(stashpoint))));
                Ok(())
            }
        }
    }

    pub async fn insert_reservation(&self, reservation: Reservation) -> Result<(), StoreError> {
        validate_reservation(&reservation)?;
        let rs = self
            .get_stashpoint(&reservation.stashpoint_id)
            .ok_or(StoreError::NotFound(reservation.stashpoint_id))?;
        let mut guard = rs.write().await;
        if guard.reservations.len() >= MAX_RESERVATIONS_PER_STASHPOINT {
            return Err(StoreError::LimitExceeded("too many reservations on stashpoint"));
        }
        self.index_reservation(&reservation)?;
        guard.insert_reservation(reservation);
        Ok(())
    }

    /// Build a store from seed records, rejecting the whole seed on the first bad record.
    pub fn from_seed(seed: Seed) -> Result<Self, StoreError> {
        let store = Self::new();
        if seed.stashpoints.len() > MAX_STASHPOINTS {
            return Err(StoreError::LimitExceeded("too many stashpoints"));
        }

        // Sole owner until returned, so states are assembled unlocked and wrapped last.
        let mut states: HashMap<Ulid, StashpointState> = HashMap::with_capacity(seed.stashpoints.len());
        for sp in seed.stashpoints {
            validate_stashpoint(&sp)?;
            if states.contains_key(&sp.id) {
                return Err(StoreError::AlreadyExists(sp.id));
            }
            states.insert(sp.id, StashpointState::new(sp));
        }
        for r in seed.reservations {
            validate_reservation(&r)?;
            let state = states
                .get_mut(&r.stashpoint_id)
                .ok_or(StoreError::NotFound(r.stashpoint_id))?;
            if state.reservations.len() >= MAX_RESERVATIONS_PER_STASHPOINT {
                return Err(StoreError::LimitExceeded("too many reservations on stashpoint"));
            }
            store.index_reservation(&r)?;
            state.insert_reservation(r);
        }

        for (id, state) in states {
            store.stashpoints.insert(id, Arc::new(RwLock::new(state)));
        }
        Ok(store)
    }

    pub fn load_seed(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path).map_err(|source| StoreError::SeedIo {
            path: path.to_path_buf(),
            source,
        })?;
        let seed: Seed = serde_json::from_slice(&bytes).map_err(|source| StoreError::SeedParse {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_seed(seed)?;
        info!(
            "loaded {} stashpoints, {} reservations from {}",
            store.stashpoint_count(),
            store.reservation_count(),
            path.display()
        );
        Ok(store)
    }

    fn index_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        match self.reservation_to_stashpoint.entry(reservation.id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(reservation.id)),
            Entry::Vacant(slot) => {
                slot.insert(reservation.stashpoint_id);
                Ok(())
            }
        }
    }
}

fn validate_stashpoint(sp: &Stashpoint) -> Result<(), StoreError> {
    if !valid_latitude(sp.latitude) || !valid_longitude(sp.longitude) {
        return Err(StoreError::InvalidRecord {
            id: sp.id,
            reason: "coordinates out of range",
        });
    }
    if sp.name.len() > MAX_NAME_LEN {
        return Err(StoreError::LimitExceeded("stashpoint name too long"));
    }
    if sp.address.len() > MAX_ADDRESS_LEN {
        return Err(StoreError::LimitExceeded("stashpoint address too long"));
    }
    Ok(())
}

fn validate_reservation(r: &Reservation) -> Result<(), StoreError> {
    if r.span().is_none() {
        return Err(StoreError::InvalidRecord {
            id: r.id,
            reason: "pickup_time must be after dropoff_time",
        });
    }
    if r.bag_count == 0 {
        return Err(StoreError::InvalidRecord {
            id: r.id,
            reason: "bag_count must be positive",
        });
    }
    Ok(())
}

#[async_trait]
impl ResourceProvider for InMemoryStore {
    async fn list_candidates(&self) -> Result<Vec<Stashpoint>, StoreError> {
        // Clone the Arcs out first so no DashMap shard guard is held across an await.
        let shared: Vec<SharedStashpointState> =
            self.stashpoints.iter().map(|e| e.value().clone()).collect();
        let mut candidates = Vec::with_capacity(shared.len());
        for rs in shared {
            candidates.push(rs.read().await.stashpoint.clone());
        }
        Ok(candidates)
    }
}

#[async_trait]
impl ReservationProvider for InMemoryStore {
    async fn overlapping_reservations(
        &self,
        stashpoint_id: Ulid,
        window: Span,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rs = self
            .get_stashpoint(&stashpoint_id)
            .ok_or(StoreError::NotFound(stashpoint_id))?;
        let guard = rs.read().await;
        Ok(guard.overlapping(&window).cloned().collect())
    }
}
