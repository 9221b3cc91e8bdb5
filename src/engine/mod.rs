//! The read-side eligibility and ranking core.
//!
//! Leaf filters (`hours`, `proximity`) and the capacity sweep (`availability`) are pure
//! functions; `search` pulls candidates and reservations from the store providers and
//! runs each candidate through them.

mod availability;
mod hours;
mod proximity;
mod search;

pub use availability::{admits, available_capacity, peak_demand};
pub use hours::is_open_for_window;
pub use proximity::{distance_km, within_radius};
pub use search::{Rejection, search};
