pub mod controller;
pub mod optimistic;
pub mod reconcile;

pub use controller::{EventFilter, FetchPlan, FetchSnapshot, ListController};
pub use reconcile::SortDirection;
