// src/store/mod.rs
pub mod snapshot;
pub mod trip_store;

pub use snapshot::{Snapshot, SnapshotFile, SnapshotSink};
pub use trip_store::TripStore;
