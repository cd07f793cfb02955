//! LAPSE - Engine Module
//! The index directory, its companion stores and maps, the expiration
//! routines that keep them coherent, and the tables built on top.
//!
//! All structures are single-writer: they are mutated in place by the
//! calling thread with no internal locking, and callers must not refresh,
//! insert or erase while an expiration pass runs.

pub mod directory;
pub mod double_map;
pub mod expirator;
pub mod expiring_double_map;
pub mod expiring_map;
pub mod key_map;
pub mod metrics;
pub mod store;

pub use self::directory::IndexDirectory;
pub use self::double_map::TwoLevelKeyIndexMap;
pub use self::expirator::{
    expire_double_map, expire_double_map_bounded, expire_double_map_with, expire_single_map,
    expire_single_map_bounded, expire_single_map_with,
};
pub use self::expiring_double_map::ExpiringDoubleMap;
pub use self::expiring_map::ExpiringMap;
pub use self::key_map::KeyIndexMap;
pub use self::metrics::{MetricsSnapshot, TableMetrics};
pub use self::store::DenseStore;
