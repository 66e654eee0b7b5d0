//! Project-level geometry holder.
//!
//! The edit session reads it once to seed its initial state and writes every
//! committed geometry back. Last write wins.

use cabinetkit_core::{thread_safe_rw, ThreadSafeRw};

use crate::geometry::GeometryState;

/// Injected holder of the last committed geometry.
pub trait ProjectStore: Send + Sync {
    /// Last committed geometry, if any
    fn get(&self) -> Option<GeometryState>;

    /// Replace the stored geometry
    fn set(&self, geometry: GeometryState);
}

/// Process-local store backed by a lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectStore {
    geometry: ThreadSafeRw<Option<GeometryState>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `geometry`
    pub fn with_geometry(geometry: GeometryState) -> Self {
        Self {
            geometry: thread_safe_rw(Some(geometry)),
        }
    }
}

impl ProjectStore for InMemoryProjectStore {
    fn get(&self) -> Option<GeometryState> {
        *self.geometry.read()
    }

    fn set(&self, geometry: GeometryState) {
        *self.geometry.write() = Some(geometry);
    }
}
