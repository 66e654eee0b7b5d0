//! Type aliases for the shared-state shapes used across the engine.
//!
//! The scheduler's request slot and the project store are shared between the
//! session and background tokio tasks, so both sit behind `parking_lot` locks.
//!
//! ```rust,ignore
//! use cabinetkit_core::types::*;
//!
//! let slot: ThreadSafe<Option<u64>> = thread_safe(None);
//! *slot.lock() = Some(7);
//! ```

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-task sharing.
///
/// Uses `parking_lot::Mutex`; never hold the guard across an `.await`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe reader-writer lock wrapper for read-heavy state.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create a new `ThreadSafeRw<T>` from a value.
#[inline]
pub fn thread_safe_rw<T>(value: T) -> ThreadSafeRw<T> {
    Arc::new(RwLock::new(value))
}
