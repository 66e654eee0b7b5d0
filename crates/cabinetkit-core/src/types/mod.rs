//! Type system utilities and aliases.
//!
//! - [`aliases`]: `Arc<Mutex<T>>` / `Arc<RwLock<T>>` shorthands and constructors.

pub mod aliases;

pub use aliases::*;
