//! Host visibility-observation primitives.
//!
//! inview never implements visibility detection itself; it consumes the
//! [`ObservationHost`] contract defined here.

/// In-memory host for tests and native embedders.
pub mod memory;
mod traits;
/// Browser `IntersectionObserver` host.
#[cfg(feature = "web")]
pub mod web;

pub use memory::{ElementId, InMemoryHost, MemoryObserver};
pub use traits::{BatchHandler, HostObserver, ObservationHost, ObserverInit, VisibilityEntry};
#[cfg(feature = "web")]
pub use web::{WebHost, WebObserver};
