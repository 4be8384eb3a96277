//! # inview - element visibility notifications
//!
//! inview tells a caller when page elements enter or leave a viewport-like
//! region, optionally firing only once per element. It is a thin layer over a
//! host-provided visibility-observation primitive (in a browser, the
//! `IntersectionObserver` API), described by the [`ObservationHost`] trait.
//!
//! ## Core Concepts
//!
//! - **ViewOptions**: the `once` flag and the visibility `threshold`
//! - **Target**: one element or an ordered collection of elements
//! - **ViewMonitor**: the per-call handle around one host observer
//! - **ObservationHost**: the primitive; [`InMemoryHost`] for native use and
//!   tests, `WebHost` with the `web` feature
//!
//! ## Usage
//!
//! ```rust
//! use inview::{is_in_view, is_supported, InMemoryHost, PartialViewOptions};
//!
//! let host = InMemoryHost::new();
//! assert!(is_supported(&host));
//!
//! let banner = host.element();
//! let monitor = is_in_view(
//!     &host,
//!     banner,
//!     |el| println!("{el} is visible"),
//!     Some(PartialViewOptions::once(true)),
//! )?;
//!
//! host.set_ratio(banner, 0.6);
//! host.flush();
//! assert!(!host.is_observed(banner));
//! monitor.detach();
//! # Ok::<(), inview::ViewError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod error;
pub mod host;
pub mod monitor;
pub mod options;
pub mod target;

// Re-export primary types at crate root for convenience
pub use api::{is_in_view, is_out_of_view, is_supported};
pub use error::{ViewError, ViewResult};
pub use host::{
    BatchHandler, ElementId, HostObserver, InMemoryHost, MemoryObserver, ObservationHost,
    ObserverInit, VisibilityEntry,
};
#[cfg(feature = "web")]
pub use host::{WebHost, WebObserver};
pub use monitor::{create_monitor, MonitorId, ViewMonitor};
pub use options::{build_options, PartialViewOptions, ViewOptions, DEFAULT_OPTIONS};
pub use target::Target;
