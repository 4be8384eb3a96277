//! Public entry points.
//!
//! [`is_in_view`] and [`is_out_of_view`] differ only in the polarity of the
//! visibility condition. Each call merges its options over
//! [`DEFAULT_OPTIONS`], normalizes the target set, builds a fresh monitor and
//! registers every target with it.

use crate::error::ViewResult;
use crate::host::{ObservationHost, VisibilityEntry};
use crate::monitor::{create_monitor, ViewMonitor};
use crate::options::{build_options, PartialViewOptions, DEFAULT_OPTIONS};
use crate::target::Target;

/// Whether `host` provides the visibility-observation primitive.
///
/// Call this before the entry points; they do not check on their own.
#[must_use]
pub fn is_supported<H: ObservationHost>(host: &H) -> bool {
    host.is_supported()
}

/// Call `callback` with each target that becomes visible.
///
/// `options` may set either field; missing fields fall back to
/// [`DEFAULT_OPTIONS`]. An empty collection registers nothing.
///
/// # Errors
///
/// Returns the host's error if it cannot construct an observer, e.g.
/// [`ViewError::Unsupported`](crate::ViewError::Unsupported).
pub fn is_in_view<H, T, F>(
    host: &H,
    target: T,
    callback: F,
    options: Option<PartialViewOptions>,
) -> ViewResult<ViewMonitor<H::Observer>>
where
    H: ObservationHost,
    T: Into<Target<H::Element>>,
    F: FnMut(H::Element) + 'static,
{
    watch(host, target.into(), callback, options, entered)
}

/// Call `callback` with each target that is reported as not visible.
///
/// Same contract as [`is_in_view`] with the condition inverted.
///
/// # Errors
///
/// Returns the host's error if it cannot construct an observer.
pub fn is_out_of_view<H, T, F>(
    host: &H,
    target: T,
    callback: F,
    options: Option<PartialViewOptions>,
) -> ViewResult<ViewMonitor<H::Observer>>
where
    H: ObservationHost,
    T: Into<Target<H::Element>>,
    F: FnMut(H::Element) + 'static,
{
    watch(host, target.into(), callback, options, exited)
}

fn entered<E>(entry: &VisibilityEntry<E>) -> bool {
    entry.is_intersecting
}

fn exited<E>(entry: &VisibilityEntry<E>) -> bool {
    !entry.is_intersecting
}

fn watch<H, F>(
    host: &H,
    target: Target<H::Element>,
    callback: F,
    options: Option<PartialViewOptions>,
    condition: fn(&VisibilityEntry<H::Element>) -> bool,
) -> ViewResult<ViewMonitor<H::Observer>>
where
    H: ObservationHost,
    F: FnMut(H::Element) + 'static,
{
    let options = build_options(DEFAULT_OPTIONS, options.as_slice());
    let targets = target.into_elements();
    let monitor = create_monitor(host, callback, options, condition)?;
    monitor.observe_all(&targets);
    Ok(monitor)
}
