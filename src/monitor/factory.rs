//! Monitor construction over a host observer.

use crate::error::ViewResult;
use crate::host::{BatchHandler, HostObserver, ObservationHost, ObserverInit, VisibilityEntry};
use crate::options::ViewOptions;

use super::handle::{MonitorId, ViewMonitor};

/// Build a monitor on `host` that calls `callback` for every entry satisfying
/// `condition`.
///
/// The observer is constructed with `options.threshold`. Entries are handled
/// in delivery order with no deduplication. With `options.once`, an element is
/// unobserved right after its callback; the observer itself stays connected
/// even when no targets remain.
///
/// A panicking callback is not caught.
///
/// # Errors
///
/// Returns the host's error if it cannot construct the observer, e.g.
/// [`ViewError::Unsupported`](crate::ViewError::Unsupported) or
/// [`ViewError::ThresholdOutOfRange`](crate::ViewError::ThresholdOutOfRange).
pub fn create_monitor<H, F, C>(
    host: &H,
    mut callback: F,
    options: ViewOptions,
    condition: C,
) -> ViewResult<ViewMonitor<H::Observer>>
where
    H: ObservationHost,
    F: FnMut(H::Element) + 'static,
    C: Fn(&VisibilityEntry<H::Element>) -> bool + 'static,
{
    let id = MonitorId::new();
    let once = options.once;

    let handler: BatchHandler<H::Element> = Box::new(
        move |entries: &[VisibilityEntry<H::Element>],
              observer: &dyn HostObserver<Element = H::Element>| {
            for entry in entries {
                if !condition(entry) {
                    continue;
                }
                log::trace!(
                    "monitor {id}: notifying (intersecting={}, ratio={})",
                    entry.is_intersecting,
                    entry.intersection_ratio
                );
                callback(entry.target.clone());
                if once {
                    observer.unobserve(&entry.target);
                    log::trace!("monitor {id}: target released after first notification");
                }
            }
        },
    );

    let observer = host.create_observer(
        ObserverInit {
            threshold: options.threshold,
        },
        handler,
    )?;
    log::debug!(
        "monitor {id}: created (threshold={}, once={})",
        options.threshold,
        options.once
    );

    Ok(ViewMonitor::new(id, observer))
}
