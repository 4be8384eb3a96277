//! Caller-side monitor handle and monitor ids.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::host::HostObserver;

/// Unique identifier for a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorId(Uuid);

impl MonitorId {
    /// Create a new random monitor id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for MonitorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a running monitor.
///
/// Dropping the handle disconnects the observer. Call [`ViewMonitor::detach`]
/// to hand the registration over to the host instead.
#[derive(Debug)]
#[must_use = "dropping a ViewMonitor disconnects it; call `detach` to keep it running"]
pub struct ViewMonitor<O: HostObserver> {
    id: MonitorId,
    observer: Option<O>,
}

impl<O: HostObserver> ViewMonitor<O> {
    pub(crate) fn new(id: MonitorId, observer: O) -> Self {
        Self {
            id,
            observer: Some(observer),
        }
    }

    /// The id this monitor logs under.
    #[must_use]
    pub const fn id(&self) -> MonitorId {
        self.id
    }

    pub(crate) fn observe_all(&self, targets: &[O::Element]) {
        if let Some(observer) = &self.observer {
            for target in targets {
                observer.observe(target);
            }
        }
        log::debug!("monitor {}: registered {} targets", self.id, targets.len());
    }

    /// Stop observing every target now.
    pub fn disconnect(mut self) {
        self.teardown();
    }

    /// Release the handle and leave the registration alive in the host.
    ///
    /// Targets stay observed until the once flag removes them or the host
    /// discards them; there is no way to disconnect afterwards.
    pub fn detach(mut self) {
        if let Some(observer) = self.observer.take() {
            log::debug!("monitor {}: detached", self.id);
            observer.detach();
        }
    }

    fn teardown(&mut self) {
        if let Some(observer) = self.observer.take() {
            log::debug!("monitor {}: disconnected", self.id);
            observer.disconnect();
        }
    }
}

impl<O: HostObserver> Drop for ViewMonitor<O> {
    fn drop(&mut self) {
        self.teardown();
    }
}
