//! Contract of the host's visibility-observation primitive.
//!
//! These traits describe what inview consumes from the host. Implementations:
//! - [`InMemoryHost`](super::InMemoryHost) for tests and native embedders
//! - `WebHost` (feature `web`) over the browser `IntersectionObserver`

use serde::{Deserialize, Serialize};

use crate::error::ViewResult;

/// One visibility transition reported by the primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityEntry<E> {
    /// The element whose visibility changed.
    pub target: E,
    /// Whether the element currently counts as visible.
    pub is_intersecting: bool,
    /// Visible fraction of the element's area, in `[0.0, 1.0]`.
    pub intersection_ratio: f64,
}

impl<E> VisibilityEntry<E> {
    /// Entry for an element that became visible with the given ratio.
    #[must_use]
    pub fn visible(target: E, intersection_ratio: f64) -> Self {
        Self {
            target,
            is_intersecting: true,
            intersection_ratio,
        }
    }

    /// Entry for an element that left the observed region.
    #[must_use]
    pub fn hidden(target: E) -> Self {
        Self {
            target,
            is_intersecting: false,
            intersection_ratio: 0.0,
        }
    }
}

/// Construction options forwarded to the primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverInit {
    /// Minimum visible fraction for an entry to count as intersecting.
    pub threshold: f64,
}

/// A live observer created by the primitive.
pub trait HostObserver {
    /// Element handle type.
    type Element;

    /// Begin observing `target`. Observing an element twice is a no-op.
    fn observe(&self, target: &Self::Element);

    /// Stop observing `target`; other targets are unaffected.
    fn unobserve(&self, target: &Self::Element);

    /// Stop observing every target.
    fn disconnect(&self);

    /// Give up this handle while leaving the registration to the host.
    fn detach(self)
    where
        Self: Sized,
    {
    }
}

/// Batch callback installed on an observer.
///
/// Receives the entries of one delivery, in host order, and the observer that
/// produced them.
pub type BatchHandler<E> = Box<dyn FnMut(&[VisibilityEntry<E>], &dyn HostObserver<Element = E>)>;

/// A host environment that may provide the visibility-observation primitive.
pub trait ObservationHost {
    /// Element handle type.
    type Element: Clone + 'static;
    /// Observer type produced by [`ObservationHost::create_observer`].
    type Observer: HostObserver<Element = Self::Element>;

    /// Whether the primitive exists in this host.
    fn is_supported(&self) -> bool;

    /// Construct an observer that calls `handler` on every delivery.
    ///
    /// # Errors
    ///
    /// Fails with [`ViewError::Unsupported`](crate::ViewError::Unsupported)
    /// when the primitive is missing, or with the primitive's own error when
    /// it rejects `init`.
    fn create_observer(
        &self,
        init: ObserverInit,
        handler: BatchHandler<Self::Element>,
    ) -> ViewResult<Self::Observer>;
}
