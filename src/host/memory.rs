//! In-memory visibility host.
//!
//! A deterministic, single-threaded model of the observation primitive. The
//! embedder sets each element's visible ratio and calls [`InMemoryHost::flush`]
//! to deliver the resulting transitions, the way a browser delivers them on
//! its next rendering step. [`InMemoryHost::deliver`] pushes a synthetic batch
//! straight to the registered observers.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{ViewError, ViewResult};
use crate::target::Target;

use super::traits::{BatchHandler, HostObserver, ObservationHost, ObserverInit, VisibilityEntry};

/// Handle to an element living in an [`InMemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// Raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

impl From<ElementId> for Target<ElementId> {
    fn from(element: ElementId) -> Self {
        Self::Element(element)
    }
}

/// Whether `ratio` counts as visible under `threshold`.
fn is_intersecting(ratio: f64, threshold: f64) -> bool {
    if threshold <= 0.0 {
        ratio > 0.0
    } else {
        ratio >= threshold
    }
}

struct ObserverSlot {
    threshold: f64,
    targets: Vec<ElementId>,
    // Observed since the last flush; owed an initial entry.
    fresh: Vec<ElementId>,
    last: HashMap<ElementId, bool>,
    // Taken out while the handler runs.
    handler: Option<BatchHandler<ElementId>>,
}

#[derive(Default)]
struct HostState {
    unsupported: bool,
    next_element: u64,
    next_observer: u64,
    ratios: HashMap<ElementId, f64>,
    dirty: Vec<ElementId>,
    observers: BTreeMap<u64, ObserverSlot>,
}

/// Deterministic in-process host.
///
/// Cloning shares the same host state.
#[derive(Clone, Default)]
pub struct InMemoryHost {
    state: Rc<RefCell<HostState>>,
}

impl fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.borrow();
        f.debug_struct("InMemoryHost")
            .field("supported", &!st.unsupported)
            .field("elements", &st.next_element)
            .field("observers", &st.observers.len())
            .finish()
    }
}

impl InMemoryHost {
    /// Create a host that provides the primitive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host without the primitive; observer construction fails.
    #[must_use]
    pub fn unsupported() -> Self {
        let host = Self::default();
        host.state.borrow_mut().unsupported = true;
        host
    }

    /// Mint a new element, initially fully hidden.
    #[must_use]
    pub fn element(&self) -> ElementId {
        let mut st = self.state.borrow_mut();
        let id = ElementId(st.next_element);
        st.next_element += 1;
        id
    }

    /// Mint `n` new elements.
    #[must_use]
    pub fn elements(&self, n: usize) -> Vec<ElementId> {
        (0..n).map(|_| self.element()).collect()
    }

    /// Set the visible fraction of `element`; delivered on the next flush.
    pub fn set_ratio(&self, element: ElementId, ratio: f64) {
        let mut st = self.state.borrow_mut();
        st.ratios.insert(element, ratio.clamp(0.0, 1.0));
        if !st.dirty.contains(&element) {
            st.dirty.push(element);
        }
    }

    /// Current visible fraction of `element`.
    #[must_use]
    pub fn ratio(&self, element: ElementId) -> f64 {
        self.state
            .borrow()
            .ratios
            .get(&element)
            .copied()
            .unwrap_or(0.0)
    }

    /// Deliver pending transitions to every observer.
    ///
    /// Each observer receives one batch, observers in creation order. An
    /// element observed since the last flush always gets an initial entry;
    /// otherwise an entry is produced only when the element crossed the
    /// observer's threshold. Returns the number of entries delivered.
    pub fn flush(&self) -> usize {
        let (dirty, ids) = {
            let mut st = self.state.borrow_mut();
            let dirty = mem::take(&mut st.dirty);
            let ids: Vec<u64> = st.observers.keys().copied().collect();
            (dirty, ids)
        };
        log::trace!(
            "flushing {} changed elements across {} observers",
            dirty.len(),
            ids.len()
        );

        let mut delivered = 0;
        for id in ids {
            let batch = {
                let mut guard = self.state.borrow_mut();
                let st = &mut *guard;
                let Some(slot) = st.observers.get_mut(&id) else {
                    continue;
                };

                let fresh = mem::take(&mut slot.fresh);
                let mut candidates = fresh.clone();
                for element in &dirty {
                    if slot.targets.contains(element) && !candidates.contains(element) {
                        candidates.push(*element);
                    }
                }

                let mut batch = Vec::with_capacity(candidates.len());
                for element in candidates {
                    if !slot.targets.contains(&element) {
                        continue;
                    }
                    let ratio = st.ratios.get(&element).copied().unwrap_or(0.0);
                    let intersecting = is_intersecting(ratio, slot.threshold);
                    let changed = slot.last.insert(element, intersecting) != Some(intersecting);
                    if changed || fresh.contains(&element) {
                        batch.push(VisibilityEntry {
                            target: element,
                            is_intersecting: intersecting,
                            intersection_ratio: ratio,
                        });
                    }
                }
                batch
            };

            if !batch.is_empty() && self.dispatch(id, &batch) {
                delivered += batch.len();
            }
        }
        delivered
    }

    /// Deliver a synthetic batch as is.
    ///
    /// Every observer receives the entries whose target it currently observes,
    /// in the given order, without deduplication. Returns the number of
    /// entries delivered.
    pub fn deliver(&self, entries: &[VisibilityEntry<ElementId>]) -> usize {
        let ids: Vec<u64> = self.state.borrow().observers.keys().copied().collect();

        let mut delivered = 0;
        for id in ids {
            let batch: Vec<VisibilityEntry<ElementId>> = {
                let mut st = self.state.borrow_mut();
                let Some(slot) = st.observers.get_mut(&id) else {
                    continue;
                };
                let batch: Vec<_> = entries
                    .iter()
                    .filter(|entry| slot.targets.contains(&entry.target))
                    .cloned()
                    .collect();
                for entry in &batch {
                    slot.last.insert(entry.target, entry.is_intersecting);
                }
                batch
            };

            if !batch.is_empty() && self.dispatch(id, &batch) {
                delivered += batch.len();
            }
        }
        delivered
    }

    /// Run the observer's handler on `batch`; false if it did not run.
    ///
    /// The handler is absent while it is already running, so a nested
    /// flush or deliver from inside a callback skips that observer.
    fn dispatch(&self, id: u64, batch: &[VisibilityEntry<ElementId>]) -> bool {
        let handler = {
            let mut st = self.state.borrow_mut();
            st.observers.get_mut(&id).and_then(|slot| slot.handler.take())
        };
        let Some(mut handler) = handler else {
            return false;
        };

        // No borrow is held here: the handler may observe, unobserve or
        // disconnect through `observer`.
        let observer = MemoryObserver {
            id,
            state: Rc::clone(&self.state),
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(batch, &observer)));

        // Put the handler back before unwinding so the observer keeps firing.
        if let Some(slot) = self.state.borrow_mut().observers.get_mut(&id) {
            slot.handler = Some(handler);
        }
        if let Err(payload) = outcome {
            panic::resume_unwind(payload);
        }
        true
    }

    /// Whether any observer currently observes `element`.
    #[must_use]
    pub fn is_observed(&self, element: ElementId) -> bool {
        self.observer_count_for(element) > 0
    }

    /// Number of observers currently observing `element`.
    #[must_use]
    pub fn observer_count_for(&self, element: ElementId) -> usize {
        self.state
            .borrow()
            .observers
            .values()
            .filter(|slot| slot.targets.contains(&element))
            .count()
    }

    /// Number of connected observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// Thresholds of the connected observers, in creation order.
    #[must_use]
    pub fn thresholds(&self) -> Vec<f64> {
        self.state
            .borrow()
            .observers
            .values()
            .map(|slot| slot.threshold)
            .collect()
    }
}

impl ObservationHost for InMemoryHost {
    type Element = ElementId;
    type Observer = MemoryObserver;

    fn is_supported(&self) -> bool {
        !self.state.borrow().unsupported
    }

    fn create_observer(
        &self,
        init: ObserverInit,
        handler: BatchHandler<ElementId>,
    ) -> ViewResult<MemoryObserver> {
        if !self.is_supported() {
            return Err(ViewError::Unsupported);
        }
        if !(0.0..=1.0).contains(&init.threshold) {
            return Err(ViewError::ThresholdOutOfRange {
                value: init.threshold,
            });
        }

        let mut st = self.state.borrow_mut();
        let id = st.next_observer;
        st.next_observer += 1;
        st.observers.insert(
            id,
            ObserverSlot {
                threshold: init.threshold,
                targets: Vec::new(),
                fresh: Vec::new(),
                last: HashMap::new(),
                handler: Some(handler),
            },
        );
        log::trace!("created observer {id} with threshold {}", init.threshold);

        Ok(MemoryObserver {
            id,
            state: Rc::clone(&self.state),
        })
    }
}

/// Observer handle issued by [`InMemoryHost`].
#[derive(Clone)]
pub struct MemoryObserver {
    id: u64,
    state: Rc<RefCell<HostState>>,
}

impl fmt::Debug for MemoryObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryObserver").field("id", &self.id).finish()
    }
}

impl HostObserver for MemoryObserver {
    type Element = ElementId;

    fn observe(&self, target: &ElementId) {
        let mut st = self.state.borrow_mut();
        if let Some(slot) = st.observers.get_mut(&self.id) {
            if !slot.targets.contains(target) {
                slot.targets.push(*target);
                slot.fresh.push(*target);
            }
        }
    }

    fn unobserve(&self, target: &ElementId) {
        let mut st = self.state.borrow_mut();
        if let Some(slot) = st.observers.get_mut(&self.id) {
            slot.targets.retain(|e| e != target);
            slot.fresh.retain(|e| e != target);
            slot.last.remove(target);
        }
    }

    fn disconnect(&self) {
        // Drop the slot after the borrow ends; the handler may own host clones.
        let removed = self.state.borrow_mut().observers.remove(&self.id);
        drop(removed);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recording_observer(
        host: &InMemoryHost,
        threshold: f64,
    ) -> (MemoryObserver, Rc<RefCell<Vec<VisibilityEntry<ElementId>>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let observer = host
            .create_observer(
                ObserverInit { threshold },
                Box::new(move |batch, _| sink.borrow_mut().extend_from_slice(batch)),
            )
            .unwrap();
        (observer, seen)
    }

    #[test]
    fn unsupported_host_rejects_observers() {
        let host = InMemoryHost::unsupported();
        assert!(!host.is_supported());
        let err = host
            .create_observer(ObserverInit { threshold: 0.0 }, Box::new(|_, _| {}))
            .unwrap_err();
        assert_eq!(err, ViewError::Unsupported);
    }

    #[test]
    fn threshold_outside_unit_range_is_rejected() {
        let host = InMemoryHost::new();
        for threshold in [-0.1, 1.5, f64::NAN] {
            let err = host
                .create_observer(ObserverInit { threshold }, Box::new(|_, _| {}))
                .unwrap_err();
            assert!(matches!(err, ViewError::ThresholdOutOfRange { .. }));
        }
        assert_eq!(host.observer_count(), 0);
    }

    #[test]
    fn first_flush_reports_initial_state() {
        let host = InMemoryHost::new();
        let (observer, seen) = recording_observer(&host, 0.0);
        let [a, b] = [host.element(), host.element()];
        host.set_ratio(b, 0.4);
        observer.observe(&a);
        observer.observe(&b);

        assert_eq!(host.flush(), 2);
        let seen = seen.borrow();
        assert_eq!(seen[0], VisibilityEntry::hidden(a));
        assert_eq!(seen[1], VisibilityEntry::visible(b, 0.4));
    }

    #[test]
    fn only_threshold_crossings_are_delivered() {
        let host = InMemoryHost::new();
        let (observer, seen) = recording_observer(&host, 0.5);
        let el = host.element();
        observer.observe(&el);
        host.flush();

        host.set_ratio(el, 0.3);
        assert_eq!(host.flush(), 0);
        host.set_ratio(el, 0.6);
        assert_eq!(host.flush(), 1);
        host.set_ratio(el, 0.9);
        assert_eq!(host.flush(), 0);
        host.set_ratio(el, 0.1);
        assert_eq!(host.flush(), 1);

        let flags: Vec<bool> = seen.borrow().iter().map(|e| e.is_intersecting).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn observing_twice_is_a_no_op() {
        let host = InMemoryHost::new();
        let (observer, seen) = recording_observer(&host, 0.0);
        let el = host.element();
        observer.observe(&el);
        observer.observe(&el);
        assert_eq!(host.flush(), 1);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(host.observer_count_for(el), 1);
    }

    #[test]
    fn unobserve_stops_only_that_element() {
        let host = InMemoryHost::new();
        let (observer, seen) = recording_observer(&host, 0.0);
        let [a, b] = [host.element(), host.element()];
        observer.observe(&a);
        observer.observe(&b);
        host.flush();
        seen.borrow_mut().clear();

        observer.unobserve(&a);
        assert!(!host.is_observed(a));
        assert!(host.is_observed(b));

        host.set_ratio(a, 1.0);
        host.set_ratio(b, 1.0);
        host.flush();
        let targets: Vec<ElementId> = seen.borrow().iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![b]);
    }

    #[test]
    fn disconnect_removes_observer() {
        let host = InMemoryHost::new();
        let (observer, seen) = recording_observer(&host, 0.0);
        let el = host.element();
        observer.observe(&el);
        observer.disconnect();

        assert_eq!(host.observer_count(), 0);
        host.set_ratio(el, 1.0);
        assert_eq!(host.flush(), 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn deliver_filters_to_observed_targets() {
        let host = InMemoryHost::new();
        let (observer, seen) = recording_observer(&host, 0.0);
        let [a, b] = [host.element(), host.element()];
        observer.observe(&a);

        let delivered = host.deliver(&[
            VisibilityEntry::visible(b, 1.0),
            VisibilityEntry::visible(a, 1.0),
            VisibilityEntry::hidden(a),
        ]);
        assert_eq!(delivered, 2);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_intersecting);
        assert!(!seen[1].is_intersecting);
    }

    #[test]
    fn handler_may_unobserve_reentrantly() {
        let host = InMemoryHost::new();
        let observer = host
            .create_observer(
                ObserverInit { threshold: 0.0 },
                Box::new(|batch, observer| {
                    for entry in batch {
                        observer.unobserve(&entry.target);
                    }
                }),
            )
            .unwrap();
        let el = host.element();
        observer.observe(&el);
        host.flush();
        assert!(!host.is_observed(el));
        assert_eq!(host.observer_count(), 1);
    }


    #[test]
    fn handler_survives_a_panicking_callback() {
        let host = InMemoryHost::new();
        let calls = Rc::new(RefCell::new(0_u32));
        let sink = Rc::clone(&calls);
        let observer = host
            .create_observer(
                ObserverInit { threshold: 0.0 },
                Box::new(move |_, _| {
                    *sink.borrow_mut() += 1;
                    if *sink.borrow() == 1 {
                        panic!("first callback fails");
                    }
                }),
            )
            .unwrap();
        let el = host.element();
        observer.observe(&el);

        let first = panic::catch_unwind(AssertUnwindSafe(|| {
            host.deliver(&[VisibilityEntry::visible(el, 1.0)])
        }));
        assert!(first.is_err());
        assert!(host.is_observed(el));

        assert_eq!(host.deliver(&[VisibilityEntry::visible(el, 1.0)]), 1);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn nested_delivery_to_running_observer_is_not_counted() {
        let host = InMemoryHost::new();
        let el = host.element();
        let nested = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&nested);
        let inner_host = host.clone();
        let observer = host
            .create_observer(
                ObserverInit { threshold: 0.0 },
                Box::new(move |_, _| {
                    if sink.borrow().is_none() {
                        let count = inner_host.deliver(&[VisibilityEntry::hidden(el)]);
                        *sink.borrow_mut() = Some(count);
                    }
                }),
            )
            .unwrap();
        observer.observe(&el);

        assert_eq!(host.deliver(&[VisibilityEntry::visible(el, 1.0)]), 1);
        assert_eq!(*nested.borrow(), Some(0));
    }

    #[test]
    fn ratios_are_clamped() {
        let host = InMemoryHost::new();
        let el = host.element();
        host.set_ratio(el, 3.0);
        assert_eq!(host.ratio(el), 1.0);
        host.set_ratio(el, -1.0);
        assert_eq!(host.ratio(el), 0.0);
    }

    #[test]
    fn element_ids_are_distinct() {
        let host = InMemoryHost::new();
        let els = host.elements(3);
        assert_eq!(els.len(), 3);
        assert_ne!(els[0], els[1]);
        assert_eq!(els[2].get(), 2);
        assert_eq!(els[1].to_string(), "element#1");
    }
}
