//! Browser host backed by `IntersectionObserver`.

use js_sys::{Array, Reflect};
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::error::{ViewError, ViewResult};
use crate::target::Target;

use super::traits::{BatchHandler, HostObserver, ObservationHost, ObserverInit, VisibilityEntry};

type Listener = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// The current browser window.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebHost;

impl ObservationHost for WebHost {
    type Element = Element;
    type Observer = WebObserver;

    fn is_supported(&self) -> bool {
        web_sys::window().is_some_and(|window| {
            Reflect::has(&window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
        })
    }

    fn create_observer(
        &self,
        init: ObserverInit,
        mut handler: BatchHandler<Element>,
    ) -> ViewResult<WebObserver> {
        if !self.is_supported() {
            return Err(ViewError::Unsupported);
        }

        let listener = Listener::new(move |entries: Array, observer: IntersectionObserver| {
            let batch: Vec<VisibilityEntry<Element>> = entries
                .iter()
                .map(|value| {
                    let entry: IntersectionObserverEntry = value.unchecked_into();
                    VisibilityEntry {
                        target: entry.target(),
                        is_intersecting: entry.is_intersecting(),
                        intersection_ratio: entry.intersection_ratio(),
                    }
                })
                .collect();
            handler(&batch, &observer);
        });

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(init.threshold));
        let observer =
            IntersectionObserver::new_with_options(listener.as_ref().unchecked_ref(), &options)
                .map_err(|err| js_error(&err, init.threshold))?;

        Ok(WebObserver { observer, listener })
    }
}

fn js_error(err: &JsValue, threshold: f64) -> ViewError {
    if err.is_instance_of::<js_sys::RangeError>() {
        return ViewError::ThresholdOutOfRange { value: threshold };
    }
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    ViewError::Host { message }
}

impl HostObserver for IntersectionObserver {
    type Element = Element;

    fn observe(&self, target: &Element) {
        IntersectionObserver::observe(self, target);
    }

    fn unobserve(&self, target: &Element) {
        IntersectionObserver::unobserve(self, target);
    }

    fn disconnect(&self) {
        IntersectionObserver::disconnect(self);
    }
}

/// A live `IntersectionObserver` together with its JS callback.
///
/// Dropping it frees the callback; disconnect first.
#[derive(Debug)]
pub struct WebObserver {
    observer: IntersectionObserver,
    listener: Listener,
}

impl HostObserver for WebObserver {
    type Element = Element;

    fn observe(&self, target: &Element) {
        self.observer.observe(target);
    }

    fn unobserve(&self, target: &Element) {
        self.observer.unobserve(target);
    }

    fn disconnect(&self) {
        self.observer.disconnect();
    }

    fn detach(self) {
        // The browser keeps the observer alive while it has targets.
        self.listener.forget();
    }
}

impl From<Element> for Target<Element> {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}
