// ============================================================================
// ACTIVITY SOURCE - user interaction events on the document
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Event};

pub trait ActivitySource {
    /// Calls `callback` on each event of the given kinds
    fn attach(&self, kinds: &[&str], callback: Rc<dyn Fn()>);
    /// Removes every listener registered by `attach`
    fn detach(&self);
}

/// Listeners on `document`; closures are kept alive until detached
#[derive(Default)]
pub struct DocumentActivity {
    listeners: RefCell<Vec<(String, Closure<dyn FnMut(Event)>)>>,
}

impl DocumentActivity {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivitySource for DocumentActivity {
    fn attach(&self, kinds: &[&str], callback: Rc<dyn Fn()>) {
        let Some(document) = window().and_then(|w| w.document()) else {
            log::warn!("⚠️ No document, activity listeners not registered");
            return;
        };

        let mut listeners = self.listeners.borrow_mut();
        for kind in kinds {
            let callback = callback.clone();
            let closure = Closure::wrap(Box::new(move |_event: Event| {
                callback();
            }) as Box<dyn FnMut(Event)>);

            if let Err(e) =
                document.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            {
                log::error!("❌ Could not listen for {}: {:?}", kind, e);
                continue;
            }
            listeners.push((kind.to_string(), closure));
        }
        log::debug!("👂 {} activity listeners registered", listeners.len());
    }

    fn detach(&self) {
        let listeners: Vec<_> = self.listeners.borrow_mut().drain(..).collect();
        let Some(document) = window().and_then(|w| w.document()) else {
            return;
        };
        for (kind, closure) in &listeners {
            let _ = document
                .remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        }
        log::debug!("🔇 {} activity listeners removed", listeners.len());
    }
}
