// ============================================================================
// STATE NOTIFIER - tells the page shell that view state changed
// ============================================================================
// Async results (loads, initiations, polling) land after the hook that started
// them has returned, so the shell re-reads `page_state()` on `statechange`.
// ============================================================================

use std::rc::Rc;

use web_sys::{window, Event};

use crate::state::ReactiveState;
use crate::utils::constants::STATE_CHANGE_EVENT;

pub trait StateNotifier {
    fn state_changed(&self);
}

/// Dispatches `statechange` on `window`
#[derive(Clone, Copy, Debug, Default)]
pub struct DomStateNotifier;

impl StateNotifier for DomStateNotifier {
    fn state_changed(&self) {
        let Some(window) = window() else {
            return;
        };
        match Event::new(STATE_CHANGE_EVENT) {
            Ok(event) => {
                let _ = window.dispatch_event(&event);
            }
            Err(e) => log::error!("❌ Could not create {} event: {:?}", STATE_CHANGE_EVENT, e),
        }
    }
}

/// Forwards every change of `state` to `notifier`
pub fn forward<T: Clone + 'static>(state: &ReactiveState<T>, notifier: &Rc<dyn StateNotifier>) {
    let notifier = notifier.clone();
    state.subscribe(move || notifier.state_changed());
}
