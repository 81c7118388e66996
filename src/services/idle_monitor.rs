// ============================================================================
// IDLE MONITOR - forced logout after a period without user interaction
// ============================================================================
// Listeners are registered once per watch cycle: a second start only rearms
// the timer. At most one timer is pending at any time.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::routing::{AppKind, Navigator};
use crate::services::activity::ActivitySource;
use crate::services::scheduler::{Scheduler, TimerHandle};
use crate::state::SessionStore;
use crate::utils::constants::ACTIVITY_EVENTS;

struct IdleInner {
    kind: AppKind,
    timeout: Duration,
    session: Rc<SessionStore>,
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    activity: Rc<dyn ActivitySource>,
    watching: Cell<bool>,
    timer: RefCell<Option<TimerHandle>>,
}

#[derive(Clone)]
pub struct IdleMonitor {
    inner: Rc<IdleInner>,
}

impl IdleMonitor {
    pub fn new(
        kind: AppKind,
        timeout: Duration,
        session: Rc<SessionStore>,
        navigator: Rc<dyn Navigator>,
        scheduler: Rc<dyn Scheduler>,
        activity: Rc<dyn ActivitySource>,
    ) -> Self {
        Self {
            inner: Rc::new(IdleInner {
                kind,
                timeout,
                session,
                navigator,
                scheduler,
                activity,
                watching: Cell::new(false),
                timer: RefCell::new(None),
            }),
        }
    }

    pub fn is_watching(&self) -> bool {
        self.inner.watching.get()
    }

    pub fn start_watching(&self) {
        if self.inner.watching.get() {
            rearm(&self.inner);
            return;
        }
        self.inner.watching.set(true);
        rearm(&self.inner);

        let weak = Rc::downgrade(&self.inner);
        self.inner.activity.attach(
            ACTIVITY_EVENTS,
            Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    if inner.watching.get() {
                        rearm(&inner);
                    }
                }
            }),
        );
        log::info!(
            "⏱️ Idle monitor started ({} min)",
            self.inner.timeout.as_secs() / 60
        );
    }

    pub fn stop_watching(&self) {
        stop(&self.inner);
    }
}

fn rearm(inner: &Rc<IdleInner>) {
    // Drop the previous handle first so its timer is cancelled
    inner.timer.borrow_mut().take();
    let weak: Weak<IdleInner> = Rc::downgrade(inner);
    let handle = inner.scheduler.schedule(
        inner.timeout,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                on_idle(&inner);
            }
        }),
    );
    *inner.timer.borrow_mut() = Some(handle);
}

fn stop(inner: &IdleInner) {
    let handle = inner.timer.borrow_mut().take();
    drop(handle);
    if inner.watching.replace(false) {
        inner.activity.detach();
        log::info!("⏹️ Idle monitor stopped");
    }
}

fn on_idle(inner: &IdleInner) {
    if !inner.watching.get() {
        return;
    }
    log::warn!("💤 No activity for {} min, logging out", inner.timeout.as_secs() / 60);
    stop(inner);
    inner.session.clear();
    inner.navigator.navigate(inner.kind.login_route(false, true));
}
