// ============================================================================
// TEST DOUBLES - virtual time, scripted HTTP, recorded navigation
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use crate::error::{ApiError, Result};
use crate::routing::{Navigator, Route};
use crate::services::activity::ActivitySource;
use crate::services::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::services::scheduler::{Scheduler, TimerHandle};
use crate::state::StateNotifier;

// ----------------------------------------------------------------------------
// Scheduler with a manual clock
// ----------------------------------------------------------------------------

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct Timers {
    now: Duration,
    next_id: u64,
    pending: Vec<(Duration, u64, Task)>,
}

pub struct FakeScheduler {
    timers: Rc<RefCell<Timers>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl FakeScheduler {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            timers: Rc::new(RefCell::new(Timers::default())),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    pub fn now(&self) -> Duration {
        self.timers.borrow().now
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().pending.len()
    }

    /// Polls spawned tasks until none can make progress
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Moves the clock forward, firing due timers in order
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        self.run_until_stalled();
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let index = timers
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, (due, _, _))| *due <= target)
                    .min_by_key(|(_, (due, id, _))| (*due, *id))
                    .map(|(index, _)| index);
                index.map(|index| {
                    let (due, _, task) = timers.pending.remove(index);
                    timers.now = due;
                    task
                })
            };
            match next {
                Some(task) => {
                    task();
                    self.run_until_stalled();
                }
                None => break,
            }
        }
        self.timers.borrow_mut().now = target;
        self.run_until_stalled();
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
        let id = {
            let mut timers = self.timers.borrow_mut();
            let id = timers.next_id;
            timers.next_id += 1;
            let due = timers.now + delay;
            timers.pending.push((due, id, task));
            id
        };
        let weak = Rc::downgrade(&self.timers);
        TimerHandle::new(move || {
            if let Some(timers) = weak.upgrade() {
                let removed: Vec<_> = {
                    let mut timers = timers.borrow_mut();
                    let (removed, kept) = std::mem::take(&mut timers.pending)
                        .into_iter()
                        .partition(|(_, timer_id, _)| *timer_id == id);
                    timers.pending = kept;
                    removed
                };
                drop(removed);
            }
        })
    }

    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        self.spawner
            .spawn_local(future)
            .expect("local pool accepts tasks");
    }
}

// ----------------------------------------------------------------------------
// Activity events fired by hand
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct ManualActivity {
    listeners: RefCell<Vec<(String, Rc<dyn Fn()>)>>,
    attach_calls: Cell<usize>,
}

impl ManualActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls.get()
    }

    pub fn attached_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn fire_event(&self, kind: &str) {
        let matching: Vec<Rc<dyn Fn()>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _)| k == kind)
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in matching {
            callback();
        }
    }

    pub fn fire(&self) {
        self.fire_event("mousemove");
    }
}

impl ActivitySource for ManualActivity {
    fn attach(&self, kinds: &[&str], callback: Rc<dyn Fn()>) {
        self.attach_calls.set(self.attach_calls.get() + 1);
        let mut listeners = self.listeners.borrow_mut();
        for kind in kinds {
            listeners.push((kind.to_string(), callback.clone()));
        }
    }

    fn detach(&self) {
        self.listeners.borrow_mut().clear();
    }
}

// ----------------------------------------------------------------------------
// Navigation recorder
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNavigator {
    routes: RefCell<Vec<Route>>,
    redirects: RefCell<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.borrow().clone()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.borrow_mut().push(route);
    }

    fn redirect_external(&self, url: &str) {
        self.redirects.borrow_mut().push(url.to_string());
    }
}

// ----------------------------------------------------------------------------
// State change counter
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingNotifier {
    changes: Cell<usize>,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> usize {
        self.changes.get()
    }
}

impl StateNotifier for CountingNotifier {
    fn state_changed(&self) {
        self.changes.set(self.changes.get() + 1);
    }
}

// ----------------------------------------------------------------------------
// Scripted HTTP transport
// ----------------------------------------------------------------------------

enum Reply {
    Now(Result<HttpResponse>),
    Later(oneshot::Receiver<Result<HttpResponse>>),
}

/// Replies are matched by URL fragment first, then taken from the queue in order
#[derive(Default)]
pub struct ScriptedTransport {
    requests: RefCell<Vec<HttpRequest>>,
    queue: RefCell<VecDeque<Reply>>,
    routed: RefCell<Vec<(String, Reply)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: &str) {
        self.queue
            .borrow_mut()
            .push_back(Reply::Now(Ok(HttpResponse::new(status, body))));
    }

    pub fn reply_error(&self, error: ApiError) {
        self.queue.borrow_mut().push_back(Reply::Now(Err(error)));
    }

    /// The request stays outstanding until the returned sender is used
    pub fn reply_later(&self) -> oneshot::Sender<Result<HttpResponse>> {
        let (tx, rx) = oneshot::channel();
        self.queue.borrow_mut().push_back(Reply::Later(rx));
        tx
    }

    pub fn reply_for(&self, url_fragment: &str, status: u16, body: &str) {
        self.routed.borrow_mut().push((
            url_fragment.to_string(),
            Reply::Now(Ok(HttpResponse::new(status, body))),
        ));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }

    fn next_reply(&self, url: &str) -> Option<Reply> {
        let mut routed = self.routed.borrow_mut();
        if let Some(index) = routed.iter().position(|(fragment, _)| url.contains(fragment.as_str())) {
            return Some(routed.remove(index).1);
        }
        drop(routed);
        self.queue.borrow_mut().pop_front()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse>> {
        let reply = self.next_reply(&request.url);
        self.requests.borrow_mut().push(request);
        Box::pin(async move {
            match reply {
                Some(Reply::Now(result)) => result,
                Some(Reply::Later(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(ApiError::Network("reply dropped".to_string()))),
                None => Err(ApiError::Network("no scripted reply".to_string())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn timers_fire_in_due_order() {
        let scheduler = FakeScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (log.clone(), log.clone());
        let _late = scheduler.schedule(Duration::from_secs(5), Box::new(move || a.borrow_mut().push("late")));
        let _early = scheduler.schedule(Duration::from_secs(1), Box::new(move || b.borrow_mut().push("early")));
        scheduler.advance(Duration::from_secs(10));
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(scheduler.now(), Duration::from_secs(10));
    }

    #[test]
    fn dropped_handle_cancels() {
        let scheduler = FakeScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let handle = scheduler.schedule(Duration::from_secs(1), Box::new(move || flag.set(true)));
        drop(handle);
        scheduler.advance(Duration::from_secs(2));
        assert!(!fired.get());
    }

    #[test]
    fn scripted_transport_prefers_routed_replies() {
        let transport = ScriptedTransport::new();
        transport.reply(200, "queued");
        transport.reply_for("/vehicles", 200, "routed");
        let routed = block_on(transport.send(HttpRequest::get("http://api/vehicles/available"))).unwrap();
        let queued = block_on(transport.send(HttpRequest::get("http://api/other"))).unwrap();
        assert_eq!(routed.body, "routed");
        assert_eq!(queued.body, "queued");
        assert_eq!(transport.request_count(), 2);
    }
}
