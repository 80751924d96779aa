//! Ready-signal bus
//!
//! A small named-event bus used to announce that a scheduler exists, so
//! dependents can defer their own setup until it does. `bootstrap` builds a
//! scheduler as soon as the bus itself reports ready.

use indexmap::IndexMap;
use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use crate::config::TickrConfig;
use crate::error::Result;
use crate::host::Host;
use crate::scheduler::FrameScheduler;

/// Listener invoked with the name of the dispatched event.
pub type Listener = Rc<dyn Fn(&str)>;

/// Handle returned by `on`, used with `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Event announcing a scheduler for `namespace`.
pub fn scheduler_ready_event(namespace: &str) -> String {
    format!("{}.Scheduler.ready", namespace)
}

/// Shared slot a bootstrapped scheduler lands in.
pub type SchedulerSlot = Rc<OnceCell<FrameScheduler>>;

/// Named-event bus scoped to a namespace.
pub struct EventBus {
    namespace: String,
    ready: Cell<bool>,
    next_id: Cell<u64>,
    listeners: RefCell<IndexMap<String, Vec<(ListenerId, Listener)>>>,
}

impl EventBus {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ready: Cell::new(false),
            next_id: Cell::new(1),
            listeners: RefCell::new(IndexMap::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Event fired once when the bus becomes ready.
    pub fn ready_event(&self) -> String {
        format!("{}.EventBus.ready", self.namespace)
    }

    /// Event fired once a scheduler has been created on this bus.
    pub fn scheduler_ready_event(&self) -> String {
        scheduler_ready_event(&self.namespace)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// Mark the bus ready and announce it. Repeated calls do nothing.
    pub fn mark_ready(&self) {
        if self.ready.replace(true) {
            return;
        }
        log::debug!("Event bus '{}' ready", self.namespace);
        self.dispatch(&self.ready_event());
    }

    pub fn on(&self, event: &str, listener: impl Fn(&str) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    /// Listen for a single occurrence of `event`.
    pub fn once(self: &Rc<Self>, event: &str, listener: impl FnOnce(&str) + 'static) -> ListenerId {
        let pending = RefCell::new(Some(listener));
        let bus = Rc::downgrade(self);
        let own_id: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let own = Rc::clone(&own_id);
        let id = self.on(event, move |name| {
            if let (Some(bus), Some(id)) = (bus.upgrade(), own.get()) {
                bus.off(id);
            }
            if let Some(listener) = pending.borrow_mut().take() {
                listener(name);
            }
        });
        own_id.set(Some(id));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        for entries in listeners.values_mut() {
            if let Some(pos) = entries.iter().position(|(lid, _)| *lid == id) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    /// Call every listener registered for `event`. Returns how many ran.
    pub fn dispatch(&self, event: &str) -> usize {
        let listeners: Vec<Listener> = match self.listeners.borrow().get(event) {
            Some(entries) => entries.iter().map(|(_, l)| Rc::clone(l)).collect(),
            None => Vec::new(),
        };
        log::trace!("Dispatching '{}' to {} listeners", event, listeners.len());
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }
}

/// Create a scheduler once `bus` is ready and announce it.
///
/// If the bus is already ready the scheduler is built now and any error is
/// returned. Otherwise construction waits for the bus's ready event, and a
/// failure at that point is logged. The scheduler-ready event is named after
/// `config.namespace`; dependents read the returned slot once it fires.
pub fn bootstrap<H: Host + 'static>(host: Rc<H>, config: TickrConfig, bus: &Rc<EventBus>) -> Result<SchedulerSlot> {
    let slot: SchedulerSlot = Rc::new(OnceCell::new());
    let announce = scheduler_ready_event(&config.namespace);
    if config.namespace != bus.namespace() {
        log::warn!(
            "Config namespace '{}' differs from bus namespace '{}', announcing '{}'",
            config.namespace,
            bus.namespace(),
            announce
        );
    }

    if bus.is_ready() {
        let scheduler = FrameScheduler::with_config(host, &config)?;
        install(&slot, scheduler, bus, &announce);
        return Ok(slot);
    }

    log::debug!("Event bus not ready, deferring scheduler until '{}'", bus.ready_event());
    let deferred = Rc::clone(&slot);
    let weak_bus = Rc::downgrade(bus);
    bus.once(&bus.ready_event(), move |_| {
        let Some(bus) = weak_bus.upgrade() else {
            return;
        };
        match FrameScheduler::with_config(host, &config) {
            Ok(scheduler) => install(&deferred, scheduler, &bus, &announce),
            Err(e) => log::error!("Deferred scheduler creation failed: {}", e),
        }
    });
    Ok(slot)
}

fn install(slot: &SchedulerSlot, scheduler: FrameScheduler, bus: &EventBus, event: &str) {
    if slot.set(scheduler).is_err() {
        log::warn!("Scheduler slot already filled, keeping existing scheduler");
        return;
    }
    bus.dispatch(event);
}
