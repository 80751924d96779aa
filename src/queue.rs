//! Queue Registry - named buckets of frame callbacks
//!
//! Each queue maps identifiers to callbacks in registration order. The first
//! registration under an identifier wins; later ones are ignored.

use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

use crate::signal::Signal;

/// A registered frame callback.
pub type Callback = Rc<dyn Fn()>;

/// The three named queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueKind {
    /// Runs on every tick
    #[default]
    Default,
    /// Runs when the scroll offset changed since the last tick
    Scroll,
    /// Runs when the viewport size changed since the last tick
    Resize,
}

impl QueueKind {
    /// All queues, in dispatch order.
    pub const ALL: [QueueKind; 3] = [QueueKind::Default, QueueKind::Scroll, QueueKind::Resize];

    /// Parse a queue name case-insensitively. Unknown names map to `Default`.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "scroll" => QueueKind::Scroll,
            "resize" => QueueKind::Resize,
            _ => QueueKind::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueKind::Default => "default",
            QueueKind::Scroll => "scroll",
            QueueKind::Resize => "resize",
        }
    }

    fn index(&self) -> usize {
        match self {
            QueueKind::Default => 0,
            QueueKind::Scroll => 1,
            QueueKind::Resize => 2,
        }
    }
}

impl From<&str> for QueueKind {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<Option<&str>> for QueueKind {
    fn from(name: Option<&str>) -> Self {
        name.map(Self::parse).unwrap_or_default()
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named bucket of callbacks with an activation flag and the last signal it saw.
pub struct Queue {
    kind: QueueKind,
    active: bool,
    previous_signal: Signal,
    container: IndexMap<String, Callback>,
}

impl Queue {
    /// Create an empty, active queue.
    ///
    /// Scroll and resize queues start from a zero signal, so the first
    /// non-zero sample fires them.
    pub fn new(kind: QueueKind) -> Self {
        let previous_signal = match kind {
            QueueKind::Default => Signal::None,
            QueueKind::Scroll => Signal::Scroll(Default::default()),
            QueueKind::Resize => Signal::Resize(Default::default()),
        };
        Self {
            kind,
            active: true,
            previous_signal,
            container: IndexMap::new(),
        }
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn previous_signal(&self) -> Signal {
        self.previous_signal
    }

    /// Record `current` if it differs from the previous signal.
    ///
    /// Returns true when the queue should fire.
    pub fn observe(&mut self, current: Signal) -> bool {
        if !self.previous_signal.differs_from(&current) {
            return false;
        }
        if current != Signal::None {
            self.previous_signal = current;
        }
        true
    }

    /// Store `callback` under `id` unless the id is already taken.
    ///
    /// Returns true if the callback was stored.
    pub fn insert(&mut self, id: String, callback: Callback) -> bool {
        if self.container.contains_key(&id) {
            return false;
        }
        self.container.insert(id, callback);
        true
    }

    /// Remove the callback under `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> bool {
        self.container.shift_remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.container.contains_key(id)
    }

    /// Whether `id` still maps to this exact callback.
    pub fn holds(&self, id: &str, callback: &Callback) -> bool {
        self.container.get(id).is_some_and(|current| Rc::ptr_eq(current, callback))
    }

    pub fn get(&self, id: &str) -> Option<&Callback> {
        self.container.get(id)
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    /// Registered identifiers in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.container.keys().cloned().collect()
    }

    /// Copy of the registration table for iteration while the queue may change.
    pub fn snapshot(&self) -> Vec<(String, Callback)> {
        self.container
            .iter()
            .map(|(id, callback)| (id.clone(), Rc::clone(callback)))
            .collect()
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("kind", &self.kind)
            .field("active", &self.active)
            .field("previous_signal", &self.previous_signal)
            .field("ids", &self.container.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The three queues owned by a scheduler.
#[derive(Debug)]
pub struct QueueSet {
    queues: [Queue; 3],
}

impl QueueSet {
    pub fn new() -> Self {
        Self {
            queues: QueueKind::ALL.map(Queue::new),
        }
    }

    pub fn get(&self, kind: QueueKind) -> &Queue {
        &self.queues[kind.index()]
    }

    pub fn get_mut(&mut self, kind: QueueKind) -> &mut Queue {
        &mut self.queues[kind.index()]
    }
}

impl Default for QueueSet {
    fn default() -> Self {
        Self::new()
    }
}
