use std::fmt;

/// Callback for board events: `(source_id, event_id)`.
pub type EventListener = Box<dyn FnMut(u32, u32) + Send>;
/// Callback run after each analog update.
pub type UpdateListener = Box<dyn FnMut() + Send>;

/// Handle returned by registration, used to remove a listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Ordered event and update listeners.
///
/// Listeners run synchronously in registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    event: Vec<(ListenerId, EventListener)>,
    update: Vec<(ListenerId, UpdateListener)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(u32, u32) + Send + 'static,
    {
        let id = self.allocate();
        self.event.push((id, Box::new(listener)));
        id
    }

    pub fn add_update_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut() + Send + 'static,
    {
        let id = self.allocate();
        self.update.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener of either kind. Returns false if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.event.len() + self.update.len();
        self.event.retain(|(entry, _)| *entry != id);
        self.update.retain(|(entry, _)| *entry != id);
        before != self.event.len() + self.update.len()
    }

    pub fn notify_event(&mut self, source_id: u32, event_id: u32) {
        for (_, listener) in &mut self.event {
            listener(source_id, event_id);
        }
    }

    pub fn notify_update(&mut self) {
        for (_, listener) in &mut self.update {
            listener();
        }
    }

    pub fn event_listener_count(&self) -> usize {
        self.event.len()
    }

    pub fn update_listener_count(&self) -> usize {
        self.update.len()
    }

    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("event_listeners", &self.event.len())
            .field("update_listeners", &self.update.len())
            .finish()
    }
}
