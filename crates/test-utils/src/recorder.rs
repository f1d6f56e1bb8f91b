use std::sync::{Arc, Mutex};

use liveconfig::{Record, UpdateEvent, UpdateKind};

/// Collects update events delivered to a listener, in delivery order.
pub struct EventRecorder<R> {
    events: Arc<Mutex<Vec<UpdateEvent<R>>>>,
}

impl<R> Clone for EventRecorder<R> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

impl<R: Record> Default for EventRecorder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> EventRecorder<R> {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A listener closure that appends to this recorder.
    pub fn listener(&self) -> impl Fn(&UpdateEvent<R>) + Send + Sync + 'static + use<R> {
        let events = Arc::clone(&self.events);
        move |event: &UpdateEvent<R>| events.lock().unwrap().push(event.clone())
    }

    pub fn events(&self) -> Vec<UpdateEvent<R>> {
        self.events.lock().unwrap().clone()
    }

    /// `(kind, key)` pairs, which is what most assertions care about.
    pub fn summary(&self) -> Vec<(UpdateKind, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.kind, e.record.key().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}
