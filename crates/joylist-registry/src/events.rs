use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::types::InstanceId;

/// Device lifecycle notifications posted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A device was appended; `index` is its position in the device list.
    Added { index: usize },
    /// A device was removed.
    Removed { instance_id: InstanceId },
}

/// Event class, used for enabling or disabling delivery per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Added,
    Removed,
}

impl DeviceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DeviceEvent::Added { .. } => EventKind::Added,
            DeviceEvent::Removed { .. } => EventKind::Removed,
        }
    }
}

/// Consumer of device lifecycle notifications.
///
/// The registry only calls [`EventSink::push`] when the event kind is enabled
/// and the filter lets the event through.
pub trait EventSink {
    fn is_enabled(&self, _kind: EventKind) -> bool {
        true
    }

    fn filter(&self, _event: &DeviceEvent) -> bool {
        true
    }

    fn push(&mut self, event: DeviceEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn is_enabled(&self, _kind: EventKind) -> bool {
        false
    }

    fn push(&mut self, _event: DeviceEvent) {}
}

/// Receiving end for device events subscription.
pub type EventReceiver = Receiver<DeviceEvent>;

type EventFilter = Box<dyn Fn(&DeviceEvent) -> bool + Send>;

/// Channel-backed sink with per-kind enablement and an optional filter.
pub struct ChannelSink {
    tx: Sender<DeviceEvent>,
    added: bool,
    removed: bool,
    filter: Option<EventFilter>,
}

impl ChannelSink {
    /// Creates a sink with both event kinds enabled and no filter.
    pub fn new() -> (Self, EventReceiver) {
        let (tx, rx) = unbounded();
        let sink = Self {
            tx,
            added: true,
            removed: true,
            filter: None,
        };
        (sink, rx)
    }

    pub fn set_enabled(&mut self, kind: EventKind, enabled: bool) {
        match kind {
            EventKind::Added => self.added = enabled,
            EventKind::Removed => self.removed = enabled,
        }
    }

    /// Installs a predicate that can veto delivery by returning `false`.
    pub fn set_filter<F>(&mut self, filter: F)
    where
        F: Fn(&DeviceEvent) -> bool + Send + 'static,
    {
        self.filter = Some(Box::new(filter));
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }
}

impl EventSink for ChannelSink {
    fn is_enabled(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Added => self.added,
            EventKind::Removed => self.removed,
        }
    }

    fn filter(&self, event: &DeviceEvent) -> bool {
        self.filter.as_ref().map(|f| f(event)).unwrap_or(true)
    }

    fn push(&mut self, event: DeviceEvent) {
        // A dropped receiver only means nobody listens anymore.
        let _ = self.tx.send(event);
    }
}

/// Delivers `event` to `sink` if its kind is enabled and the filter agrees.
pub(crate) fn post(sink: &mut dyn EventSink, event: DeviceEvent) -> bool {
    if !sink.is_enabled(event.kind()) || !sink.filter(&event) {
        return false;
    }
    sink.push(event);
    true
}
