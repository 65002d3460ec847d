//! Publish/subscribe registry owned by one grid instance.
//!
//! Listeners are registered per [`EventKind`] and receive the event payload by
//! reference. The registry lives inside the grid and is cleared on destroy;
//! there is no global bus.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use slotmap::{new_key_type, SlotMap};

use crate::layout::FrameLayout;
use crate::types::{ChangeItem, Row, RowKey};
use crate::validation::ValidationError;

new_key_type! {
    /// Handle returned by [`EventBus::on`]; pass it to [`EventBus::off`].
    pub struct ListenerId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A full frame was laid out (overlay included)
    Draw,
    /// A frame was laid out with the overlay layer skipped
    DrawView,
    SelectionChange,
    Change,
    ExpandChange,
    ValidationChange,
    Scroll,
    Loading,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Draw,
        EventKind::DrawView,
        EventKind::SelectionChange,
        EventKind::Change,
        EventKind::ExpandChange,
        EventKind::ValidationChange,
        EventKind::Scroll,
        EventKind::Loading,
        EventKind::Error,
    ];

    /// Event name as used by the JS host.
    pub fn name(self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::DrawView => "drawView",
            Self::SelectionChange => "selectionChange",
            Self::Change => "change",
            Self::ExpandChange => "expandChange",
            Self::ValidationChange => "validationChange",
            Self::Scroll => "scroll",
            Self::Loading => "loading",
            Self::Error => "error",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current row selection, resolved to concrete rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    /// Whether the select-all flag is active
    pub all: bool,
    pub keys: Vec<RowKey>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone)]
pub enum GridEvent {
    Draw(Rc<FrameLayout>),
    DrawView(Rc<FrameLayout>),
    SelectionChange(SelectionSnapshot),
    Change(Vec<ChangeItem>),
    ExpandChange { row_key: RowKey, expanded: bool },
    /// Active validation errors after a run or an explicit update
    ValidationChange(Vec<ValidationError>),
    Scroll { x: f32, y: f32 },
    Loading(bool),
    Error(String),
}

impl GridEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Draw(_) => EventKind::Draw,
            Self::DrawView(_) => EventKind::DrawView,
            Self::SelectionChange(_) => EventKind::SelectionChange,
            Self::Change(_) => EventKind::Change,
            Self::ExpandChange { .. } => EventKind::ExpandChange,
            Self::ValidationChange(_) => EventKind::ValidationChange,
            Self::Scroll { .. } => EventKind::Scroll,
            Self::Loading(_) => EventKind::Loading,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// Payload as JSON, for hosts that cannot take Rust values.
    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Draw(frame) | Self::DrawView(frame) => serde_json::to_value(frame.as_ref()),
            Self::SelectionChange(snapshot) => serde_json::to_value(snapshot),
            Self::Change(items) => serde_json::to_value(items),
            Self::ExpandChange { row_key, expanded } => Ok(serde_json::json!({
                "rowKey": row_key,
                "expanded": expanded,
            })),
            Self::ValidationChange(errors) => serde_json::to_value(errors),
            Self::Scroll { x, y } => Ok(serde_json::json!({ "x": x, "y": y })),
            Self::Loading(loading) => Ok(serde_json::Value::Bool(*loading)),
            Self::Error(message) => Ok(serde_json::Value::String(message.clone())),
        }
    }
}

pub type Listener = Rc<dyn Fn(&GridEvent)>;

#[derive(Default)]
pub struct EventBus {
    listeners: SlotMap<ListenerId, (EventKind, Listener)>,
    // Slots are reused after `off`, so slot order is not registration order.
    order: Vec<ListenerId>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&GridEvent) + 'static,
    {
        let id = self.listeners.insert((kind, Rc::new(listener)));
        self.order.push(id);
        id
    }

    /// Remove a listener. Returns `false` if `id` is unknown or was registered
    /// for a different kind.
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        match self.listeners.get(id) {
            Some((registered, _)) if *registered == kind => {
                self.listeners.remove(id);
                self.order.retain(|other| *other != id);
                true
            }
            _ => false,
        }
    }

    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.listeners.values().any(|(k, _)| *k == kind)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Call every listener of the event's kind, in registration order.
    pub fn emit(&self, event: &GridEvent) {
        let kind = event.kind();
        let targets: Vec<Listener> = self
            .order
            .iter()
            .filter_map(|id| self.listeners.get(*id))
            .filter(|(k, _)| *k == kind)
            .map(|(_, l)| Rc::clone(l))
            .collect();
        tracing::trace!(event = %kind, listeners = targets.len(), "emit");
        for listener in targets {
            listener(event);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
        self.order.clear();
    }
}
