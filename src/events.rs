use super::*;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Payload carried by the `simulate-input` trigger event: the id of the
/// field to fill and the key to type into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetail {
    pub id: String,
    pub value: String,
}

/// The two deprecated numeric accessors (`keyCode` and `which`) on
/// keyboard events. The standard construction path leaves both fixed at
/// zero; dispatching code that needs page scripts to observe a real code
/// must install an accessor override on the constructed event first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyKeyCode {
    /// Constructor default: both accessors read zero.
    Constructed,
    /// Override installed before dispatch: both accessors read the
    /// supplied code.
    Overridden(u32),
}

impl LegacyKeyCode {
    fn get(self) -> u32 {
        match self {
            Self::Constructed => 0,
            Self::Overridden(code) => code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventState {
    pub event_type: String,
    pub target: NodeId,
    pub current_target: NodeId,
    pub bubbles: bool,
    pub cancelable: bool,
    pub is_trusted: bool,
    pub default_prevented: bool,
    pub key: Option<String>,
    pub detail: Option<EventDetail>,
    legacy_code: LegacyKeyCode,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
}

impl EventState {
    /// Generic bubbling, cancelable event with no key data. Everything
    /// dispatched through the harness is script-constructed, so it is
    /// never trusted.
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            bubbles: true,
            cancelable: true,
            is_trusted: false,
            default_prevented: false,
            key: None,
            detail: None,
            legacy_code: LegacyKeyCode::Constructed,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    pub fn new_keyboard(event_type: &str, target: NodeId, key: &str) -> Self {
        let mut event = Self::new(event_type, target);
        event.key = Some(key.to_string());
        event
    }

    pub fn new_custom(event_type: &str, target: NodeId, detail: EventDetail) -> Self {
        let mut event = Self::new(event_type, target);
        event.detail = Some(detail);
        event
    }

    pub fn key_code(&self) -> u32 {
        self.legacy_code.get()
    }

    pub fn which(&self) -> u32 {
        self.legacy_code.get()
    }

    pub fn legacy_code(&self) -> LegacyKeyCode {
        self.legacy_code
    }

    pub fn override_legacy_code(&mut self, code: u32) {
        self.legacy_code = LegacyKeyCode::Overridden(code);
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }
}

pub(crate) type HandlerFn = Rc<dyn Fn(&mut Harness, &mut EventState) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) usize);

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) capture: bool,
    pub(crate) handler: HandlerFn,
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub(crate) struct ListenerStore {
    pub(crate) map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
    next_id: usize,
}

impl ListenerStore {
    pub(crate) fn add(
        &mut self,
        node_id: NodeId,
        event: String,
        capture: bool,
        handler: HandlerFn,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default()
            .push(Listener {
                id,
                capture,
                handler,
            });
        id
    }

    pub(crate) fn remove(&mut self, listener_id: ListenerId) -> bool {
        let mut removed = false;
        self.map.retain(|_, events| {
            events.retain(|_, listeners| {
                if let Some(pos) = listeners
                    .iter()
                    .position(|listener| listener.id == listener_id)
                {
                    listeners.remove(pos);
                    removed = true;
                }
                !listeners.is_empty()
            });
            !events.is_empty()
        });
        removed
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn count(&self, node_id: NodeId, event: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: false,
        }
    }
}
