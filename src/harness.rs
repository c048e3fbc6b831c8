use super::*;
use crate::events::HandlerFn;
use std::rc::Rc;

pub(crate) const DISPATCH_STACK_BYTES: usize = 32 * 1024 * 1024;

/// In-memory page: document tree, listener store, trace facility, and the
/// page-console sink where uncaught listener faults land.
#[derive(Debug)]
pub struct Harness {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) console_faults: Vec<String>,
    pub(crate) trace_state: TraceState,
}

impl Harness {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = crate::html::parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            console_faults: Vec::new(),
            trace_state: TraceState::default(),
        })
    }

    pub fn document(&self) -> NodeId {
        self.dom.root()
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.element_by_id(id)
    }

    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        handler: impl Fn(&mut Harness, &mut EventState) -> Result<()> + 'static,
    ) -> ListenerId {
        let handler: HandlerFn = Rc::new(handler);
        self.listeners
            .add(node, event_type.to_string(), capture, handler)
    }

    pub fn remove_event_listener(&mut self, listener: ListenerId) -> bool {
        self.listeners.remove(listener)
    }

    /// Dispatch a generic bubbling event on the element with the given id.
    pub fn dispatch(&mut self, id: &str, event_type: &str) -> Result<EventState> {
        let target = self
            .element_by_id(id)
            .ok_or_else(|| Error::TargetNotFound(id.to_string()))?;
        let event = EventState::new(event_type, target);
        Ok(stacker::grow(DISPATCH_STACK_BYTES, || {
            self.dispatch_event(event)
        }))
    }

    /// The trigger channel: fire a `simulate-input` custom event on the
    /// document, carrying `{ id, value }`. Fire-and-forget: the call
    /// returns even when the simulation faults, and the fault is
    /// observable only through `take_console_faults`.
    pub fn trigger_simulate_input(&mut self, id: &str, value: &str) {
        let document = self.document();
        let event = EventState::new_custom(
            SIMULATE_INPUT_EVENT,
            document,
            EventDetail {
                id: id.to_string(),
                value: value.to_string(),
            },
        );
        stacker::grow(DISPATCH_STACK_BYTES, || {
            self.dispatch_event(event);
        });
    }

    /// Synchronous dispatch: capture phase root-to-parent, target phase
    /// (capture listeners then bubble listeners), bubble phase
    /// parent-to-root. Nothing else runs until every listener invoked by
    /// this dispatch has returned.
    pub(crate) fn dispatch_event(&mut self, mut event: EventState) -> EventState {
        let target = event.target;
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        // Capture phase.
        if path.len() >= 2 {
            for node in &path[..path.len() - 1] {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, true);
                if event.propagation_stopped {
                    self.trace_event_done(&event, "propagation_stopped");
                    return event;
                }
            }
        }

        // Target phase: capture listeners first.
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true);
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return event;
        }

        self.invoke_listeners(target, &mut event, false);
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return event;
        }

        // Bubble phase.
        if event.bubbles && path.len() >= 2 {
            for node in path[..path.len() - 1].iter().rev() {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, false);
                if event.propagation_stopped {
                    self.trace_event_done(&event, "propagation_stopped");
                    return event;
                }
            }
        }

        self.trace_event_done(&event, "completed");
        event
    }

    fn invoke_listeners(&mut self, node: NodeId, event: &mut EventState, capture: bool) {
        let listeners = self.listeners.get(node, &event.event_type, capture);
        for listener in listeners {
            if self.trace_state.enabled {
                let phase = if capture { "capture" } else { "bubble" };
                let target_label = self.dom.describe_node(event.target);
                let current_label = self.dom.describe_node(event.current_target);
                self.trace_line(format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type, target_label, current_label, phase, event.default_prevented
                ));
            }
            if let Err(fault) = (listener.handler)(self, event) {
                // A fault in a page listener surfaces on the page console;
                // it never unwinds into the dispatching caller, and the
                // remaining listeners still run.
                self.report_uncaught_fault(&event.event_type, &fault);
            }
            if event.immediate_propagation_stopped {
                break;
            }
        }
    }

    fn report_uncaught_fault(&mut self, event_type: &str, fault: &Error) {
        let line = format!("uncaught fault in {event_type} listener: {fault}");
        self.trace_line(format!("[console] {line}"));
        self.console_faults.push(line);
    }

    pub fn take_console_faults(&mut self) -> Vec<String> {
        std::mem::take(&mut self.console_faults)
    }

    pub fn value(&self, id: &str) -> Result<String> {
        let node = self
            .element_by_id(id)
            .ok_or_else(|| Error::TargetNotFound(id.to_string()))?;
        self.dom.control_value(node)
    }

    pub fn assert_value(&self, id: &str, expected: &str) -> Result<()> {
        let actual = self.value(id)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                target: id.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if !self.trace_state.enabled {
            return;
        }
        if self.trace_state.to_stderr {
            eprintln!("{line}");
        }
        if self.trace_state.logs.len() >= self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        self.trace_state.logs.push_back(line);
    }

    fn trace_event_done(&mut self, event: &EventState, outcome: &str) {
        if !self.trace_state.enabled {
            return;
        }
        let target_label = self.dom.describe_node(event.target);
        let current_label = self.dom.describe_node(event.current_target);
        self.trace_line(format!(
            "[event] done {} target={} current={} outcome={} default_prevented={}",
            event.event_type, target_label, current_label, outcome, event.default_prevented
        ));
    }

    #[cfg(test)]
    pub(crate) fn all_form_control_values(&self) -> Vec<(String, String)> {
        self.dom.all_form_control_values()
    }
}

/// Stand-in for the extension's privileged context: it decides which
/// field to fill and sequences one trigger per character. Each trigger
/// replaces the field value, so after `fill_field` the field holds the
/// final character, the same contract as driving the page shim one
/// keystroke at a time.
#[derive(Debug, Default)]
pub struct ExtensionHost {
    triggers_sent: usize,
}

impl ExtensionHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_field(&mut self, page: &mut Harness, id: &str, text: &str) {
        for key in text.chars() {
            let mut buf = [0u8; 4];
            page.trigger_simulate_input(id, key.encode_utf8(&mut buf));
            self.triggers_sent += 1;
        }
    }

    pub fn triggers_sent(&self) -> usize {
        self.triggers_sent
    }
}
