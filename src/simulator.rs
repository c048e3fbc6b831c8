use super::*;

/// Name of the custom trigger event the extension dispatches on the
/// document to request one simulated keystroke.
pub const SIMULATE_INPUT_EVENT: &str = "simulate-input";

/// `charCodeAt(0)` equivalent: first UTF-16 code unit of the key, used
/// for the legacy numeric accessors. An empty key has none.
pub(crate) fn first_utf16_code_unit(key: &str) -> Option<u32> {
    key.encode_utf16().next().map(u32::from)
}

pub(crate) fn new_basic_event(event_type: &str, target: NodeId) -> EventState {
    EventState::new(event_type, target)
}

/// Keyboard event carrying the key. Construction cannot set the legacy
/// `keyCode`/`which` accessors (they stay at zero), so the override is
/// installed on the constructed event before it is dispatched.
pub(crate) fn new_keyboard_event(
    event_type: &str,
    target: NodeId,
    key: &str,
) -> Result<EventState> {
    let key_code = first_utf16_code_unit(key)
        .ok_or_else(|| Error::MalformedDetail("empty value, no key code to derive".into()))?;
    let mut event = EventState::new_keyboard(event_type, target, key);
    event.override_legacy_code(key_code);
    Ok(event)
}

/// Replay one keystroke against the target so page listeners observe it
/// as typing: focus, keydown, keypress, value write, keyup, blur, change,
/// input, in that order, synchronously. A failing step aborts the rest
/// of the sequence.
pub(crate) fn simulate_input(page: &mut Harness, target: NodeId, key: &str) -> Result<()> {
    page.dispatch_event(new_basic_event("focus", target));
    page.dispatch_event(new_keyboard_event("keydown", target, key)?);
    page.dispatch_event(new_keyboard_event("keypress", target, key)?);
    page.dom.set_value(target, key)?;
    page.dispatch_event(new_keyboard_event("keyup", target, key)?);
    page.dispatch_event(new_basic_event("blur", target));
    page.dispatch_event(new_basic_event("change", target));
    page.dispatch_event(new_basic_event("input", target));
    Ok(())
}

impl Harness {
    /// Request/response variant of the trigger channel: runs the same
    /// keystroke sequence but reports lookup and payload failures to the
    /// caller instead of the page console.
    pub fn simulate_input_by_id(&mut self, id: &str, value: &str) -> Result<()> {
        let target = self
            .element_by_id(id)
            .ok_or_else(|| Error::TargetNotFound(id.to_string()))?;
        stacker::grow(crate::harness::DISPATCH_STACK_BYTES, || {
            simulate_input(self, target, value)
        })
    }
}

/// The page-context shim: one document-level subscription to
/// `simulate-input`, created at install and removed at uninstall. Each
/// trigger resolves `detail.id` and replays the keystroke sequence; a
/// trigger whose id resolves to nothing faults for that invocation only,
/// leaving the subscription registered for later triggers.
#[derive(Debug)]
pub struct InputSimulator {
    listener: ListenerId,
}

impl InputSimulator {
    pub fn install(page: &mut Harness) -> Self {
        let document = page.document();
        let listener = page.add_event_listener(document, SIMULATE_INPUT_EVENT, false, on_trigger);
        Self { listener }
    }

    /// Page teardown. Returns false if the subscription was already gone.
    pub fn uninstall(self, page: &mut Harness) -> bool {
        page.remove_event_listener(self.listener)
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }
}

fn on_trigger(page: &mut Harness, event: &mut EventState) -> Result<()> {
    let detail = event
        .detail
        .clone()
        .ok_or_else(|| Error::MalformedDetail("simulate-input event carries no detail".into()))?;
    // Diagnostic only; disabled unless tracing is on.
    page.trace_line(format!(
        "[simulate] sending key {:?} to input {:?}",
        detail.value, detail.id
    ));
    let target = page
        .element_by_id(&detail.id)
        .ok_or_else(|| Error::TargetNotFound(detail.id.clone()))?;
    simulate_input(page, target, &detail.value)
}
