use super::*;
use std::cell::RefCell;
use std::rc::Rc;


type EventLog = Rc<RefCell<Vec<String>>>;

/// Subscribe to every event type the keystroke sequence produces and
/// record what arrives, in order. Keyboard entries carry key and the
/// legacy code both accessors report.
fn record_events(page: &mut Harness, node: NodeId) -> EventLog {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    for event_type in [
        "focus", "keydown", "keypress", "keyup", "blur", "change", "input",
    ] {
        let log = Rc::clone(&log);
        page.add_event_listener(node, event_type, false, move |_, event| {
            let entry = match &event.key {
                Some(key) => format!("{}({},{})", event.event_type, key, event.key_code()),
                None => event.event_type.clone(),
            };
            log.borrow_mut().push(entry);
            Ok(())
        });
    }
    log
}

#[test]
fn direct_call_fills_password_field() -> Result<()> {
    let html = r#"
        <form id='login'>
          <input id='user' type='text'>
          <input id='pw' type='password'>
        </form>
        "#;

    let mut page = Harness::from_html(html)?;
    page.simulate_input_by_id("pw", "x")?;
    page.assert_value("pw", "x")?;
    page.assert_value("user", "")?;
    Ok(())
}

#[test]
fn trigger_channel_fills_password_field() -> Result<()> {
    let mut page = Harness::from_html(r#"<input id='pw' type='password'>"#)?;
    let _simulator = InputSimulator::install(&mut page);
    page.trigger_simulate_input("pw", "x");
    page.assert_value("pw", "x")?;
    assert!(page.take_console_faults().is_empty());
    Ok(())
}

#[test]
fn assert_value_reports_expected_and_actual() -> Result<()> {
    let mut page = Harness::from_html(r#"<input id='pw'>"#)?;
    page.simulate_input_by_id("pw", "a")?;
    match page.assert_value("pw", "b") {
        Err(Error::AssertionFailed {
            target,
            expected,
            actual,
        }) => {
            assert_eq!(target, "pw");
            assert_eq!(expected, "b");
            assert_eq!(actual, "a");
        }
        other => panic!("expected assertion failure, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn trace_logs_capture_the_keystroke_sequence_when_enabled() -> Result<()> {
    let mut page = Harness::from_html(r#"<input id='pw'>"#)?;
    let _simulator = InputSimulator::install(&mut page);

    // Disabled by default: nothing is collected.
    page.trigger_simulate_input("pw", "x");
    assert!(page.take_trace_logs().is_empty());

    page.set_trace(true);
    page.trigger_simulate_input("pw", "y");
    let logs = page.take_trace_logs();
    assert!(
        logs.iter()
            .any(|line| line.contains("[simulate]") && line.contains("\"pw\"")),
        "missing simulate line in {logs:?}"
    );
    assert!(
        logs.iter()
            .any(|line| line.contains("[event] done keydown")),
        "missing keydown completion in {logs:?}"
    );
    Ok(())
}
