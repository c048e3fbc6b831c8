use input_simulator::{Harness, InputSimulator};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseResult};

const SIMULATOR_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/simulator_property_fuzz_test.txt";
const DEFAULT_SIMULATOR_PROPTEST_CASES: u32 = 128;

const LOGIN_PAGE: &str = r#"
    <form id='login'>
      <input id='user' type='text'>
      <input id='pw' type='password'>
    </form>
    "#;

#[derive(Clone, Debug)]
enum Trigger {
    Fill { key: char },
    MissingTarget { key: char },
}

fn simulator_proptest_cases() -> u32 {
    std::env::var("INPUT_SIMULATOR_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SIMULATOR_PROPTEST_CASES)
}

fn trigger_strategy() -> BoxedStrategy<Trigger> {
    prop_oneof![
        5 => any::<char>().prop_map(|key| Trigger::Fill { key }),
        1 => any::<char>().prop_map(|key| Trigger::MissingTarget { key }),
    ]
    .boxed()
}

fn trigger_sequence_strategy() -> BoxedStrategy<Vec<Trigger>> {
    vec(trigger_strategy(), 1..=24).boxed()
}

fn first_code_unit(key: char) -> u32 {
    let mut buf = [0u16; 2];
    u32::from(key.encode_utf16(&mut buf)[0])
}

fn assert_trigger_sequence_is_stable(triggers: &[Trigger]) -> TestCaseResult {
    let mut page = Harness::from_html(LOGIN_PAGE)
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;
    let _simulator = InputSimulator::install(&mut page);

    let mut last_filled = None;
    let mut expected_faults = 0usize;

    for (step, trigger) in triggers.iter().enumerate() {
        let mut buf = [0u8; 4];
        match trigger {
            Trigger::Fill { key } => {
                page.trigger_simulate_input("pw", key.encode_utf8(&mut buf));
                last_filled = Some(*key);
            }
            Trigger::MissingTarget { key } => {
                page.trigger_simulate_input("missing", key.encode_utf8(&mut buf));
                expected_faults += 1;
            }
        }

        let pw_value = page.value("pw").map_err(|err| {
            proptest::test_runner::TestCaseError::fail(format!(
                "pw unreadable after step {step}: {trigger:?}, {err:?}"
            ))
        })?;
        let expected = last_filled
            .map(|key| key.to_string())
            .unwrap_or_default();
        prop_assert_eq!(
            pw_value,
            expected,
            "wrong pw value after step {}: {:?}, triggers={:?}",
            step,
            trigger,
            triggers
        );
    }

    // Other fields never mutate and faults match the missing-target count.
    prop_assert_eq!(page.value("user").unwrap_or_default(), "");
    prop_assert_eq!(page.take_console_faults().len(), expected_faults);
    Ok(())
}

fn assert_single_char_codes_hold(key: char) -> TestCaseResult {
    let mut page = Harness::from_html(LOGIN_PAGE)
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;
    let expected_code = first_code_unit(key);

    let pw = page.element_by_id("pw").ok_or_else(|| {
        proptest::test_runner::TestCaseError::fail("pw missing from fixture".to_string())
    })?;
    let codes = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    for event_type in ["keydown", "keypress", "keyup"] {
        let codes = std::rc::Rc::clone(&codes);
        page.add_event_listener(pw, event_type, false, move |_, event| {
            codes.borrow_mut().push((event.key_code(), event.which()));
            Ok(())
        });
    }

    let mut buf = [0u8; 4];
    let key_str = key.encode_utf8(&mut buf);
    page.simulate_input_by_id("pw", key_str)
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;

    prop_assert_eq!(page.value("pw").unwrap_or_default(), key.to_string());
    prop_assert_eq!(
        codes.borrow().clone(),
        vec![
            (expected_code, expected_code),
            (expected_code, expected_code),
            (expected_code, expected_code),
        ]
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: simulator_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(SIMULATOR_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn trigger_sequences_keep_the_page_consistent(triggers in trigger_sequence_strategy()) {
        assert_trigger_sequence_is_stable(&triggers)?;
    }

    #[test]
    fn every_single_char_reports_its_first_code_unit(key in any::<char>()) {
        assert_single_char_codes_hold(key)?;
    }
}
