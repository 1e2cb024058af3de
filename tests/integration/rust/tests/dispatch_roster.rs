//! Roster and Dispatch Integration Tests
//!
//! Loading several scripts, broadcasting events in roster order and
//! isolating failures between contexts.

use host_types::{ContextId, Format, Host, HostClient, HostEvent, HostValue, LogLevel};
use std::time::Duration;
use integration_tests::Fixture;
use script_host::{LoadError, RosterSlot, SubsystemError};

fn recorder(tag: &str) -> String {
    format!(
        r#"fn process_event(kind, payload) {{
               if kind == "client-message" {{
                   this.commandv("print-text", "{}:" + payload[0]);
               }}
           }}"#,
        tag
    )
}

/// Test: every event reaches every context, in roster order
#[test]
fn test_events_broadcast_in_roster_order() {
    let (c0, c1, c2) = (recorder("c0"), recorder("c1"), recorder("c2"));
    let fixture = Fixture::new()
        .script("c0", &c0)
        .script("c1", &c1)
        .script("c2", &c2);
    fixture.host.push_event(HostEvent::client_message(&["e1"]));
    fixture.host.push_event(HostEvent::client_message(&["e2"]));

    let report = fixture.run();

    assert_eq!(report.events, 2);
    assert_eq!(report.deliveries, 6);
    assert_eq!(
        fixture.host.terminal_output(),
        vec!["c0:e1", "c1:e1", "c2:e1", "c0:e2", "c1:e2", "c2:e2"]
    );
}

/// Test: the middle script lacks its hook, the others get every event
#[test]
fn test_missing_hook_compacts_roster() {
    let (first, last) = (recorder("first"), recorder("last"));
    let fixture = Fixture::new()
        .script("first", &first)
        .script("hookless", "let configured = true;")
        .script("last", &last);
    fixture.host.push_event(HostEvent::client_message(&["a"]));
    fixture.host.push_event(HostEvent::client_message(&["b"]));

    let subsystem = fixture.load().unwrap();
    assert_eq!(subsystem.roster().ids(), vec![ContextId(1), ContextId(3)]);
    assert_eq!(subsystem.roster().get(RosterSlot(1)).unwrap().name(), "last");
    assert_eq!(subsystem.failures().len(), 1);
    assert_eq!(subsystem.failures()[0].name, "hookless");
    assert!(matches!(
        subsystem.failures()[0].error,
        LoadError::MissingBinding { .. }
    ));

    fixture.host.set_shutdown_when_idle(true);
    subsystem.run();
    assert_eq!(
        fixture.host.terminal_output(),
        vec!["first:a", "last:a", "first:b", "last:b"]
    );
}

/// Test: a broken script is discarded, the rest keep their ids
#[test]
fn test_load_failure_is_isolated() {
    let good = recorder("good");
    let fixture = Fixture::new()
        .script("broken", "fn process_event(kind, payload) {")
        .script("good", &good);
    fixture.host.push_event(HostEvent::client_message(&["x"]));

    let subsystem = fixture.load().unwrap();
    assert_eq!(subsystem.roster().len(), 1);
    assert_eq!(subsystem.roster().ids(), vec![ContextId(2)]);
    assert_eq!(
        subsystem.roster().get(RosterSlot(0)).unwrap().name(),
        "good"
    );

    let failures = subsystem.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, ContextId(1));
    assert!(matches!(failures[0].error, LoadError::Compile { .. }));

    fixture.host.set_shutdown_when_idle(true);
    subsystem.run();
    assert_eq!(fixture.host.terminal_output(), vec!["good:x"]);
}

/// Test: a throwing handler does not keep later contexts from the event
#[test]
fn test_handler_failure_does_not_stop_broadcast() {
    let after = recorder("after");
    let fixture = Fixture::new()
        .script(
            "thrower",
            r#"fn process_event(kind, payload) {
                   if kind == "client-message" { throw "handler broke"; }
               }"#,
        )
        .script("after", &after);
    fixture.host.push_event(HostEvent::client_message(&["one"]));
    fixture.host.push_event(HostEvent::client_message(&["two"]));

    let report = fixture.run();

    assert_eq!(report.failures, 2);
    assert_eq!(fixture.host.terminal_output(), vec!["after:one", "after:two"]);
    let errors = fixture.sink.messages_at(LogLevel::Error);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("handler broke"));
}

/// Test: when nothing loads the host is told and no event is consumed
#[test]
fn test_total_failure_notifies_host() {
    let fixture = Fixture::new()
        .script("no_hook", "let answer = 42;")
        .script("also_no_hook", "fn helper() { 1 }");
    fixture.host.push_event(HostEvent::client_message(&["pending"]));

    let Err(SubsystemError::NoActiveClient {
        failures,
        mut manager,
    }) = fixture.load()
    else {
        panic!("expected total failure");
    };

    assert_eq!(failures.len(), 2);
    assert!(matches!(failures[0].error, LoadError::MissingBinding { .. }));
    assert!(matches!(failures[1].error, LoadError::MissingBinding { .. }));
    assert!(fixture.host.no_active_client_signalled());
    assert_eq!(fixture.host.pending_events(), 1);

    assert_eq!(
        manager.keep_alive().map(|context| context.id()),
        Some(ContextId::KEEP_ALIVE)
    );
    manager.shutdown(Default::default());
    assert!(manager.keep_alive().is_none());
}

/// Test: a discarded script's observers stop producing events
#[test]
fn test_discarded_script_observers_are_released() {
    let fixture = Fixture::new()
        .script("dead", r#"mp.observe_property("volume", "double", 9);"#)
        .script(
            "live",
            r#"fn process_event(kind, payload) {
                   if kind == "property-change" {
                       this.commandv("print-text", "id=" + payload.id);
                   }
               }"#,
        );

    let subsystem = fixture.load().unwrap();
    assert_eq!(subsystem.roster().ids(), vec![ContextId(2)]);
    while fixture.host.pending_events() > 0 {
        fixture.host.wait_event(Duration::ZERO);
    }

    let outsider = fixture.host.create_client("outsider").unwrap();
    outsider
        .set_property("volume", Format::Double, &HostValue::Double(30.0))
        .unwrap();
    assert_eq!(fixture.host.pending_events(), 0);

    fixture.host.set_shutdown_when_idle(true);
    let report = subsystem.run();
    assert_eq!(report.events, 0);
    assert!(fixture.host.terminal_output().is_empty());
}

/// Test: shutdown stops the loop before later events
#[test]
fn test_shutdown_stops_dispatch() {
    let only = recorder("only");
    let fixture = Fixture::new().script("only", &only);
    fixture.host.push_event(HostEvent::client_message(&["before"]));
    fixture.host.push_event(HostEvent::shutdown());
    fixture.host.push_event(HostEvent::client_message(&["after"]));

    let report = fixture.load().unwrap().run();

    assert_eq!(report.events, 1);
    assert_eq!(fixture.host.terminal_output(), vec!["only:before"]);
    assert_eq!(fixture.host.pending_events(), 1);
}
