//! Unit tests for headless_host public API

use headless_host::{HeadlessHost, HostSetup};
use host_types::{EventKind, Format, Host, HostErrorCode, HostEvent, HostValue, InputFlags};
use std::time::Duration;

#[test]
fn test_command_log_records_client_and_args() {
    let host = HeadlessHost::new();
    let client = host.create_client("logger").unwrap();
    client.command(&["show-text", "hi", "1000"]).unwrap();
    client.command_string("print-text 'two words'").unwrap();

    let log = host.command_log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].client, "logger");
    assert_eq!(log[0].args, vec!["show-text", "hi", "1000"]);
    assert_eq!(log[1].args, vec!["print-text", "two words"]);
    assert_eq!(host.osd_messages(), vec!["hi"]);
    assert_eq!(host.terminal_output(), vec!["two words"]);
}

#[test]
fn test_failed_commands_are_counted_but_not_logged() {
    let host = HeadlessHost::new();
    let client = host.create_client("c").unwrap();
    assert_eq!(client.command(&["no-such-command"]), Err(HostErrorCode::Command));
    assert!(host.command_log().is_empty());
    assert_eq!(host.call_count(), 1);
}

#[test]
fn test_command_node_returns_result() {
    let host = HeadlessHost::new();
    let client = host.create_client("c").unwrap();
    let result = client
        .command_node(&HostValue::strings(&["expand-text", "${media-title}"]))
        .unwrap();
    assert_eq!(result, HostValue::String("${media-title}".into()));
}

#[test]
fn test_set_command_coerces_to_property_type() {
    let host = HeadlessHost::new();
    let client = host.create_client("c").unwrap();
    client.command(&["set", "volume", "55"]).unwrap();
    assert_eq!(host.property("volume"), Some(HostValue::Double(55.0)));
    assert_eq!(
        client.command(&["set", "pause", "perhaps"]),
        Err(HostErrorCode::PropertyFormat)
    );
    client.command(&["cycle", "pause"]).unwrap();
    assert_eq!(
        client.get_property("pause", Format::String).unwrap(),
        HostValue::String("yes".into())
    );
}

#[test]
fn test_quit_queues_shutdown() {
    let host = HeadlessHost::new();
    let client = host.create_client("c").unwrap();
    client.command(&["quit"]).unwrap();
    assert_eq!(host.wait_event(Duration::ZERO), HostEvent::shutdown());
}

#[test]
fn test_input_sections_are_recorded() {
    let host = HeadlessHost::new();
    let client = host.create_client("c").unwrap();
    client.define_input_section("sec", "loc", "\na ignore", false, "c");
    assert_eq!(host.input_section("sec").unwrap().enabled, None);
    client.enable_input_section("sec", InputFlags::ON_TOP);
    let section = host.input_section("sec").unwrap();
    assert_eq!(section.enabled, Some(InputFlags::ON_TOP));
    assert_eq!(section.location, "loc");

    client.enable_input_section("undefined", InputFlags::EXCLUSIVE);
    assert!(host.input_section("undefined").is_none());
}

#[test]
fn test_setup_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host.json");
    std::fs::write(
        &path,
        r#"{ "events": [{ "type": "property-change", "id": 2, "name": "volume", "value": 10 }] }"#,
    )
    .unwrap();
    let host = HostSetup::from_json_file(&path).unwrap().build();
    let event = host.wait_event(Duration::ZERO);
    assert_eq!(event.kind, EventKind::PropertyChange);
    assert_eq!(event.reply_userdata, 2);
}

#[test]
fn test_notify_no_active_client() {
    let host = HeadlessHost::new();
    assert!(!host.no_active_client_signalled());
    host.notify_no_active_client();
    assert!(host.no_active_client_signalled());
}
