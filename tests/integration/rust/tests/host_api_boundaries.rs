//! Host API Boundary Integration Tests
//!
//! Argument limits, value marshalling through the host and error mapping
//! as scripts see them.

use host_types::{HostValue, MAX_COMMAND_ARGS};
use integration_tests::Fixture;

fn args_script(count: usize) -> String {
    format!(
        r#"let args = ["ignore"];
           for i in 1..{} {{ args.push("arg" + i); }}
           try {{
               mp.commandv(args);
               mp.commandv("print-text", "ok");
           }} catch (err) {{
               mp.commandv("print-text", err.kind);
           }}
           fn process_event(kind, payload) {{}}"#,
        count
    )
}

/// Test: the largest accepted command reaches the host
#[test]
fn test_commandv_at_capacity_is_accepted() {
    let source = args_script(MAX_COMMAND_ARGS);
    let fixture = Fixture::new().script("full", &source);
    fixture.run();

    assert_eq!(fixture.host.terminal_output(), vec!["ok"]);
    let log = fixture.host.command_log();
    assert_eq!(log[0].args.len(), MAX_COMMAND_ARGS);
    assert_eq!(log[0].args[0], "ignore");
}

/// Test: one argument too many fails without calling the host
#[test]
fn test_commandv_over_capacity_makes_no_host_call() {
    let source = args_script(MAX_COMMAND_ARGS + 1);
    let fixture = Fixture::new().script("over", &source);
    fixture.run();

    assert_eq!(fixture.host.terminal_output(), vec!["CapacityError"]);
    let log = fixture.host.command_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].args, vec!["print-text", "CapacityError"]);
}

/// Test: non-string command arguments are rejected
#[test]
fn test_commandv_rejects_non_strings() {
    let fixture = Fixture::new().script(
        "typed",
        r#"try { mp.commandv(["show-text", 42]); } catch (err) { mp.commandv("print-text", err.kind); }
           fn process_event(kind, payload) {}"#,
    );
    fixture.run();
    assert_eq!(fixture.host.terminal_output(), vec!["ParseError"]);
}

/// Test: a nested value survives a trip through the host unchanged
#[test]
fn test_native_property_round_trip() {
    let fixture = Fixture::new().script(
        "roundtrip",
        r#"let v = #{ a: 1, b: [true, 2.5, "x", ()], c: #{ d: "e" } };
           mp.set_property_native("user-data/v", v);
           let back = mp.get_property_native("user-data/v");
           mp.commandv("print-text", if back == v { "same" } else { "different" });
           fn process_event(kind, payload) {}"#,
    );
    fixture.run();

    assert_eq!(fixture.host.terminal_output(), vec!["same"]);
    assert_eq!(
        fixture.host.property("user-data/v"),
        Some(HostValue::map([
            ("a", HostValue::Int64(1)),
            (
                "b",
                HostValue::Array(vec![
                    HostValue::Flag(true),
                    HostValue::Double(2.5),
                    HostValue::String("x".into()),
                    HostValue::None,
                ])
            ),
            ("c", HostValue::map([("d", HostValue::String("e".into()))])),
        ]))
    );
}

/// Test: typed reads and writes go through the host's formats
#[test]
fn test_typed_property_access() {
    let fixture = Fixture::new().script(
        "typed",
        r#"mp.set_property_float("volume", 55);
           mp.set_property("speed", "string", "1.5");
           mp.set_property_bool("pause", true);
           mp.commandv("print-text", mp.get_property("volume"));
           mp.commandv("print-text", type_of(mp.get_property_float("speed")));
           mp.commandv("print-text", mp.get_property_osd("pause"));
           try { mp.set_property_int("pause", "nope"); } catch (err) { mp.commandv("print-text", err.kind); }
           fn process_event(kind, payload) {}"#,
    );
    fixture.run();

    assert_eq!(
        fixture.host.terminal_output(),
        vec!["55.000000", "f64", "yes", "TypeMismatch"]
    );
    assert_eq!(fixture.host.property("speed"), Some(HostValue::Double(1.5)));
}

/// Test: config lookup returns a path or throws NotFound
#[test]
fn test_find_config_file() {
    let conf = tempfile::tempdir().unwrap();
    std::fs::write(conf.path().join("osc.conf"), "").unwrap();

    let fixture = Fixture::new().script(
        "config",
        r#"mp.commandv("print-text", mp.find_config_file("osc.conf"));
           try { mp.find_config_file("missing.conf"); } catch (err) { mp.commandv("print-text", err.kind); }
           fn process_event(kind, payload) {}"#,
    );
    fixture.host.add_config_dir(conf.path());
    fixture.run();

    let expected = conf.path().join("osc.conf").display().to_string();
    assert_eq!(fixture.host.terminal_output(), vec![expected, "NotFound".to_string()]);
}

/// Test: an invalid log level is a host error with a fixed message
#[test]
fn test_enable_messages_rejects_bad_level() {
    let fixture = Fixture::new().script(
        "levels",
        r#"mp.enable_messages("warn");
           try { mp.enable_messages("loud"); } catch (err) { mp.commandv("print-text", err.message); }
           fn process_event(kind, payload) {}"#,
    );
    fixture.run();

    assert_eq!(fixture.host.log_level("levels"), Some("warn".to_string()));
    let output = fixture.host.terminal_output();
    assert!(output[0].contains("Invalid log level"));
}
