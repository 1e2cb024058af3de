//! Callback Integration Tests
//!
//! Key bindings, script messages and per-context extension state across
//! the host round trip.

use host_types::{HostEvent, InputFlags};
use integration_tests::Fixture;

const SILENT_HOOK: &str = "fn process_event(kind, payload) {}";

/// Test: a key press reaches only the script that bound the key
#[test]
fn test_key_binding_routes_to_owner() {
    let fixture = Fixture::new()
        .script(
            "owner",
            &format!(
                r#"mp.add_binding("ctrl+k", "kill", "on_kill");
                   fn on_kill() {{ this.commandv("print-text", "owner:" + this.name); }}
                   {SILENT_HOOK}"#
            ),
        )
        .script(
            "bystander",
            &format!(
                r#"mp.add_binding((), "kill", "on_kill");
                   fn on_kill() {{ this.commandv("print-text", "bystander"); }}
                   fn flush() {{ this.command("keypress ctrl+k"); }}
                   {SILENT_HOOK}"#
            ),
        );

    fixture.run();

    assert_eq!(fixture.host.terminal_output(), vec!["owner:owner"]);
    assert!(fixture.host.input_section("script_bystander_kbs").is_none());
}

/// Test: builtin and regular bindings land in separate sections
#[test]
fn test_binding_sections_and_generated_names() {
    let fixture = Fixture::new().script(
        "sections",
        &format!(
            r#"let first = mp.add_binding("a", (), true, "noop");
               let second = mp.add_binding("b", (), false, "noop");
               mp.commandv("print-text", first);
               mp.commandv("print-text", second);
               fn noop() {{}}
               {SILENT_HOOK}"#
        ),
    );

    fixture.run();

    assert_eq!(
        fixture.host.terminal_output(),
        vec!["__keybinding1", "__keybinding2"]
    );
    let builtin = fixture.host.input_section("script_sections_kbs_builtin").unwrap();
    assert!(builtin.builtin);
    assert_eq!(builtin.contents, "\na script-binding sections_____keybinding1");
    assert_eq!(builtin.enabled, Some(InputFlags::ON_TOP));

    let regular = fixture.host.input_section("script_sections_kbs").unwrap();
    assert!(!regular.builtin);
    assert_eq!(regular.owner, "sections");
    assert_eq!(regular.location, "script_sections_bs");
}

/// Test: script-message commands from one script reach another's callback
#[test]
fn test_script_message_between_scripts() {
    let fixture = Fixture::new()
        .script(
            "listener",
            &format!(
                r#"mp.register_script_message("ping", "on_ping");
                   fn on_ping(args) {{ this.commandv("print-text", "pong " + args[0]); }}
                   {SILENT_HOOK}"#
            ),
        )
        .script(
            "sender",
            &format!(
                r#"fn flush() {{ this.commandv("script-message-to", "listener", "ping", "42"); }}
                   {SILENT_HOOK}"#
            ),
        );

    fixture.run();

    assert_eq!(fixture.host.terminal_output(), vec!["pong 42"]);
}

/// Test: the extension slot keeps state between events, per context
#[test]
fn test_extension_slot_accumulates() {
    let counter = r#"
        fn process_event(kind, payload) {
            if kind != "client-message" { return; }
            let seen = this["seen"];
            if type_of(seen) == "()" { seen = []; }
            seen.push(payload[0]);
            this["seen"] = seen;
            if payload[0] == "last" {
                this.commandv("print-text", this.name + "=" + seen.len());
            }
        }
    "#;
    let fixture = Fixture::new().script("left", counter).script("right", counter);
    for word in ["one", "two", "last"] {
        fixture.host.push_event(HostEvent::client_message(&[word]));
    }

    fixture.run();

    assert_eq!(fixture.host.terminal_output(), vec!["left=3", "right=3"]);
}

/// Test: a flush hook runs after the bindings are defined
#[test]
fn test_flush_sees_defined_bindings() {
    let fixture = Fixture::new().script(
        "early",
        &format!(
            r#"mp.add_binding("x", "ex", "on_ex");
               fn on_ex() {{ this.commandv("print-text", "ex fired"); }}
               fn flush() {{
                   this.command("keypress x");
                   this.commandv("print-text", "flushed");
               }}
               {SILENT_HOOK}"#
        ),
    );

    fixture.run();

    assert_eq!(fixture.host.terminal_output(), vec!["flushed", "ex fired"]);
}
