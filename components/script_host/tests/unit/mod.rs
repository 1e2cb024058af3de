//! Unit tests for script_host public API

use headless_host::HeadlessHost;
use host_types::{ContextId, Format, HostEvent, InputFlags, LogLevel, ScriptDescriptor, ScriptError};
use rhai::INT;
use script_host::{
    CaptureSink, LifecycleManager, LoadError, LogSink, ScriptingConfig, ScriptingSubsystem,
    SubsystemError,
};
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

fn write_scripts(scripts: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = scripts
        .iter()
        .map(|(name, source)| {
            let path = dir.path().join(format!("{}.rhai", name));
            std::fs::write(&path, source).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

fn manager_with(host: &HeadlessHost, sink: &CaptureSink, config: ScriptingConfig) -> LifecycleManager {
    let sink = sink.clone();
    LifecycleManager::new(Rc::new(host.clone()), config)
        .unwrap()
        .with_sink_factory(move |_| -> Rc<dyn LogSink> { Rc::new(sink.clone()) })
}

fn load(
    host: &HeadlessHost,
    sink: &CaptureSink,
    scripts: &[(&str, &str)],
) -> Result<ScriptingSubsystem, SubsystemError> {
    let (_dir, paths) = write_scripts(scripts);
    let manager = manager_with(host, sink, ScriptingConfig::default());
    ScriptingSubsystem::load(manager, &ScriptDescriptor::for_paths(&paths))
}

fn run(host: &HeadlessHost, scripts: &[(&str, &str)]) -> (Vec<String>, CaptureSink) {
    let sink = CaptureSink::new();
    host.set_shutdown_when_idle(true);
    let subsystem = load(host, &sink, scripts).unwrap();
    subsystem.run();
    (host.terminal_output(), sink)
}

const ECHO: &str = r#"
fn process_event(kind, payload) {
    if kind == "client-message" {
        this.commandv("print-text", payload[0]);
    }
}
"#;

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_top_level_sees_api_and_client_name() {
    let host = HeadlessHost::new();
    let (output, _) = run(
        &host,
        &[(
            "hello",
            r#"mp.commandv("print-text", client_name);
               fn process_event(kind, payload) {}"#,
        )],
    );
    assert_eq!(output, vec!["hello"]);
}

#[test]
fn test_missing_hook_discards_script() {
    let host = HeadlessHost::new();
    let sink = CaptureSink::new();
    let result = load(&host, &sink, &[("lazy", "let x = 1;")]);

    let Err(SubsystemError::NoActiveClient { failures, manager }) = result else {
        panic!("expected total failure");
    };
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0].error, LoadError::MissingBinding { .. }));
    assert!(host.no_active_client_signalled());
    assert_eq!(manager.keep_alive().map(|c| c.id()), Some(ContextId(0)));
}

#[test]
fn test_top_level_throw_is_execute_failure() {
    let host = HeadlessHost::new();
    let sink = CaptureSink::new();
    let subsystem = load(
        &host,
        &sink,
        &[
            ("boom", r#"throw "boom at load";"#),
            ("fine", "fn process_event(kind, payload) {}"),
        ],
    )
    .unwrap();

    assert_eq!(subsystem.roster().ids(), vec![ContextId(2)]);
    let failure = &subsystem.failures()[0];
    assert_eq!(failure.id, ContextId(1));
    match &failure.error {
        LoadError::Execute { message, .. } => assert!(message.contains("boom at load")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_functions_are_isolated_per_context() {
    let host = HeadlessHost::new();
    host.push_event(HostEvent::client_message(&["x"]));
    let tagged = |tag: &str| {
        format!(
            r#"fn tag() {{ "{}" }}
               fn process_event(kind, payload) {{
                   if kind == "client-message" {{ this.commandv("print-text", tag()); }}
               }}"#,
            tag
        )
    };
    let a = tagged("A");
    let b = tagged("B");
    let (output, _) = run(&host, &[("a", a.as_str()), ("b", b.as_str())]);
    assert_eq!(output, vec!["A", "B"]);
}

// ============================================================================
// Host API
// ============================================================================

#[test]
fn test_host_errors_are_catchable() {
    let host = HeadlessHost::new();
    let (output, _) = run(
        &host,
        &[(
            "catcher",
            r#"
            let kind = "";
            try { mp.get_property("no-such-property"); } catch (err) { kind = err.kind; }
            mp.commandv("print-text", kind);

            let args = [];
            for i in 0..50 { args.push("x"); }
            try { mp.commandv(args); } catch (err) { kind = err.kind; }
            mp.commandv("print-text", kind);

            fn process_event(kind, payload) {}
            "#,
        )],
    );
    assert_eq!(output, vec!["NotFound", "CapacityError"]);
}

#[test]
fn test_unknown_event_name_returns_unit() {
    let host = HeadlessHost::new();
    let (output, _) = run(
        &host,
        &[(
            "events",
            r#"mp.commandv("print-text", type_of(mp.request_event("no-such-event", true)));
               mp.commandv("print-text", type_of(mp.request_event("file-loaded", true)));
               fn process_event(kind, payload) {}"#,
        )],
    );
    assert_eq!(output, vec!["()", "bool"]);
    assert_eq!(host.requested_events("events").len(), 1);
}

#[test]
fn test_observed_property_delivers_initial_value() {
    let host = HeadlessHost::new();
    let (output, _) = run(
        &host,
        &[(
            "watch",
            r#"mp.observe_property("volume", "double", 3);
               fn process_event(kind, payload) {
                   if kind == "property-change" && payload.id == 3 {
                       this.commandv("print-text", payload.name + "=" + payload.value);
                   }
               }"#,
        )],
    );
    assert_eq!(output, vec!["volume=100.0"]);
}

#[test]
fn test_api_outside_baton_is_rejected() {
    let host = HeadlessHost::new();
    let manager = LifecycleManager::new(Rc::new(host.clone()), ScriptingConfig::default()).unwrap();
    let context = manager
        .create(&ScriptDescriptor::new("/nowhere/idle.rhai", ContextId(1)))
        .unwrap();
    let calls = host.call_count();
    assert!(matches!(
        context.api().get_property("volume", Format::Double),
        Err(ScriptError::Inactive)
    ));
    assert_eq!(host.call_count(), calls);
}

#[test]
fn test_log_and_print_reach_sink() {
    let host = HeadlessHost::new();
    let (_, sink) = run(
        &host,
        &[(
            "chatty",
            r#"mp.info("ready", 1);
               mp.log("debug", "details");
               print("printed");
               fn process_event(kind, payload) {}"#,
        )],
    );
    assert_eq!(sink.messages_at(LogLevel::Info), vec!["ready 1", "printed"]);
    assert_eq!(sink.messages_at(LogLevel::Debug), vec!["details"]);
}

// ============================================================================
// Callbacks
// ============================================================================

#[test]
fn test_key_binding_fires_callback() {
    let host = HeadlessHost::new();
    let (output, _) = run(
        &host,
        &[(
            "keys",
            r#"mp.add_binding("ctrl+a", "press", "on_press");
               fn flush() { this.command("keypress ctrl+a"); }
               fn on_press() { this.commandv("print-text", "pressed"); }
               fn process_event(kind, payload) {}"#,
        )],
    );
    assert_eq!(output, vec!["pressed"]);

    let section = host.input_section("script_keys_kbs").unwrap();
    assert_eq!(section.contents, "\nctrl+a script-binding keys___press");
    assert_eq!(section.location, "script_keys_bs");
    assert_eq!(section.enabled, Some(InputFlags::ON_TOP));
    assert!(host.input_section("script_keys_kbs_builtin").is_none());
}

#[test]
fn test_script_message_callback_gets_remaining_args() {
    let host = HeadlessHost::new();
    host.push_event(HostEvent::client_message(&["greet", "world", "again"]));
    let (output, _) = run(
        &host,
        &[(
            "greeter",
            r#"mp.register_script_message("greet", "on_greet");
               fn on_greet(args) { this.commandv("print-text", args[0] + "/" + args.len()); }
               fn process_event(kind, payload) {}"#,
        )],
    );
    assert_eq!(output, vec!["world/2"]);
}

#[test]
fn test_failing_callback_does_not_block_process_event() {
    let host = HeadlessHost::new();
    host.push_event(HostEvent::client_message(&["boom"]));
    let (output, sink) = run(
        &host,
        &[(
            "fragile",
            r#"mp.register_script_message("boom", "on_boom");
               fn on_boom(args) { throw "callback broke"; }
               fn process_event(kind, payload) { this.commandv("print-text", kind); }"#,
        )],
    );
    assert_eq!(output, vec!["client-message"]);
    let errors = sink.messages_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("on_boom failed"));
}

#[test]
fn test_handler_failure_is_isolated() {
    let host = HeadlessHost::new();
    host.push_event(HostEvent::client_message(&["one"]));
    let sink = CaptureSink::new();
    host.set_shutdown_when_idle(true);
    let subsystem = load(
        &host,
        &sink,
        &[
            ("broken", r#"fn process_event(kind, payload) { throw "nope"; }"#),
            ("echo", ECHO),
        ],
    )
    .unwrap();
    let report = subsystem.run();

    assert_eq!(report.events, 1);
    assert_eq!(report.failures, 1);
    assert_eq!(report.deliveries, 1);
    assert_eq!(host.terminal_output(), vec!["one"]);
}

// ============================================================================
// Extension slot and statistics
// ============================================================================

#[test]
fn test_extension_slot_is_per_context() {
    let host = HeadlessHost::new();
    let counter = r#"
        fn process_event(kind, payload) {
            let count = this["count"];
            if type_of(count) == "()" { count = 0; }
            this["count"] = count + 1;
        }
    "#;
    let sink = CaptureSink::new();
    let mut subsystem = load(&host, &sink, &[("a", counter), ("b", "fn process_event(kind, payload) {}")]).unwrap();

    subsystem.dispatch(&HostEvent::client_message(&["tick"]));
    subsystem.dispatch(&HostEvent::client_message(&["tick"]));

    let contexts: Vec<_> = subsystem.roster().iter().collect();
    assert_eq!(contexts[0].api().extension_get("count").as_int().unwrap(), 2 as INT);
    assert!(contexts[1].api().extension_get("count").is_unit());
}

#[test]
fn test_stats_count_events_and_calls() {
    let host = HeadlessHost::new();
    let sink = CaptureSink::new();
    let (_dir, paths) = write_scripts(&[("echo", ECHO)]);
    let manager = manager_with(&host, &sink, ScriptingConfig::default().with_stats(true));
    let mut subsystem = ScriptingSubsystem::load(manager, &ScriptDescriptor::for_paths(&paths)).unwrap();

    subsystem.dispatch(&HostEvent::client_message(&["a"]));
    subsystem.dispatch(&HostEvent::idle());

    let stats = subsystem.roster().iter().next().unwrap().api().stats().unwrap();
    assert_eq!(stats.events, 1);
    assert_eq!(stats.host_calls, 1);
}
