//! Unit tests for host_types public API

use host_types::*;

mod value_tests {
    use super::*;

    #[test]
    fn test_get_on_non_map_is_none() {
        assert_eq!(HostValue::Int64(3).get("a"), None);
    }

    #[test]
    fn test_insert_ignored_on_non_map() {
        let mut value = HostValue::Array(vec![]);
        value.insert("a", HostValue::None);
        assert_eq!(value, HostValue::Array(vec![]));
    }

    #[test]
    fn test_strings_helper() {
        let value = HostValue::strings(&["show-text", "hi"]);
        assert_eq!(
            value,
            HostValue::Array(vec![
                HostValue::String("show-text".into()),
                HostValue::String("hi".into())
            ])
        );
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(HostValue::from(true), HostValue::Flag(true));
        assert_eq!(HostValue::from(4i64), HostValue::Int64(4));
        assert_eq!(HostValue::from("x"), HostValue::String("x".into()));
    }
}

mod event_tests {
    use super::*;

    #[test]
    fn test_request_names_are_bounded_by_table() {
        assert_eq!(EventKind::from_name("shutdown"), Some(EventKind::Shutdown));
        assert_eq!(EventKind::from_name("property-change"), Some(EventKind::PropertyChange));
        assert_eq!(EventKind::from_name(""), None);
        assert!(EventKind::Hook.id() < EVENT_TABLE_LEN);
    }

    #[test]
    fn test_other_ids_roundtrip() {
        let kind = EventKind::from_id(200);
        assert_eq!(kind, EventKind::Other(200));
        assert_eq!(kind.id(), 200);
        assert_eq!(kind.name(), None);
    }

    #[test]
    fn test_client_message_envelope() {
        let envelope = EventEnvelope::from_event(&HostEvent::client_message(&["a", "b"]));
        assert_eq!(
            envelope.payload,
            EnvelopePayload::ClientMessage(ClientMessage {
                args: vec!["a".into(), "b".into()]
            })
        );
    }

    #[test]
    fn test_shutdown_envelope_is_inert() {
        let envelope = EventEnvelope::from_event(&HostEvent::shutdown());
        assert_eq!(envelope.kind, EventKind::Shutdown);
        assert_eq!(envelope.payload, EnvelopePayload::None);
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_capacity_message() {
        let err = ScriptError::Capacity {
            given: MAX_COMMAND_ARGS + 1,
            max: MAX_COMMAND_ARGS,
        };
        assert_eq!(err.to_string(), "too many arguments: 50 given, at most 49 allowed");
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(HostErrorCode::PropertyNotFound.default_message(), "property not found");
        assert_eq!(HostErrorCode::Command.code(), -12);
    }
}

mod descriptor_tests {
    use super::*;

    #[test]
    fn test_display_names_identity() {
        let d = ScriptDescriptor::new("/tmp/autoload.rhai", ContextId(4));
        assert_eq!(d.to_string(), "#4 autoload (/tmp/autoload.rhai)");
    }
}
