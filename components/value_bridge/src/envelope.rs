//! Marshalling of event envelopes into handler arguments.

use crate::{Bridge, MarshalError};
use host_types::{EnvelopePayload, EventEnvelope};
use rhai::{Array, Dynamic, Map};

/// Arguments of a `process_event(kind, payload)` call.
#[derive(Debug, Clone)]
pub struct NativeEvent {
    /// Event name, or `event-<id>` for unnamed kinds
    pub kind: String,
    /// Script-side payload
    pub payload: Dynamic,
}

impl Bridge {
    /// Marshal an envelope once per event; every context receives a clone.
    ///
    /// Client messages become an array of strings, property changes a map
    /// `#{ name, id, value }`, everything else `()`.
    pub fn marshal_envelope(&self, envelope: &EventEnvelope) -> Result<NativeEvent, MarshalError> {
        let payload = match &envelope.payload {
            EnvelopePayload::None => Dynamic::UNIT,
            EnvelopePayload::ClientMessage(message) => Dynamic::from_array(
                message
                    .args
                    .iter()
                    .map(|arg| Dynamic::from(arg.clone()))
                    .collect::<Array>(),
            ),
            EnvelopePayload::Property { id, name, value } => {
                let mut map = Map::new();
                map.insert("name".into(), Dynamic::from(name.clone()));
                map.insert("id".into(), Dynamic::from_int(i64::try_from(*id).unwrap_or(i64::MAX)));
                map.insert("value".into(), self.from_host(value)?);
                Dynamic::from_map(map)
            }
        };
        Ok(NativeEvent {
            kind: envelope.kind.script_name(),
            payload,
        })
    }
}
