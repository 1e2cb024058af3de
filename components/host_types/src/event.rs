//! Host events and the fixed event-name table.

use crate::HostValue;

/// Number of slots in the event-name table. Slots without a name are holes.
pub const EVENT_TABLE_LEN: u32 = 256;

/// Kind of a host event.
///
/// Ids follow the host client API numbering; ids without a variant are
/// carried as [`EventKind::Other`] and delivered without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Nothing happened (`wait_event` timed out)
    None,
    /// The host is shutting down
    Shutdown,
    /// Log message requested through `request_log_messages`
    LogMessage,
    /// Reply to an asynchronous property read
    GetPropertyReply,
    /// Reply to an asynchronous property write
    SetPropertyReply,
    /// Reply to an asynchronous command
    CommandReply,
    /// Playback of a file is about to start
    StartFile,
    /// Playback of a file ended
    EndFile,
    /// A file was loaded and playback starts
    FileLoaded,
    /// Message sent to a client with `script-message`
    ClientMessage,
    /// Video output reconfigured
    VideoReconfig,
    /// Audio output reconfigured
    AudioReconfig,
    /// A seek was initiated
    Seek,
    /// Playback restarted after a seek or file start
    PlaybackRestart,
    /// An observed property changed
    PropertyChange,
    /// Event queue overflowed
    QueueOverflow,
    /// A registered hook fired
    Hook,
    /// Any id without a dedicated variant
    Other(u32),
}

impl EventKind {
    /// Numeric id of this kind.
    pub fn id(self) -> u32 {
        match self {
            EventKind::None => 0,
            EventKind::Shutdown => 1,
            EventKind::LogMessage => 2,
            EventKind::GetPropertyReply => 3,
            EventKind::SetPropertyReply => 4,
            EventKind::CommandReply => 5,
            EventKind::StartFile => 6,
            EventKind::EndFile => 7,
            EventKind::FileLoaded => 8,
            EventKind::ClientMessage => 16,
            EventKind::VideoReconfig => 17,
            EventKind::AudioReconfig => 18,
            EventKind::Seek => 20,
            EventKind::PlaybackRestart => 21,
            EventKind::PropertyChange => 22,
            EventKind::QueueOverflow => 24,
            EventKind::Hook => 25,
            EventKind::Other(id) => id,
        }
    }

    /// Kind for a numeric id.
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => EventKind::None,
            1 => EventKind::Shutdown,
            2 => EventKind::LogMessage,
            3 => EventKind::GetPropertyReply,
            4 => EventKind::SetPropertyReply,
            5 => EventKind::CommandReply,
            6 => EventKind::StartFile,
            7 => EventKind::EndFile,
            8 => EventKind::FileLoaded,
            16 => EventKind::ClientMessage,
            17 => EventKind::VideoReconfig,
            18 => EventKind::AudioReconfig,
            20 => EventKind::Seek,
            21 => EventKind::PlaybackRestart,
            22 => EventKind::PropertyChange,
            24 => EventKind::QueueOverflow,
            25 => EventKind::Hook,
            other => EventKind::Other(other),
        }
    }

    /// Table name of this kind, `None` for holes.
    pub fn name(self) -> Option<&'static str> {
        event_name(self.id())
    }

    /// Name passed to script handlers: the table name, or `event-<id>`.
    pub fn script_name(self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("event-{}", self.id()),
        }
    }

    /// Find a kind by name with a linear scan over the event table.
    ///
    /// # Examples
    ///
    /// ```
    /// use host_types::EventKind;
    ///
    /// assert_eq!(EventKind::from_name("client-message"), Some(EventKind::ClientMessage));
    /// assert_eq!(EventKind::from_name("no-such-event"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        (0..EVENT_TABLE_LEN)
            .find(|&n| event_name(n) == Some(name))
            .map(EventKind::from_id)
    }
}

/// Name of the event at slot `id` of the event table.
pub fn event_name(id: u32) -> Option<&'static str> {
    let name = match id {
        0 => "none",
        1 => "shutdown",
        2 => "log-message",
        3 => "get-property-reply",
        4 => "set-property-reply",
        5 => "command-reply",
        6 => "start-file",
        7 => "end-file",
        8 => "file-loaded",
        16 => "client-message",
        17 => "video-reconfig",
        18 => "audio-reconfig",
        20 => "seek",
        21 => "playback-restart",
        22 => "property-change",
        24 => "queue-overflow",
        25 => "hook",
        _ => return None,
    };
    Some(name)
}

/// Data attached to a raw host event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventData {
    /// No data
    #[default]
    None,
    /// Arguments of a client message
    ClientMessage(Vec<String>),
    /// Property name and value
    Property {
        /// Property name
        name: String,
        /// Current value, in the format it was observed with
        value: HostValue,
    },
}

/// Raw event as returned by the host's `wait_event`.
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    /// Event kind
    pub kind: EventKind,
    /// Subscription or request id the event answers, 0 if none
    pub reply_userdata: u64,
    /// Attached data
    pub data: EventData,
}

impl HostEvent {
    /// Event without data.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            reply_userdata: 0,
            data: EventData::None,
        }
    }

    /// Timeout event returned when nothing happened.
    pub fn idle() -> Self {
        Self::new(EventKind::None)
    }

    /// Shutdown event.
    pub fn shutdown() -> Self {
        Self::new(EventKind::Shutdown)
    }

    /// Client message with the given arguments.
    pub fn client_message<S: AsRef<str>>(args: &[S]) -> Self {
        Self {
            kind: EventKind::ClientMessage,
            reply_userdata: 0,
            data: EventData::ClientMessage(args.iter().map(|s| s.as_ref().to_string()).collect()),
        }
    }

    /// Property change for subscription `id`.
    pub fn property_change(id: u64, name: &str, value: HostValue) -> Self {
        Self {
            kind: EventKind::PropertyChange,
            reply_userdata: id,
            data: EventData::Property {
                name: name.to_string(),
                value,
            },
        }
    }
}

/// Arguments of a client message, as delivered to scripts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientMessage {
    /// Ordered message arguments
    pub args: Vec<String>,
}

/// Payload of a marshalled event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnvelopePayload {
    /// Inert notification
    #[default]
    None,
    /// Structured client message
    ClientMessage(ClientMessage),
    /// Property change
    Property {
        /// Subscription id the change answers
        id: u64,
        /// Property name
        name: String,
        /// New value
        value: HostValue,
    },
}

/// Event as delivered to every context in the roster.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    /// Event kind
    pub kind: EventKind,
    /// Payload
    pub payload: EnvelopePayload,
}

impl EventEnvelope {
    /// Build the envelope for a raw host event.
    ///
    /// Only client messages and property changes carry payload; every
    /// other kind passes through as `(kind, None)`.
    pub fn from_event(event: &HostEvent) -> Self {
        let payload = match (event.kind, &event.data) {
            (EventKind::ClientMessage, EventData::ClientMessage(args)) => {
                EnvelopePayload::ClientMessage(ClientMessage { args: args.clone() })
            }
            (EventKind::PropertyChange, EventData::Property { name, value }) => {
                EnvelopePayload::Property {
                    id: event.reply_userdata,
                    name: name.clone(),
                    value: value.clone(),
                }
            }
            _ => EnvelopePayload::None,
        };
        Self {
            kind: event.kind,
            payload,
        }
    }
}
