//! Error taxonomy shared across the scripting subsystem.
//!
//! [`ScriptError`] is what a single Host API call can fail with; it is raised
//! to the calling script only. [`HostErrorCode`] is the negative status the
//! host reports, before the binding turns it into message text.

use thiserror::Error;

/// Failure of a single call made by a script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// Malformed call arguments
    #[error("parse error: {0}")]
    Parse(String),
    /// Value could not be marshalled, including the depth limit
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Negative result from the host, carrying its own message text
    #[error("{0}")]
    Host(String),
    /// Missing config file or property
    #[error("not found: {0}")]
    NotFound(String),
    /// Argument count over a fixed bound
    #[error("too many arguments: {given} given, at most {max} allowed")]
    Capacity {
        /// Number of arguments supplied
        given: usize,
        /// Fixed maximum
        max: usize,
    },
    /// The calling context does not hold the baton
    #[error("host call made outside the owning context's turn")]
    Inactive,
}

impl ScriptError {
    /// Short taxonomy name, exposed to scripts as `e.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptError::Parse(_) => "ParseError",
            ScriptError::TypeMismatch(_) => "TypeMismatch",
            ScriptError::Host(_) => "HostError",
            ScriptError::NotFound(_) => "NotFound",
            ScriptError::Capacity { .. } => "CapacityError",
            ScriptError::Inactive => "ContractViolation",
        }
    }
}

/// Negative status codes returned by the host client API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostErrorCode {
    /// Event ringbuffer is full
    EventQueueFull,
    /// Memory allocation failed
    NoMem,
    /// Core not initialized
    Uninitialized,
    /// Invalid or unsupported parameter
    InvalidParameter,
    /// Property does not exist
    PropertyNotFound,
    /// Property exists but the format is not supported
    PropertyFormat,
    /// Property exists but is currently unavailable
    PropertyUnavailable,
    /// Error setting or getting a property
    PropertyError,
    /// General error when running a command
    Command,
    /// Operation is not supported
    Unsupported,
    /// Feature is not implemented
    NotImplemented,
    /// Unspecified error
    Generic,
}

impl HostErrorCode {
    /// Numeric code as the host reports it.
    pub fn code(self) -> i32 {
        match self {
            HostErrorCode::EventQueueFull => -1,
            HostErrorCode::NoMem => -2,
            HostErrorCode::Uninitialized => -3,
            HostErrorCode::InvalidParameter => -4,
            HostErrorCode::PropertyNotFound => -8,
            HostErrorCode::PropertyFormat => -9,
            HostErrorCode::PropertyUnavailable => -10,
            HostErrorCode::PropertyError => -11,
            HostErrorCode::Command => -12,
            HostErrorCode::Unsupported => -18,
            HostErrorCode::NotImplemented => -19,
            HostErrorCode::Generic => -20,
        }
    }

    /// Reverse of [`HostErrorCode::code`]; unknown codes map to `Generic`.
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => HostErrorCode::EventQueueFull,
            -2 => HostErrorCode::NoMem,
            -3 => HostErrorCode::Uninitialized,
            -4 => HostErrorCode::InvalidParameter,
            -8 => HostErrorCode::PropertyNotFound,
            -9 => HostErrorCode::PropertyFormat,
            -10 => HostErrorCode::PropertyUnavailable,
            -11 => HostErrorCode::PropertyError,
            -12 => HostErrorCode::Command,
            -18 => HostErrorCode::Unsupported,
            -19 => HostErrorCode::NotImplemented,
            _ => HostErrorCode::Generic,
        }
    }

    /// Default message text. Hosts may override it through `error_string`.
    pub fn default_message(self) -> &'static str {
        match self {
            HostErrorCode::EventQueueFull => "event queue full",
            HostErrorCode::NoMem => "memory allocation failed",
            HostErrorCode::Uninitialized => "core not initialized",
            HostErrorCode::InvalidParameter => "invalid parameter",
            HostErrorCode::PropertyNotFound => "property not found",
            HostErrorCode::PropertyFormat => "unsupported format for accessing property",
            HostErrorCode::PropertyUnavailable => "property unavailable",
            HostErrorCode::PropertyError => "error accessing property",
            HostErrorCode::Command => "error running command",
            HostErrorCode::Unsupported => "not supported",
            HostErrorCode::NotImplemented => "operation not implemented",
            HostErrorCode::Generic => "something happened",
        }
    }
}

/// Result of a call into the host client API.
pub type HostResult<T> = Result<T, HostErrorCode>;
