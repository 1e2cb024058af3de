//! Property formats, log levels and input section flags.

use crate::ScriptError;
use std::fmt;
use std::str::FromStr;

/// Format a property is read or written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Raw string
    String,
    /// Human readable string for on-screen display
    OsdString,
    /// Boolean flag
    Flag,
    /// Signed 64 bit integer
    Int64,
    /// Double
    Double,
    /// Generic value tree
    Node,
}

impl Format {
    /// Numeric format code as used by the host client API.
    pub fn code(self) -> i64 {
        match self {
            Format::String => 1,
            Format::OsdString => 2,
            Format::Flag => 3,
            Format::Int64 => 4,
            Format::Double => 5,
            Format::Node => 6,
        }
    }

    /// Format for a numeric code in `1..=6`.
    pub fn from_code(code: i64) -> Result<Self, ScriptError> {
        match code {
            1 => Ok(Format::String),
            2 => Ok(Format::OsdString),
            3 => Ok(Format::Flag),
            4 => Ok(Format::Int64),
            5 => Ok(Format::Double),
            6 => Ok(Format::Node),
            other => Err(ScriptError::Parse(format!("invalid property format {}", other))),
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Format::String => "string",
            Format::OsdString => "osd-string",
            Format::Flag => "flag",
            Format::Int64 => "int64",
            Format::Double => "double",
            Format::Node => "native",
        }
    }
}

impl FromStr for Format {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Format::String),
            "osd-string" | "osd" => Ok(Format::OsdString),
            "flag" | "bool" => Ok(Format::Flag),
            "int64" | "int" => Ok(Format::Int64),
            "double" | "float" => Ok(Format::Double),
            "native" | "node" => Ok(Format::Node),
            other => Err(ScriptError::Parse(format!("invalid property format '{}'", other))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Message severity accepted by `log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Unrecoverable failure
    Fatal,
    /// Error
    Error,
    /// Warning
    Warn,
    /// Informational
    Info,
    /// Status line
    Status,
    /// Verbose
    Verbose,
    /// Debug
    Debug,
    /// Trace
    Trace,
}

impl LogLevel {
    /// Level name as scripts spell it.
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Status => "status",
            LogLevel::Verbose => "v",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fatal" => Ok(LogLevel::Fatal),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "status" => Ok(LogLevel::Status),
            "v" => Ok(LogLevel::Verbose),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ScriptError::Parse(format!("invalid log level '{}'", other))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flags for `enable_input_section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InputFlags(pub u32);

impl InputFlags {
    /// Do not fall through to other sections for unbound keys.
    pub const EXCLUSIVE: InputFlags = InputFlags(1);
    /// Prefer this section over others.
    pub const ON_TOP: InputFlags = InputFlags(2);
    /// Allow window dragging inside the mouse area.
    pub const ALLOW_VO_DRAGGING: InputFlags = InputFlags(4);
    /// Do not force the mouse pointer visible.
    pub const ALLOW_HIDE_CURSOR: InputFlags = InputFlags(8);

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: InputFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for InputFlags {
    type Output = InputFlags;

    fn bitor(self, rhs: InputFlags) -> InputFlags {
        InputFlags(self.0 | rhs.0)
    }
}
