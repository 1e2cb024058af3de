//! Property format conversions.

use host_types::{Format, HostErrorCode, HostResult, HostValue};

/// Read `stored` in the requested format.
pub(crate) fn read_as(stored: &HostValue, format: Format) -> HostResult<HostValue> {
    match format {
        Format::String | Format::OsdString => Ok(HostValue::String(stored.to_string())),
        Format::Node => Ok(stored.clone()),
        Format::Flag => match stored {
            HostValue::Flag(b) => Ok(HostValue::Flag(*b)),
            HostValue::String(s) => parse_flag(s).map(HostValue::Flag),
            _ => Err(HostErrorCode::PropertyFormat),
        },
        Format::Int64 => match stored {
            HostValue::Int64(n) => Ok(HostValue::Int64(*n)),
            HostValue::Double(n) => Ok(HostValue::Int64(*n as i64)),
            HostValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(HostValue::Int64)
                .map_err(|_| HostErrorCode::PropertyFormat),
            _ => Err(HostErrorCode::PropertyFormat),
        },
        Format::Double => match stored {
            HostValue::Double(n) => Ok(HostValue::Double(*n)),
            HostValue::Int64(n) => Ok(HostValue::Double(*n as f64)),
            HostValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(HostValue::Double)
                .map_err(|_| HostErrorCode::PropertyFormat),
            _ => Err(HostErrorCode::PropertyFormat),
        },
    }
}

/// Convert an incoming value so it keeps the type of `current`.
///
/// String writes are parsed into the current type; typed writes must match
/// the format they claim; node writes replace the value as given.
pub(crate) fn write_as(
    current: Option<&HostValue>,
    format: Format,
    value: &HostValue,
) -> HostResult<HostValue> {
    match (format, value) {
        (Format::Node, v) => Ok(v.clone()),
        (Format::String | Format::OsdString, HostValue::String(s)) => parse_like(current, s),
        (Format::Flag, HostValue::Flag(b)) => Ok(HostValue::Flag(*b)),
        (Format::Int64, HostValue::Int64(n)) => Ok(coerce_number(current, *n as f64, Some(*n))),
        (Format::Double, HostValue::Double(n)) => Ok(coerce_number(current, *n, None)),
        _ => Err(HostErrorCode::PropertyFormat),
    }
}

fn coerce_number(current: Option<&HostValue>, n: f64, exact: Option<i64>) -> HostValue {
    match current {
        Some(HostValue::Double(_)) => HostValue::Double(n),
        Some(HostValue::Int64(_)) => HostValue::Int64(exact.unwrap_or(n as i64)),
        _ => match exact {
            Some(i) => HostValue::Int64(i),
            None => HostValue::Double(n),
        },
    }
}

fn parse_like(current: Option<&HostValue>, text: &str) -> HostResult<HostValue> {
    match current {
        Some(HostValue::Flag(_)) => parse_flag(text).map(HostValue::Flag),
        Some(HostValue::Int64(_)) => text
            .trim()
            .parse::<i64>()
            .map(HostValue::Int64)
            .map_err(|_| HostErrorCode::PropertyFormat),
        Some(HostValue::Double(_)) => text
            .trim()
            .parse::<f64>()
            .map(HostValue::Double)
            .map_err(|_| HostErrorCode::PropertyFormat),
        _ => Ok(HostValue::String(text.to_string())),
    }
}

fn parse_flag(text: &str) -> HostResult<bool> {
    match text.trim() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(HostErrorCode::PropertyFormat),
    }
}
