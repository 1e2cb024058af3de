//! The headless command engine.
//!
//! Supports the subset of player commands that scripts and tests rely on.
//! Every command that succeeds is appended to the command log.

use crate::host::{CommandRecord, HostState};
use crate::properties;
use host_types::{Format, HostErrorCode, HostEvent, HostResult, HostValue, InputFlags};

/// Nested `keypress` resolution stops after this many hops.
const MAX_KEY_HOPS: usize = 8;

/// Split a command line into arguments.
///
/// Whitespace separates arguments; single or double quotes group them.
pub(crate) fn split_command(line: &str) -> HostResult<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_arg = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_arg = true;
            }
            None if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if quote.is_some() {
        return Err(HostErrorCode::InvalidParameter);
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

/// Arguments of a command given as a node.
///
/// Arrays list the arguments in order; maps carry `name` plus an optional
/// `args` array.
pub(crate) fn node_args(node: &HostValue) -> HostResult<Vec<String>> {
    match node {
        HostValue::Array(items) => Ok(items.iter().map(|v| v.to_string()).collect()),
        HostValue::Map(_) => {
            let name = node
                .get("name")
                .and_then(HostValue::as_str)
                .ok_or(HostErrorCode::InvalidParameter)?;
            let mut args = vec![name.to_string()];
            match node.get("args") {
                Some(HostValue::Array(rest)) => args.extend(rest.iter().map(|v| v.to_string())),
                Some(HostValue::None) | None => {}
                Some(_) => return Err(HostErrorCode::InvalidParameter),
            }
            Ok(args)
        }
        _ => Err(HostErrorCode::InvalidParameter),
    }
}

/// Run one command on behalf of `client`.
pub(crate) fn execute(state: &mut HostState, client: &str, args: &[String]) -> HostResult<HostValue> {
    execute_nested(state, client, args, 0)
}

fn execute_nested(
    state: &mut HostState,
    client: &str,
    args: &[String],
    hops: usize,
) -> HostResult<HostValue> {
    let (name, rest) = args.split_first().ok_or(HostErrorCode::InvalidParameter)?;
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

    let result = match (name.as_str(), rest.as_slice()) {
        ("ignore", _) => Ok(HostValue::None),
        ("set", [property, value]) => {
            let current = state
                .properties
                .get(*property)
                .ok_or(HostErrorCode::PropertyNotFound)?;
            let converted =
                properties::write_as(Some(current), Format::String, &HostValue::from(*value))?;
            state.store_property(property, converted);
            Ok(HostValue::None)
        }
        ("add", [property, delta @ ..]) if delta.len() <= 1 => {
            let step = match delta.first() {
                Some(text) => text
                    .parse::<f64>()
                    .map_err(|_| HostErrorCode::InvalidParameter)?,
                None => 1.0,
            };
            let updated = match state.properties.get(*property) {
                Some(HostValue::Int64(n)) => HostValue::Int64(
                    n.checked_add(step as i64)
                        .ok_or(HostErrorCode::PropertyError)?,
                ),
                Some(HostValue::Double(n)) => HostValue::Double(n + step),
                Some(_) => return Err(HostErrorCode::PropertyFormat),
                None => return Err(HostErrorCode::PropertyNotFound),
            };
            state.store_property(property, updated);
            Ok(HostValue::None)
        }
        ("cycle", [property]) => {
            let updated = match state.properties.get(*property) {
                Some(HostValue::Flag(b)) => HostValue::Flag(!b),
                Some(_) => return Err(HostErrorCode::PropertyFormat),
                None => return Err(HostErrorCode::PropertyNotFound),
            };
            state.store_property(property, updated);
            Ok(HostValue::None)
        }
        ("show-text", [text, ..]) if rest.len() <= 3 => {
            state.osd.push(text.to_string());
            Ok(HostValue::None)
        }
        ("print-text", [text]) => {
            state.terminal.push(text.to_string());
            Ok(HostValue::None)
        }
        ("expand-text", [text]) => Ok(HostValue::String(text.to_string())),
        ("script-message", message) if !message.is_empty() => {
            state.push_event(HostEvent::client_message(message));
            Ok(HostValue::None)
        }
        ("script-message-to", [_target, message @ ..]) if !message.is_empty() => {
            state.push_event(HostEvent::client_message(message));
            Ok(HostValue::None)
        }
        ("script-binding", [binding]) => {
            state.push_event(HostEvent::client_message(&["key-binding", *binding, "u-", "", ""]));
            Ok(HostValue::None)
        }
        ("keypress", [key]) => {
            if hops >= MAX_KEY_HOPS {
                return Err(HostErrorCode::Command);
            }
            let Some((owner, bound)) = lookup_key(state, key) else {
                return Ok(HostValue::None);
            };
            let bound = split_command(&bound)?;
            record(state, client, args);
            return execute_nested(state, &owner, &bound, hops + 1);
        }
        ("quit", _) => {
            state.push_event(HostEvent::shutdown());
            Ok(HostValue::None)
        }
        _ => Err(HostErrorCode::Command),
    };

    if result.is_ok() {
        record(state, client, args);
    }
    result
}

fn record(state: &mut HostState, client: &str, args: &[String]) {
    state.commands.push(CommandRecord {
        client: client.to_string(),
        args: args.to_vec(),
    });
}

/// Find the command bound to `key` in the enabled input sections.
///
/// `ON_TOP` sections win over the others, regular sections over builtin ones.
fn lookup_key(state: &HostState, key: &str) -> Option<(String, String)> {
    let mut candidates: Vec<_> = state
        .input_sections
        .values()
        .filter_map(|section| section.enabled.map(|flags| (flags, section)))
        .collect();
    candidates.sort_by_key(|(flags, section)| (!flags.contains(InputFlags::ON_TOP), section.builtin));

    candidates.into_iter().find_map(|(_, section)| {
        section.contents.lines().find_map(|line| {
            let line = line.trim();
            let (bound_key, command) = line.split_once(char::is_whitespace)?;
            (bound_key == key).then(|| (section.owner.clone(), command.trim().to_string()))
        })
    })
}
