//! Registration of the `Client` type with the script engine.

use crate::client_api::{RequestOutcome, ScriptApi};
use host_types::{Format, InputFlags, LogLevel, ScriptError};
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, Position, INT};

type CallResult<T> = Result<T, Box<EvalAltResult>>;

/// Turn a call failure into a script exception carrying `#{ kind, message }`.
pub fn throw(err: ScriptError) -> Box<EvalAltResult> {
    let mut map = Map::new();
    map.insert("kind".into(), Dynamic::from(err.kind().to_string()));
    map.insert("message".into(), Dynamic::from(err.to_string()));
    Box::new(EvalAltResult::ErrorRuntime(Dynamic::from_map(map), Position::NONE))
}

fn format_named(name: &str) -> CallResult<Format> {
    name.parse::<Format>().map_err(throw)
}

fn format_coded(code: INT) -> CallResult<Format> {
    Format::from_code(code).map_err(throw)
}

fn subscription_id(id: INT) -> CallResult<u64> {
    u64::try_from(id)
        .map_err(|_| throw(ScriptError::Parse(format!("invalid subscription id {}", id))))
}

fn optional_str(value: &Dynamic, what: &str) -> CallResult<Option<String>> {
    if value.is_unit() {
        return Ok(None);
    }
    value
        .clone()
        .try_cast::<ImmutableString>()
        .map(|s| Some(s.to_string()))
        .ok_or_else(|| {
            throw(ScriptError::Parse(format!(
                "{} must be a string or (), found '{}'",
                what,
                value.type_name()
            )))
        })
}

fn commandv(api: &mut ScriptApi, items: Array) -> CallResult<()> {
    let args = api.bridge().string_args(&items).map_err(throw)?;
    api.commandv(&args).map_err(throw)
}

fn add_binding(
    api: &mut ScriptApi,
    key: Dynamic,
    name: Dynamic,
    builtin: bool,
    callback: &str,
) -> CallResult<String> {
    let key = optional_str(&key, "binding key")?;
    let name = optional_str(&name, "binding name")?;
    api.add_binding(key.as_deref(), name.as_deref(), builtin, callback)
        .map_err(throw)
}

/// Register `Client` and all of its methods.
///
/// Scripts call them on `mp` at top level and on `this` inside hooks:
///
/// ```text
/// mp.commandv(["show-text", "hello"]);
/// let volume = mp.get_property_float("volume");
/// mp.observe_property("pause", "flag", 1);
/// mp.add_binding("ctrl+a", "toggle", false, "on_toggle");
/// ```
pub fn register_client_api(engine: &mut Engine) {
    engine.register_type_with_name::<ScriptApi>("Client");

    engine.register_get("name", |api: &mut ScriptApi| api.name().to_string());
    engine.register_indexer_get(|api: &mut ScriptApi, key: &str| api.extension_get(key));
    engine.register_indexer_set(|api: &mut ScriptApi, key: &str, value: Dynamic| {
        api.extension_set(key, value)
    });

    register_commands(engine);
    register_properties(engine);
    register_events_and_logging(engine);
    register_input(engine);

    engine.register_fn("create_stats", |api: &mut ScriptApi| api.enable_stats());
    engine.register_fn("stats", |api: &mut ScriptApi| -> Dynamic {
        match api.stats() {
            Some(stats) => Dynamic::from_map(stats.to_map()),
            None => Dynamic::UNIT,
        }
    });
}

fn register_commands(engine: &mut Engine) {
    engine.register_fn("command", |api: &mut ScriptApi, text: &str| -> CallResult<()> {
        api.command_string(text).map_err(throw)
    });
    engine.register_fn("command_native", |api: &mut ScriptApi, node: Dynamic| -> CallResult<Dynamic> {
        api.command_node(&node).map_err(throw)
    });
    engine.register_fn("commandv", |api: &mut ScriptApi, items: Array| commandv(api, items));
    engine.register_fn("commandv", |api: &mut ScriptApi, a: Dynamic| commandv(api, vec![a]));
    engine.register_fn("commandv", |api: &mut ScriptApi, a: Dynamic, b: Dynamic| {
        commandv(api, vec![a, b])
    });
    engine.register_fn(
        "commandv",
        |api: &mut ScriptApi, a: Dynamic, b: Dynamic, c: Dynamic| commandv(api, vec![a, b, c]),
    );
    engine.register_fn(
        "commandv",
        |api: &mut ScriptApi, a: Dynamic, b: Dynamic, c: Dynamic, d: Dynamic| {
            commandv(api, vec![a, b, c, d])
        },
    );
    engine.register_fn("osd_message", |api: &mut ScriptApi, text: &str| -> CallResult<()> {
        api.osd_message(text, None).map_err(throw)
    });
    engine.register_fn(
        "osd_message",
        |api: &mut ScriptApi, text: &str, duration: Dynamic| -> CallResult<()> {
            api.osd_message(text, Some(&duration.to_string())).map_err(throw)
        },
    );
}

fn register_properties(engine: &mut Engine) {
    engine.register_fn("get_property", |api: &mut ScriptApi, name: &str| -> CallResult<Dynamic> {
        api.get_property(name, Format::String).map_err(throw)
    });
    engine.register_fn(
        "get_property",
        |api: &mut ScriptApi, name: &str, format: &str| -> CallResult<Dynamic> {
            api.get_property(name, format_named(format)?).map_err(throw)
        },
    );
    engine.register_fn(
        "get_property",
        |api: &mut ScriptApi, name: &str, format: INT| -> CallResult<Dynamic> {
            api.get_property(name, format_coded(format)?).map_err(throw)
        },
    );
    engine.register_fn(
        "set_property",
        |api: &mut ScriptApi, name: &str, format: &str, value: Dynamic| -> CallResult<()> {
            api.set_property(name, format_named(format)?, &value).map_err(throw)
        },
    );
    engine.register_fn(
        "set_property",
        |api: &mut ScriptApi, name: &str, format: INT, value: Dynamic| -> CallResult<()> {
            api.set_property(name, format_coded(format)?, &value).map_err(throw)
        },
    );
    engine.register_fn("del_property", |api: &mut ScriptApi, name: &str| -> CallResult<()> {
        api.del_property(name).map_err(throw)
    });

    for (suffix, format) in [
        ("string", Format::String),
        ("osd", Format::OsdString),
        ("bool", Format::Flag),
        ("int", Format::Int64),
        ("float", Format::Double),
        ("native", Format::Node),
    ] {
        engine.register_fn(
            format!("get_property_{}", suffix),
            move |api: &mut ScriptApi, name: &str| -> CallResult<Dynamic> {
                api.get_property(name, format).map_err(throw)
            },
        );
        if format != Format::OsdString {
            engine.register_fn(
                format!("set_property_{}", suffix),
                move |api: &mut ScriptApi, name: &str, value: Dynamic| -> CallResult<()> {
                    api.set_property(name, format, &value).map_err(throw)
                },
            );
        }
    }

    engine.register_fn(
        "observe_property",
        |api: &mut ScriptApi, name: &str, format: &str, id: INT| -> CallResult<()> {
            api.observe_property(name, format_named(format)?, subscription_id(id)?)
                .map_err(throw)
        },
    );
    engine.register_fn("unobserve_property", |api: &mut ScriptApi, id: INT| -> CallResult<INT> {
        let removed = api.unobserve_property(subscription_id(id)?).map_err(throw)?;
        Ok(INT::try_from(removed).unwrap_or(INT::MAX))
    });
}

fn register_events_and_logging(engine: &mut Engine) {
    engine.register_fn(
        "request_event",
        |api: &mut ScriptApi, name: &str, enable: bool| -> CallResult<Dynamic> {
            match api.request_event(name, enable).map_err(throw)? {
                RequestOutcome::Applied => Ok(Dynamic::TRUE),
                RequestOutcome::Unknown => Ok(Dynamic::UNIT),
            }
        },
    );
    engine.register_fn("enable_messages", |api: &mut ScriptApi, level: &str| -> CallResult<()> {
        api.enable_messages(level).map_err(throw)
    });
    engine.register_fn("find_config_file", |api: &mut ScriptApi, name: &str| -> CallResult<String> {
        api.find_config_file(name)
            .map(|path| path.display().to_string())
            .map_err(throw)
    });

    engine.register_fn("log", |api: &mut ScriptApi, level: &str, a: Dynamic| -> CallResult<()> {
        api.log_named(level, &[a]).map_err(throw)
    });
    engine.register_fn(
        "log",
        |api: &mut ScriptApi, level: &str, a: Dynamic, b: Dynamic| -> CallResult<()> {
            api.log_named(level, &[a, b]).map_err(throw)
        },
    );
    engine.register_fn(
        "log",
        |api: &mut ScriptApi, level: &str, a: Dynamic, b: Dynamic, c: Dynamic| -> CallResult<()> {
            api.log_named(level, &[a, b, c]).map_err(throw)
        },
    );

    for level in [
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
    ] {
        engine.register_fn(level.name(), move |api: &mut ScriptApi, a: Dynamic| -> CallResult<()> {
            api.log(level, &[a]).map_err(throw)
        });
        engine.register_fn(
            level.name(),
            move |api: &mut ScriptApi, a: Dynamic, b: Dynamic| -> CallResult<()> {
                api.log(level, &[a, b]).map_err(throw)
            },
        );
        engine.register_fn(
            level.name(),
            move |api: &mut ScriptApi, a: Dynamic, b: Dynamic, c: Dynamic| -> CallResult<()> {
                api.log(level, &[a, b, c]).map_err(throw)
            },
        );
    }
}

fn register_input(engine: &mut Engine) {
    engine.register_fn(
        "define_input_section",
        |api: &mut ScriptApi,
         name: &str,
         location: &str,
         contents: &str,
         builtin: bool,
         owner: &str|
         -> CallResult<()> {
            api.define_input_section(name, location, contents, builtin, owner)
                .map_err(throw)
        },
    );
    engine.register_fn(
        "define_input_section",
        |api: &mut ScriptApi, name: &str, location: &str, contents: &str, builtin: bool| -> CallResult<()> {
            let owner = api.name().to_string();
            api.define_input_section(name, location, contents, builtin, &owner)
                .map_err(throw)
        },
    );
    engine.register_fn(
        "enable_input_section",
        |api: &mut ScriptApi, name: &str, flags: INT| -> CallResult<()> {
            let flags = u32::try_from(flags)
                .map_err(|_| throw(ScriptError::Parse(format!("invalid input flags {}", flags))))?;
            api.enable_input_section(name, InputFlags(flags)).map_err(throw)
        },
    );

    engine.register_fn("add_binding", add_binding);
    engine.register_fn(
        "add_binding",
        |api: &mut ScriptApi, key: Dynamic, name: Dynamic, callback: &str| {
            add_binding(api, key, name, false, callback)
        },
    );
    engine.register_fn("has_binding", |api: &mut ScriptApi| api.has_binding());
    engine.register_fn(
        "register_script_message",
        |api: &mut ScriptApi, name: &str, callback: &str| -> CallResult<()> {
            api.register_script_message(name, callback).map_err(throw)
        },
    );
}
