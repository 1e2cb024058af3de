//! Recursive conversion between [`HostValue`] and Rhai's [`Dynamic`].
//!
//! Both directions walk the tree through a [`MarshalContext`] that tracks
//! nesting depth; crossing [`BridgeOptions::max_depth`] fails the whole
//! conversion with [`MarshalError::DepthExceeded`] instead of growing the
//! stack without bound. Cyclic script structures are not detected.

use host_types::{HostValue, ScriptError};
use rhai::{Array, Dynamic, ImmutableString, Map};
use thiserror::Error;

/// Default nesting limit for a single conversion.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Errors that can occur while marshalling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    /// The value has no host representation
    #[error("cannot convert value of type '{type_name}'")]
    Unsupported {
        /// Script-side type name
        type_name: String,
    },
    /// The value nests deeper than allowed
    #[error("value nests deeper than {max} levels")]
    DepthExceeded {
        /// Configured limit
        max: usize,
    },
}

impl From<MarshalError> for ScriptError {
    fn from(err: MarshalError) -> Self {
        ScriptError::TypeMismatch(err.to_string())
    }
}

/// Options for marshalling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Maximum nesting depth; a scalar has depth 1
    pub max_depth: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Depth tracking for one conversion
struct MarshalContext {
    depth: usize,
    max_depth: usize,
}

impl MarshalContext {
    fn new(options: BridgeOptions) -> Self {
        Self {
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    fn enter(&mut self) -> Result<(), MarshalError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(MarshalError::DepthExceeded { max: self.max_depth });
        }
        Ok(())
    }

    fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// The value marshalling bridge.
///
/// # Examples
///
/// ```
/// use host_types::HostValue;
/// use value_bridge::Bridge;
///
/// let bridge = Bridge::default();
/// let native = bridge.from_host(&HostValue::Array(vec![HostValue::Int64(1)])).unwrap();
/// assert!(native.is_array());
/// assert_eq!(bridge.to_host(&native).unwrap(), HostValue::Array(vec![HostValue::Int64(1)]));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bridge {
    options: BridgeOptions,
}

impl Bridge {
    /// Bridge with explicit options.
    pub fn new(options: BridgeOptions) -> Self {
        Self { options }
    }

    /// Bridge with the given depth limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self::new(BridgeOptions { max_depth })
    }

    /// Options in effect.
    pub fn options(&self) -> BridgeOptions {
        self.options
    }

    /// Convert a script value into a host value.
    ///
    /// `()` becomes `None`, characters become one-character strings, arrays
    /// keep their order and maps keep their (sorted) key order. Every other
    /// script type fails with [`MarshalError::Unsupported`].
    pub fn to_host(&self, value: &Dynamic) -> Result<HostValue, MarshalError> {
        let mut ctx = MarshalContext::new(self.options);
        Self::to_host_internal(value, &mut ctx)
    }

    /// Convert a host value into a script value.
    pub fn from_host(&self, value: &HostValue) -> Result<Dynamic, MarshalError> {
        let mut ctx = MarshalContext::new(self.options);
        Self::from_host_internal(value, &mut ctx)
    }

    fn to_host_internal(value: &Dynamic, ctx: &mut MarshalContext) -> Result<HostValue, MarshalError> {
        let flattened;
        let value = if value.is_shared() {
            flattened = value.flatten_clone();
            &flattened
        } else {
            value
        };

        ctx.enter()?;

        let result = if value.is_unit() {
            Ok(HostValue::None)
        } else if let Ok(b) = value.as_bool() {
            Ok(HostValue::Flag(b))
        } else if let Ok(n) = value.as_int() {
            Ok(HostValue::Int64(n))
        } else if let Ok(n) = value.as_float() {
            Ok(HostValue::Double(n))
        } else if let Ok(c) = value.as_char() {
            Ok(HostValue::String(c.to_string()))
        } else if value.is::<ImmutableString>() {
            match value.clone().try_cast::<ImmutableString>() {
                Some(s) => Ok(HostValue::String(s.to_string())),
                None => Err(unsupported(value)),
            }
        } else if value.is::<Array>() {
            match value.clone().try_cast::<Array>() {
                Some(items) => items
                    .iter()
                    .map(|item| Self::to_host_internal(item, ctx))
                    .collect::<Result<Vec<_>, _>>()
                    .map(HostValue::Array),
                None => Err(unsupported(value)),
            }
        } else if value.is::<Map>() {
            match value.clone().try_cast::<Map>() {
                Some(map) => map
                    .iter()
                    .map(|(k, v)| {
                        Self::to_host_internal(v, ctx).map(|converted| (k.to_string(), converted))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(HostValue::Map),
                None => Err(unsupported(value)),
            }
        } else {
            Err(unsupported(value))
        };

        ctx.exit();
        result
    }

    fn from_host_internal(value: &HostValue, ctx: &mut MarshalContext) -> Result<Dynamic, MarshalError> {
        ctx.enter()?;

        let result = match value {
            HostValue::None => Ok(Dynamic::UNIT),
            HostValue::Flag(b) => Ok(Dynamic::from_bool(*b)),
            HostValue::Int64(n) => Ok(Dynamic::from_int(*n)),
            HostValue::Double(n) => Ok(Dynamic::from_float(*n)),
            HostValue::String(s) => Ok(Dynamic::from(s.clone())),
            HostValue::Array(items) => items
                .iter()
                .map(|item| Self::from_host_internal(item, ctx))
                .collect::<Result<Array, _>>()
                .map(Dynamic::from_array),
            HostValue::Map(entries) => {
                let mut map = Map::new();
                for (key, item) in entries {
                    let converted = Self::from_host_internal(item, ctx)?;
                    map.insert(key.as_str().into(), converted);
                }
                Ok(Dynamic::from_map(map))
            }
        };

        ctx.exit();
        result
    }

    /// Convert a script array of strings into owned arguments.
    ///
    /// Non-string elements are malformed call arguments.
    pub fn string_args(&self, items: &Array) -> Result<Vec<String>, ScriptError> {
        items
            .iter()
            .map(|item| {
                item.clone()
                    .try_cast::<ImmutableString>()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        ScriptError::Parse(format!(
                            "expected a list of strings, found '{}'",
                            item.type_name()
                        ))
                    })
            })
            .collect()
    }
}

fn unsupported(value: &Dynamic) -> MarshalError {
    MarshalError::Unsupported {
        type_name: value.type_name().to_string(),
    }
}
