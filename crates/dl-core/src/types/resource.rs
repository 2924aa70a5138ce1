//! Loaded resource values.
//!
//! A [`Resource`] is whatever a loader produced for one matched file. The
//! variants let the dictionary builder and the aggregate merger branch on the
//! *shape* of a value instead of guessing at it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::Dictionary;

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A JSON number (integer or float).
    Number(serde_json::Number),
    /// A string.
    String(String),
}

type CallableFn = dyn Fn(&[Resource]) -> Resource + Send + Sync;

/// A named function value exported by a resource.
///
/// Two callables are equal only if they wrap the same function object.
#[derive(Clone)]
pub struct Callable {
    name: String,
    func: Arc<CallableFn>,
}

impl Callable {
    /// Wraps a function under the given name.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Resource]) -> Resource + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the function's name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the function.
    pub fn call(&self, args: &[Resource]) -> Resource {
        (self.func)(args)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.name).finish()
    }
}

/// A host object that is neither a plain dictionary nor a sequence.
///
/// Opaque values are carried through untouched and are always replaced
/// wholesale when merged.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Wraps an arbitrary value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Returns the Rust type name of the wrapped value.
    #[inline]
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the wrapped value if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.type_name).finish()
    }
}

/// The in-memory content obtained by loading a matched file.
///
/// # Examples
///
/// ```
/// use dl_core::Resource;
/// use serde_json::json;
///
/// let resource = Resource::from(json!({ "adapter": "disk", "pool": [1, 2] }));
/// assert!(resource.is_dict());
/// assert_eq!(resource.to_json(), json!({ "adapter": "disk", "pool": [1, 2] }));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// A plain key→value dictionary (shared handle).
    Dict(Dictionary),
    /// An ordered list.
    Sequence(Vec<Resource>),
    /// A scalar leaf.
    Scalar(Scalar),
    /// A function value.
    Callable(Callable),
    /// Any other host object.
    Opaque(Opaque),
    /// The loader explicitly produced nothing for this file.
    Absent,
}

impl Resource {
    /// The marker recorded for files that were matched but not loaded.
    #[inline]
    #[must_use]
    pub const fn present() -> Self {
        Self::Scalar(Scalar::Bool(true))
    }

    /// Returns a short, human-readable name for the value's shape.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Dict(_) => "dictionary",
            Self::Sequence(_) => "sequence",
            Self::Scalar(Scalar::Null) => "null",
            Self::Scalar(Scalar::Bool(_)) => "boolean",
            Self::Scalar(Scalar::Number(_)) => "number",
            Self::Scalar(Scalar::String(_)) => "string",
            Self::Callable(_) => "callable",
            Self::Opaque(_) => "opaque",
            Self::Absent => "absent",
        }
    }

    /// Returns `true` for plain dictionaries.
    #[inline]
    #[must_use]
    pub const fn is_dict(&self) -> bool {
        matches!(self, Self::Dict(_))
    }

    /// Returns `true` for sequences.
    #[inline]
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Returns `true` if the loader produced nothing.
    #[inline]
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the dictionary handle, if this is one.
    #[must_use]
    pub const fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Self::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Returns the string contents, if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Converts a parsed JSON value into a resource tree.
    ///
    /// Every JSON object becomes a fresh [`Dictionary`].
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Scalar(Scalar::Null),
            Value::Bool(flag) => Self::Scalar(Scalar::Bool(flag)),
            Value::Number(number) => Self::Scalar(Scalar::Number(number)),
            Value::String(text) => Self::Scalar(Scalar::String(text)),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Dict(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Renders the resource as JSON.
    ///
    /// Callables render as `"[Function: name]"`, opaque values as
    /// `"[Opaque: type]"`, and absent values as `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Dict(dict) => dict.to_json(),
            Self::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Scalar(Scalar::Null) | Self::Absent => Value::Null,
            Self::Scalar(Scalar::Bool(flag)) => Value::Bool(*flag),
            Self::Scalar(Scalar::Number(number)) => Value::Number(number.clone()),
            Self::Scalar(Scalar::String(text)) => Value::String(text.clone()),
            Self::Callable(callable) => Value::String(format!("[Function: {}]", callable.name())),
            Self::Opaque(opaque) => Value::String(format!("[Opaque: {}]", opaque.type_name())),
        }
    }
}

impl From<serde_json::Value> for Resource {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(value)
    }
}

impl From<Dictionary> for Resource {
    fn from(dict: Dictionary) -> Self {
        Self::Dict(dict)
    }
}

impl From<Vec<Self>> for Resource {
    fn from(items: Vec<Self>) -> Self {
        Self::Sequence(items)
    }
}

impl From<bool> for Resource {
    fn from(flag: bool) -> Self {
        Self::Scalar(Scalar::Bool(flag))
    }
}

impl From<i64> for Resource {
    fn from(number: i64) -> Self {
        Self::Scalar(Scalar::Number(number.into()))
    }
}

impl From<&str> for Resource {
    fn from(text: &str) -> Self {
        Self::Scalar(Scalar::String(text.to_owned()))
    }
}

impl From<String> for Resource {
    fn from(text: String) -> Self {
        Self::Scalar(Scalar::String(text))
    }
}

impl From<Callable> for Resource {
    fn from(callable: Callable) -> Self {
        Self::Callable(callable)
    }
}

impl From<Opaque> for Resource {
    fn from(opaque: Opaque) -> Self {
        Self::Opaque(opaque)
    }
}
