//! Typed model of D-Bus reply arguments.
//!
//! Replies are converted into [`Arg`] trees at the transport boundary, and
//! everything above it reads them through an [`ArgCursor`], which walks a
//! sequence of arguments the way a D-Bus message iterator does.

use zbus::zvariant::Value;

/// One decoded D-Bus argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    ObjectPath(String),
    Bool(bool),
    Variant(Box<Arg>),
    Array(Vec<Arg>),
    /// Any type this crate never extracts, kept by signature.
    Other(String),
}

/// Type tag of the argument under a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Str,
    ObjectPath,
    Bool,
    Variant,
    Array,
    Other,
    /// The cursor is past the last argument.
    Invalid,
}

impl Arg {
    pub fn arg_type(&self) -> ArgType {
        match self {
            Arg::Str(_) => ArgType::Str,
            Arg::ObjectPath(_) => ArgType::ObjectPath,
            Arg::Bool(_) => ArgType::Bool,
            Arg::Variant(_) => ArgType::Variant,
            Arg::Array(_) => ArgType::Array,
            Arg::Other(_) => ArgType::Other,
        }
    }

    pub fn variant(inner: Arg) -> Self {
        Arg::Variant(Box::new(inner))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Arg::Str(value.into())
    }

    pub fn object_path(value: impl Into<String>) -> Self {
        Arg::ObjectPath(value.into())
    }

    /// String content of a string or object path argument.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) | Arg::ObjectPath(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&Value<'_>> for Arg {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::Str(s) => Arg::Str(s.to_string()),
            Value::ObjectPath(p) => Arg::ObjectPath(p.to_string()),
            Value::Bool(b) => Arg::Bool(*b),
            Value::Value(inner) => Arg::variant(Arg::from(&**inner)),
            Value::Array(items) => Arg::Array(items.iter().map(Arg::from).collect()),
            other => Arg::Other(other.value_signature().to_string()),
        }
    }
}

/// Read position over a sequence of arguments.
#[derive(Debug, Clone)]
pub struct ArgCursor<'a> {
    args: &'a [Arg],
    pos: usize,
}

impl<'a> ArgCursor<'a> {
    pub fn new(args: &'a [Arg]) -> Self {
        Self { args, pos: 0 }
    }

    pub fn current(&self) -> Option<&'a Arg> {
        self.args.get(self.pos)
    }

    pub fn arg_type(&self) -> ArgType {
        self.current().map_or(ArgType::Invalid, Arg::arg_type)
    }

    /// Move to the next argument. Returns whether one is available.
    pub fn advance(&mut self) -> bool {
        if self.pos < self.args.len() {
            self.pos += 1;
        }
        self.pos < self.args.len()
    }

    /// Cursor over the contents of the current container.
    ///
    /// A variant yields its single inner value, an array yields its elements,
    /// and anything else yields an empty cursor.
    pub fn recurse(&self) -> ArgCursor<'a> {
        match self.current() {
            Some(Arg::Variant(inner)) => ArgCursor::new(std::slice::from_ref(inner.as_ref())),
            Some(Arg::Array(items)) => ArgCursor::new(items),
            _ => ArgCursor::new(&[]),
        }
    }

    pub fn get_str(&self) -> Option<&'a str> {
        self.current().and_then(Arg::as_str)
    }

    pub fn get_bool(&self) -> Option<bool> {
        match self.current() {
            Some(Arg::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}
