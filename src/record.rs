//! Record identity and the self-description contract record types implement.

use std::fmt;
use std::str::FromStr;

use crate::schema::FieldDescriptor;

/// Namespaced identifier for record types and record instances, e.g. `mymod:smelting`.
///
/// The namespace scopes value-serializer resolution; the path names the record
/// (type) within it. A bare path with no `:` gets [`RecordId::DEFAULT_NAMESPACE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    namespace: String,
    path: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseRecordIdError {
    #[error("record id has an empty {0}")]
    Empty(&'static str),
    #[error("invalid character {ch:?} in record id {part}")]
    InvalidChar { ch: char, part: &'static str },
}

impl RecordId {
    pub const DEFAULT_NAMESPACE: &'static str = "record";

    pub fn new(namespace: &str, path: &str) -> Result<Self, ParseRecordIdError> {
        if namespace.is_empty() {
            return Err(ParseRecordIdError::Empty("namespace"));
        }
        if path.is_empty() {
            return Err(ParseRecordIdError::Empty("path"));
        }
        if let Some(ch) = namespace.chars().find(|c| !is_namespace_char(*c)) {
            return Err(ParseRecordIdError::InvalidChar { ch, part: "namespace" });
        }
        if let Some(ch) = path.chars().find(|c| !is_path_char(*c)) {
            return Err(ParseRecordIdError::InvalidChar { ch, part: "path" });
        }
        Ok(RecordId {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn is_namespace_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.')
}

fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl FromStr for RecordId {
    type Err = ParseRecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((ns, path)) => RecordId::new(ns, path),
            None => RecordId::new(Self::DEFAULT_NAMESPACE, s),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// Opaque category marker minted when a record type is registered.
///
/// Outer dispatch (a request router, a recipe matcher, ...) compares kind tags
/// to group instances by their registered type; the codec itself only mints
/// and hands them out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KindTag(RecordId);

impl KindTag {
    pub(crate) fn new(id: RecordId) -> Self {
        KindTag(id)
    }

    pub fn id(&self) -> &RecordId {
        &self.0
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A record type that can be driven through the codec.
///
/// The descriptor list is the type's schema: one entry per serialized field,
/// in declaration order. The binary wire format carries no field names, so
/// encode and decode both walk this list in exactly the order returned here.
/// The list is derived once at registration time and cached by the registry.
pub trait Record: Send + Sized + 'static {
    fn fields() -> Vec<FieldDescriptor<Self>>;
}
