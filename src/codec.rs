//! The codec engine: drive a record type's field descriptors against a text
//! tree or a binary cursor.
//!
//! All three directions walk the descriptor list in declared order and
//! dispatch on the field's shape. Field order is the load-bearing invariant of
//! the wire format: it carries no field names, so encoding with one order and
//! decoding with another silently mis-assigns values. Text decode isolates
//! per-field failures (an optional field that cannot be read is left at its
//! factory default); wire decode has no such isolation — any failure is fatal.

use std::any;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::record::{Record, RecordId};
use crate::registry::Registry;
use crate::schema::{FieldDescriptor, FieldPath, FieldShape, KeyError, ValueTypeId};
use crate::serializer::{ErasedValueSerializer, ValueError};
use crate::wire::{WireError, WireReader, WireWriter};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("record type {0} is not registered")]
    UnknownRecordType(&'static str),
    #[error("record {record}: missing or malformed required field `{field}`: {source}")]
    MissingRequiredField {
        record: RecordId,
        field: &'static str,
        source: FieldError,
    },
    #[error("record {record}: field `{field}`: {source}")]
    Field {
        record: RecordId,
        field: &'static str,
        source: FieldError,
    },
}

/// Why a single field could not be decoded or encoded. Carried as the source
/// of a [`CodecError`]; the engine inspects it to decide continue-vs-abort.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("path segment `{0}` is missing or not an object")]
    MalformedPath(String),
    #[error("no value at `{0}`")]
    Absent(String),
    #[error("expected an object of key/value members")]
    NotAnObject,
    #[error("no value serializer registered for {0}")]
    UnresolvedSerializer(&'static str),
    #[error("map key `{key}` is not a valid {ty}: {reason}")]
    KeyConstruction {
        key: String,
        ty: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Malformed(#[from] ValueError),
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl From<KeyError> for FieldError {
    fn from(e: KeyError) -> Self {
        FieldError::KeyConstruction {
            key: e.key,
            ty: e.ty,
            reason: e.reason,
        }
    }
}

impl Registry {
    /// Decodes one record from a text tree. `id` is the instance's own
    /// identifier (typically where the document was loaded from); the factory
    /// receives it and may stamp it into the instance.
    pub fn decode_text<R: Record>(&self, id: RecordId, root: &JsonValue) -> Result<R, CodecError> {
        let entry = self
            .typed_entry::<R>()
            .ok_or(CodecError::UnknownRecordType(any::type_name::<R>()))?;
        let mut rec = (entry.factory)(id.clone());
        for field in &entry.fields {
            match self.decode_text_field(&entry.namespace, field, root, &mut rec) {
                Ok(()) => {}
                Err(source) if field.required() => {
                    return Err(CodecError::MissingRequiredField {
                        record: id,
                        field: field.name(),
                        source,
                    });
                }
                Err(source) => {
                    tracing::debug!(
                        record = %id,
                        field = field.name(),
                        error = %source,
                        "optional field left at its default"
                    );
                }
            }
        }
        Ok(rec)
    }

    /// Decodes one record from a binary cursor. The wire form has no notion of
    /// a missing field, so there is no required/optional branching here and
    /// any failure aborts the whole decode.
    pub fn decode_wire<R: Record>(
        &self,
        id: RecordId,
        r: &mut WireReader<'_>,
    ) -> Result<R, CodecError> {
        let entry = self
            .typed_entry::<R>()
            .ok_or(CodecError::UnknownRecordType(any::type_name::<R>()))?;
        let mut rec = (entry.factory)(id.clone());
        for field in &entry.fields {
            self.decode_wire_field(&entry.namespace, field, r, &mut rec)
                .map_err(|source| CodecError::Field {
                    record: id.clone(),
                    field: field.name(),
                    source,
                })?;
        }
        Ok(rec)
    }

    /// Encodes one record to the wire, mirroring [`Registry::decode_wire`]
    /// field for field. Writing itself cannot fail; the only failure modes are
    /// an unregistered record type or a still-unresolved serializer.
    pub fn encode_wire<R: Record>(&self, rec: &R, w: &mut WireWriter) -> Result<(), CodecError> {
        let entry = self
            .typed_entry::<R>()
            .ok_or(CodecError::UnknownRecordType(any::type_name::<R>()))?;
        for field in &entry.fields {
            self.encode_wire_field(&entry.namespace, field, rec, w)
                .map_err(|source| CodecError::Field {
                    record: entry.id.clone(),
                    field: field.name(),
                    source,
                })?;
        }
        Ok(())
    }

    fn decode_text_field<R: Record>(
        &self,
        namespace: &str,
        field: &FieldDescriptor<R>,
        root: &JsonValue,
        rec: &mut R,
    ) -> Result<(), FieldError> {
        let leaf = descend(field.path(), root)?;
        match field.shape() {
            FieldShape::Scalar(ty) => {
                let ser = self.resolve(namespace, *ty)?;
                field.slot().store_one(rec, ser.decode_text(leaf)?);
            }
            FieldShape::List(ty) | FieldShape::Set(ty) | FieldShape::FixedBuffer(ty) => {
                let ser = self.resolve(namespace, *ty)?;
                // A bare leaf is authoring shorthand for a one-element collection.
                let items = match leaf {
                    JsonValue::Array(elems) => elems
                        .iter()
                        .map(|e| ser.decode_text(e))
                        .collect::<Result<Vec<_>, _>>()?,
                    other => vec![ser.decode_text(other)?],
                };
                field.slot().store_many(rec, items);
            }
            FieldShape::Map { value, .. } => {
                let ser = self.resolve(namespace, *value)?;
                let members = leaf.as_object().ok_or(FieldError::NotAnObject)?;
                let mut entries = Vec::with_capacity(members.len());
                for (key, member) in members {
                    entries.push((key.clone(), ser.decode_text(member)?));
                }
                field.slot().store_pairs(rec, entries)?;
            }
        }
        Ok(())
    }

    fn decode_wire_field<R: Record>(
        &self,
        namespace: &str,
        field: &FieldDescriptor<R>,
        r: &mut WireReader<'_>,
        rec: &mut R,
    ) -> Result<(), FieldError> {
        match field.shape() {
            FieldShape::Scalar(ty) => {
                let ser = self.resolve(namespace, *ty)?;
                field.slot().store_one(rec, ser.decode_wire(r)?);
            }
            FieldShape::List(ty) | FieldShape::Set(ty) | FieldShape::FixedBuffer(ty) => {
                let ser = self.resolve(namespace, *ty)?;
                let n = r.read_len()?;
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(ser.decode_wire(r)?);
                }
                field.slot().store_many(rec, items);
            }
            FieldShape::Map { value, .. } => {
                let ser = self.resolve(namespace, *value)?;
                let n = r.read_len()?;
                let mut entries = Vec::with_capacity(n);
                for _ in 0..n {
                    let key = r.read_string()?;
                    entries.push((key, ser.decode_wire(r)?));
                }
                field.slot().store_pairs(rec, entries)?;
            }
        }
        Ok(())
    }

    fn encode_wire_field<R: Record>(
        &self,
        namespace: &str,
        field: &FieldDescriptor<R>,
        rec: &R,
        w: &mut WireWriter,
    ) -> Result<(), FieldError> {
        match field.shape() {
            FieldShape::Scalar(ty) => {
                let ser = self.resolve(namespace, *ty)?;
                ser.encode_wire(w, field.slot().collect_one(rec).as_ref());
            }
            FieldShape::List(ty) | FieldShape::Set(ty) | FieldShape::FixedBuffer(ty) => {
                let ser = self.resolve(namespace, *ty)?;
                let items = field.slot().collect_many(rec);
                w.write_varint(items.len() as u32);
                for item in &items {
                    ser.encode_wire(w, item.as_ref());
                }
            }
            FieldShape::Map { value, .. } => {
                let ser = self.resolve(namespace, *value)?;
                let entries = field.slot().collect_pairs(rec);
                w.write_varint(entries.len() as u32);
                for (key, item) in &entries {
                    w.write_string(key);
                    ser.encode_wire(w, item.as_ref());
                }
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        namespace: &str,
        ty: ValueTypeId,
    ) -> Result<&Arc<dyn ErasedValueSerializer>, FieldError> {
        self.resolve_erased(namespace, ty)
            .ok_or(FieldError::UnresolvedSerializer(ty.name()))
    }
}

/// Walks all but the last path segment as nested object lookups and returns
/// the leaf value under the last segment.
fn descend<'a>(path: &FieldPath, root: &'a JsonValue) -> Result<&'a JsonValue, FieldError> {
    let segments = path.segments();
    let (leaf_key, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(FieldError::Absent(path.to_string())),
    };
    let mut node = root;
    for seg in parents {
        node = match node.get(seg) {
            Some(v) if v.is_object() => v,
            _ => return Err(FieldError::MalformedPath(seg.clone())),
        };
    }
    node.get(leaf_key)
        .ok_or_else(|| FieldError::Absent(path.to_string()))
}
