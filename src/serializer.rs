//! The value serializer contract and the built-in serializers for primitives.
//!
//! A serializer converts exactly one value type to and from the two external
//! representations: a JSON leaf (text decode only — there is no record→text
//! direction) and the binary wire form. Serializers are stateless and shared
//! behind `Arc` across concurrent decode calls.

use std::any::{self, Any};
use std::marker::PhantomData;

use crate::record::RecordId;
use crate::registry::Registry;
use crate::wire::{WireError, WireReader, WireWriter};

/// A serializer rejected its input.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("{0}")]
    Malformed(String),
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl ValueError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        ValueError::Malformed(msg.into())
    }

    fn expected(what: &str, got: &serde_json::Value) -> Self {
        ValueError::Malformed(format!("expected {what}, got {got}"))
    }
}

/// Conversion strategy for one value type.
///
/// `encode_wire` is infallible: encoding a well-formed in-memory value is
/// total, and a serializer that cannot represent a value it previously decoded
/// is a programming error, not a runtime failure.
pub trait ValueSerializer<T>: Send + Sync + 'static {
    fn decode_text(&self, value: &serde_json::Value) -> Result<T, ValueError>;
    fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<T, ValueError>;
    fn encode_wire(&self, w: &mut WireWriter, value: &T);
}

/// Object-safe wrapper so the registry can hold serializers for heterogeneous
/// value types in one table. Decoded values travel as `Box<dyn Any>` between
/// the serializer and the field slot that stores them.
pub(crate) trait ErasedValueSerializer: Send + Sync {
    fn decode_text(&self, value: &serde_json::Value) -> Result<Box<dyn Any>, ValueError>;
    fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<Box<dyn Any>, ValueError>;
    fn encode_wire(&self, w: &mut WireWriter, value: &dyn Any);
    fn value_type(&self) -> &'static str;
}

pub(crate) struct Erased<T, S> {
    serializer: S,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> Erased<T, S> {
    pub(crate) fn new(serializer: S) -> Self {
        Erased {
            serializer,
            _marker: PhantomData,
        }
    }
}

impl<T: 'static, S: ValueSerializer<T>> ErasedValueSerializer for Erased<T, S> {
    fn decode_text(&self, value: &serde_json::Value) -> Result<Box<dyn Any>, ValueError> {
        self.serializer
            .decode_text(value)
            .map(|v| Box::new(v) as Box<dyn Any>)
    }

    fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<Box<dyn Any>, ValueError> {
        self.serializer
            .decode_wire(r)
            .map(|v| Box::new(v) as Box<dyn Any>)
    }

    fn encode_wire(&self, w: &mut WireWriter, value: &dyn Any) {
        match value.downcast_ref::<T>() {
            Some(v) => self.serializer.encode_wire(w, v),
            None => panic!(
                "value serializer for {} fed a mismatched value",
                any::type_name::<T>()
            ),
        }
    }

    fn value_type(&self) -> &'static str {
        any::type_name::<T>()
    }
}

macro_rules! int_serializer {
    ($name:ident, $ty:ty, $as_json:ident, $read:ident, $write:ident) => {
        pub struct $name;

        impl ValueSerializer<$ty> for $name {
            fn decode_text(&self, value: &serde_json::Value) -> Result<$ty, ValueError> {
                let n = value
                    .$as_json()
                    .ok_or_else(|| ValueError::expected(stringify!($ty), value))?;
                <$ty>::try_from(n).map_err(|_| ValueError::expected(stringify!($ty), value))
            }

            fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<$ty, ValueError> {
                Ok(r.$read()?)
            }

            fn encode_wire(&self, w: &mut WireWriter, value: &$ty) {
                w.$write(*value);
            }
        }
    };
}

int_serializer!(U8Serializer, u8, as_u64, read_u8, write_u8);
int_serializer!(U16Serializer, u16, as_u64, read_u16, write_u16);
int_serializer!(U32Serializer, u32, as_u64, read_u32, write_u32);
int_serializer!(U64Serializer, u64, as_u64, read_u64, write_u64);
int_serializer!(I8Serializer, i8, as_i64, read_i8, write_i8);
int_serializer!(I16Serializer, i16, as_i64, read_i16, write_i16);
int_serializer!(I32Serializer, i32, as_i64, read_i32, write_i32);
int_serializer!(I64Serializer, i64, as_i64, read_i64, write_i64);

pub struct BoolSerializer;

impl ValueSerializer<bool> for BoolSerializer {
    fn decode_text(&self, value: &serde_json::Value) -> Result<bool, ValueError> {
        value
            .as_bool()
            .ok_or_else(|| ValueError::expected("bool", value))
    }

    fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<bool, ValueError> {
        Ok(r.read_bool()?)
    }

    fn encode_wire(&self, w: &mut WireWriter, value: &bool) {
        w.write_bool(*value);
    }
}

pub struct F32Serializer;

impl ValueSerializer<f32> for F32Serializer {
    fn decode_text(&self, value: &serde_json::Value) -> Result<f32, ValueError> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| ValueError::expected("f32", value))
    }

    fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<f32, ValueError> {
        Ok(r.read_f32()?)
    }

    fn encode_wire(&self, w: &mut WireWriter, value: &f32) {
        w.write_f32(*value);
    }
}

pub struct F64Serializer;

impl ValueSerializer<f64> for F64Serializer {
    fn decode_text(&self, value: &serde_json::Value) -> Result<f64, ValueError> {
        value
            .as_f64()
            .ok_or_else(|| ValueError::expected("f64", value))
    }

    fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<f64, ValueError> {
        Ok(r.read_f64()?)
    }

    fn encode_wire(&self, w: &mut WireWriter, value: &f64) {
        w.write_f64(*value);
    }
}

pub struct StringSerializer;

impl ValueSerializer<String> for StringSerializer {
    fn decode_text(&self, value: &serde_json::Value) -> Result<String, ValueError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ValueError::expected("string", value))
    }

    fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<String, ValueError> {
        Ok(r.read_string()?)
    }

    fn encode_wire(&self, w: &mut WireWriter, value: &String) {
        w.write_string(value);
    }
}

pub struct RecordIdSerializer;

impl ValueSerializer<RecordId> for RecordIdSerializer {
    fn decode_text(&self, value: &serde_json::Value) -> Result<RecordId, ValueError> {
        let s = value
            .as_str()
            .ok_or_else(|| ValueError::expected("record id string", value))?;
        s.parse::<RecordId>()
            .map_err(|e| ValueError::malformed(e.to_string()))
    }

    fn decode_wire(&self, r: &mut WireReader<'_>) -> Result<RecordId, ValueError> {
        let s = r.read_string()?;
        s.parse::<RecordId>()
            .map_err(|e| ValueError::malformed(e.to_string()))
    }

    fn encode_wire(&self, w: &mut WireWriter, value: &RecordId) {
        w.write_string(&value.to_string());
    }
}

/// Installs the global serializers every registry starts with. Domain value
/// types stay external; their serializers are registered by the caller.
pub(crate) fn register_builtins(registry: &mut Registry) {
    registry.register_serializer(BoolSerializer);
    registry.register_serializer(U8Serializer);
    registry.register_serializer(U16Serializer);
    registry.register_serializer(U32Serializer);
    registry.register_serializer(U64Serializer);
    registry.register_serializer(I8Serializer);
    registry.register_serializer(I16Serializer);
    registry.register_serializer(I32Serializer);
    registry.register_serializer(I64Serializer);
    registry.register_serializer(F32Serializer);
    registry.register_serializer(F64Serializer);
    registry.register_serializer(StringSerializer);
    registry.register_serializer(RecordIdSerializer);
}
