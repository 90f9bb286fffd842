//! # autocodec — declarative record codec
//!
//! Record types describe their serialized fields once — a `/`-delimited path
//! into a JSON tree, required or optional, and a container shape — and the
//! engine derives both directions from that description: decoding hand-written
//! JSON documents, and a compact binary wire codec for transmitting
//! already-constructed instances. Call sites never write per-type parsing
//! code.
//!
//! ## Pieces
//!
//! - [`Record`]: a type describes its own fields as a list of
//!   [`FieldDescriptor`]s; declaration order is the wire field order.
//! - [`Registry`]: global and namespace-scoped [`ValueSerializer`] tables plus
//!   the record-type table. Built during a single-threaded load phase, then
//!   shared read-only.
//! - The engine ([`Registry::decode_text`], [`Registry::decode_wire`],
//!   [`Registry::encode_wire`]): walks the descriptor list in declared order,
//!   resolving a value serializer per field.
//!
//! There is deliberately no record→JSON direction: text documents are authored
//! by hand; the wire form is how constructed instances travel.
//!
//! ## Example
//!
//! ```
//! use autocodec::{FieldDescriptor, Record, RecordId, Registry, WireReader, WireWriter};
//!
//! #[derive(Debug, PartialEq)]
//! struct Smelting {
//!     id: RecordId,
//!     count: i32,
//!     tags: Vec<String>,
//! }
//!
//! impl Record for Smelting {
//!     fn fields() -> Vec<FieldDescriptor<Self>> {
//!         vec![
//!             FieldDescriptor::scalar("count", "data/count", |r: &Smelting| &r.count, |r, v| r.count = v),
//!             FieldDescriptor::list("tags", "tags", |r: &Smelting| &r.tags, |r, v| r.tags = v).optional(),
//!         ]
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register_record_type::<Smelting, _>(
//!     "mymod:smelting".parse().unwrap(),
//!     |id| Smelting { id, count: 0, tags: Vec::new() },
//! );
//!
//! let doc = serde_json::json!({"data": {"count": 5}, "tags": ["a", "b"]});
//! let rec: Smelting = registry
//!     .decode_text("mymod:campfire".parse().unwrap(), &doc)
//!     .unwrap();
//! assert_eq!(rec.count, 5);
//! assert_eq!(rec.tags, vec!["a".to_string(), "b".to_string()]);
//!
//! let mut w = WireWriter::new();
//! registry.encode_wire(&rec, &mut w).unwrap();
//! let bytes = w.into_bytes();
//! let back: Smelting = registry
//!     .decode_wire("mymod:campfire".parse().unwrap(), &mut WireReader::new(&bytes))
//!     .unwrap();
//! assert_eq!(back, rec);
//! ```

pub mod codec;
pub mod record;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod wire;

pub use codec::{CodecError, FieldError};
pub use record::{KindTag, ParseRecordIdError, Record, RecordId};
pub use registry::{Registry, TypeHandle};
pub use schema::{FieldDescriptor, FieldPath, FieldShape, ValueTypeId};
pub use serializer::{ValueError, ValueSerializer};
pub use wire::{WireError, WireReader, WireWriter, MAX_LEN};
