//! Static per-field metadata: where a field lives in the text tree, whether it
//! is required, and its container shape.
//!
//! A [`FieldDescriptor`] couples that metadata with a type-erased *slot* bound
//! to the concrete Rust field, so the engine can store decoded values and
//! collect them back out without knowing the field's type. Descriptors are
//! built once (in [`Record::fields`](crate::Record::fields)), cached at
//! registration, and never mutated.

use std::any::{self, Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Identity of a value type, the key under which serializers are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueTypeId {
    id: TypeId,
    name: &'static str,
}

impl ValueTypeId {
    pub fn of<T: 'static>() -> Self {
        ValueTypeId {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// `/`-delimited key path into the text tree. All segments but the last are
/// object-member lookups; the last is the leaf key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        FieldPath {
            segments: path.split('/').map(String::from).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Closed set of container shapes a field may declare.
///
/// Every shape carries the element value type the engine must resolve a
/// serializer for; `Map` additionally carries its key type, which is parsed
/// from strings rather than looked up in the serializer tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Scalar(ValueTypeId),
    List(ValueTypeId),
    Set(ValueTypeId),
    FixedBuffer(ValueTypeId),
    Map { key: ValueTypeId, value: ValueTypeId },
}

/// Map key string failed to parse as the declared key type.
pub(crate) struct KeyError {
    pub(crate) key: String,
    pub(crate) ty: &'static str,
    pub(crate) reason: String,
}

/// Type-erased binding between a descriptor and a concrete record field.
///
/// Only the method pair matching the descriptor's shape is ever invoked; the
/// defaults guard against a slot constructed for a different shape, which
/// cannot happen through the public constructors.
pub(crate) trait FieldSlot<R>: Send + Sync {
    fn store_one(&self, _rec: &mut R, _value: Box<dyn Any>) {
        panic!("field slot does not hold a scalar");
    }
    fn store_many(&self, _rec: &mut R, _items: Vec<Box<dyn Any>>) {
        panic!("field slot does not hold a collection");
    }
    fn store_pairs(
        &self,
        _rec: &mut R,
        _entries: Vec<(String, Box<dyn Any>)>,
    ) -> Result<(), KeyError> {
        panic!("field slot does not hold a map");
    }
    fn collect_one(&self, _rec: &R) -> Box<dyn Any> {
        panic!("field slot does not hold a scalar");
    }
    fn collect_many(&self, _rec: &R) -> Vec<Box<dyn Any>> {
        panic!("field slot does not hold a collection");
    }
    fn collect_pairs(&self, _rec: &R) -> Vec<(String, Box<dyn Any>)> {
        panic!("field slot does not hold a map");
    }
}

fn take<T: 'static>(value: Box<dyn Any>) -> T {
    match value.downcast::<T>() {
        Ok(b) => *b,
        Err(_) => panic!(
            "field slot for {} received a mismatched value",
            any::type_name::<T>()
        ),
    }
}

struct ScalarSlot<R, T> {
    get: fn(&R) -> &T,
    set: fn(&mut R, T),
}

impl<R, T: Clone + 'static> FieldSlot<R> for ScalarSlot<R, T> {
    fn store_one(&self, rec: &mut R, value: Box<dyn Any>) {
        (self.set)(rec, take::<T>(value));
    }
    fn collect_one(&self, rec: &R) -> Box<dyn Any> {
        Box::new((self.get)(rec).clone())
    }
}

struct ListSlot<R, T> {
    get: fn(&R) -> &Vec<T>,
    set: fn(&mut R, Vec<T>),
}

impl<R, T: Clone + 'static> FieldSlot<R> for ListSlot<R, T> {
    fn store_many(&self, rec: &mut R, items: Vec<Box<dyn Any>>) {
        (self.set)(rec, items.into_iter().map(take::<T>).collect());
    }
    fn collect_many(&self, rec: &R) -> Vec<Box<dyn Any>> {
        (self.get)(rec)
            .iter()
            .map(|v| Box::new(v.clone()) as Box<dyn Any>)
            .collect()
    }
}

struct SetSlot<R, T> {
    get: fn(&R) -> &HashSet<T>,
    set: fn(&mut R, HashSet<T>),
}

impl<R, T: Clone + Eq + Hash + 'static> FieldSlot<R> for SetSlot<R, T> {
    fn store_many(&self, rec: &mut R, items: Vec<Box<dyn Any>>) {
        (self.set)(rec, items.into_iter().map(take::<T>).collect());
    }
    fn collect_many(&self, rec: &R) -> Vec<Box<dyn Any>> {
        (self.get)(rec)
            .iter()
            .map(|v| Box::new(v.clone()) as Box<dyn Any>)
            .collect()
    }
}

struct BufferSlot<R, T> {
    get: fn(&R) -> &Box<[T]>,
    set: fn(&mut R, Box<[T]>),
}

impl<R, T: Clone + 'static> FieldSlot<R> for BufferSlot<R, T> {
    fn store_many(&self, rec: &mut R, items: Vec<Box<dyn Any>>) {
        let items: Vec<T> = items.into_iter().map(take::<T>).collect();
        (self.set)(rec, items.into_boxed_slice());
    }
    fn collect_many(&self, rec: &R) -> Vec<Box<dyn Any>> {
        (self.get)(rec)
            .iter()
            .map(|v| Box::new(v.clone()) as Box<dyn Any>)
            .collect()
    }
}

struct MapSlot<R, K, V> {
    get: fn(&R) -> &HashMap<K, V>,
    set: fn(&mut R, HashMap<K, V>),
}

impl<R, K, V> FieldSlot<R> for MapSlot<R, K, V>
where
    K: FromStr + fmt::Display + Eq + Hash + Clone + 'static,
    K::Err: fmt::Display,
    V: Clone + 'static,
{
    fn store_pairs(
        &self,
        rec: &mut R,
        entries: Vec<(String, Box<dyn Any>)>,
    ) -> Result<(), KeyError> {
        let mut map = HashMap::with_capacity(entries.len());
        for (key, value) in entries {
            let k = key.parse::<K>().map_err(|e| KeyError {
                key: key.clone(),
                ty: any::type_name::<K>(),
                reason: e.to_string(),
            })?;
            map.insert(k, take::<V>(value));
        }
        (self.set)(rec, map);
        Ok(())
    }
    fn collect_pairs(&self, rec: &R) -> Vec<(String, Box<dyn Any>)> {
        (self.get)(rec)
            .iter()
            .map(|(k, v)| (k.to_string(), Box::new(v.clone()) as Box<dyn Any>))
            .collect()
    }
}

/// One declared field of a record type: text path, requiredness, shape, and
/// the binding to the concrete Rust field.
pub struct FieldDescriptor<R> {
    name: &'static str,
    path: FieldPath,
    required: bool,
    shape: FieldShape,
    slot: Box<dyn FieldSlot<R>>,
}

impl<R: 'static> FieldDescriptor<R> {
    /// Required scalar field. `path` is `/`-delimited.
    pub fn scalar<T: Clone + 'static>(
        name: &'static str,
        path: &str,
        get: fn(&R) -> &T,
        set: fn(&mut R, T),
    ) -> Self {
        FieldDescriptor {
            name,
            path: FieldPath::parse(path),
            required: true,
            shape: FieldShape::Scalar(ValueTypeId::of::<T>()),
            slot: Box::new(ScalarSlot { get, set }),
        }
    }

    /// Required list field bound to a `Vec<T>`.
    pub fn list<T: Clone + 'static>(
        name: &'static str,
        path: &str,
        get: fn(&R) -> &Vec<T>,
        set: fn(&mut R, Vec<T>),
    ) -> Self {
        FieldDescriptor {
            name,
            path: FieldPath::parse(path),
            required: true,
            shape: FieldShape::List(ValueTypeId::of::<T>()),
            slot: Box::new(ListSlot { get, set }),
        }
    }

    /// Required set field bound to a `HashSet<T>`.
    pub fn set<T: Clone + Eq + Hash + 'static>(
        name: &'static str,
        path: &str,
        get: fn(&R) -> &HashSet<T>,
        set: fn(&mut R, HashSet<T>),
    ) -> Self {
        FieldDescriptor {
            name,
            path: FieldPath::parse(path),
            required: true,
            shape: FieldShape::Set(ValueTypeId::of::<T>()),
            slot: Box::new(SetSlot { get, set }),
        }
    }

    /// Required fixed-buffer field bound to a `Box<[T]>`.
    pub fn buffer<T: Clone + 'static>(
        name: &'static str,
        path: &str,
        get: fn(&R) -> &Box<[T]>,
        set: fn(&mut R, Box<[T]>),
    ) -> Self {
        FieldDescriptor {
            name,
            path: FieldPath::parse(path),
            required: true,
            shape: FieldShape::FixedBuffer(ValueTypeId::of::<T>()),
            slot: Box::new(BufferSlot { get, set }),
        }
    }

    /// Required map field bound to a `HashMap<K, V>`. Keys are text-tree member
    /// names, parsed via `FromStr` when `K` is not `String`; `Display` is the
    /// inverse used when writing keys to the wire.
    pub fn map<K, V>(
        name: &'static str,
        path: &str,
        get: fn(&R) -> &HashMap<K, V>,
        set: fn(&mut R, HashMap<K, V>),
    ) -> Self
    where
        K: FromStr + fmt::Display + Eq + Hash + Clone + 'static,
        K::Err: fmt::Display,
        V: Clone + 'static,
    {
        FieldDescriptor {
            name,
            path: FieldPath::parse(path),
            required: true,
            shape: FieldShape::Map {
                key: ValueTypeId::of::<K>(),
                value: ValueTypeId::of::<V>(),
            },
            slot: Box::new(MapSlot { get, set }),
        }
    }

    /// Marks the field optional: a text-decode miss leaves it at the factory
    /// default instead of failing the record.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    pub(crate) fn slot(&self) -> &dyn FieldSlot<R> {
        &*self.slot
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("required", &self.required)
            .field("shape", &self.shape)
            .finish()
    }
}
