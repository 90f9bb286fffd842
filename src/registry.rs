//! Process-wide lookup tables: value serializers (global and namespace-scoped)
//! and registered record types.
//!
//! One owned `Registry` value holds every table; there are no global statics.
//! Registration takes `&mut self` during a single-threaded load phase; once
//! the registry is shared (typically behind `Arc`) only the read-only surface
//! remains reachable, which is the freeze the concurrency model relies on.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::record::{KindTag, Record, RecordId};
use crate::schema::{FieldDescriptor, FieldShape, ValueTypeId};
use crate::serializer::{self, Erased, ErasedValueSerializer, ValueSerializer};

pub(crate) struct RegisteredRecord<R> {
    pub(crate) id: RecordId,
    pub(crate) kind: KindTag,
    pub(crate) namespace: String,
    pub(crate) fields: Vec<FieldDescriptor<R>>,
    pub(crate) factory: Box<dyn Fn(RecordId) -> R + Send + Sync>,
}

/// Handle minted at registration. Record-type definitions keep it around to
/// answer "what is my category" when outer dispatch routes an instance back
/// through the codec.
pub struct TypeHandle<R> {
    id: RecordId,
    kind: KindTag,
    _marker: PhantomData<fn() -> R>,
}

impl<R> TypeHandle<R> {
    fn new(id: RecordId, kind: KindTag) -> Self {
        TypeHandle {
            id,
            kind,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn kind(&self) -> &KindTag {
        &self.kind
    }
}

impl<R> Clone for TypeHandle<R> {
    fn clone(&self) -> Self {
        TypeHandle::new(self.id.clone(), self.kind.clone())
    }
}

impl<R> fmt::Debug for TypeHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle").field("id", &self.id).finish()
    }
}

/// Serializer and record-type tables. See the module docs for the lifecycle.
pub struct Registry {
    globals: HashMap<ValueTypeId, Arc<dyn ErasedValueSerializer>>,
    scoped: HashMap<String, HashMap<ValueTypeId, Arc<dyn ErasedValueSerializer>>>,
    records: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Registry {
    /// An empty registry with the built-in serializers (primitives, `String`,
    /// `RecordId`) already installed globally.
    pub fn new() -> Self {
        let mut registry = Registry {
            globals: HashMap::new(),
            scoped: HashMap::new(),
            records: HashMap::new(),
        };
        serializer::register_builtins(&mut registry);
        registry
    }

    /// Registers a record type under `id` and caches its field descriptors.
    ///
    /// Scalar fields without a resolvable serializer are reported with a
    /// warning rather than an error: the serializer may legitimately register
    /// later in the load phase. Container element types are not probed here;
    /// they fail at decode/encode time if still unresolved.
    pub fn register_record_type<R, F>(&mut self, id: RecordId, factory: F) -> TypeHandle<R>
    where
        R: Record,
        F: Fn(RecordId) -> R + Send + Sync + 'static,
    {
        let fields = R::fields();
        let namespace = id.namespace().to_string();
        for field in &fields {
            if let FieldShape::Scalar(ty) = field.shape() {
                if self.resolve_erased(&namespace, *ty).is_none() {
                    tracing::warn!(
                        record = %id,
                        field = field.name(),
                        value_type = ty.name(),
                        "no value serializer found for field, has it not been registered yet?"
                    );
                }
            }
        }
        let kind = KindTag::new(id.clone());
        let entry: RegisteredRecord<R> = RegisteredRecord {
            id: id.clone(),
            kind: kind.clone(),
            namespace,
            fields,
            factory: Box::new(factory),
        };
        self.records.insert(TypeId::of::<R>(), Box::new(entry));
        TypeHandle::new(id, kind)
    }

    /// Registers a global serializer for `T`. Last write wins; replacing an
    /// existing entry is reported.
    pub fn register_serializer<T, S>(&mut self, serializer: S)
    where
        T: 'static,
        S: ValueSerializer<T>,
    {
        let ty = ValueTypeId::of::<T>();
        let prev = self.globals.insert(ty, Arc::new(Erased::new(serializer)));
        if prev.is_some() {
            tracing::warn!(
                value_type = ty.name(),
                "value serializer registered over an existing global serializer"
            );
        }
    }

    /// Registers a serializer for `T` visible only to record types whose id
    /// lives in `namespace`. Scoped entries win over global ones.
    pub fn register_scoped_serializer<T, S>(&mut self, namespace: &str, serializer: S)
    where
        T: 'static,
        S: ValueSerializer<T>,
    {
        let ty = ValueTypeId::of::<T>();
        let prev = self
            .scoped
            .entry(namespace.to_string())
            .or_default()
            .insert(ty, Arc::new(Erased::new(serializer)));
        if prev.is_some() {
            tracing::warn!(
                namespace,
                value_type = ty.name(),
                "value serializer registered over an existing scoped serializer"
            );
        }
    }

    pub fn has_serializer<T: 'static>(&self, namespace: Option<&str>) -> bool {
        let ty = ValueTypeId::of::<T>();
        match namespace {
            Some(ns) => self.resolve_erased(ns, ty).is_some(),
            None => self.globals.contains_key(&ty),
        }
    }

    /// Scoped table first, then the global table.
    pub(crate) fn resolve_erased(
        &self,
        namespace: &str,
        ty: ValueTypeId,
    ) -> Option<&Arc<dyn ErasedValueSerializer>> {
        self.scoped
            .get(namespace)
            .and_then(|m| m.get(&ty))
            .or_else(|| self.globals.get(&ty))
    }

    pub(crate) fn typed_entry<R: Record>(&self) -> Option<&RegisteredRecord<R>> {
        self.records
            .get(&TypeId::of::<R>())
            .and_then(|entry| entry.downcast_ref::<RegisteredRecord<R>>())
    }

    pub fn fields_of<R: Record>(&self) -> Option<&[FieldDescriptor<R>]> {
        self.typed_entry::<R>().map(|e| e.fields.as_slice())
    }

    pub fn kind_of<R: Record>(&self) -> Option<&KindTag> {
        self.typed_entry::<R>().map(|e| &e.kind)
    }

    pub fn id_of<R: Record>(&self) -> Option<&RecordId> {
        self.typed_entry::<R>().map(|e| &e.id)
    }

    pub fn handle_of<R: Record>(&self) -> Option<TypeHandle<R>> {
        self.typed_entry::<R>()
            .map(|e| TypeHandle::new(e.id.clone(), e.kind.clone()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("global_serializers", &self.globals.len())
            .field("scoped_namespaces", &self.scoped.len())
            .field("record_types", &self.records.len())
            .finish()
    }
}
