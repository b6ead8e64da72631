//! Schema-driven decoding.
//!
//! The decoder walks a [`Schema`] node by node, reading exactly the bytes
//! each node describes, and routes every decoded value into the caller's
//! destination via its [`Destination`] shape:
//!
//! | schema      | Structured        | Associative        | Dynamic        | Polymorphic       | Scalar   |
//! |-------------|-------------------|--------------------|----------------|-------------------|----------|
//! | record      | slot per field    | entry per field    | `Value::Record`| into held record  | mismatch |
//! | map         | mismatch          | entry per key      | `Value::Map`   | mismatch          | mismatch |
//! | primitive   | mismatch          | mismatch           | stored         | mismatch          | assigned |
//!
//! Fields with no destination slot are still read, so the cursor always
//! ends up past the whole value. Errors abort immediately and carry the
//! field path at which they occurred.

use std::fmt::Write as _;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::bind::resolve::{plan_record, slot_at, RecordPlan};
use crate::bind::{Bind, Destination, Record, RecordDescriptor};
use crate::codec::primitives::Reader;
use crate::error::DecodeError;
use crate::limits::{MAX_BYTES_LEN, MAX_DEPTH, MAX_MAP_ENTRIES};
use crate::logical::{default_logical_types, LogicalTypes};
use crate::model::Value;
use crate::schema::{Node, PrimitiveKind, RecordId, Schema};

/// Limits applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum length of a single `bytes` or `string` value.
    pub max_bytes_len: usize,
    /// Maximum number of entries across all blocks of one map.
    pub max_map_entries: usize,
    /// Maximum nesting depth of records and maps.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_bytes_len: MAX_BYTES_LEN,
            max_map_entries: MAX_MAP_ENTRIES,
            max_depth: MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Creates options with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_bytes_len(mut self, max: usize) -> Self {
        self.max_bytes_len = max;
        self
    }

    pub fn max_map_entries(mut self, max: usize) -> Self {
        self.max_map_entries = max;
        self
    }

    pub fn max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }
}

/// Decodes one value described by `schema` from `reader` into `dest`.
///
/// On success the reader is positioned just past the value. On error the
/// reader position and the contents of `dest` are unspecified.
///
/// # Example
///
/// ```
/// use avrobind::codec::{decode, Reader};
/// use avrobind::model::Value;
/// use avrobind::schema::{RecordDef, Schema, SchemaDef};
///
/// let schema = Schema::new(
///     RecordDef::new("test")
///         .field("a", SchemaDef::LONG)
///         .field("b", SchemaDef::STRING),
/// )
/// .unwrap();
///
/// let mut reader = Reader::new(&[0x36, 0x06, b'f', b'o', b'o']);
/// let mut value = Value::Null;
/// decode(&schema, &mut reader, &mut value).unwrap();
///
/// assert_eq!(value.get("a"), Some(&Value::Long(27)));
/// assert_eq!(value.get("b"), Some(&Value::from("foo")));
/// assert!(reader.is_empty());
/// ```
pub fn decode<T: Bind + ?Sized>(
    schema: &Schema,
    reader: &mut Reader<'_>,
    dest: &mut T,
) -> Result<(), DecodeError> {
    let mut decoder = Decoder::new(schema, reader.remaining());
    let result = decoder.decode(dest);
    let consumed = decoder.position();
    // The remaining slice cannot be shorter than what was consumed from it.
    let _ = reader.read_fixed(consumed, "value");
    result
}

/// A reusable decoder over one input buffer.
///
/// Successive calls to [`Decoder::decode`] read consecutive values, which
/// is how a container block holding several records is consumed. Binding
/// plans are cached per (schema record, destination type) pair for the
/// lifetime of the decoder.
pub struct Decoder<'s, 'a> {
    schema: &'s Schema,
    reader: Reader<'a>,
    options: DecodeOptions,
    logical: &'s LogicalTypes,
    plans: FxHashMap<(RecordId, usize), Arc<RecordPlan>>,
    path: Vec<PathSegment<'s>>,
    depth: usize,
}

#[derive(Debug, Clone)]
enum PathSegment<'s> {
    Field(&'s str),
    Key(String),
}

impl<'s, 'a> Decoder<'s, 'a> {
    /// Creates a decoder with default limits and the built-in logical types.
    pub fn new(schema: &'s Schema, data: &'a [u8]) -> Self {
        Self::with_options(schema, data, DecodeOptions::default())
    }

    /// Creates a decoder with custom limits.
    pub fn with_options(schema: &'s Schema, data: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            schema,
            reader: Reader::new(data),
            options,
            logical: default_logical_types(),
            plans: FxHashMap::default(),
            path: Vec::new(),
            depth: 0,
        }
    }

    /// Replaces the logical type registry.
    pub fn with_logical_types(mut self, logical: &'s LogicalTypes) -> Self {
        self.logical = logical;
        self
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Returns true if every byte of the input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    /// Decodes the next value into `dest`.
    pub fn decode<T: Bind + ?Sized>(&mut self, dest: &mut T) -> Result<(), DecodeError> {
        self.path.clear();
        self.depth = 0;
        let schema = self.schema;
        let root = schema.root();
        self.decode_node(root, dest.destination())
            .map_err(|e| self.locate(e))
    }

    /// Decodes the next value as a [`Value`].
    pub fn decode_value(&mut self) -> Result<Value, DecodeError> {
        let mut value = Value::Null;
        self.decode(&mut value)?;
        Ok(value)
    }

    /// Wraps `error` with the current field path, if any.
    fn locate(&self, error: DecodeError) -> DecodeError {
        if self.path.is_empty() {
            return error;
        }
        let mut path = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Field(name) => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(name);
                }
                PathSegment::Key(key) => {
                    let _ = write!(path, "[{:?}]", key);
                }
            }
        }
        DecodeError::InField {
            path,
            source: Box::new(error),
        }
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(DecodeError::DepthExceedsLimit {
                max: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn decode_node(&mut self, node: &'s Node, dest: Destination<'_>) -> Result<(), DecodeError> {
        self.enter()?;
        match node {
            Node::Record(id) | Node::Reference(id) => self.decode_record(*id, dest)?,
            Node::Map(values) => self.decode_map(values, dest)?,
            Node::Primitive(kind) => {
                let value = self.read_primitive(*kind)?;
                store(value, dest)?;
            }
            Node::Logical { base, tag } => self.decode_logical(base, tag, dest)?,
        }
        self.depth -= 1;
        Ok(())
    }

    // =========================================================================
    // RECORDS
    // =========================================================================

    fn decode_record(&mut self, id: RecordId, dest: Destination<'_>) -> Result<(), DecodeError> {
        let schema = self.schema;
        let record = schema.record(id);
        match dest {
            Destination::Structured(target) => self.decode_structured(id, target),
            Destination::Polymorphic(slot) => match slot.get_mut() {
                Some(target) => self.decode_structured(id, target),
                None => Err(DecodeError::UnresolvedPolymorphicTarget),
            },
            Destination::Associative(sink) => {
                if !sink.accepts_string_keys() {
                    return Err(DecodeError::IncompatibleMapKey {
                        key_kind: sink.key_kind(),
                    });
                }
                for field in &record.fields {
                    let key_kind = sink.key_kind();
                    let slot = sink
                        .entry(field.name.clone())
                        .ok_or(DecodeError::IncompatibleMapKey { key_kind })?;
                    self.path.push(PathSegment::Field(&field.name));
                    self.decode_node(&field.schema, slot.destination())?;
                    self.path.pop();
                }
                Ok(())
            }
            Destination::Dynamic(value) => {
                let mut fields = IndexMap::with_capacity(record.fields.len());
                for field in &record.fields {
                    let mut field_value = Value::Null;
                    self.path.push(PathSegment::Field(&field.name));
                    self.decode_node(&field.schema, field_value.destination())?;
                    self.path.pop();
                    fields.insert(field.name.clone(), field_value);
                }
                *value = Value::Record(fields);
                Ok(())
            }
            Destination::Scalar(scalar) => Err(DecodeError::TypeMismatch {
                expected: scalar.kind(),
                found: "record",
            }),
        }
    }

    fn decode_structured(
        &mut self,
        id: RecordId,
        target: &mut (dyn Record + '_),
    ) -> Result<(), DecodeError> {
        let schema = self.schema;
        let record = schema.record(id);
        let plan = self.plan(id, target.descriptor());

        for (field, path) in record.fields.iter().zip(&plan.targets) {
            self.path.push(PathSegment::Field(&field.name));
            let slot = match path {
                Some(path) => slot_at(&mut *target, path),
                None => None,
            };
            match slot {
                Some(slot) => self.decode_node(&field.schema, slot.destination())?,
                None => {
                    tracing::trace!(
                        record = %record.name,
                        field = %field.name,
                        "no destination slot, skipping field"
                    );
                    self.skip(&field.schema)?;
                }
            }
            self.path.pop();
        }
        Ok(())
    }

    fn plan(&mut self, id: RecordId, descriptor: &'static RecordDescriptor) -> Arc<RecordPlan> {
        let key = (id, descriptor as *const RecordDescriptor as usize);
        if let Some(plan) = self.plans.get(&key) {
            return Arc::clone(plan);
        }
        let record = self.schema.record(id);
        let plan = Arc::new(plan_record(record, descriptor));
        tracing::debug!(
            record = %record.name,
            destination = descriptor.name,
            fields = plan.targets.len(),
            unmatched = plan.unmatched(),
            "computed binding plan"
        );
        self.plans.insert(key, Arc::clone(&plan));
        plan
    }

    // =========================================================================
    // MAPS
    // =========================================================================

    fn decode_map(&mut self, values: &'s Node, dest: Destination<'_>) -> Result<(), DecodeError> {
        match dest {
            Destination::Associative(sink) => {
                if !sink.accepts_string_keys() {
                    return Err(DecodeError::IncompatibleMapKey {
                        key_kind: sink.key_kind(),
                    });
                }
                self.read_map_blocks(|decoder, key| {
                    let key_kind = sink.key_kind();
                    let slot = sink
                        .entry(key.clone())
                        .ok_or(DecodeError::IncompatibleMapKey { key_kind })?;
                    decoder.path.push(PathSegment::Key(key));
                    decoder.decode_node(values, slot.destination())?;
                    decoder.path.pop();
                    Ok(())
                })
            }
            Destination::Dynamic(value) => {
                let mut entries = IndexMap::new();
                self.read_map_blocks(|decoder, key| {
                    let mut entry = Value::Null;
                    decoder.path.push(PathSegment::Key(key.clone()));
                    decoder.decode_node(values, entry.destination())?;
                    decoder.path.pop();
                    entries.insert(key, entry);
                    Ok(())
                })?;
                *value = Value::Map(entries);
                Ok(())
            }
            Destination::Polymorphic(slot) => match slot.get_mut() {
                Some(target) => Err(DecodeError::TypeMismatch {
                    expected: target.descriptor().name,
                    found: "map",
                }),
                None => Err(DecodeError::UnresolvedPolymorphicTarget),
            },
            other => Err(DecodeError::TypeMismatch {
                expected: other.kind_name(),
                found: "map",
            }),
        }
    }

    /// Reads map blocks until the zero terminator, calling `each` per key.
    ///
    /// A negative block count is followed by the block's byte size; the
    /// entries that follow are read the same way.
    fn read_map_blocks(
        &mut self,
        mut each: impl FnMut(&mut Self, String) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        let mut total: usize = 0;
        loop {
            let count = self.reader.read_long("map block count")?;
            if count == 0 {
                return Ok(());
            }
            if count < 0 {
                self.reader.read_long("map block size")?;
            }
            let count = usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX);
            total = total.saturating_add(count);
            if total > self.options.max_map_entries {
                return Err(DecodeError::LengthExceedsLimit {
                    context: "map",
                    len: total,
                    max: self.options.max_map_entries,
                });
            }
            for _ in 0..count {
                let key = self
                    .reader
                    .read_str(self.options.max_bytes_len, "map key")?
                    .to_string();
                each(self, key)?;
            }
        }
    }

    // =========================================================================
    // LOGICAL TYPES AND PRIMITIVES
    // =========================================================================

    fn decode_logical(
        &mut self,
        base: &'s Node,
        tag: &str,
        dest: Destination<'_>,
    ) -> Result<(), DecodeError> {
        if let Some(kind) = base.primitive_kind() {
            let raw = self.read_primitive(kind)?;
            return match dest {
                // A slot of the base type takes the raw value; the
                // projection is only needed when the slot rejects it.
                Destination::Scalar(scalar) => match scalar.assign(raw) {
                    Ok(()) => Ok(()),
                    Err(raw) => {
                        let value = self.logical.project(tag, raw)?;
                        store(value, Destination::Scalar(scalar))
                    }
                },
                dest => store(self.logical.project(tag, raw)?, dest),
            };
        }
        match dest {
            Destination::Dynamic(value) => {
                let mut raw = Value::Null;
                self.decode_node(base, raw.destination())?;
                *value = self.logical.project(tag, raw)?;
                Ok(())
            }
            dest => self.decode_node(base, dest),
        }
    }

    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value, DecodeError> {
        let max_len = self.options.max_bytes_len;
        let reader = &mut self.reader;
        Ok(match kind {
            PrimitiveKind::Null => Value::Null,
            PrimitiveKind::Boolean => Value::Boolean(reader.read_bool("boolean")?),
            PrimitiveKind::Int => Value::Int(reader.read_int("int")?),
            PrimitiveKind::Long => Value::Long(reader.read_long("long")?),
            PrimitiveKind::Float => Value::Float(reader.read_float("float")?),
            PrimitiveKind::Double => Value::Double(reader.read_double("double")?),
            PrimitiveKind::Bytes => Value::Bytes(reader.read_bytes(max_len, "bytes")?.to_vec()),
            PrimitiveKind::String => Value::String(reader.read_str(max_len, "string")?.to_string()),
        })
    }

    // =========================================================================
    // SKIPPING
    // =========================================================================

    /// Advances past a value without binding it.
    ///
    /// Logical tags are not applied, so an unbound field never fails on its
    /// logical conversion.
    fn skip(&mut self, node: &'s Node) -> Result<(), DecodeError> {
        self.enter()?;
        let max_len = self.options.max_bytes_len;
        match node {
            Node::Primitive(kind) => match kind {
                PrimitiveKind::Null => {}
                PrimitiveKind::Boolean => {
                    self.reader.read_bool("boolean")?;
                }
                PrimitiveKind::Int => {
                    self.reader.read_int("int")?;
                }
                PrimitiveKind::Long => {
                    self.reader.read_long("long")?;
                }
                PrimitiveKind::Float => {
                    self.reader.read_fixed(4, "float")?;
                }
                PrimitiveKind::Double => {
                    self.reader.read_fixed(8, "double")?;
                }
                PrimitiveKind::Bytes => {
                    self.reader.read_bytes(max_len, "bytes")?;
                }
                PrimitiveKind::String => {
                    self.reader.read_bytes(max_len, "string")?;
                }
            },
            Node::Record(id) | Node::Reference(id) => {
                let schema = self.schema;
                for field in &schema.record(*id).fields {
                    self.skip(&field.schema)?;
                }
            }
            Node::Map(values) => self.skip_map(values)?,
            Node::Logical { base, .. } => self.skip(base)?,
        }
        self.depth -= 1;
        Ok(())
    }

    /// Skips map blocks, jumping over sized blocks without reading entries.
    fn skip_map(&mut self, values: &'s Node) -> Result<(), DecodeError> {
        loop {
            let count = self.reader.read_long("map block count")?;
            if count == 0 {
                return Ok(());
            }
            if count < 0 {
                let size = self.reader.read_long("map block size")?;
                let remaining = self.reader.remaining_len();
                match usize::try_from(size) {
                    Ok(size) if size <= remaining => {
                        self.reader.read_fixed(size, "map block")?;
                    }
                    _ => {
                        return Err(DecodeError::MalformedLength {
                            context: "map block size",
                            len: size,
                            remaining,
                        });
                    }
                }
                continue;
            }
            for _ in 0..count {
                self.reader.read_bytes(self.options.max_bytes_len, "map key")?;
                self.skip(values)?;
            }
        }
    }
}

/// Stores a decoded leaf value into `dest`.
fn store(value: Value, dest: Destination<'_>) -> Result<(), DecodeError> {
    match dest {
        Destination::Scalar(scalar) => {
            let expected = scalar.kind();
            scalar
                .assign(value)
                .map_err(|rejected| DecodeError::TypeMismatch {
                    expected,
                    found: rejected.kind().name(),
                })
        }
        Destination::Dynamic(slot) => {
            *slot = value;
            Ok(())
        }
        Destination::Polymorphic(slot) => match slot.get_mut() {
            Some(target) => Err(DecodeError::TypeMismatch {
                expected: target.descriptor().name,
                found: value.kind().name(),
            }),
            None => Err(DecodeError::UnresolvedPolymorphicTarget),
        },
        other => Err(DecodeError::TypeMismatch {
            expected: other.kind_name(),
            found: value.kind().name(),
        }),
    }
}
