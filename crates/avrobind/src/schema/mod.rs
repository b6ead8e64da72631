//! Schema tree.
//!
//! A [`Schema`] is an immutable arena of record declarations plus a root
//! [`Node`]. Records are stored once and referred to by [`RecordId`], so
//! recursive schemas (a record that reaches itself through a map or a
//! nested record) are finite graphs rather than infinite trees.
//!
//! A `Schema` is `Send + Sync` and is meant to be built once and shared
//! across any number of decode calls.

pub mod def;

use rustc_hash::FxHashMap;

use crate::error::SchemaError;
use crate::validate::{validate_logical_base, validate_record};

pub use def::{FieldDef, RecordDef, SchemaDef};

/// Primitive schema kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveKind {
    /// Resolves a primitive type name (e.g., "long").
    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        match name {
            "null" => Some(PrimitiveKind::Null),
            "boolean" => Some(PrimitiveKind::Boolean),
            "int" => Some(PrimitiveKind::Int),
            "long" => Some(PrimitiveKind::Long),
            "float" => Some(PrimitiveKind::Float),
            "double" => Some(PrimitiveKind::Double),
            "bytes" => Some(PrimitiveKind::Bytes),
            "string" => Some(PrimitiveKind::String),
            _ => None,
        }
    }

    /// Returns the type name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Null => "null",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::String => "string",
        }
    }
}

/// Index of a record declaration inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(u32);

impl RecordId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A resolved schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Primitive(PrimitiveKind),
    /// The place where a record was declared.
    Record(RecordId),
    Map(Box<Node>),
    /// A by-name use of a record declared earlier.
    Reference(RecordId),
    Logical { base: Box<Node>, tag: String },
}

impl Node {
    /// Returns the record this node denotes, looking through logical wrappers.
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            Node::Record(id) | Node::Reference(id) => Some(*id),
            Node::Logical { base, .. } => base.record_id(),
            _ => None,
        }
    }

    /// Returns the primitive kind this node decodes as, looking through
    /// logical wrappers.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Node::Primitive(kind) => Some(*kind),
            Node::Logical { base, .. } => base.primitive_kind(),
            _ => None,
        }
    }

    /// Returns a short name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Primitive(kind) => kind.name(),
            Node::Record(_) | Node::Reference(_) => "record",
            Node::Map(_) => "map",
            Node::Logical { base, .. } => base.kind_name(),
        }
    }
}

/// A record field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub aliases: Vec<String>,
    pub schema: Node,
    /// Index in encoding order.
    pub position: usize,
}

impl Field {
    /// The declared name followed by the aliases, in lookup order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// A record declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<Field>,
}

/// An immutable, validated schema graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    records: Vec<RecordSchema>,
    names: FxHashMap<String, RecordId>,
    root: Node,
}

impl Schema {
    /// Resolves and validates a schema description.
    ///
    /// Records are registered as soon as their declaration starts, so a
    /// record may refer to itself or to any record declared before it.
    /// Names used before their declaration fail with
    /// [`SchemaError::UnresolvedReference`].
    pub fn new(def: impl Into<SchemaDef>) -> Result<Schema, SchemaError> {
        let mut schema = Schema {
            records: Vec::new(),
            names: FxHashMap::default(),
            root: Node::Primitive(PrimitiveKind::Null),
        };
        schema.root = schema.compile(def.into())?;
        Ok(schema)
    }

    fn compile(&mut self, def: SchemaDef) -> Result<Node, SchemaError> {
        match def {
            SchemaDef::Primitive(kind) => Ok(Node::Primitive(kind)),
            SchemaDef::Map(values) => Ok(Node::Map(Box::new(self.compile(*values)?))),
            SchemaDef::Named(name) => {
                if let Some(kind) = PrimitiveKind::from_name(&name) {
                    return Ok(Node::Primitive(kind));
                }
                self.names
                    .get(&name)
                    .map(|id| Node::Reference(*id))
                    .ok_or(SchemaError::UnresolvedReference { name })
            }
            SchemaDef::Logical { base, tag } => {
                let base = self.compile(*base)?;
                validate_logical_base(&base, &tag)?;
                Ok(Node::Logical {
                    base: Box::new(base),
                    tag,
                })
            }
            SchemaDef::Record(record) => self.compile_record(record),
        }
    }

    fn compile_record(&mut self, def: RecordDef) -> Result<Node, SchemaError> {
        if def.name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "record" });
        }
        if self.names.contains_key(&def.name) {
            return Err(SchemaError::DuplicateRecord { name: def.name });
        }

        let id = RecordId(self.records.len() as u32);
        self.names.insert(def.name.clone(), id);
        self.records.push(RecordSchema {
            name: def.name,
            fields: Vec::with_capacity(def.fields.len()),
        });

        let mut fields = Vec::with_capacity(def.fields.len());
        for (position, field) in def.fields.into_iter().enumerate() {
            fields.push(Field {
                name: field.name,
                aliases: field.aliases,
                schema: self.compile(field.schema)?,
                position,
            });
        }

        let record = &mut self.records[id.index()];
        record.fields = fields;
        validate_record(record)?;

        Ok(Node::Record(id))
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The record declaration for `id`.
    pub fn record(&self, id: RecordId) -> &RecordSchema {
        &self.records[id.index()]
    }

    /// Looks up a record declaration by name.
    pub fn lookup(&self, name: &str) -> Option<RecordId> {
        self.names.get(name).copied()
    }

    /// All record declarations, in declaration order.
    pub fn records(&self) -> &[RecordSchema] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> RecordDef {
        RecordDef::new("test")
            .field("a", SchemaDef::LONG)
            .field("b", SchemaDef::STRING)
    }

    #[test]
    fn test_simple_record() {
        let schema = Schema::new(test_record()).unwrap();
        let id = schema.root().record_id().unwrap();
        let record = schema.record(id);
        assert_eq!(record.name, "test");
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[1].position, 1);
        assert_eq!(record.fields[1].schema, Node::Primitive(PrimitiveKind::String));
        assert_eq!(schema.lookup("test"), Some(id));
    }

    #[test]
    fn test_reference_to_earlier_record() {
        let schema = Schema::new(
            RecordDef::new("parent")
                .field("a", test_record())
                .field("b", SchemaDef::named("test")),
        )
        .unwrap();

        let parent = schema.record(schema.root().record_id().unwrap());
        let test_id = schema.lookup("test").unwrap();
        assert_eq!(parent.fields[0].schema, Node::Record(test_id));
        assert_eq!(parent.fields[1].schema, Node::Reference(test_id));
    }

    #[test]
    fn test_self_reference() {
        let schema = Schema::new(
            RecordDef::new("tree")
                .field("value", SchemaDef::LONG)
                .field("children", SchemaDef::map(SchemaDef::named("tree"))),
        )
        .unwrap();
        let id = schema.lookup("tree").unwrap();
        let tree = schema.record(id);
        assert_eq!(tree.fields[1].schema, Node::Map(Box::new(Node::Reference(id))));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let result = Schema::new(
            RecordDef::new("parent")
                .field("b", SchemaDef::named("test"))
                .field("a", test_record()),
        );
        assert_eq!(
            result,
            Err(SchemaError::UnresolvedReference {
                name: "test".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_record_rejected() {
        let result = Schema::new(
            RecordDef::new("parent")
                .field("a", test_record())
                .field("b", test_record()),
        );
        assert!(matches!(result, Err(SchemaError::DuplicateRecord { .. })));
    }

    #[test]
    fn test_primitive_names() {
        let schema = Schema::new(SchemaDef::named("double")).unwrap();
        assert_eq!(schema.root(), &Node::Primitive(PrimitiveKind::Double));
        assert_eq!(PrimitiveKind::from_name("fixed"), None);
    }

    #[test]
    fn test_logical_wrapper() {
        let schema = Schema::new(SchemaDef::LONG.logical("timestamp-millis")).unwrap();
        assert_eq!(schema.root().primitive_kind(), Some(PrimitiveKind::Long));
        assert_eq!(schema.root().kind_name(), "long");

        let result = Schema::new(SchemaDef::map(SchemaDef::INT).logical("date"));
        assert!(matches!(result, Err(SchemaError::InvalidLogicalBase { .. })));
    }

    #[test]
    fn test_schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
