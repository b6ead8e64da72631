//! Declarative schema description.
//!
//! This is the unresolved tree a schema parser produces: records are
//! declared inline and referenced elsewhere by name. [`Schema::new`]
//! resolves it into the arena form used by the decoder.
//!
//! [`Schema::new`]: crate::schema::Schema::new

use crate::schema::PrimitiveKind;

/// An unresolved schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDef {
    Primitive(PrimitiveKind),
    Record(RecordDef),
    Map(Box<SchemaDef>),
    /// A primitive name or a previously declared record name.
    Named(String),
    Logical {
        base: Box<SchemaDef>,
        tag: String,
    },
}

impl SchemaDef {
    pub const NULL: SchemaDef = SchemaDef::Primitive(PrimitiveKind::Null);
    pub const BOOLEAN: SchemaDef = SchemaDef::Primitive(PrimitiveKind::Boolean);
    pub const INT: SchemaDef = SchemaDef::Primitive(PrimitiveKind::Int);
    pub const LONG: SchemaDef = SchemaDef::Primitive(PrimitiveKind::Long);
    pub const FLOAT: SchemaDef = SchemaDef::Primitive(PrimitiveKind::Float);
    pub const DOUBLE: SchemaDef = SchemaDef::Primitive(PrimitiveKind::Double);
    pub const BYTES: SchemaDef = SchemaDef::Primitive(PrimitiveKind::Bytes);
    pub const STRING: SchemaDef = SchemaDef::Primitive(PrimitiveKind::String);

    /// A map whose values follow `values`.
    pub fn map(values: impl Into<SchemaDef>) -> SchemaDef {
        SchemaDef::Map(Box::new(values.into()))
    }

    /// A reference by name to a primitive or an earlier record declaration.
    pub fn named(name: impl Into<String>) -> SchemaDef {
        SchemaDef::Named(name.into())
    }

    /// Annotates this schema with a logical type tag.
    pub fn logical(self, tag: impl Into<String>) -> SchemaDef {
        SchemaDef::Logical {
            base: Box::new(self),
            tag: tag.into(),
        }
    }
}

impl From<RecordDef> for SchemaDef {
    fn from(record: RecordDef) -> Self {
        SchemaDef::Record(record)
    }
}

impl From<PrimitiveKind> for SchemaDef {
    fn from(kind: PrimitiveKind) -> Self {
        SchemaDef::Primitive(kind)
    }
}

/// An inline record declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl RecordDef {
    /// Starts a record declaration with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<SchemaDef>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            aliases: Vec::new(),
            schema: schema.into(),
        });
        self
    }

    /// Appends a field with alternate names.
    pub fn field_with_aliases<A: Into<String>>(
        mut self,
        name: impl Into<String>,
        aliases: impl IntoIterator<Item = A>,
        schema: impl Into<SchemaDef>,
    ) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
            schema: schema.into(),
        });
        self
    }
}

/// A field entry inside a [`RecordDef`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub aliases: Vec<String>,
    pub schema: SchemaDef,
}
