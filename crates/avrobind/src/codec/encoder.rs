//! Schema-driven encoding of dynamic values.
//!
//! The inverse of decoding into a [`Value`]: fields are written in schema
//! position order, maps as a single block followed by the zero terminator,
//! and logical values are converted back to their base primitive.

use crate::codec::primitives::Writer;
use crate::error::EncodeError;
use crate::logical::unproject;
use crate::model::Value;
use crate::schema::{Node, PrimitiveKind, RecordId, Schema};

/// Encodes `value` as described by `schema`.
pub fn encode_value(schema: &Schema, value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new();
    write_value(schema, &mut writer, value)?;
    tracing::trace!(len = writer.len(), "encoded value");
    Ok(writer.into_bytes())
}

/// Appends the encoding of `value` to `writer`.
pub fn write_value(schema: &Schema, writer: &mut Writer, value: &Value) -> Result<(), EncodeError> {
    let mut encoder = Encoder {
        schema,
        writer,
        path: Vec::new(),
    };
    encoder.write_node(schema.root(), value)
}

struct Encoder<'s, 'w> {
    schema: &'s Schema,
    writer: &'w mut Writer,
    path: Vec<&'s str>,
}

impl<'s> Encoder<'s, '_> {
    fn write_node(&mut self, node: &'s Node, value: &Value) -> Result<(), EncodeError> {
        match node {
            Node::Primitive(kind) => self.write_primitive(*kind, value),
            Node::Record(id) | Node::Reference(id) => self.write_record(*id, value),
            Node::Map(values) => self.write_map(values, value),
            Node::Logical { base, tag } => match base.primitive_kind() {
                Some(kind) => {
                    let raw = unproject(tag, kind, value.clone())?;
                    self.write_primitive(kind, &raw)
                }
                None => self.write_node(base, value),
            },
        }
    }

    fn write_record(&mut self, id: RecordId, value: &Value) -> Result<(), EncodeError> {
        let schema = self.schema;
        let record = schema.record(id);
        let fields = match value {
            Value::Record(fields) | Value::Map(fields) => fields,
            other => return Err(self.mismatch("record", other)),
        };

        for field in &record.fields {
            let field_value = field
                .names()
                .find_map(|name| fields.get(name))
                .ok_or_else(|| EncodeError::MissingField {
                    record: record.name.clone(),
                    field: field.name.clone(),
                })?;
            self.path.push(&field.name);
            self.write_node(&field.schema, field_value)?;
            self.path.pop();
        }
        Ok(())
    }

    fn write_map(&mut self, values: &'s Node, value: &Value) -> Result<(), EncodeError> {
        let entries = match value {
            Value::Map(entries) | Value::Record(entries) => entries,
            other => return Err(self.mismatch("map", other)),
        };

        if !entries.is_empty() {
            self.writer.write_long(entries.len() as i64);
            for (key, entry) in entries {
                self.writer.write_str(key);
                self.write_node(values, entry)?;
            }
        }
        self.writer.write_long(0);
        Ok(())
    }

    fn write_primitive(&mut self, kind: PrimitiveKind, value: &Value) -> Result<(), EncodeError> {
        let writer = &mut *self.writer;
        match (kind, value) {
            (PrimitiveKind::Null, Value::Null) => {}
            (PrimitiveKind::Boolean, Value::Boolean(v)) => writer.write_bool(*v),
            (PrimitiveKind::Int, Value::Int(v)) => writer.write_int(*v),
            (PrimitiveKind::Long, Value::Int(v)) => writer.write_long(*v as i64),
            (PrimitiveKind::Long, Value::Long(v)) => writer.write_long(*v),
            (PrimitiveKind::Float, Value::Float(v)) => writer.write_float(*v),
            (PrimitiveKind::Double, Value::Float(v)) => writer.write_double(*v as f64),
            (PrimitiveKind::Double, Value::Double(v)) => writer.write_double(*v),
            (PrimitiveKind::Bytes, Value::Bytes(v)) => writer.write_bytes(v),
            (PrimitiveKind::String, Value::String(v)) => writer.write_str(v),
            (kind, other) => return Err(self.mismatch(kind.name(), other)),
        }
        Ok(())
    }

    fn mismatch(&self, expected: &'static str, found: &Value) -> EncodeError {
        EncodeError::TypeMismatch {
            path: self.path.join("."),
            expected,
            found: found.kind().name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Decoder;
    use crate::model::Timestamp;
    use crate::schema::{RecordDef, SchemaDef};

    fn test_schema() -> Schema {
        Schema::new(
            RecordDef::new("test")
                .field("a", SchemaDef::LONG)
                .field("b", SchemaDef::STRING),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_record() {
        let value = Value::record([("b", Value::from("foo")), ("a", Value::Long(27))]);
        let bytes = encode_value(&test_schema(), &value).unwrap();
        assert_eq!(bytes, vec![0x36, 0x06, 0x66, 0x6f, 0x6f]);
    }

    #[test]
    fn test_encode_by_alias() {
        let schema = Schema::new(
            RecordDef::new("test").field_with_aliases("c", ["a"], SchemaDef::INT),
        )
        .unwrap();
        let bytes = encode_value(&schema, &Value::record([("a", Value::Int(1))])).unwrap();
        assert_eq!(bytes, vec![0x02]);
    }

    #[test]
    fn test_missing_field() {
        let err = encode_value(&test_schema(), &Value::record([("a", Value::Long(1))])).unwrap_err();
        assert_eq!(
            err,
            EncodeError::MissingField {
                record: "test".to_string(),
                field: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_type_mismatch_path() {
        let value = Value::record([("a", Value::from("x")), ("b", Value::from("y"))]);
        let err = encode_value(&test_schema(), &value).unwrap_err();
        assert_eq!(
            err,
            EncodeError::TypeMismatch {
                path: "a".to_string(),
                expected: "long",
                found: "string",
            }
        );
    }

    #[test]
    fn test_map_and_logical_roundtrip() {
        let schema = Schema::new(
            RecordDef::new("event")
                .field("at", SchemaDef::LONG.logical("timestamp-micros"))
                .field("tags", SchemaDef::map(SchemaDef::STRING)),
        )
        .unwrap();
        let value = Value::record([
            ("at", Value::Timestamp(Timestamp::from_epoch_micros(1_658_335_430_564_125).unwrap())),
            ("tags", Value::map([("k", Value::from("v")), ("x", Value::from(""))])),
        ]);

        let bytes = encode_value(&schema, &value).unwrap();
        let decoded = Decoder::new(&schema, &bytes).decode_value().unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_empty_map() {
        let schema = Schema::new(SchemaDef::map(SchemaDef::INT)).unwrap();
        let bytes = encode_value(&schema, &Value::Map(Default::default())).unwrap();
        assert_eq!(bytes, vec![0x00]);
    }
}
