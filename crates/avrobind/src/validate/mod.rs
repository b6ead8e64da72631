//! Schema well-formedness checks.
//!
//! These run once while a [`Schema`](crate::schema::Schema) is built. The
//! decoder assumes a validated schema and never re-checks per call.
//! Reference resolution itself is checked during construction, since a
//! reference can only be resolved against records already declared.

use rustc_hash::FxHashSet;

use crate::error::SchemaError;
use crate::schema::{Node, RecordSchema};

/// Validates a record's field namespace.
///
/// Field names and aliases share one namespace: no name may appear twice,
/// whether as a name or as an alias. Names are case-sensitive.
pub fn validate_record(record: &RecordSchema) -> Result<(), SchemaError> {
    let mut seen = FxHashSet::default();
    for field in &record.fields {
        if field.name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "field" });
        }
        for name in field.names() {
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateField {
                    record: record.name.clone(),
                    name: name.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Validates that a logical tag wraps a primitive or a record.
pub fn validate_logical_base(base: &Node, tag: &str) -> Result<(), SchemaError> {
    match base {
        Node::Map(_) => Err(SchemaError::InvalidLogicalBase {
            tag: tag.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, PrimitiveKind};

    fn field(name: &str, aliases: &[&str]) -> Field {
        Field {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            schema: Node::Primitive(PrimitiveKind::Long),
            position: 0,
        }
    }

    #[test]
    fn test_valid_record() {
        let record = RecordSchema {
            name: "test".to_string(),
            fields: vec![field("c", &["a"]), field("b", &[]), field("B", &[])],
        };
        assert!(validate_record(&record).is_ok());
    }

    #[test]
    fn test_duplicate_name() {
        let record = RecordSchema {
            name: "test".to_string(),
            fields: vec![field("a", &[]), field("a", &[])],
        };
        assert_eq!(
            validate_record(&record),
            Err(SchemaError::DuplicateField {
                record: "test".to_string(),
                name: "a".to_string(),
            })
        );
    }

    #[test]
    fn test_alias_collides_with_name() {
        let record = RecordSchema {
            name: "test".to_string(),
            fields: vec![field("a", &[]), field("c", &["a"])],
        };
        assert!(matches!(
            validate_record(&record),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_empty_field_name() {
        let record = RecordSchema {
            name: "test".to_string(),
            fields: vec![field("", &[])],
        };
        assert_eq!(
            validate_record(&record),
            Err(SchemaError::EmptyName { kind: "field" })
        );
    }

    #[test]
    fn test_logical_on_map_rejected() {
        let map = Node::Map(Box::new(Node::Primitive(PrimitiveKind::Int)));
        assert!(validate_logical_base(&map, "date").is_err());
        assert!(validate_logical_base(&Node::Primitive(PrimitiveKind::Int), "date").is_ok());
    }
}
