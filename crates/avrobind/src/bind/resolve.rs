//! Field-to-slot resolution for structured destinations.
//!
//! A [`RecordPlan`] maps every schema field of one record, by position, to
//! a slot path in one destination type. The path ends at the slot that
//! receives the value; any earlier segments name embedded sub-records that
//! are walked (and allocated, if optional) on the way down.
//!
//! Plans depend only on the schema record and the static descriptor, so a
//! decoder computes each one once and reuses it for every value.

use crate::bind::{Bind, Record, RecordDescriptor, SlotMut};
use crate::limits::MAX_DEPTH;
use crate::schema::RecordSchema;

/// Slot path for one schema field.
pub(crate) type SlotPath = Vec<&'static str>;

/// Resolved slot paths for a record, indexed by field position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordPlan {
    pub targets: Vec<Option<SlotPath>>,
}

impl RecordPlan {
    /// Number of schema fields that found no slot.
    pub fn unmatched(&self) -> usize {
        self.targets.iter().filter(|t| t.is_none()).count()
    }
}

/// Resolves every field of `record` against `descriptor`.
pub(crate) fn plan_record(record: &RecordSchema, descriptor: &'static RecordDescriptor) -> RecordPlan {
    let targets = record
        .fields
        .iter()
        .map(|field| {
            let names: Vec<&str> = field.names().collect();
            find_slot(descriptor, &names, 0)
        })
        .collect();
    RecordPlan { targets }
}

/// Finds the slot for the first of `names` that matches.
///
/// Direct slots are tried for every name (declared name first, then
/// aliases in order) before any embedded sub-record is searched. Embedded
/// sub-records are searched depth-first in declaration order, so the first
/// declared one wins a collision.
fn find_slot(descriptor: &'static RecordDescriptor, names: &[&str], depth: usize) -> Option<SlotPath> {
    if depth > MAX_DEPTH {
        return None;
    }

    for name in names {
        if let Some(slot) = descriptor.direct().find(|slot| slot.matches(name)) {
            return Some(vec![slot.name]);
        }
    }

    for (slot, embedded) in descriptor.embedded() {
        if let Some(mut path) = find_slot(embedded, names, depth + 1) {
            path.insert(0, slot.name);
            return Some(path);
        }
    }

    None
}

/// Walks `path` from `record`, allocating absent embedded sub-records.
pub(crate) fn slot_at<'r>(
    record: &'r mut (dyn Record + '_),
    path: &[&'static str],
) -> Option<&'r mut dyn Bind> {
    let (last, parents) = path.split_last()?;
    match parents.split_first() {
        None => match record.slot_mut(last)? {
            SlotMut::Value(value) => Some(value),
            SlotMut::Embedded(_) => None,
        },
        Some((first, _)) => match record.slot_mut(first)? {
            SlotMut::Embedded(embedded) => slot_at(embedded.record_mut(), &path[1..]),
            SlotMut::Value(_) => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::Slot;
    use crate::schema::{Field, Node, PrimitiveKind};

    static INNER: RecordDescriptor = RecordDescriptor {
        name: "Inner",
        slots: &[
            Slot { name: "b", aliases: &[], embedded: None },
            Slot { name: "x", aliases: &[], embedded: None },
        ],
    };

    static OTHER: RecordDescriptor = RecordDescriptor {
        name: "Other",
        slots: &[Slot { name: "x", aliases: &[], embedded: None }],
    };

    fn inner() -> &'static RecordDescriptor {
        &INNER
    }

    fn other() -> &'static RecordDescriptor {
        &OTHER
    }

    static OUTER: RecordDescriptor = RecordDescriptor {
        name: "Outer",
        slots: &[
            Slot { name: "a", aliases: &["first"], embedded: None },
            Slot { name: "inner", aliases: &[], embedded: Some(inner as fn() -> &'static RecordDescriptor) },
            Slot { name: "other", aliases: &[], embedded: Some(other as fn() -> &'static RecordDescriptor) },
        ],
    };

    fn record(fields: &[(&str, Vec<&str>)]) -> RecordSchema {
        RecordSchema {
            name: "test".to_string(),
            fields: fields
                .iter()
                .enumerate()
                .map(|(position, (name, aliases))| Field {
                    name: name.to_string(),
                    aliases: aliases.iter().map(|a| a.to_string()).collect(),
                    schema: Node::Primitive(PrimitiveKind::Long),
                    position,
                })
                .collect(),
        }
    }

    #[test]
    fn test_direct_and_alias() {
        let plan = plan_record(&record(&[("a", vec![]), ("c", vec!["a"]), ("first", vec![])]), &OUTER);
        assert_eq!(plan.targets[0], Some(vec!["a"]));
        assert_eq!(plan.targets[1], Some(vec!["a"]));
        // Slot aliases answer too.
        assert_eq!(plan.targets[2], Some(vec!["a"]));
    }

    #[test]
    fn test_embedded_promotion() {
        let plan = plan_record(&record(&[("b", vec![]), ("x", vec![]), ("missing", vec![])]), &OUTER);
        assert_eq!(plan.targets[0], Some(vec!["inner", "b"]));
        // First declared embedded record wins.
        assert_eq!(plan.targets[1], Some(vec!["inner", "x"]));
        assert_eq!(plan.targets[2], None);
        assert_eq!(plan.unmatched(), 1);
    }

    #[test]
    fn test_direct_beats_embedded_alias_order() {
        // The alias matches a direct slot; the name only matches an embedded one.
        let plan = plan_record(&record(&[("b", vec!["a"])]), &OUTER);
        assert_eq!(plan.targets[0], Some(vec!["a"]));
    }
}
