//! Registration macro for structured destinations.

/// Registers a struct as a structured destination.
///
/// Each direct field is listed with the slot name it answers to, plus any
/// slot aliases. Embedded sub-records (by value, `Option<_>` or `Box<_>`)
/// go in a trailing `embed` block; their slots are promoted into the parent
/// as if declared on it, after the direct slots.
///
/// ```
/// use avrobind::codec::{decode, Reader};
/// use avrobind::record;
/// use avrobind::schema::{RecordDef, Schema, SchemaDef};
///
/// #[derive(Debug, Default)]
/// struct Audit {
///     author: String,
/// }
///
/// #[derive(Debug, Default)]
/// struct Entry {
///     count: i64,
///     label: String,
///     audit: Option<Audit>,
/// }
///
/// record! {
///     Audit {
///         author: "author",
///     }
/// }
///
/// record! {
///     Entry {
///         count: "count",
///         label: "label" | "name",
///     }
///     embed {
///         audit: Option<Audit>,
///     }
/// }
///
/// let schema = Schema::new(
///     RecordDef::new("entry")
///         .field("count", SchemaDef::LONG)
///         .field("name", SchemaDef::STRING)
///         .field("author", SchemaDef::STRING),
/// )
/// .unwrap();
///
/// let bytes = [0x36, 0x06, b'f', b'o', b'o', 0x02, b'x'];
/// let mut entry = Entry::default();
/// decode(&schema, &mut Reader::new(&bytes), &mut entry).unwrap();
///
/// assert_eq!(entry.count, 27);
/// assert_eq!(entry.label, "foo");
/// assert_eq!(entry.audit.unwrap().author, "x");
/// ```
#[macro_export]
macro_rules! record {
    (
        $ty:ident {
            $( $field:ident : $name:literal $( | $alias:literal )* ),* $(,)?
        }
        $( embed {
            $( $embed:ident : $embed_ty:ty ),* $(,)?
        } )?
    ) => {
        impl $crate::bind::Embedded for $ty {
            fn descriptor_of() -> &'static $crate::bind::RecordDescriptor {
                static DESCRIPTOR: $crate::bind::RecordDescriptor = $crate::bind::RecordDescriptor {
                    name: stringify!($ty),
                    slots: &[
                        $(
                            $crate::bind::Slot {
                                name: $name,
                                aliases: &[$($alias),*],
                                embedded: None,
                            },
                        )*
                        $($(
                            $crate::bind::Slot {
                                name: stringify!($embed),
                                aliases: &[],
                                embedded: Some(
                                    <$embed_ty as $crate::bind::Embedded>::descriptor_of
                                        as fn() -> &'static $crate::bind::RecordDescriptor,
                                ),
                            },
                        )*)?
                    ],
                };
                &DESCRIPTOR
            }

            fn record_mut(&mut self) -> &mut dyn $crate::bind::Record {
                self
            }
        }

        impl $crate::bind::Record for $ty {
            fn descriptor(&self) -> &'static $crate::bind::RecordDescriptor {
                <Self as $crate::bind::Embedded>::descriptor_of()
            }

            #[allow(unused_variables)]
            fn slot_mut(&mut self, name: &str) -> Option<$crate::bind::SlotMut<'_>> {
                $(
                    if name == $name {
                        return Some($crate::bind::SlotMut::Value(&mut self.$field));
                    }
                )*
                $($(
                    if name == stringify!($embed) {
                        return Some($crate::bind::SlotMut::Embedded(&mut self.$embed));
                    }
                )*)?
                None
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::bind::Bind for $ty {
            fn destination(&mut self) -> $crate::bind::Destination<'_> {
                $crate::bind::Destination::Structured(self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::bind::{Bind, Destination, Embedded, Record, SlotMut};

    #[derive(Debug, Default)]
    struct Inner {
        b: String,
    }

    #[derive(Debug, Default)]
    struct Outer {
        a: i64,
        inner: Option<Inner>,
    }

    crate::record! {
        Inner {
            b: "b",
        }
    }

    crate::record! {
        Outer {
            a: "a" | "first",
        }
        embed {
            inner: Option<Inner>,
        }
    }

    #[test]
    fn test_descriptor_layout() {
        let descriptor = Outer::descriptor_of();
        assert_eq!(descriptor.name, "Outer");
        assert_eq!(descriptor.slots.len(), 2);
        assert_eq!(descriptor.slots[0].aliases, &["first"]);
        let (slot, embedded) = descriptor.embedded().next().unwrap();
        assert_eq!(slot.name, "inner");
        assert_eq!(embedded.name, "Inner");
    }

    #[test]
    fn test_slot_access_allocates_embedded() {
        let mut outer = Outer::default();
        match outer.slot_mut("inner") {
            Some(SlotMut::Embedded(embedded)) => {
                assert_eq!(embedded.record_mut().descriptor().name, "Inner");
            }
            _ => panic!("expected embedded slot"),
        }
        assert!(outer.inner.is_some());
        assert!(outer.slot_mut("b").is_none());
        assert!(matches!(outer.destination(), Destination::Structured(_)));
    }
}
