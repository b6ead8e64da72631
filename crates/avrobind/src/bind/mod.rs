//! Destination descriptors.
//!
//! The decoder never inspects Rust types directly. Every destination
//! implements [`Bind`], which classifies it as one of five shapes:
//!
//! - [`Destination::Structured`]: a record type with named slots, registered
//!   with the [`record!`](crate::record) macro.
//! - [`Destination::Associative`]: a map keyed by field names or map keys.
//! - [`Destination::Dynamic`]: a [`Value`] that takes anything verbatim.
//! - [`Destination::Polymorphic`]: a [`Polymorphic`] slot that must already
//!   hold a concrete record.
//! - [`Destination::Scalar`]: a primitive leaf such as `i64` or `String`.
//!
//! `Option<T>` allocates `T::default()` when asked for its destination and
//! then forwards, which is how absent optionals are filled on demand.

mod impls;
mod macros;
pub(crate) mod resolve;

use std::any::Any;
use std::fmt;

use crate::model::Value;

pub use impls::MapKey;

/// A value the decoder can write into.
pub trait Bind {
    /// Classifies this value for the binding resolver.
    fn destination(&mut self) -> Destination<'_>;
}

/// The shape of a destination, borrowed for one binding step.
pub enum Destination<'a> {
    Structured(&'a mut dyn Record),
    Associative(&'a mut dyn MapSink),
    Dynamic(&'a mut Value),
    Polymorphic(&'a mut Polymorphic),
    Scalar(&'a mut dyn Scalar),
}

impl Destination<'_> {
    /// Short name of the destination kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Destination::Structured(record) => record.descriptor().name,
            Destination::Associative(_) => "map",
            Destination::Dynamic(_) => "value",
            Destination::Polymorphic(_) => "polymorphic",
            Destination::Scalar(scalar) => scalar.kind(),
        }
    }
}

/// Static description of a record type's slots.
///
/// Built once per type by [`record!`](crate::record) and shared by every
/// instance.
#[derive(Debug)]
pub struct RecordDescriptor {
    pub name: &'static str,
    pub slots: &'static [Slot],
}

impl RecordDescriptor {
    /// Slots declared directly on this type, in declaration order.
    pub fn direct(&self) -> impl Iterator<Item = &'static Slot> {
        self.slots.iter().filter(|slot| slot.embedded.is_none())
    }

    /// Embedded sub-records whose slots are promoted into this type.
    pub fn embedded(&self) -> impl Iterator<Item = (&'static Slot, &'static RecordDescriptor)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.embedded.map(|descriptor| (slot, descriptor())))
    }
}

/// One named slot of a record type.
#[derive(Debug)]
pub struct Slot {
    /// Name matched against schema field names and aliases.
    pub name: &'static str,
    /// Additional names this slot answers to.
    pub aliases: &'static [&'static str],
    /// For embedded sub-records, the descriptor of the embedded type.
    pub embedded: Option<fn() -> &'static RecordDescriptor>,
}

impl Slot {
    /// Returns true if this slot answers to `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

/// Mutable access to one slot.
pub enum SlotMut<'a> {
    Value(&'a mut dyn Bind),
    Embedded(&'a mut dyn Embedded),
}

/// A record type with named slots.
///
/// Implemented by [`record!`](crate::record); hand-written impls must keep
/// [`Record::slot_mut`] consistent with the descriptor.
pub trait Record {
    /// The static slot layout of this type.
    fn descriptor(&self) -> &'static RecordDescriptor;

    /// Mutable access to the slot named `name` in the descriptor.
    fn slot_mut(&mut self, name: &str) -> Option<SlotMut<'_>>;

    /// Upcast for downcasting a [`Polymorphic`] payload.
    fn as_any(&self) -> &dyn Any;
}

/// A record embedded in another record, by value or behind `Option`/`Box`.
pub trait Embedded {
    /// Descriptor of the embedded record type, available without an instance.
    fn descriptor_of() -> &'static RecordDescriptor
    where
        Self: Sized;

    /// The embedded record, allocating it first if it is absent.
    fn record_mut(&mut self) -> &mut dyn Record;
}

impl<T: Embedded + Default> Embedded for Option<T> {
    fn descriptor_of() -> &'static RecordDescriptor {
        T::descriptor_of()
    }

    fn record_mut(&mut self) -> &mut dyn Record {
        self.get_or_insert_with(T::default).record_mut()
    }
}

impl<T: Embedded> Embedded for Box<T> {
    fn descriptor_of() -> &'static RecordDescriptor {
        T::descriptor_of()
    }

    fn record_mut(&mut self) -> &mut dyn Record {
        self.as_mut().record_mut()
    }
}

/// A map-like destination.
pub trait MapSink {
    /// Name of the key type, for diagnostics.
    fn key_kind(&self) -> &'static str;

    /// Returns true if keys can be built from strings.
    fn accepts_string_keys(&self) -> bool;

    /// The value slot for `key`, inserting a default value if absent.
    ///
    /// Returns `None` when the key type is not string-like.
    fn entry(&mut self, key: String) -> Option<&mut dyn Bind>;
}

/// A primitive leaf destination.
pub trait Scalar {
    /// Name of the accepted kind, for diagnostics (e.g., "string").
    fn kind(&self) -> &'static str;

    /// Stores `value`, or hands it back if this slot cannot represent it.
    fn assign(&mut self, value: Value) -> Result<(), Value>;
}

/// A destination constrained only by capability.
///
/// The decoder cannot invent a concrete type, so the caller must populate
/// the slot before decoding. Decoding into an empty slot fails with
/// [`DecodeError::UnresolvedPolymorphicTarget`](crate::DecodeError::UnresolvedPolymorphicTarget).
#[derive(Default)]
pub struct Polymorphic {
    inner: Option<Box<dyn Record>>,
}

impl Polymorphic {
    /// An unpopulated slot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A slot holding `record`.
    pub fn new<R: Record + 'static>(record: R) -> Self {
        Self {
            inner: Some(Box::new(record)),
        }
    }

    /// Returns true if the slot holds a concrete record.
    pub fn is_populated(&self) -> bool {
        self.inner.is_some()
    }

    /// The concrete record, if populated.
    pub fn get_mut(&mut self) -> Option<&mut (dyn Record + 'static)> {
        self.inner.as_deref_mut()
    }

    /// Downcasts the concrete record.
    pub fn downcast_ref<R: Record + 'static>(&self) -> Option<&R> {
        self.inner.as_deref()?.as_any().downcast_ref::<R>()
    }
}

impl fmt::Debug for Polymorphic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(record) => write!(f, "Polymorphic({})", record.descriptor().name),
            None => f.write_str("Polymorphic(<empty>)"),
        }
    }
}

impl Bind for Polymorphic {
    fn destination(&mut self) -> Destination<'_> {
        Destination::Polymorphic(self)
    }
}

impl Bind for Value {
    fn destination(&mut self) -> Destination<'_> {
        Destination::Dynamic(self)
    }
}
