//! The type registry: cached reflection summaries of record types.
use crate::{Bind, Error};
use std::any::{Any, TypeId};

/// Looks up (or builds) the nested descriptor of a record field.
pub type DescriptorFn = fn() -> Result<&'static TypeDescriptor, Error>;
/// Produces a declared default value, type-erased for storage in a
/// [`FieldDescriptor`]. The registration macro guarantees the boxed type
/// matches the field type.
pub type DefaultFn = fn() -> Box<dyn Any>;

/// A record type that the engine can describe, serialize and reconstruct.
///
/// Implemented by the [`reflect_record!`](crate::reflect_record) macro, which
/// also generates the per-type descriptor cache: a `std::sync::OnceLock`
/// holding the build result for the process lifetime. The first caller builds
/// the descriptor; concurrent callers for the same type block on the cell and
/// reuse the single published result. A failed build is cached as well, so
/// an undescribable type fails the same way on every use.
pub trait Reflect: Bind {
    /// Build or look up the cached [`TypeDescriptor`] of this type.
    fn describe() -> Result<&'static TypeDescriptor, Error>;
}

/// The cached reflection summary of one record type.
///
/// Built once per type, immutable afterwards, safe for concurrent read.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Identity of the described type.
    pub id: TypeId,
    /// The type's own name.
    pub type_name: &'static str,
    /// Top-level tag name: an override, or the type's own name.
    pub root_name: &'static str,
    /// Field summaries in declaration order. Declaration order fixes the
    /// emission order for formats with no native ordering guarantee.
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Assemble a descriptor, rejecting duplicate external field names.
    pub fn new<T: Any>(
        type_name: &'static str,
        root_name: &'static str,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, Error> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i]
                .iter()
                .any(|other| other.external_name == field.external_name)
            {
                return Err(Error::UnsupportedType {
                    ty: type_name,
                    reason: format!("duplicate external field name `{}`", field.external_name),
                });
            }
        }
        Ok(Self {
            id: TypeId::of::<T>(),
            type_name,
            root_name,
            fields,
        })
    }

    /// Look up a field summary by its external name.
    pub fn field(&self, external_name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.external_name == external_name)
    }
}

/// The reflection summary of one field of a record.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The field name as declared in the record.
    pub declared_name: &'static str,
    /// The name used in both text formats: an override, or the declared name.
    pub external_name: &'static str,
    /// Whether a null value or an absent key is acceptable for this field.
    pub nullable: bool,
    /// Thunk producing the declared default value, if one was declared.
    pub default: Option<DefaultFn>,
    /// Classification of the field's declared type.
    pub kind: FieldKind,
}

/// Classification of a field's declared type, resolved once at
/// descriptor-build time.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Built-in text scalar.
    Str,
    /// Built-in integer scalar.
    Int,
    /// Built-in floating-point scalar.
    Float,
    /// Built-in boolean scalar.
    Bool,
    /// Non-record scalar handled by a registered converter.
    Custom {
        /// The converted type's name.
        ty: &'static str,
    },
    /// A nested record. The descriptor is looked up lazily so that
    /// self-referential records do not re-enter their own cache cell
    /// while it is being initialized.
    Record {
        /// The nested record type's name.
        ty: &'static str,
        /// Descriptor lookup for the nested type.
        descriptor: DescriptorFn,
    },
    /// A sequence of some element kind.
    Seq(Box<FieldKind>),
    /// A closed set of textual labels.
    Enum {
        /// The enum type's name.
        ty: &'static str,
        /// Allowed labels, in declaration order.
        labels: &'static [&'static str],
    },
}
