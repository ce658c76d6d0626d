//! The binder: converts between native instances and value trees.
//!
//! [`Bind`] is implemented for every leaf and container type a record field
//! may use; [`reflect_record!`](crate::reflect_record),
//! [`reflect_enum!`](crate::reflect_enum) and
//! [`reflect_scalar!`](crate::reflect_scalar) generate the remaining impls.
//! The field-resolution algorithm lives in [`bind_field`], once, and the
//! generated record impls call into it.
use crate::{Error, FieldKind, Map, TypeDescriptor, Value};
use std::{cell::RefCell, rc::Rc};

/// Nesting levels allowed before [`Error::DepthExceeded`] is reported.
pub const DEPTH_LIMIT: usize = 128;

macro_rules! impl_bind_num {
    ($(impl $($ty:ty),+ => $kind:ident($expected:literal))+) => {
        $($(impl Bind for $ty {
            fn kind() -> Result<FieldKind, Error> {
                Ok(FieldKind::$kind)
            }

            fn to_tree(&self, _: &mut EncodeCtx) -> Result<Value, Error> {
                Ok(Value::$kind(self.to_string()))
            }

            fn from_tree(value: &Value, _: &mut DecodeCtx) -> Result<Self, Error> {
                value
                    .scalar_text()
                    .and_then(|text| text.parse().ok())
                    .ok_or_else(|| Error::TypeMismatch {
                        expected: $expected,
                        found: value.found(),
                        at: String::new(),
                    })
            }
        })+)+
    };
}

/// Serialization state: the active recursion path and the depth guard.
///
/// Records push their own address while their fields are being converted, so
/// a shared instance that is revisited on the active path is reported as
/// [`Error::CyclicReference`] instead of diverging.
#[derive(Debug)]
pub struct EncodeCtx {
    active: Vec<usize>,
    limit: usize,
}

impl Default for EncodeCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeCtx {
    /// Context with the default depth limit.
    pub fn new() -> Self {
        Self::with_limit(DEPTH_LIMIT)
    }

    /// Context with a caller-chosen depth limit.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            active: Vec::new(),
            limit,
        }
    }

    /// Push one record instance onto the active path.
    pub fn enter(&mut self, addr: usize, ty: &'static str) -> Result<(), Error> {
        if self.active.contains(&addr) {
            return Err(Error::CyclicReference(ty));
        }
        if self.active.len() >= self.limit {
            return Err(Error::DepthExceeded { limit: self.limit });
        }
        self.active.push(addr);
        Ok(())
    }

    /// Pop the current record instance off the active path.
    pub fn leave(&mut self) {
        self.active.pop();
    }
}

/// Deserialization state: the depth guard.
#[derive(Debug)]
pub struct DecodeCtx {
    depth: usize,
    limit: usize,
}

impl Default for DecodeCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeCtx {
    /// Context with the default depth limit.
    pub fn new() -> Self {
        Self::with_limit(DEPTH_LIMIT)
    }

    /// Context with a caller-chosen depth limit.
    pub fn with_limit(limit: usize) -> Self {
        Self { depth: 0, limit }
    }

    /// Enter one nesting level.
    pub fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= self.limit {
            return Err(Error::DepthExceeded { limit: self.limit });
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave one nesting level.
    pub fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// Conversion between one native type and the value tree.
///
/// `kind` classifies the type for descriptor building and may fail — that is
/// where an unregistered custom scalar surfaces. `to_tree` is total for any
/// acyclic instance of a described type; `from_tree` is partial and fails on
/// structural mismatch.
pub trait Bind: Sized + 'static {
    /// Whether a null value stands for a legitimate absent value.
    const NULLABLE: bool = false;

    /// Classify this type for a field descriptor.
    fn kind() -> Result<FieldKind, Error>;

    /// Convert an instance into a value tree.
    fn to_tree(&self, ctx: &mut EncodeCtx) -> Result<Value, Error>;

    /// Reconstruct an instance from a value tree.
    fn from_tree(value: &Value, ctx: &mut DecodeCtx) -> Result<Self, Error>;

    /// The value bound when the key is absent and no default is declared,
    /// if this type has one.
    fn absent() -> Option<Self> {
        None
    }
}

impl_bind_num! {
    impl usize, u8, u16, u32, u64, isize, i8, i16, i32, i64 => Int("integer")
    impl f32, f64 => Float("float")
}

impl Bind for bool {
    fn kind() -> Result<FieldKind, Error> {
        Ok(FieldKind::Bool)
    }

    fn to_tree(&self, _: &mut EncodeCtx) -> Result<Value, Error> {
        Ok(Value::Bool(*self))
    }

    fn from_tree(value: &Value, _: &mut DecodeCtx) -> Result<Self, Error> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(Error::TypeMismatch {
                expected: "boolean",
                found: value.found(),
                at: String::new(),
            }),
        }
    }
}

impl Bind for String {
    fn kind() -> Result<FieldKind, Error> {
        Ok(FieldKind::Str)
    }

    fn to_tree(&self, _: &mut EncodeCtx) -> Result<Value, Error> {
        Ok(Value::Str(self.clone()))
    }

    fn from_tree(value: &Value, _: &mut DecodeCtx) -> Result<Self, Error> {
        // Inference may have classified the literal as a number or boolean;
        // any scalar text is a valid string.
        value
            .scalar_text()
            .map(|text| text.into_owned())
            .ok_or_else(|| Error::TypeMismatch {
                expected: "string",
                found: value.found(),
                at: String::new(),
            })
    }
}

impl<T: Bind> Bind for Option<T> {
    const NULLABLE: bool = true;

    fn kind() -> Result<FieldKind, Error> {
        T::kind()
    }

    fn to_tree(&self, ctx: &mut EncodeCtx) -> Result<Value, Error> {
        match self {
            Some(inner) => inner.to_tree(ctx),
            None => Ok(Value::Null),
        }
    }

    fn from_tree(value: &Value, ctx: &mut DecodeCtx) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_tree(value, ctx).map(Some),
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: Bind> Bind for Vec<T> {
    fn kind() -> Result<FieldKind, Error> {
        Ok(FieldKind::Seq(Box::new(T::kind()?)))
    }

    fn to_tree(&self, ctx: &mut EncodeCtx) -> Result<Value, Error> {
        self.iter()
            .map(|item| item.to_tree(ctx))
            .collect::<Result<_, _>>()
            .map(Value::Seq)
    }

    fn from_tree(value: &Value, ctx: &mut DecodeCtx) -> Result<Self, Error> {
        ctx.enter()?;
        let out = match value {
            Value::Seq(items) => items
                .iter()
                .map(|item| T::from_tree(item, ctx))
                .collect::<Result<_, _>>()?,
            // A lone node stands for a one-element sequence: the tag format
            // cannot distinguish a single occurrence from a list of one.
            other => vec![T::from_tree(other, ctx)?],
        };
        ctx.leave();
        Ok(out)
    }

    /// An absent key is the empty sequence — the tag format encodes an
    /// empty sequence as zero occurrences of the tag.
    fn absent() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: Bind> Bind for Box<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn kind() -> Result<FieldKind, Error> {
        T::kind()
    }

    fn to_tree(&self, ctx: &mut EncodeCtx) -> Result<Value, Error> {
        (**self).to_tree(ctx)
    }

    fn from_tree(value: &Value, ctx: &mut DecodeCtx) -> Result<Self, Error> {
        T::from_tree(value, ctx).map(Box::new)
    }

    fn absent() -> Option<Self> {
        T::absent().map(Box::new)
    }
}

// Shared mutable handles are what make a reference cycle constructible in
// the first place, so they get the same treatment as plain records: the
// inner address joins the active path through the delegated `to_tree`.
impl<T: Bind> Bind for Rc<RefCell<T>> {
    const NULLABLE: bool = T::NULLABLE;

    fn kind() -> Result<FieldKind, Error> {
        T::kind()
    }

    fn to_tree(&self, ctx: &mut EncodeCtx) -> Result<Value, Error> {
        self.borrow().to_tree(ctx)
    }

    fn from_tree(value: &Value, ctx: &mut DecodeCtx) -> Result<Self, Error> {
        T::from_tree(value, ctx).map(|v| Rc::new(RefCell::new(v)))
    }

    fn absent() -> Option<Self> {
        T::absent().map(|v| Rc::new(RefCell::new(v)))
    }
}

/// Require a mapping node, as every record binding does.
pub fn expect_map<'a>(value: &'a Value, root: &'static str) -> Result<&'a Map, Error> {
    match value {
        Value::Map(map) => Ok(map),
        other => Err(Error::TypeMismatch {
            expected: "mapping",
            found: other.found(),
            at: root.to_string(),
        }),
    }
}

/// Resolve one field of a record from an input mapping.
///
/// This is the single implementation of the binding algorithm: key present
/// and non-null binds recursively, a null value requires nullability, an
/// absent key falls back to the declared default, then to the type's absent
/// value, then fails with [`Error::MissingField`]. Unknown keys in the
/// mapping are never visited at all, which is what makes them tolerated.
pub fn bind_field<T: Bind>(
    map: &Map,
    desc: &TypeDescriptor,
    index: usize,
    ctx: &mut DecodeCtx,
) -> Result<T, Error> {
    let field = &desc.fields[index];
    match map.get(field.external_name) {
        Some(Value::Null) if !field.nullable => Err(Error::NonNullableField {
            root: desc.root_name,
            field: field.external_name,
        }),
        Some(value) => {
            T::from_tree(value, ctx).map_err(|e| e.locate(desc.root_name, field.external_name))
        }
        None => match field.default {
            Some(thunk) => match thunk().downcast::<T>() {
                Ok(v) => Ok(*v),
                Err(_) => Err(Error::UnsupportedType {
                    ty: desc.type_name,
                    reason: format!(
                        "default value for `{}` has the wrong type",
                        field.external_name
                    ),
                }),
            },
            None => T::absent().ok_or(Error::MissingField {
                root: desc.root_name,
                field: field.external_name,
            }),
        },
    }
}
