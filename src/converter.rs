//! Pluggable scalar converters for types that are neither primitives nor
//! records.
//!
//! A converter is a bidirectional text mapping registered by type identity.
//! Registration must happen before the first descriptor that uses the type is
//! built, otherwise describing fails with
//! [`Error::UnsupportedType`](crate::Error::UnsupportedType) — failures
//! surface at descriptor-build time, not at call time. Converters are expected
//! to obey the round-trip law: `parse(format(x)) == x` for all valid `x`.
use crate::{Error, FieldKind};
use once_cell::sync::Lazy;
use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    sync::RwLock,
};

struct Entry {
    type_name: &'static str,
    parse: Box<dyn Fn(&str) -> Option<Box<dyn Any>> + Send + Sync>,
    format: Box<dyn Fn(&dyn Any) -> Option<String> + Send + Sync>,
}

static CONVERTERS: Lazy<RwLock<HashMap<TypeId, Entry>>> = Lazy::new(Default::default);

fn short_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Register the converter for `T`.
///
/// The registry is populated once and read afterwards; re-registering a type
/// keeps the first converter.
///
/// ```
/// #[derive(Debug, Clone, PartialEq)]
/// struct Upper(String);
///
/// textree::converter::register::<Upper>(
///     |s| Some(Upper(s.to_uppercase())),
///     |u| u.0.clone(),
/// );
/// ```
pub fn register<T: Any>(parse: fn(&str) -> Option<T>, format: fn(&T) -> String) {
    let entry = Entry {
        type_name: short_name::<T>(),
        parse: Box::new(move |s| parse(s).map(|v| Box::new(v) as Box<dyn Any>)),
        format: Box::new(move |v| v.downcast_ref::<T>().map(format)),
    };
    CONVERTERS
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .entry(TypeId::of::<T>())
        .or_insert(entry);
}

/// The field kind of `T`, or the descriptor-build failure when no converter
/// is registered.
pub fn kind_of<T: Any>() -> Result<FieldKind, Error> {
    let registry = CONVERTERS.read().unwrap_or_else(|e| e.into_inner());
    match registry.get(&TypeId::of::<T>()) {
        Some(entry) => Ok(FieldKind::Custom {
            ty: entry.type_name,
        }),
        None => Err(Error::UnsupportedType {
            ty: short_name::<T>(),
            reason: "no converter registered".to_string(),
        }),
    }
}

/// Format a custom scalar through its registered converter.
pub fn format<T: Any>(value: &T) -> Result<String, Error> {
    let registry = CONVERTERS.read().unwrap_or_else(|e| e.into_inner());
    registry
        .get(&TypeId::of::<T>())
        .and_then(|entry| (entry.format)(value))
        .ok_or_else(|| Error::UnsupportedType {
            ty: short_name::<T>(),
            reason: "no converter registered".to_string(),
        })
}

/// Parse a custom scalar through its registered converter.
pub fn parse<T: Any>(text: &str) -> Result<T, Error> {
    let registry = CONVERTERS.read().unwrap_or_else(|e| e.into_inner());
    let entry = registry
        .get(&TypeId::of::<T>())
        .ok_or_else(|| Error::UnsupportedType {
            ty: short_name::<T>(),
            reason: "no converter registered".to_string(),
        })?;
    let parsed = (entry.parse)(text).ok_or_else(|| Error::TypeMismatch {
        expected: entry.type_name,
        found: text.to_string(),
        at: String::new(),
    })?;
    match parsed.downcast::<T>() {
        Ok(v) => Ok(*v),
        Err(_) => Err(Error::UnsupportedType {
            ty: short_name::<T>(),
            reason: "converter produced a value of the wrong type".to_string(),
        }),
    }
}
