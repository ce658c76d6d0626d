//! Declarative registration macros: the static per-type metadata surface.

/// Declare a record type and register it with the engine.
///
/// The macro emits the struct as written and generates its [`Reflect`] and
/// [`Bind`](crate::Bind) implementations, including the process-lifetime
/// descriptor cache. Metadata is declared inline:
///
/// + `as "name"` after the struct name overrides the root name.
/// + `as "name"` after a field type overrides the external field name.
/// + `= expr` after a field declares its default value.
/// + `Option<T>` fields are nullable.
///
/// ```
/// use textree::{reflect_record, Reflect};
///
/// reflect_record! {
///     /// A library record.
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Book as "book" {
///         title: String,
///         year: i64 as "published",
///         edition: i64 = 1,
///         note: Option<String>,
///     }
/// }
///
/// let desc = Book::describe().unwrap();
/// assert_eq!(desc.root_name, "book");
/// assert_eq!(desc.fields[1].external_name, "published");
/// assert!(desc.fields[2].default.is_some());
/// assert!(desc.fields[3].nullable);
/// ```
///
/// [`Reflect`]: crate::Reflect
#[macro_export]
macro_rules! reflect_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(as $root:literal)? {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty $(as $external:literal)? $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Reflect for $name {
            fn describe() -> ::std::result::Result<&'static $crate::TypeDescriptor, $crate::Error> {
                static DESC: ::std::sync::OnceLock<
                    ::std::result::Result<$crate::TypeDescriptor, $crate::Error>,
                > = ::std::sync::OnceLock::new();
                DESC.get_or_init(|| {
                    let fields = ::std::vec![
                        $($crate::FieldDescriptor {
                            declared_name: stringify!($field),
                            external_name: $crate::__name_or!(stringify!($field) $(, $external)?),
                            nullable: <$field_ty as $crate::Bind>::NULLABLE,
                            default: $crate::__default_thunk!($field_ty $(, $default)?),
                            kind: <$field_ty as $crate::Bind>::kind()?,
                        },)*
                    ];
                    $crate::TypeDescriptor::new::<Self>(
                        stringify!($name),
                        $crate::__name_or!(stringify!($name) $(, $root)?),
                        fields,
                    )
                })
                .as_ref()
                .map_err(::std::clone::Clone::clone)
            }
        }

        impl $crate::Bind for $name {
            fn kind() -> ::std::result::Result<$crate::FieldKind, $crate::Error> {
                Ok($crate::FieldKind::Record {
                    ty: stringify!($name),
                    descriptor: <Self as $crate::Reflect>::describe,
                })
            }

            fn to_tree(
                &self,
                ctx: &mut $crate::EncodeCtx,
            ) -> ::std::result::Result<$crate::Value, $crate::Error> {
                let desc = <Self as $crate::Reflect>::describe()?;
                ctx.enter(self as *const Self as usize, desc.type_name)?;
                #[allow(unused_mut)]
                let mut map = $crate::Map::new();
                #[allow(unused_mut)]
                let mut index = 0usize;
                $({
                    let field = &desc.fields[index];
                    let value = $crate::Bind::to_tree(&self.$field, ctx)
                        .map_err(|e| e.locate(desc.root_name, field.external_name))?;
                    map.insert(field.external_name.to_string(), value);
                    index += 1;
                })*
                let _ = index;
                ctx.leave();
                Ok($crate::Value::Map(map))
            }

            fn from_tree(
                value: &$crate::Value,
                ctx: &mut $crate::DecodeCtx,
            ) -> ::std::result::Result<Self, $crate::Error> {
                let desc = <Self as $crate::Reflect>::describe()?;
                let map = $crate::expect_map(value, desc.root_name)?;
                ctx.enter()?;
                #[allow(unused_mut)]
                let mut index = 0usize;
                // A single struct literal: the instance exists only once
                // every field resolved.
                let out = Self {
                    $($field: {
                        let v = $crate::bind_field::<$field_ty>(map, desc, index, ctx)?;
                        index += 1;
                        v
                    },)*
                };
                let _ = index;
                ctx.leave();
                Ok(out)
            }
        }
    };
}

/// Declare a unit-variant enum and register it as a closed label set.
///
/// The labels are the variant names, in declaration order.
///
/// ```
/// use textree::reflect_enum;
///
/// reflect_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq)]
///     pub enum Genre { Fiction, NonFiction }
/// }
///
/// assert_eq!(Genre::LABELS, &["Fiction", "NonFiction"]);
/// assert_eq!(Genre::from_label("Fiction"), Some(Genre::Fiction));
/// assert_eq!(Genre::NonFiction.label(), "NonFiction");
/// ```
#[macro_export]
macro_rules! reflect_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$variant_meta])* $variant,)*
        }

        impl $name {
            /// Every declared label, in declaration order.
            pub const LABELS: &'static [&'static str] = &[$(stringify!($variant)),*];

            /// The textual label of this value.
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }

            /// Look up a value from its textual label.
            pub fn from_label(label: &str) -> ::std::option::Option<Self> {
                match label {
                    $(stringify!($variant) => ::std::option::Option::Some(Self::$variant),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl $crate::Bind for $name {
            fn kind() -> ::std::result::Result<$crate::FieldKind, $crate::Error> {
                Ok($crate::FieldKind::Enum {
                    ty: stringify!($name),
                    labels: Self::LABELS,
                })
            }

            fn to_tree(
                &self,
                _: &mut $crate::EncodeCtx,
            ) -> ::std::result::Result<$crate::Value, $crate::Error> {
                Ok($crate::Value::Str(self.label().to_string()))
            }

            fn from_tree(
                value: &$crate::Value,
                _: &mut $crate::DecodeCtx,
            ) -> ::std::result::Result<Self, $crate::Error> {
                let text = match value.scalar_text() {
                    ::std::option::Option::Some(text) => text,
                    ::std::option::Option::None => {
                        return Err($crate::Error::TypeMismatch {
                            expected: "enum label",
                            found: value.type_name().to_string(),
                            at: ::std::string::String::new(),
                        })
                    }
                };
                match Self::from_label(&text) {
                    ::std::option::Option::Some(v) => Ok(v),
                    ::std::option::Option::None => Err($crate::Error::UnknownEnumValue {
                        ty: stringify!($name),
                        label: text.into_owned(),
                        at: ::std::string::String::new(),
                    }),
                }
            }
        }
    };
}

/// Route a custom scalar type through the [converter
/// registry](crate::converter).
///
/// The type must have a registered converter before the first descriptor
/// naming it is built; an unregistered type fails describing with
/// [`Error::UnsupportedType`](crate::Error::UnsupportedType).
///
/// ```
/// use textree::{converter, reflect_scalar};
///
/// #[derive(Debug, Clone, PartialEq)]
/// pub struct Isbn(String);
///
/// reflect_scalar!(Isbn);
/// converter::register::<Isbn>(|s| Some(Isbn(s.to_string())), |isbn| isbn.0.clone());
/// ```
#[macro_export]
macro_rules! reflect_scalar {
    ($ty:ty) => {
        impl $crate::Bind for $ty {
            fn kind() -> ::std::result::Result<$crate::FieldKind, $crate::Error> {
                $crate::converter::kind_of::<Self>()
            }

            fn to_tree(
                &self,
                _: &mut $crate::EncodeCtx,
            ) -> ::std::result::Result<$crate::Value, $crate::Error> {
                $crate::converter::format(self).map($crate::Value::Str)
            }

            fn from_tree(
                value: &$crate::Value,
                _: &mut $crate::DecodeCtx,
            ) -> ::std::result::Result<Self, $crate::Error> {
                match value.scalar_text() {
                    ::std::option::Option::Some(text) => $crate::converter::parse(&text),
                    ::std::option::Option::None => Err($crate::Error::TypeMismatch {
                        expected: stringify!($ty),
                        found: value.type_name().to_string(),
                        at: ::std::string::String::new(),
                    }),
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __name_or {
    ($declared:expr) => {
        $declared
    };
    ($declared:expr, $external:literal) => {
        $external
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __default_thunk {
    ($ty:ty) => {
        ::std::option::Option::None
    };
    ($ty:ty, $default:expr) => {
        ::std::option::Option::Some(
            (|| {
                let v: $ty = $default;
                ::std::boxed::Box::new(v) as ::std::boxed::Box<dyn ::std::any::Any>
            }) as $crate::DefaultFn,
        )
    };
}
