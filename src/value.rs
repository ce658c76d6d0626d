use ritelinked::LinkedHashMap;
use std::borrow::Cow;

macro_rules! impl_from {
    ($(impl $($from_ty:ty),+ => $ty:ident)+) => {
        $($(impl From<$from_ty> for Value {
            fn from(v: $from_ty) -> Self {
                Self::$ty(v.to_string())
            }
        })+)+
    };
}

/// The sequence data structure of a value tree.
pub type Seq = Vec<Value>;
/// The mapping data structure of a value tree.
///
/// Entry order is preserved from the source for emission,
/// and lookup during binding is by key.
pub type Map = LinkedHashMap<String, Value>;

/// The format-neutral intermediate representation shared by both codecs.
///
/// Numbers keep their literal text, so nothing is lost between decoding and
/// binding. This type can convert from primitive types by `From` and `Into`
/// traits.
///
/// ```
/// use textree::Value;
///
/// assert_eq!(Value::Int("20".to_string()), 20.into());
/// assert_eq!(Value::Float("0.001".to_string()), 1e-3.into());
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer, kept as literal text
    Int(String),
    /// Float, kept as literal text
    Float(String),
    /// String
    Str(String),
    /// Sequence
    Seq(Seq),
    /// Mapping
    Map(Map),
}

impl Value {
    /// Check the value is null.
    pub fn is_null(&self) -> bool {
        *self == Self::Null
    }

    /// The textual content of a scalar value, or [`None`] for containers and
    /// null.
    ///
    /// ```
    /// use textree::Value;
    ///
    /// assert_eq!("true", Value::Bool(true).scalar_text().unwrap());
    /// assert_eq!(None, Value::Seq(vec![]).scalar_text());
    /// ```
    pub fn scalar_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Self::Int(s) | Self::Float(s) | Self::Str(s) => Some(Cow::Borrowed(s)),
            _ => None,
        }
    }

    /// A short name for the shape of this value, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
        }
    }

    /// Scalar text for mismatch diagnostics, falling back to the shape name.
    pub(crate) fn found(&self) -> String {
        match self.scalar_text() {
            Some(text) => text.into_owned(),
            None => self.type_name().to_string(),
        }
    }

    /// Classify a scalar literal by its text.
    ///
    /// The inference order is null, booleans, integers, floats, then the
    /// string fallback. Quoting is a codec concern and is resolved before
    /// inference. The flow markers `[]` and `{}` stand for the empty
    /// sequence and the empty mapping.
    ///
    /// ```
    /// use textree::Value;
    ///
    /// assert_eq!(Value::infer("null"), Value::Null);
    /// assert_eq!(Value::infer("1605"), Value::Int("1605".to_string()));
    /// assert_eq!(Value::infer("2e-4"), Value::Float("2e-4".to_string()));
    /// assert_eq!(Value::infer("50%"), Value::Str("50%".to_string()));
    /// ```
    pub fn infer(text: &str) -> Self {
        match text {
            "null" => Self::Null,
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            "[]" => Self::Seq(Seq::new()),
            "{}" => Self::Map(Map::new()),
            _ if is_int(text) => Self::Int(text.to_string()),
            _ if is_float(text) => Self::Float(text.to_string()),
            _ => Self::Str(text.to_string()),
        }
    }
}

fn is_int(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float(text: &str) -> bool {
    // Reject "nan" / "inf" spellings, which the subset grammar keeps as strings.
    text.bytes()
        .all(|b| matches!(b, b'+' | b'-' | b'.' | b'e' | b'E' | b'0'..=b'9'))
        && text.parse::<f64>().is_ok()
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl_from! {
    impl usize, u8, u16, u32, u64, isize, i8, i16, i32, i64 => Int
    impl f32, f64 => Float
}

impl From<Seq> for Value {
    fn from(s: Seq) -> Self {
        Self::Seq(s)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(m)
    }
}

/// Create [`Value::Seq`] items literally.
///
/// ```
/// use textree::value_seq;
/// value_seq!["a", "b", "c"];
/// ```
#[macro_export]
macro_rules! value_seq {
    [$($v:expr),* $(,)?] => {
        $crate::Value::Seq(::std::vec![$($crate::Value::from($v)),*])
    };
}

/// Create [`Value::Map`] items literally.
///
/// ```
/// use textree::value_map;
/// value_map! {
///     "a" => "b",
///     "c" => "d",
/// };
/// ```
#[macro_export]
macro_rules! value_map {
    {$($k:expr => $v:expr),* $(,)?} => {
        $crate::Value::Map(
            ::std::iter::Iterator::collect(::std::iter::IntoIterator::into_iter([
                $((::std::string::String::from($k), $crate::Value::from($v))),*
            ]))
        )
    };
}
