use thiserror::Error;

/// Everything the engine can report to the caller.
///
/// Every variant carries enough context to diagnose without re-running:
/// field and root names from the binder, line numbers or offsets from the
/// codecs. No operation ever returns a partially built instance alongside
/// an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A type cannot be described: no converter, not a record, or a
    /// malformed declaration.
    #[error("type `{ty}` cannot be described: {reason}")]
    UnsupportedType {
        /// The type that failed to describe.
        ty: &'static str,
        /// Why the descriptor could not be built.
        reason: String,
    },
    /// The object graph revisited an instance already on the active
    /// serialization path.
    #[error("cyclic reference through `{0}`")]
    CyclicReference(&'static str),
    /// A required field is absent from the input mapping.
    #[error("missing field `{field}` in `{root}`")]
    MissingField {
        /// Root name of the enclosing record.
        root: &'static str,
        /// External name of the absent field.
        field: &'static str,
    },
    /// A null value was supplied for a field that is not nullable.
    #[error("field `{field}` in `{root}` is not nullable")]
    NonNullableField {
        /// Root name of the enclosing record.
        root: &'static str,
        /// External name of the offending field.
        field: &'static str,
    },
    /// Scalar text does not parse as the field's declared type.
    #[error("type mismatch{}: expected {expected}, found `{found}`", fmt_at(.at))]
    TypeMismatch {
        /// What the declared type required.
        expected: &'static str,
        /// The scalar text or shape that was found instead.
        found: String,
        /// `root.field` path, filled in by the binder.
        at: String,
    },
    /// Scalar text does not match any declared enum label.
    #[error("unknown value `{label}` for enum `{ty}`{}", fmt_at(.at))]
    UnknownEnumValue {
        /// The enum type name.
        ty: &'static str,
        /// The unmatched label text.
        label: String,
        /// `root.field` path, filled in by the binder.
        at: String,
    },
    /// Codec-level structural failure: bad indentation, unterminated tag.
    #[error("malformed input: {msg}")]
    MalformedInput {
        /// Line number (indentation codec) or byte offset (tag codec).
        pos: u64,
        /// Human-readable description, including the position.
        msg: String,
    },
    /// The nesting depth guard tripped before the call stack could.
    #[error("nesting depth exceeded the limit of {limit}")]
    DepthExceeded {
        /// The configured depth limit.
        limit: usize,
    },
}

impl Error {
    /// Attach the innermost `root.field` path to a context-free mismatch.
    /// Already-located errors pass through unchanged.
    ///
    /// Called by the binder and by generated record impls.
    pub fn locate(self, root: &'static str, field: &'static str) -> Self {
        match self {
            Self::TypeMismatch {
                expected,
                found,
                at,
            } if at.is_empty() => Self::TypeMismatch {
                expected,
                found,
                at: format!("{root}.{field}"),
            },
            Self::UnknownEnumValue { ty, label, at } if at.is_empty() => Self::UnknownEnumValue {
                ty,
                label,
                at: format!("{root}.{field}"),
            },
            e => e,
        }
    }
}

// thiserror binds each referenced field to a local of the same name, so a
// helper named `at` would be shadowed inside the generated impl.
fn fmt_at(loc: &str) -> String {
    if loc.is_empty() {
        String::new()
    } else {
        format!(" at `{loc}`")
    }
}
