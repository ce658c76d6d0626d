//! Codec components: the two text formats and the format-agnostic
//! operations.
pub use self::indent::Indent;
pub use self::tag::Tag;
use crate::{DecodeCtx, EncodeCtx, Error, Reflect, Value};

mod indent;
mod tag;

/// A paired encoder/decoder for one concrete text format.
///
/// Codecs understand nothing but [`Value`] trees; the root name is supplied
/// by the caller for formats that need a top-level tag.
pub trait Codec {
    /// Encode one value tree into a document.
    fn encode(value: &Value, root: &str) -> String;
    /// Encode a sequence of value trees into one document.
    fn encode_seq(values: &[Value], root: &str) -> String;
    /// Decode a document into one value tree.
    fn decode(doc: &str) -> Result<Value, Error>;
    /// Decode a document holding a sequence of value trees.
    fn decode_seq(doc: &str) -> Result<Vec<Value>, Error>;
}

/// Serialize an instance into text.
///
/// ```
/// use textree::{codec::Indent, reflect_record, serialize};
///
/// reflect_record! {
///     struct Member {
///         name: String,
///         married: bool,
///         age: u8,
///     }
/// }
///
/// let officer = Member { name: "Bob".to_string(), married: true, age: 46 };
/// let doc = "\
/// name: Bob
/// married: true
/// age: 46
/// ";
/// assert_eq!(doc, serialize::<Indent, _>(&officer).unwrap());
/// ```
pub fn serialize<C: Codec, T: Reflect>(instance: &T) -> Result<String, Error> {
    let desc = T::describe()?;
    let tree = instance.to_tree(&mut EncodeCtx::new())?;
    Ok(C::encode(&tree, desc.root_name))
}

/// Serialize a sequence of instances into one document.
pub fn serialize_seq<C: Codec, T: Reflect>(instances: &[T]) -> Result<String, Error> {
    let desc = T::describe()?;
    let mut trees = Vec::with_capacity(instances.len());
    for instance in instances {
        trees.push(instance.to_tree(&mut EncodeCtx::new())?);
    }
    Ok(C::encode_seq(&trees, desc.root_name))
}

/// Deserialize an instance from text.
///
/// ```
/// use textree::{codec::Tag, deserialize, reflect_record};
///
/// reflect_record! {
///     #[derive(Debug, PartialEq)]
///     struct Member {
///         name: String,
///         age: u8,
///     }
/// }
///
/// let member: Member = deserialize::<Tag, _>("<m><name>Bob</name><age>46</age></m>").unwrap();
/// assert_eq!(member, Member { name: "Bob".to_string(), age: 46 });
/// ```
pub fn deserialize<C: Codec, T: Reflect>(doc: &str) -> Result<T, Error> {
    let tree = C::decode(doc)?;
    T::from_tree(&tree, &mut DecodeCtx::new())
}

/// Deserialize a sequence of instances from one document, in source order.
pub fn deserialize_seq<C: Codec, T: Reflect>(doc: &str) -> Result<Vec<T>, Error> {
    let trees = C::decode_seq(doc)?;
    let mut out = Vec::with_capacity(trees.len());
    for tree in &trees {
        out.push(T::from_tree(tree, &mut DecodeCtx::new())?);
    }
    Ok(out)
}
