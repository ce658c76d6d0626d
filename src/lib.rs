//! A reflection-driven object serializer: describe a record type once, then
//! move instances to and from two human-readable text formats without
//! per-type codec code.
//!
//! The engine is the pairing of a type/value reflection layer — the
//! [`Reflect`] registry, the [`Bind`] binder and the [converter] registry —
//! with a format-neutral [`Value`] tree that two structural codecs encode and
//! decode: [`Indent`](codec::Indent) for the indentation-structured format
//! and [`Tag`](codec::Tag) for the tag-nested format.
//!
//! ```
//! use textree::{codec::{Indent, Tag}, deserialize, reflect_record, serialize};
//!
//! reflect_record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Author {
//!         name: String,
//!         birthdate: String,
//!     }
//! }
//!
//! reflect_record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Book as "book" {
//!         title: String,
//!         author: Author,
//!         year: i64,
//!     }
//! }
//!
//! let doc = "\
//! title: Don Quixote
//! author:
//!   name: Miguel de Cervantes
//!   birthdate: 1547-09-29
//! year: 1605
//! ";
//! let book: Book = deserialize::<Indent, _>(doc).unwrap();
//! assert_eq!(book.title, "Don Quixote");
//! assert_eq!(book.author.name, "Miguel de Cervantes");
//! assert_eq!(serialize::<Indent, _>(&book).unwrap(), doc);
//! assert_eq!(
//!     serialize::<Tag, _>(&book).unwrap(),
//!     "<book><title>Don Quixote</title>\
//!      <author><name>Miguel de Cervantes</name><birthdate>1547-09-29</birthdate></author>\
//!      <year>1605</year></book>",
//! );
//! ```
//!
//! The registries are process-wide and read-mostly; every serialize or
//! deserialize call is otherwise stateless and may run concurrently.
pub use crate::binder::*;
pub use crate::codec::*;
pub use crate::error::*;
pub use crate::indicator::*;
pub use crate::reflect::*;
pub use crate::value::*;

mod binder;
pub mod codec;
pub mod converter;
mod error;
mod indicator;
mod macros;
mod reflect;
#[cfg(test)]
mod tests;
mod value;
