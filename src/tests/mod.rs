use super::*;
use crate::codec::{Indent, Tag};
use std::{cell::RefCell, rc::Rc};

reflect_record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Author {
        name: String,
        birthdate: String,
    }
}

reflect_record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Book as "book" {
        title: String,
        author: Author,
        year: i64,
    }
}

reflect_enum! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Genre {
        Fiction,
        NonFiction,
        Poetry,
    }
}

reflect_record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Entry as "entry" {
        id: u32 as "entry_id",
        genre: Genre,
        rating: Option<f64>,
        tags: Vec<String>,
        edition: i64 = 1,
    }
}

fn quixote() -> Book {
    Book {
        title: "Don Quixote".to_string(),
        author: Author {
            name: "Miguel de Cervantes".to_string(),
            birthdate: "1547-09-29".to_string(),
        },
        year: 1605,
    }
}

const QUIXOTE_INDENT: &str = "\
title: Don Quixote
author:
  name: Miguel de Cervantes
  birthdate: 1547-09-29
year: 1605
";

const QUIXOTE_TAG: &str = "<book><title>Don Quixote</title>\
    <author><name>Miguel de Cervantes</name><birthdate>1547-09-29</birthdate></author>\
    <year>1605</year></book>";

#[test]
fn indent_scenario() {
    let book: Book = deserialize::<Indent, _>(QUIXOTE_INDENT).unwrap();
    assert_eq!(book, quixote());
    assert_eq!(serialize::<Indent, _>(&book).unwrap(), QUIXOTE_INDENT);
}

#[test]
fn tag_scenario() {
    assert_eq!(serialize::<Tag, _>(&quixote()).unwrap(), QUIXOTE_TAG);
    let book: Book = deserialize::<Tag, _>(QUIXOTE_TAG).unwrap();
    assert_eq!(book, quixote());
}

#[test]
fn tree_round_trip_matches_both_codecs() {
    let tree = quixote().to_tree(&mut EncodeCtx::new()).unwrap();
    let desc = Book::describe().unwrap();
    for doc in [
        Indent::encode(&tree, desc.root_name),
        Tag::encode(&tree, desc.root_name),
    ] {
        let decoded = if doc.starts_with('<') {
            Tag::decode(&doc).unwrap()
        } else {
            Indent::decode(&doc).unwrap()
        };
        assert_eq!(decoded, tree);
    }
    assert_eq!(
        Book::from_tree(&tree, &mut DecodeCtx::new()).unwrap(),
        quixote()
    );
}

#[test]
fn descriptor_metadata() {
    let desc = Entry::describe().unwrap();
    assert_eq!(desc.root_name, "entry");
    assert_eq!(desc.type_name, "Entry");
    let id = desc.field("entry_id").unwrap();
    assert_eq!(id.declared_name, "id");
    assert!(matches!(id.kind, FieldKind::Int));
    assert!(matches!(
        desc.field("genre").unwrap().kind,
        FieldKind::Enum { labels, .. } if labels == ["Fiction", "NonFiction", "Poetry"]
    ));
    assert!(desc.field("rating").unwrap().nullable);
    assert!(matches!(
        desc.field("tags").unwrap().kind,
        FieldKind::Seq(ref element) if matches!(**element, FieldKind::Str)
    ));
    assert!(desc.field("edition").unwrap().default.is_some());
    assert!(desc.field("id").is_none());
}

#[test]
fn nested_record_descriptors_resolve_through_the_field_kind() {
    let desc = Book::describe().unwrap();
    match &desc.field("author").unwrap().kind {
        FieldKind::Record { ty, descriptor } => {
            assert_eq!(*ty, "Author");
            let nested = descriptor().unwrap();
            assert_eq!(nested.root_name, "Author");
            assert_eq!(nested.fields.len(), 2);
            assert_eq!(nested.id, std::any::TypeId::of::<Author>());
            assert_ne!(nested.id, desc.id);
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn error_display_carries_the_field_path() {
    let located = Error::TypeMismatch {
        expected: "integer",
        found: "soon".to_string(),
        at: "book.year".to_string(),
    };
    assert_eq!(
        located.to_string(),
        "type mismatch at `book.year`: expected integer, found `soon`"
    );
    let bare = Error::UnknownEnumValue {
        ty: "Genre",
        label: "Drama".to_string(),
        at: String::new(),
    };
    assert_eq!(bare.to_string(), "unknown value `Drama` for enum `Genre`");
}

#[test]
fn grammar_colliding_strings_survive_the_indent_round_trip() {
    for title in ["Don\nQuixote", "", "null", "year: 1605", "  indented"] {
        let mut book = quixote();
        book.title = title.to_string();
        let doc = serialize::<Indent, _>(&book).unwrap();
        assert_eq!(deserialize::<Indent, Book>(&doc).unwrap(), book, "{doc}");
    }
}

#[test]
fn missing_required_field() {
    let doc = "title: X\nyear: 1605\n";
    match deserialize::<Indent, Book>(doc) {
        Err(Error::MissingField { root, field }) => {
            assert_eq!(root, "book");
            assert_eq!(field, "author");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn null_for_non_nullable_field() {
    let doc = "title: null\nauthor:\n  name: a\n  birthdate: b\nyear: 1\n";
    assert_eq!(
        deserialize::<Indent, Book>(doc),
        Err(Error::NonNullableField {
            root: "book",
            field: "title",
        })
    );
}

#[test]
fn default_substitution_and_empty_sequence() {
    let doc = "entry_id: 7\ngenre: Poetry\n";
    let entry: Entry = deserialize::<Indent, _>(doc).unwrap();
    assert_eq!(entry.edition, 1);
    assert_eq!(entry.rating, None);
    assert_eq!(entry.tags, Vec::<String>::new());
}

#[test]
fn unknown_keys_are_ignored() {
    let doc = "\
title: X
author:
  name: a
  birthdate: b
  homepage: unrecorded
year: 2
publisher: unrecorded
";
    let book: Book = deserialize::<Indent, _>(doc).unwrap();
    assert_eq!(book.title, "X");
    assert_eq!(book.year, 2);
}

#[test]
fn enum_validation() {
    let doc = "entry_id: 1\ngenre: Drama\n";
    match deserialize::<Indent, Entry>(doc) {
        Err(Error::UnknownEnumValue { ty, label, at }) => {
            assert_eq!(ty, "Genre");
            assert_eq!(label, "Drama");
            assert_eq!(at, "entry.genre");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn type_mismatch_names_the_field() {
    let doc = "title: X\nauthor:\n  name: a\n  birthdate: b\nyear: soon\n";
    match deserialize::<Indent, Book>(doc) {
        Err(Error::TypeMismatch {
            expected,
            found,
            at,
        }) => {
            assert_eq!(expected, "integer");
            assert_eq!(found, "soon");
            assert_eq!(at, "book.year");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn nullable_round_trip() {
    let entry = Entry {
        id: 3,
        genre: Genre::Fiction,
        rating: None,
        tags: vec!["old".to_string()],
        edition: 2,
    };
    let doc = serialize::<Indent, _>(&entry).unwrap();
    assert_eq!(
        doc,
        "entry_id: 3\ngenre: Fiction\nrating: null\ntags:\n  - old\nedition: 2\n"
    );
    assert_eq!(deserialize::<Indent, Entry>(&doc).unwrap(), entry);
}

#[test]
fn sequence_scenario_indent() {
    let books = vec![quixote(), {
        let mut b = quixote();
        b.title = "Second Part".to_string();
        b.year = 1615;
        b
    }];
    let doc = serialize_seq::<Indent, _>(&books).unwrap();
    assert_eq!(doc.matches("- title:").count(), 2);
    let back: Vec<Book> = deserialize_seq::<Indent, _>(&doc).unwrap();
    assert_eq!(back, books);
}

#[test]
fn sequence_scenario_tag() {
    let books = vec![quixote(), quixote()];
    let doc = serialize_seq::<Tag, _>(&books).unwrap();
    assert_eq!(doc.matches("<book>").count(), 2);
    let back: Vec<Book> = deserialize_seq::<Tag, _>(&doc).unwrap();
    assert_eq!(back, books);
}

#[test]
fn repeated_tags_bind_to_a_sequence_field() {
    let doc = "<entry><entry_id>1</entry_id><genre>Fiction</genre>\
        <tags>a</tags><tags>b</tags></entry>";
    let entry: Entry = deserialize::<Tag, _>(doc).unwrap();
    assert_eq!(entry.tags, ["a", "b"]);
}

#[test]
fn single_tag_binds_as_a_one_element_sequence() {
    let doc = "<entry><entry_id>1</entry_id><genre>Fiction</genre><tags>a</tags></entry>";
    let entry: Entry = deserialize::<Tag, _>(doc).unwrap();
    assert_eq!(entry.tags, ["a"]);
}

#[test]
fn repeated_tags_for_a_scalar_field_mismatch() {
    let doc = "<book><title>X</title><title>Y</title>\
        <author><name>a</name><birthdate>b</birthdate></author><year>1</year></book>";
    match deserialize::<Tag, Book>(doc) {
        Err(Error::TypeMismatch { expected, at, .. }) => {
            assert_eq!(expected, "string");
            assert_eq!(at, "book.title");
        }
        other => panic!("{other:?}"),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Isbn {
    prefix: u32,
    rest: String,
}

reflect_scalar!(Isbn);

fn register_isbn() {
    converter::register::<Isbn>(
        |s| {
            let (prefix, rest) = s.split_once('-')?;
            Some(Isbn {
                prefix: prefix.parse().ok()?,
                rest: rest.to_string(),
            })
        },
        |isbn| format!("{}-{}", isbn.prefix, isbn.rest),
    );
}

reflect_record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Edition {
        isbn: Isbn,
    }
}

#[test]
fn custom_converter_round_trip() {
    register_isbn();
    let edition = Edition {
        isbn: Isbn {
            prefix: 978,
            rest: "0140449099".to_string(),
        },
    };
    let doc = serialize::<Indent, _>(&edition).unwrap();
    assert_eq!(doc, "isbn: 978-0140449099\n");
    assert_eq!(deserialize::<Indent, Edition>(&doc).unwrap(), edition);
    match deserialize::<Indent, Edition>("isbn: nonsense\n") {
        Err(Error::TypeMismatch { expected, at, .. }) => {
            assert_eq!(expected, "Isbn");
            assert_eq!(at, "Edition.isbn");
        }
        other => panic!("{other:?}"),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct NeverRegistered(String);

reflect_scalar!(NeverRegistered);

reflect_record! {
    #[derive(Debug, Clone, PartialEq)]
    struct UsesUnregistered {
        field: NeverRegistered,
    }
}

#[test]
fn unregistered_converter_fails_at_describe_time() {
    match UsesUnregistered::describe() {
        Err(Error::UnsupportedType { ty, reason }) => {
            assert_eq!(ty, "NeverRegistered");
            assert!(reason.contains("no converter"), "{reason}");
        }
        other => panic!("{other:?}"),
    }
    // The failure is cached and stable.
    assert!(UsesUnregistered::describe().is_err());
}

reflect_record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Chain as "chain" {
        name: String,
        next: Option<Rc<RefCell<Chain>>>,
    }
}

#[test]
fn cyclic_reference_is_reported() {
    let a = Rc::new(RefCell::new(Chain {
        name: "a".to_string(),
        next: None,
    }));
    let b = Rc::new(RefCell::new(Chain {
        name: "b".to_string(),
        next: Some(a.clone()),
    }));
    a.borrow_mut().next = Some(b.clone());
    let cyclic = Chain {
        name: "head".to_string(),
        next: Some(a.clone()),
    };
    assert_eq!(
        serialize::<Indent, _>(&cyclic),
        Err(Error::CyclicReference("Chain"))
    );
    // Breaking the cycle makes the same graph serializable.
    b.borrow_mut().next = None;
    let doc = serialize::<Indent, _>(&cyclic).unwrap();
    let back: Chain = deserialize::<Indent, _>(&doc).unwrap();
    assert_eq!(back.name, "head");
    assert_eq!(back.next.unwrap().borrow().name, "a");
}

#[test]
fn decode_depth_guard() {
    let mut doc = String::new();
    for level in 0..200 {
        doc.push_str(&"  ".repeat(level));
        doc.push_str("a:\n");
    }
    assert_eq!(
        Indent::decode(&doc),
        Err(Error::DepthExceeded { limit: DEPTH_LIMIT })
    );
    let tag_doc = format!("{}{}", "<a>".repeat(200), "</a>".repeat(200));
    assert_eq!(
        Tag::decode(&tag_doc),
        Err(Error::DepthExceeded { limit: DEPTH_LIMIT })
    );
}

#[test]
fn malformed_indentation_carries_the_line() {
    let doc = "title: X\n   author: Y\n";
    match Indent::decode(doc) {
        Err(Error::MalformedInput { pos, msg }) => {
            assert_eq!(pos, 2);
            assert!(msg.contains("line 2"), "{msg}");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn duplicate_keys_are_malformed() {
    let doc = "a: 1\na: 2\n";
    assert!(matches!(
        Indent::decode(doc),
        Err(Error::MalformedInput { pos: 2, .. })
    ));
}

#[test]
fn mismatched_closing_tag_is_malformed() {
    match Tag::decode("<a><b>1</c></a>") {
        Err(Error::MalformedInput { msg, .. }) => {
            assert!(msg.contains("</b>"), "{msg}");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn mapping_key_order_is_preserved_but_lookup_is_by_key() {
    // Keys out of declaration order still bind correctly.
    let doc = "year: 1605\ntitle: X\nauthor:\n  birthdate: b\n  name: a\n";
    let book: Book = deserialize::<Indent, _>(doc).unwrap();
    assert_eq!(book.title, "X");
    assert_eq!(book.author.name, "a");
    // Emission order follows field declaration order, not input order.
    assert!(serialize::<Indent, _>(&book).unwrap().starts_with("title:"));
}
