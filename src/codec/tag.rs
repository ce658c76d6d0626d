//! The tag-nested text format.
//!
//! A mapping becomes an element with one child per entry, a sequence repeats
//! the enclosing tag once per element, and a scalar becomes text content.
//! The subset has no attributes, no namespaces and no comments; the decoder
//! reports anything outside the subset as malformed input with its byte
//! offset and an indicated-position excerpt.
use super::Codec;
use crate::{indicated_msg, Error, Map, Value, DEPTH_LIMIT};

/// The tag-nested codec.
///
/// ```
/// use textree::{codec::Tag, value_map, Codec};
///
/// let tree = value_map! { "a" => "b", "c" => 1 };
/// assert_eq!(Tag::encode(&tree, "root"), "<root><a>b</a><c>1</c></root>");
/// assert_eq!(Tag::decode("<root><a>b</a><c>1</c></root>").unwrap(), tree);
/// ```
pub struct Tag;

impl Codec for Tag {
    fn encode(value: &Value, root: &str) -> String {
        let mut doc = String::new();
        emit(&mut doc, value, root);
        doc
    }

    fn encode_seq(values: &[Value], root: &str) -> String {
        let mut doc = String::new();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                doc.push('\n');
            }
            emit(&mut doc, value, root);
        }
        doc
    }

    fn decode(doc: &str) -> Result<Value, Error> {
        let mut scanner = Scanner::new(doc);
        scanner.skip_ws();
        let (_, value) = scanner.element(0)?;
        scanner.skip_ws();
        if !scanner.at_end() {
            return Err(scanner.malformed("trailing content after the root element"));
        }
        Ok(value)
    }

    fn decode_seq(doc: &str) -> Result<Vec<Value>, Error> {
        let mut scanner = Scanner::new(doc);
        let mut values = Vec::new();
        loop {
            scanner.skip_ws();
            if scanner.at_end() {
                return Ok(values);
            }
            let (_, value) = scanner.element(0)?;
            values.push(value);
        }
    }
}

fn emit(doc: &mut String, value: &Value, tag: &str) {
    match value {
        // No wrapper tag: the field's own tag repeats per element.
        Value::Seq(items) => {
            for item in items {
                emit(doc, item, tag);
            }
        }
        Value::Map(map) => {
            doc.push('<');
            doc.push_str(tag);
            doc.push('>');
            for (key, entry) in map {
                emit(doc, entry, key);
            }
            doc.push_str("</");
            doc.push_str(tag);
            doc.push('>');
        }
        Value::Null => {
            doc.push('<');
            doc.push_str(tag);
            doc.push_str("/>");
        }
        scalar => {
            doc.push('<');
            doc.push_str(tag);
            doc.push('>');
            match scalar {
                Value::Bool(b) => doc.push_str(if *b { "true" } else { "false" }),
                Value::Int(n) | Value::Float(n) => doc.push_str(n),
                Value::Str(s) => doc.push_str(&escape(s)),
                _ => unreachable!(),
            }
            doc.push_str("</");
            doc.push_str(tag);
            doc.push('>');
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let mut replaced = false;
        for (entity, c) in [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>')] {
            if let Some(tail) = rest.strip_prefix(entity) {
                out.push(c);
                rest = tail;
                replaced = true;
                break;
            }
        }
        if !replaced {
            // Unknown entities pass through literally.
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

struct Scanner<'a> {
    doc: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(doc: &'a str) -> Self {
        Self { doc, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.doc.len()
    }

    fn rest(&self) -> &'a str {
        &self.doc[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn malformed(&self, reason: &str) -> Error {
        Error::MalformedInput {
            pos: self.pos as u64,
            msg: format!("{}: \n\n{}", reason, indicated_msg(self.doc, self.pos as u64)),
        }
    }

    /// Read a tag name: letters, digits, `_` and `-`, starting with a letter
    /// or `_`.
    fn name(&mut self) -> Result<&'a str, Error> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            return Err(self.malformed("expected a tag name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn expect(&mut self, token: &str, reason: &str) -> Result<(), Error> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(self.malformed(reason))
        }
    }

    /// Match one element, returning its tag name and value.
    fn element(&mut self, depth: usize) -> Result<(&'a str, Value), Error> {
        if depth >= DEPTH_LIMIT {
            return Err(Error::DepthExceeded { limit: DEPTH_LIMIT });
        }
        self.expect("<", "expected an opening tag")?;
        let name = self.name()?;
        if self.rest().starts_with("/>") {
            self.pos += 2;
            return Ok((name, Value::Null));
        }
        // Attributes are out of this subset.
        self.expect(">", "expected `>` (attributes are not supported)")?;
        let text_start = self.pos;
        let text = self.text()?;
        if self.rest().starts_with("</") {
            // Text-only content.
            self.close(name)?;
            let value = if text.is_empty() {
                Value::Str(String::new())
            } else {
                Value::infer(&unescape(text))
            };
            return Ok((name, value));
        }
        // Child elements; surrounding whitespace is insignificant.
        if !text.trim().is_empty() {
            self.pos = text_start;
            return Err(self.malformed("mixed text and child elements"));
        }
        let mut map = Map::new();
        loop {
            let (child_name, child) = self.element(depth + 1)?;
            insert_grouped(&mut map, child_name, child);
            let text = self.text()?;
            if self.rest().starts_with("</") {
                break;
            }
            if !text.trim().is_empty() {
                return Err(self.malformed("mixed text and child elements"));
            }
        }
        self.close(name)?;
        Ok((name, Value::Map(map)))
    }

    /// Consume text up to the next `<`, failing at an unterminated end.
    fn text(&mut self) -> Result<&'a str, Error> {
        let rest = self.rest();
        match rest.find('<') {
            Some(i) => {
                self.pos += i;
                Ok(&rest[..i])
            }
            None => Err(self.malformed("unterminated element")),
        }
    }

    /// Match `</name>` for the given opening name.
    fn close(&mut self, name: &str) -> Result<(), Error> {
        let at = self.pos;
        self.expect("</", "expected a closing tag")?;
        let closing = self.name()?;
        if closing != name {
            self.pos = at;
            return Err(self.malformed(&format!("expected `</{name}>`, found `</{closing}>`")));
        }
        self.expect(">", "malformed closing tag")
    }
}

/// Insert one decoded child, collapsing repeated sibling tags into a
/// sequence. Whether a sequence is acceptable for the target field is the
/// binder's decision, not the codec's.
fn insert_grouped(map: &mut Map, name: &str, child: Value) {
    match map.get_mut(name) {
        None => {
            map.insert(name.to_string(), child);
        }
        Some(Value::Seq(items)) => items.push(child),
        Some(existing) => {
            let first = std::mem::replace(existing, Value::Null);
            *existing = Value::Seq(vec![first, child]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{value_map, value_seq};

    #[test]
    fn repeated_siblings_group_into_a_sequence() {
        let tree = Tag::decode("<r><t>1</t><t>2</t><u>x</u></r>").unwrap();
        assert_eq!(tree, value_map! { "t" => value_seq![1, 2], "u" => "x" });
    }

    #[test]
    fn null_and_empty_text_are_distinct() {
        let tree = Tag::decode("<r><a/><b></b></r>").unwrap();
        assert_eq!(tree, value_map! { "a" => (), "b" => "" });
    }

    #[test]
    fn escaped_text_round_trips() {
        let tree = value_map! { "m" => "a < b & c" };
        let doc = Tag::encode(&tree, "r");
        assert_eq!(doc, "<r><m>a &lt; b &amp; c</m></r>");
        assert_eq!(Tag::decode(&doc).unwrap(), tree);
    }

    #[test]
    fn unterminated_tag_carries_the_offset() {
        match Tag::decode("<r><a>1</a>") {
            Err(Error::MalformedInput { pos, msg }) => {
                assert_eq!(pos, 11);
                assert!(msg.contains("unterminated"), "{msg}");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn attributes_are_rejected() {
        assert!(matches!(
            Tag::decode("<r id=\"1\"><a>1</a></r>"),
            Err(Error::MalformedInput { .. })
        ));
    }
}
