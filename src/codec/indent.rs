//! The indentation-structured text format.
//!
//! One mapping entry or sequence item per line, nesting expressed by a fixed
//! two-column indentation unit. The decoder is line-oriented: each line's
//! leading-space count either matches an open level or opens a new one, and
//! anything else is malformed input reported with its line number.
//!
//! String scalars that would collide with the line grammar (empty text,
//! `null`/boolean/number/flow spellings, embedded newlines, surrounding
//! whitespace, `- ` items or `key:` forms) are emitted double-quoted with
//! `\\`, `\"` and `\n` escapes; the decoder resolves quoting before scalar
//! inference.
use super::Codec;
use crate::{Error, Map, Seq, Value, DEPTH_LIMIT};

const UNIT: usize = 2;

/// The indentation-structured codec.
///
/// ```
/// use textree::{codec::Indent, value_map, Codec};
///
/// let tree = value_map! {
///     "a" => "b",
///     "c" => value_map! { "d" => 1 },
/// };
/// assert_eq!(Indent::encode(&tree, ""), "a: b\nc:\n  d: 1\n");
/// assert_eq!(Indent::decode("a: b\nc:\n  d: 1\n").unwrap(), tree);
/// ```
pub struct Indent;

impl Codec for Indent {
    fn encode(value: &Value, _root: &str) -> String {
        let mut doc = String::new();
        match value {
            Value::Seq(_) | Value::Map(_) => emit_block(&mut doc, value, 0),
            scalar => {
                doc += &scalar_literal(scalar);
                doc.push('\n');
            }
        }
        doc
    }

    fn encode_seq(values: &[Value], _root: &str) -> String {
        let mut doc = String::new();
        for value in values {
            emit_item(&mut doc, value, 0);
        }
        doc
    }

    fn decode(doc: &str) -> Result<Value, Error> {
        let mut parser = Parser::scan(doc)?;
        if parser.lines.is_empty() {
            return Ok(Value::Null);
        }
        if parser.lines[0].indent != 0 {
            return Err(parser.malformed(0, "the first line must not be indented"));
        }
        let value = parser.block(0, 0)?;
        match parser.peek() {
            Some(_) => Err(parser.malformed(parser.pos, "trailing content")),
            None => Ok(value),
        }
    }

    fn decode_seq(doc: &str) -> Result<Vec<Value>, Error> {
        match Self::decode(doc)? {
            Value::Seq(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            single => Ok(vec![single]),
        }
    }
}

fn pad(doc: &mut String, level: usize) {
    doc.push_str(&" ".repeat(level * UNIT));
}

fn scalar_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) | Value::Float(n) => n.clone(),
        Value::Str(s) if needs_quoting(s) => quote(s),
        Value::Str(s) => s.clone(),
        Value::Seq(_) | Value::Map(_) => unreachable!("containers are emitted as blocks"),
    }
}

/// Whether emitting this string bare would re-parse as something else.
fn needs_quoting(text: &str) -> bool {
    text.is_empty()
        || text != text.trim()
        || text.starts_with('"')
        || text == "-"
        || text.starts_with("- ")
        || text.contains('\n')
        || text.contains(": ")
        || text.ends_with(':')
        || !matches!(Value::infer(text), Value::Str(_))
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Decode the remainder of a quoted scalar, after its opening quote. The
/// closing quote must end the text.
fn unquote(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return chars.next().is_none().then_some(out),
            '\\' => match chars.next()? {
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                'n' => out.push('\n'),
                _ => return None,
            },
            c => out.push(c),
        }
    }
    None
}

fn emit_block(doc: &mut String, value: &Value, level: usize) {
    match value {
        Value::Seq(items) => {
            for item in items {
                emit_item(doc, item, level);
            }
        }
        Value::Map(map) => {
            for (key, entry) in map {
                pad(doc, level);
                emit_entry(doc, key, entry, level);
            }
        }
        scalar => {
            pad(doc, level);
            doc.push_str(&scalar_literal(scalar));
            doc.push('\n');
        }
    }
}

/// Emit `key: value` or `key:` plus a nested block. The caller has already
/// written the indentation of the key.
fn emit_entry(doc: &mut String, key: &str, value: &Value, level: usize) {
    doc.push_str(key);
    doc.push(':');
    match value {
        Value::Seq(items) if items.is_empty() => doc.push_str(" []\n"),
        Value::Map(map) if map.is_empty() => doc.push_str(" {}\n"),
        Value::Seq(_) | Value::Map(_) => {
            doc.push('\n');
            emit_block(doc, value, level + 1);
        }
        scalar => {
            doc.push(' ');
            doc.push_str(&scalar_literal(scalar));
            doc.push('\n');
        }
    }
}

fn emit_item(doc: &mut String, item: &Value, level: usize) {
    pad(doc, level);
    match item {
        Value::Seq(items) if items.is_empty() => doc.push_str("- []\n"),
        Value::Map(map) if map.is_empty() => doc.push_str("- {}\n"),
        Value::Seq(_) => {
            // A nested sequence cannot share the dash line.
            doc.push_str("-\n");
            emit_block(doc, item, level + 1);
        }
        Value::Map(map) => {
            // The first key shares the dash line, the rest align under it.
            doc.push_str("- ");
            for (i, (key, entry)) in map.iter().enumerate() {
                if i > 0 {
                    pad(doc, level + 1);
                }
                emit_entry(doc, key, entry, level + 1);
            }
        }
        scalar => {
            doc.push_str("- ");
            doc.push_str(&scalar_literal(scalar));
            doc.push('\n');
        }
    }
}

#[derive(Clone, Copy)]
struct Line<'a> {
    indent: usize,
    text: &'a str,
    number: u64,
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Split the document into non-blank lines with measured indentation.
    fn scan(doc: &'a str) -> Result<Self, Error> {
        let mut lines = Vec::new();
        for (i, raw) in doc.split('\n').enumerate() {
            let number = i as u64 + 1;
            let trimmed = raw.trim_end();
            if trimmed.is_empty() {
                continue;
            }
            let indent = trimmed.len() - trimmed.trim_start_matches(' ').len();
            let text = &trimmed[indent..];
            if text.starts_with('\t') {
                return Err(Error::MalformedInput {
                    pos: number,
                    msg: format!("line {number}: tab character in indentation"),
                });
            }
            lines.push(Line {
                indent,
                text,
                number,
            });
        }
        Ok(Self { lines, pos: 0 })
    }

    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn malformed(&self, at: usize, reason: &str) -> Error {
        let number = self
            .lines
            .get(at)
            .map(|line| line.number)
            .unwrap_or(self.lines.len() as u64);
        Error::MalformedInput {
            pos: number,
            msg: format!("line {number}: {reason}"),
        }
    }

    /// Resolve one scalar token, quoted or bare.
    fn scalar(&self, at: usize, text: &str) -> Result<Value, Error> {
        match text.strip_prefix('"') {
            Some(quoted) => match unquote(quoted) {
                Some(s) => Ok(Value::Str(s)),
                None => Err(self.malformed(at, "malformed quoted string")),
            },
            None => Ok(Value::infer(text)),
        }
    }

    /// Parse the block opening at the current line, whose indentation is
    /// `indent`.
    fn block(&mut self, indent: usize, depth: usize) -> Result<Value, Error> {
        if depth >= DEPTH_LIMIT {
            return Err(Error::DepthExceeded { limit: DEPTH_LIMIT });
        }
        // Callers guarantee the current line exists at this indentation.
        let line = self.lines[self.pos];
        if line.text == "-" || line.text.starts_with("- ") {
            self.seq(indent, depth)
        } else if !line.text.starts_with('"') && split_key(line.text).is_some() {
            self.map(indent, depth)
        } else {
            let at = self.pos;
            self.advance();
            self.scalar(at, line.text)
        }
    }

    fn map(&mut self, indent: usize, depth: usize) -> Result<Value, Error> {
        let mut map = Map::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(self.malformed(self.pos, "indentation does not match any open level"));
            }
            if line.text.starts_with('-') && (line.text == "-" || line.text.starts_with("- ")) {
                return Err(self.malformed(self.pos, "sequence item inside a mapping"));
            }
            let (key, rest) = match split_key(line.text) {
                Some(entry) => entry,
                None => return Err(self.malformed(self.pos, "expected a `key:` entry")),
            };
            let entry_pos = self.pos;
            self.advance();
            let value = if !rest.is_empty() {
                self.scalar(entry_pos, rest)?
            } else {
                match self.peek() {
                    Some(next) if next.indent > indent => self.block(next.indent, depth + 1)?,
                    _ => Value::Null,
                }
            };
            if map.insert(key.to_string(), value).is_some() {
                return Err(self.malformed(entry_pos, &format!("duplicate key `{key}`")));
            }
        }
        Ok(Value::Map(map))
    }

    fn seq(&mut self, indent: usize, depth: usize) -> Result<Value, Error> {
        let mut items = Seq::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(self.malformed(self.pos, "indentation does not match any open level"));
            }
            if line.text == "-" {
                self.advance();
                let value = match self.peek() {
                    Some(next) if next.indent > indent => self.block(next.indent, depth + 1)?,
                    _ => Value::Null,
                };
                items.push(value);
            } else if let Some(rest) = line.text.strip_prefix("- ") {
                let rest = rest.trim_start();
                if rest.starts_with("- ")
                    || rest == "-"
                    || (!rest.starts_with('"') && split_key(rest).is_some())
                {
                    // The item starts on the dash line: rewrite it as its own
                    // line one unit deeper and parse the nested block there.
                    self.lines[self.pos] = Line {
                        indent: indent + UNIT,
                        text: rest,
                        number: line.number,
                    };
                    items.push(self.block(indent + UNIT, depth + 1)?);
                } else {
                    let at = self.pos;
                    self.advance();
                    items.push(self.scalar(at, rest)?);
                }
            } else {
                return Err(self.malformed(self.pos, "expected a `-` item"));
            }
        }
        Ok(Value::Seq(items))
    }
}

/// Split a `key: value` or `key:` line. The key ends at the first colon that
/// is followed by a space or the end of the line.
fn split_key(text: &str) -> Option<(&str, &str)> {
    for (i, _) in text.match_indices(':') {
        let rest = &text[i + 1..];
        if rest.is_empty() {
            return if i == 0 { None } else { Some((&text[..i], "")) };
        }
        if let Some(stripped) = rest.strip_prefix(' ') {
            return if i == 0 {
                None
            } else {
                Some((&text[..i], stripped.trim_start()))
            };
        }
    }
    None
}
