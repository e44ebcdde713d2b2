//! Minimal XML reader for XML-RPC documents.
//!
//! Produces an element tree without namespaces or attribute values. Mixed
//! content is flattened: each element keeps its child elements in document
//! order and the concatenation of its direct text and CDATA sections.

use super::error::{DecodeError, DecodeResult};

/// Deepest element nesting accepted before parsing stops.
pub const MAX_DEPTH: usize = 128;

/// One element of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Direct text content with entities resolved.
    pub text: String,
}

impl Element {
    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// First child element, if any.
    pub fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }

    /// First child element with the given name, or a decode error.
    pub fn require(&self, name: &str) -> DecodeResult<&Element> {
        self.child(name).ok_or_else(|| DecodeError::MissingElement {
            parent: self.name.clone(),
            child: name.to_string(),
        })
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(source: &str) -> DecodeResult<Element> {
    let mut parser = Parser::new(source);
    parser.skip_misc()?;
    if parser.eof() {
        return Err(parser.error("document has no root element"));
    }
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if !parser.eof() {
        return Err(parser.error("trailing content after root element"));
    }
    Ok(root)
}

/// Resolve the five named entities and numeric character references.
pub fn unescape(text: &str) -> DecodeResult<String> {
    if !text.contains('&') {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let end = tail.find(';').ok_or_else(|| DecodeError::Xml {
            offset: start,
            detail: "unterminated entity reference".to_string(),
        })?;
        let entity = &tail[..end];
        out.push(resolve_entity(entity).ok_or_else(|| DecodeError::Xml {
            offset: start,
            detail: format!("unknown entity '&{};'", entity),
        })?);
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    index: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            index: 0,
            depth: 0,
        }
    }

    fn eof(&self) -> bool {
        self.index >= self.bytes.len()
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.index).copied()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.index..]
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn error(&self, detail: impl Into<String>) -> DecodeError {
        DecodeError::Xml {
            offset: self.index,
            detail: detail.into(),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_ascii_whitespace() {
                self.index += 1;
            } else {
                break;
            }
        }
    }

    /// Advance past the next occurrence of `terminator`.
    fn skip_past(&mut self, terminator: &str) -> DecodeResult<&'a str> {
        match self.rest().find(terminator) {
            Some(pos) => {
                let skipped = &self.rest()[..pos];
                self.index += pos + terminator.len();
                Ok(skipped)
            }
            None => Err(self.error(format!("missing '{}'", terminator))),
        }
    }

    fn expect(&mut self, byte: u8) -> DecodeResult<()> {
        if self.current() == Some(byte) {
            self.index += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    /// Skip whitespace, comments, processing instructions and declarations.
    fn skip_misc(&mut self) -> DecodeResult<()> {
        loop {
            self.skip_ws();
            if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<!") {
                self.skip_past(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_name(&mut self) -> DecodeResult<&'a str> {
        let start = self.index;
        while let Some(ch) = self.current() {
            if ch.is_ascii_whitespace() || ch == b'/' || ch == b'>' || ch == b'=' {
                break;
            }
            self.index += 1;
        }
        if self.index == start {
            return Err(self.error("expected a name"));
        }
        Ok(&self.src[start..self.index])
    }

    fn parse_element(&mut self) -> DecodeResult<Element> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting too deep (limit {})", MAX_DEPTH)));
        }
        self.depth += 1;
        let element = self.parse_element_inner();
        self.depth -= 1;
        element
    }

    fn parse_element_inner(&mut self) -> DecodeResult<Element> {
        self.expect(b'<')?;
        let name = self.parse_name()?.to_string();

        // Attributes carry nothing in XML-RPC; scan over them.
        loop {
            self.skip_ws();
            match self.current() {
                Some(b'/') => {
                    self.index += 1;
                    self.expect(b'>')?;
                    return Ok(Element {
                        name,
                        ..Default::default()
                    });
                }
                Some(b'>') => {
                    self.index += 1;
                    break;
                }
                Some(_) => self.skip_attribute()?,
                None => return Err(self.error(format!("unterminated tag <{}>", name))),
            }
        }

        let mut element = Element {
            name,
            ..Default::default()
        };
        loop {
            if self.eof() {
                return Err(self.error(format!("unclosed element <{}>", element.name)));
            }
            if self.starts_with("</") {
                self.index += 2;
                let closing = self.parse_name()?;
                if closing != element.name {
                    return Err(self.error(format!(
                        "mismatched closing tag </{}> for <{}>",
                        closing, element.name
                    )));
                }
                self.skip_ws();
                self.expect(b'>')?;
                return Ok(element);
            } else if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<![CDATA[") {
                self.index += "<![CDATA[".len();
                let data = self.skip_past("]]>")?;
                element.text.push_str(data);
            } else if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.current() == Some(b'<') {
                element.children.push(self.parse_element()?);
            } else {
                let start = self.index;
                let len = self.rest().find('<').unwrap_or(self.rest().len());
                self.index += len;
                let raw = &self.src[start..self.index];
                element.text.push_str(&unescape(raw).map_err(|err| match err {
                    DecodeError::Xml { offset, detail } => DecodeError::Xml {
                        offset: start + offset,
                        detail,
                    },
                    other => other,
                })?);
            }
        }
    }

    fn skip_attribute(&mut self) -> DecodeResult<()> {
        self.parse_name()?;
        self.skip_ws();
        self.expect(b'=')?;
        self.skip_ws();
        match self.current() {
            Some(quote @ (b'"' | b'\'')) => {
                self.index += 1;
                let terminator = if quote == b'"' { "\"" } else { "'" };
                self.skip_past(terminator)?;
                Ok(())
            }
            _ => Err(self.error("expected quoted attribute value")),
        }
    }
}
