//! Feed rendering
//!
//! Turning a [`Feed`] into a document is left to a [`Render`] implementation.
//! [`AtomRenderer`] is a generic Atom layout: every info key becomes a child
//! of `<feed>` and every entry an `<entry>` with one child per field.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Error, Result};
use crate::extractors::Feed;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

pub trait Render {
    fn render(&self, feed: &Feed) -> Result<String>;
}

impl<F> Render for F
where
    F: Fn(&Feed) -> Result<String>,
{
    fn render(&self, feed: &Feed) -> Result<String> {
        self(feed)
    }
}

/// Atom output built with `quick-xml`.
///
/// Values produced by `cdata` rules are written as CDATA sections; all
/// other values are escaped as text. Fields carry no type once extracted, so
/// any value that starts with `<![CDATA[` and ends with `]]>` is taken as
/// CDATA, even one from a plain text rule.
///
/// Info and entry keys become element names and must be valid XML names.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomRenderer {
    indent: Option<usize>,
}

impl AtomRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-print with `width` spaces per level
    pub fn indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }
}

impl Render for AtomRenderer {
    fn render(&self, feed: &Feed) -> Result<String> {
        let mut writer = match self.indent {
            Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
            None => Writer::new(Vec::new()),
        };

        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        write(
            &mut writer,
            Event::Start(BytesStart::new("feed").with_attributes([("xmlns", ATOM_NS)])),
        )?;

        for (name, value) in &feed.info {
            write_field(&mut writer, name, value)?;
        }

        for entry in &feed.entries {
            write(&mut writer, Event::Start(BytesStart::new("entry")))?;
            for (name, value) in entry {
                write_field(&mut writer, name, value)?;
            }
            write(&mut writer, Event::End(BytesEnd::new("entry")))?;
        }

        write(&mut writer, Event::End(BytesEnd::new("feed")))?;

        String::from_utf8(writer.into_inner()).map_err(|e| Error::Render(e.to_string()))
    }
}

fn write_field(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    if !is_xml_name(name) {
        return Err(Error::Render(format!("invalid element name `{name}`")));
    }
    write(writer, Event::Start(BytesStart::new(name)))?;

    let cdata = value
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"));
    match cdata {
        Some(inner) => write(writer, Event::CData(BytesCData::new(inner)))?,
        None if value.is_empty() => {}
        None => write(writer, Event::Text(BytesText::new(value)))?,
    }

    write(writer, Event::End(BytesEnd::new(name)))
}

/// XML 1.0 `Name` production
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | '_' | 'A'..='Z' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Render(e.to_string()))
}
