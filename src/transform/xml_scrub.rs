//! Redact environment-specific data from scanner XML output
//!
//! Two kinds of data are removed: the text of every `User` element nested
//! directly under a `Script` element, and the directory part of every
//! `qualified_path` attribute on the children of a `FileNames` element.
//! Elements are matched by local name, so a default or prefixed namespace
//! makes no difference.
//!
//! Documents are decoded from their declared encoding and written back as
//! UTF-8 with a fresh XML declaration. Character data is kept exactly as it
//! was. Elements that contain only child elements are re-indented with two
//! spaces; any element holding text keeps its content verbatim.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesCData, BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::discovery::TreeEntry;
use crate::error::{TransformError, TransformResult};

use super::{Transform, TransformOutcome};

pub const REDACTED_TEXT: &str = "redacted";
pub const PATH_WILDCARD: &str = "***";

const SCRIPT: &[u8] = b"Script";
const USER: &[u8] = b"User";
const FILE_NAMES: &[u8] = b"FileNames";
const QUALIFIED_PATH: &[u8] = b"qualified_path";
const INDENT: usize = 2;

/// Counts of redactions made in one document
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrubReport {
    pub users: usize,
    pub paths: usize,
}

enum ScrubError {
    NotXml(String),
    Write(quick_xml::Error),
}

impl From<quick_xml::Error> for ScrubError {
    fn from(e: quick_xml::Error) -> Self {
        ScrubError::Write(e)
    }
}

fn not_xml(e: impl ToString) -> ScrubError {
    ScrubError::NotXml(e.to_string())
}

/// One parsed node. Text and markup are held already escaped, in UTF-8.
enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    Pi(String),
    DocType(String),
}

impl Node {
    fn is_character_data(&self) -> bool {
        matches!(self, Node::Text(_) | Node::CData(_))
    }
}

struct Element {
    start: BytesStart<'static>,
    children: Vec<Node>,
}

impl Element {
    fn is(&self, local: &[u8]) -> bool {
        self.start.local_name().as_ref() == local
    }
}

#[derive(Debug, Default, Clone)]
pub struct XmlScrubber {
    totals: ScrubReport,
}

impl XmlScrubber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redactions made across every document so far
    pub fn totals(&self) -> ScrubReport {
        self.totals
    }

    /// Scrub one document. `Ok(None)` means the input is not XML.
    pub fn scrub(&self, contents: &[u8]) -> TransformResult<Option<(Vec<u8>, ScrubReport)>> {
        match scrub_document(contents) {
            Ok(scrubbed) => Ok(Some(scrubbed)),
            Err(ScrubError::NotXml(message)) => {
                tracing::debug!("Not XML: {}", message);
                Ok(None)
            }
            Err(ScrubError::Write(e)) => Err(TransformError::xml(e)),
        }
    }
}

impl Transform for XmlScrubber {
    fn name(&self) -> &'static str {
        "scrub-xml"
    }

    fn apply(&mut self, entry: &TreeEntry, contents: Vec<u8>) -> TransformResult<TransformOutcome> {
        tracing::info!("Parsing '{}'", entry.source.display());

        let Some((scrubbed, report)) = self.scrub(&contents)? else {
            tracing::warn!(
                "File '{}' does not appear to be XML. Skipping.",
                entry.source.display()
            );
            return Ok(TransformOutcome::skip("not XML"));
        };

        tracing::info!("Script -> Admin 'User' items redacted: {}", report.users);
        tracing::info!(
            "FileName Path 'qualified_path' items redacted: {}",
            report.paths
        );
        self.totals.users += report.users;
        self.totals.paths += report.paths;

        Ok(TransformOutcome::Write(scrubbed))
    }
}

fn scrub_document(contents: &[u8]) -> Result<(Vec<u8>, ScrubReport), ScrubError> {
    let mut top = parse_document(contents)?;

    let mut report = ScrubReport::default();
    for node in &mut top {
        if let Node::Element(root) = node {
            redact(root, &mut report)?;
        }
    }

    Ok((write_document(&top)?, report))
}

/// Parse into top-level nodes holding exactly one root element
fn parse_document(contents: &[u8]) -> Result<Vec<Node>, ScrubError> {
    let mut reader = Reader::from_reader(contents);

    let mut top: Vec<Node> = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(not_xml)?;
        // The declaration may switch the encoding, so ask for each event
        let decoder = reader.decoder();

        let node = match event {
            Event::Eof => break,
            Event::Decl(_) => continue,
            Event::Start(start) => {
                open_element(&open, &mut saw_root)?;
                open.push(Element {
                    start: decode_start(&start, decoder)?,
                    children: Vec::new(),
                });
                continue;
            }
            Event::Empty(start) => {
                open_element(&open, &mut saw_root)?;
                Node::Element(Element {
                    start: decode_start(&start, decoder)?,
                    children: Vec::new(),
                })
            }
            Event::End(_) => match open.pop() {
                Some(element) => Node::Element(element),
                None => return Err(not_xml("unmatched closing tag")),
            },
            Event::Text(text) => {
                if open.is_empty() {
                    if text.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    return Err(not_xml("text outside the root element"));
                }
                Node::Text(decode(&text, decoder)?)
            }
            Event::CData(cdata) => {
                if open.is_empty() {
                    return Err(not_xml("CDATA outside the root element"));
                }
                Node::CData(decode(&cdata, decoder)?)
            }
            Event::Comment(comment) => Node::Comment(decode(&comment, decoder)?),
            Event::PI(pi) => Node::Pi(decode(&pi, decoder)?),
            Event::DocType(doctype) => Node::DocType(decode(&doctype, decoder)?),
        };

        match open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => top.push(node),
        }
    }

    if !saw_root {
        return Err(not_xml("no root element"));
    }
    if !open.is_empty() {
        return Err(not_xml("unclosed elements at end of input"));
    }
    Ok(top)
}

fn open_element(open: &[Element], saw_root: &mut bool) -> Result<(), ScrubError> {
    if open.is_empty() {
        if *saw_root {
            return Err(not_xml("more than one root element"));
        }
        *saw_root = true;
    }
    Ok(())
}

fn decode(bytes: &[u8], decoder: Decoder) -> Result<String, ScrubError> {
    decoder
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(not_xml)
}

fn decode_start(start: &BytesStart<'_>, decoder: Decoder) -> Result<BytesStart<'static>, ScrubError> {
    let name = decode(start.name().as_ref(), decoder)?;
    let content = decode(start, decoder)?;
    Ok(BytesStart::from_content(content, name.len()))
}

fn redact(element: &mut Element, report: &mut ScrubReport) -> Result<(), ScrubError> {
    let is_script = element.is(SCRIPT);
    let is_file_names = element.is(FILE_NAMES);

    for child in &mut element.children {
        let Node::Element(child) = child else {
            continue;
        };
        if is_script && child.is(USER) {
            replace_text(child);
            report.users += 1;
        }
        if is_file_names {
            if let Some(start) = rewrite_paths(&child.start, report)? {
                child.start = start;
            }
        }
        redact(child, report)?;
    }
    Ok(())
}

/// Replace the character data before the first child node. Children and
/// anything after them are kept.
fn replace_text(element: &mut Element) {
    let leading = element
        .children
        .iter()
        .take_while(|node| node.is_character_data())
        .count();
    element.children.drain(..leading);
    element
        .children
        .insert(0, Node::Text(REDACTED_TEXT.to_string()));
}

/// `Some` with the rewritten start tag when it carries a `qualified_path`
fn rewrite_paths(
    start: &BytesStart<'_>,
    report: &mut ScrubReport,
) -> Result<Option<BytesStart<'static>>, ScrubError> {
    let has_path = start
        .attributes()
        .flatten()
        .any(|attr| attr.key.local_name().as_ref() == QUALIFIED_PATH);
    if !has_path {
        return Ok(None);
    }

    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut rewritten = BytesStart::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(not_xml)?;
        if attr.key.local_name().as_ref() == QUALIFIED_PATH {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .decode_and_unescape_value(&Reader::from_str(""))
                .map_err(not_xml)?;
            let redacted = redact_windows_path(&value);
            rewritten.push_attribute((key.as_str(), redacted.as_str()));
            report.paths += 1;
        } else {
            rewritten.push_attribute(attr);
        }
    }

    Ok(Some(rewritten))
}

fn write_document(top: &[Node]) -> Result<Vec<u8>, ScrubError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.get_mut().push(b'\n');

    for node in top {
        write_node(&mut writer, node, 0, true)?;
        writer.get_mut().push(b'\n');
    }
    Ok(writer.into_inner())
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    node: &Node,
    level: usize,
    format: bool,
) -> Result<(), ScrubError> {
    match node {
        Node::Element(element) => write_element(writer, element, level, format)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?,
        Node::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
        Node::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
        }
        Node::Pi(text) => writer.write_event(Event::PI(BytesText::from_escaped(text.as_str())))?,
        Node::DocType(text) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(text.as_str())))?
        }
    }
    Ok(())
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    level: usize,
    format: bool,
) -> Result<(), ScrubError> {
    if element.children.is_empty() {
        writer.write_event(Event::Empty(element.start.borrow()))?;
        return Ok(());
    }

    // Indenting stops at the first element that holds character data
    let format = format && !element.children.iter().any(Node::is_character_data);

    writer.write_event(Event::Start(element.start.borrow()))?;
    for child in &element.children {
        if format {
            indent(writer, level + 1);
        }
        write_node(writer, child, level + 1, format)?;
    }
    if format {
        indent(writer, level);
    }
    writer.write_event(Event::End(element.start.to_end()))?;
    Ok(())
}

fn indent(writer: &mut Writer<Vec<u8>>, level: usize) {
    let out = writer.get_mut();
    out.push(b'\n');
    out.resize(out.len() + level * INDENT, b' ');
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Split a Windows path into its anchor (drive and/or root) and the rest.
/// The anchor is normalized to backslashes.
fn split_anchor(path: &str) -> (String, &str) {
    let chars: Vec<char> = path.chars().take(3).collect();

    // UNC: \\server\share\
    if chars.len() >= 2 && is_separator(chars[0]) && is_separator(chars[1]) {
        let body = &path[2..];
        let mut parts = body.splitn(3, is_separator);
        let server = parts.next().unwrap_or("");
        let share = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("");
        return (format!("\\\\{}\\{}\\", server, share), rest);
    }

    // Drive letter, absolute (C:\) or drive-relative (C:)
    if chars.len() >= 2 && chars[0].is_ascii_alphabetic() && chars[1] == ':' {
        if chars.len() >= 3 && is_separator(chars[2]) {
            return (format!("{}:\\", chars[0]), &path[3..]);
        }
        return (format!("{}:", chars[0]), &path[2..]);
    }

    if chars.first().copied().is_some_and(is_separator) {
        return ("\\".to_string(), &path[1..]);
    }

    (String::new(), path)
}

/// Keep only the anchor and final component of a Windows path, replacing
/// every directory in between with a wildcard.
///
/// `C:\Users\jdoe\Documents\report.docx` becomes `C:\***\report.docx`.
pub fn redact_windows_path(path: &str) -> String {
    let (anchor, rest) = split_anchor(path);
    let name = rest.rsplit(is_separator).find(|s| !s.is_empty()).unwrap_or("");

    let mut redacted = anchor;
    redacted.push_str(PATH_WILDCARD);
    if !name.is_empty() {
        redacted.push('\\');
        redacted.push_str(name);
    }
    redacted
}
