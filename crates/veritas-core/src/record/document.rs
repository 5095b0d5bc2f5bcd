//! XML-composed documents.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <document>
//!   <metadata>
//!     <author name="Alice">hash://sha256/...</author>
//!     <title>On Colour</title>
//!     <keywords>sky, colour</keywords>
//!   </metadata>
//!   <section>
//!     <title>Observations</title>
//!     <paragraph>
//!       <span>We looked up and </span>
//!       <span statement="hash://sha256/...">the sky is blue</span>
//!     </paragraph>
//!   </section>
//! </document>
//! ```
//!
//! The raw XML is the canonical content and is kept verbatim, so the
//! address never depends on how the parser normalizes whitespace.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{RecordKind, Referenceable};
use crate::error::CoreError;
use crate::hashuri::HashUri;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub keywords: Vec<String>,
    /// Address of the authoring entity. Empty when absent.
    pub author: HashUri,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub title: Option<String>,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub spans: Vec<Span>,
}

/// A reference carried by a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanRef {
    Statement(HashUri),
    Assertion(HashUri),
}

impl SpanRef {
    pub fn uri(&self) -> &HashUri {
        match self {
            SpanRef::Statement(uri) | SpanRef::Assertion(uri) => uri,
        }
    }

    fn attribute(&self) -> &'static str {
        match self {
            SpanRef::Statement(_) => "statement",
            SpanRef::Assertion(_) => "assertion",
        }
    }
}

/// A run of text, optionally linked to a statement or assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub reference: Option<SpanRef>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference: None,
        }
    }

    pub fn statement(text: impl Into<String>, uri: &HashUri) -> Self {
        Self {
            text: text.into(),
            reference: Some(SpanRef::Statement(uri.with_kind("statement"))),
        }
    }

    pub fn assertion(text: impl Into<String>, uri: &HashUri) -> Self {
        Self {
            text: text.into(),
            reference: Some(SpanRef::Assertion(uri.with_kind("assertion"))),
        }
    }

    /// Web route of the referenced record, for renderers.
    pub fn link(&self) -> Option<String> {
        self.reference.as_ref().map(|r| r.uri().web_path())
    }
}

/// A parsed document and its verbatim XML.
#[derive(Debug, Clone)]
pub struct Document {
    uri: HashUri,
    raw: String,
    metadata: Metadata,
    sections: Vec<Section>,
}

impl Document {
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn author(&self) -> &HashUri {
        &self.metadata.author
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// All spans in document order.
    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.sections
            .iter()
            .flat_map(|s| s.paragraphs.iter())
            .flat_map(|p| p.spans.iter())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Referenceable for Document {
    fn uri(&self) -> &HashUri {
        &self.uri
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Document
    }

    fn content(&self) -> &str {
        &self.raw
    }

    fn summary(&self) -> String {
        if self.metadata.title.is_empty() {
            "Untitled document".to_string()
        } else {
            self.metadata.title.clone()
        }
    }

    fn text_content(&self) -> String {
        let mut parts: Vec<&str> = vec![self.metadata.title.as_str()];
        if let Some(name) = &self.metadata.author_name {
            parts.push(name);
        }
        parts.extend(self.metadata.keywords.iter().map(String::as_str));
        parts.extend(self.sections.iter().filter_map(|s| s.title.as_deref()));
        parts.extend(self.spans().map(|s| s.text.as_str()));

        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn references(&self) -> Vec<HashUri> {
        let author = Some(&self.metadata.author).filter(|a| !a.is_empty());
        author
            .into_iter()
            .chain(self.spans().filter_map(|s| s.reference.as_ref().map(SpanRef::uri)))
            .cloned()
            .collect()
    }

    fn parse_content(raw: &str) -> Result<Self, CoreError> {
        let (metadata, sections) = parse_xml(raw)?;
        Ok(Self {
            uri: RecordKind::Document.address_for(raw)?,
            raw: raw.to_string(),
            metadata,
            sections,
        })
    }
}

// ───── Parsing ─────

fn xml_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Document(e.to_string())
}

fn parse_xml(raw: &str) -> Result<(Metadata, Vec<Section>), CoreError> {
    let mut reader = Reader::from_str(raw);
    let mut metadata = Metadata::default();
    let mut sections: Vec<Section> = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut pending_ref: Option<SpanRef> = None;
    let mut seen_root = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(start) => {
                let name = open_element(
                    &start,
                    &stack,
                    &mut metadata,
                    &mut sections,
                    &mut pending_ref,
                    &mut seen_root,
                )?;
                stack.push(name);
                text.clear();
            }
            Event::Empty(start) => {
                let name = open_element(
                    &start,
                    &stack,
                    &mut metadata,
                    &mut sections,
                    &mut pending_ref,
                    &mut seen_root,
                )?;
                text.clear();
                close_element(&name, &stack, "", &mut metadata, &mut sections, &mut pending_ref)?;
            }
            Event::End(_) => {
                let name = stack
                    .pop()
                    .ok_or_else(|| CoreError::Document("unbalanced end tag".into()))?;
                close_element(&name, &stack, &text, &mut metadata, &mut sections, &mut pending_ref)?;
                text.clear();
            }
            Event::Text(t) => {
                let chunk = t.unescape().map_err(xml_err)?;
                accept_text(&chunk, &stack, &mut text, &mut sections)?;
            }
            Event::CData(c) => {
                let chunk = String::from_utf8_lossy(&c.into_inner()).into_owned();
                accept_text(&chunk, &stack, &mut text, &mut sections)?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if !seen_root {
        return Err(CoreError::Document("missing <document> root".into()));
    }
    if !stack.is_empty() {
        return Err(CoreError::Document(format!("unclosed <{}>", stack.join("/"))));
    }
    Ok((metadata, sections))
}

fn open_element(
    start: &BytesStart<'_>,
    stack: &[String],
    metadata: &mut Metadata,
    sections: &mut Vec<Section>,
    pending_ref: &mut Option<SpanRef>,
    seen_root: &mut bool,
) -> Result<String, CoreError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let parent = stack.last().map(String::as_str);

    match (parent, name.as_str()) {
        (None, "document") if !*seen_root => *seen_root = true,
        (Some("document"), "metadata") => {}
        (Some("metadata"), "title" | "keywords") => {}
        (Some("metadata"), "author") => {
            for attr in start.attributes() {
                let attr = attr.map_err(xml_err)?;
                if attr.key.as_ref() == b"name" {
                    metadata.author_name = Some(attr.unescape_value().map_err(xml_err)?.into_owned());
                }
            }
        }
        (Some("document"), "section") => sections.push(Section::default()),
        (Some("section"), "title") => {}
        (Some("section"), "paragraph") => {
            current_section(sections)?.paragraphs.push(Paragraph::default());
        }
        (Some("paragraph"), "span") => {
            *pending_ref = span_reference(start)?;
        }
        _ => {
            return Err(CoreError::Document(format!(
                "unexpected <{name}> inside <{}>",
                parent.unwrap_or("")
            )))
        }
    }
    Ok(name)
}

fn close_element(
    name: &str,
    stack: &[String],
    text: &str,
    metadata: &mut Metadata,
    sections: &mut [Section],
    pending_ref: &mut Option<SpanRef>,
) -> Result<(), CoreError> {
    match (stack.last().map(String::as_str), name) {
        (Some("metadata"), "author") => {
            let trimmed = text.trim();
            metadata.author = if trimmed.is_empty() {
                HashUri::EMPTY
            } else {
                HashUri::parse(trimmed)?.with_kind("entity")
            };
        }
        (Some("metadata"), "title") => metadata.title = text.to_string(),
        (Some("metadata"), "keywords") => {
            metadata.keywords = text
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
        }
        (Some("section"), "title") => {
            if let Some(section) = sections.last_mut() {
                section.title = Some(text.to_string());
            }
        }
        (Some("paragraph"), "span") => {
            current_paragraph(sections)?.spans.push(Span {
                text: text.to_string(),
                reference: pending_ref.take(),
            });
        }
        _ => {}
    }
    Ok(())
}

fn accept_text(
    chunk: &str,
    stack: &[String],
    text: &mut String,
    sections: &mut [Section],
) -> Result<(), CoreError> {
    match stack.last().map(String::as_str) {
        Some("span" | "title" | "author" | "keywords") => text.push_str(chunk),
        // Bare paragraph text is an unlinked span.
        Some("paragraph") if !chunk.trim().is_empty() => {
            current_paragraph(sections)?.spans.push(Span::plain(chunk));
        }
        _ if chunk.trim().is_empty() => {}
        parent => {
            return Err(CoreError::Document(format!(
                "unexpected text inside <{}>",
                parent.unwrap_or("")
            )))
        }
    }
    Ok(())
}

fn span_reference(start: &BytesStart<'_>) -> Result<Option<SpanRef>, CoreError> {
    let mut reference = None;
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        let kind = match attr.key.as_ref() {
            b"statement" => RecordKind::Statement,
            b"assertion" => RecordKind::Assertion,
            _ => continue,
        };
        if reference.is_some() {
            return Err(CoreError::Document("span carries more than one reference".into()));
        }
        let uri = HashUri::parse(&attr.unescape_value().map_err(xml_err)?)?.with_kind(kind.tag());
        reference = Some(match kind {
            RecordKind::Statement => SpanRef::Statement(uri),
            _ => SpanRef::Assertion(uri),
        });
    }
    Ok(reference)
}

fn current_section(sections: &mut [Section]) -> Result<&mut Section, CoreError> {
    sections
        .last_mut()
        .ok_or_else(|| CoreError::Document("paragraph outside a section".into()))
}

fn current_paragraph(sections: &mut [Section]) -> Result<&mut Paragraph, CoreError> {
    current_section(sections)?
        .paragraphs
        .last_mut()
        .ok_or_else(|| CoreError::Document("span outside a paragraph".into()))
}

// ───── Building ─────

/// Incrementally compose a document, then serialize it.
///
/// ```ignore
/// let doc = DocumentBuilder::new("On Colour")
///     .author(alice.uri(), Some("Alice"))
///     .keyword("sky")
///     .section(Some("Observations"))
///     .text("We looked up and ")
///     .cite_statement("the sky is blue", statement.uri())
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    metadata: Metadata,
    sections: Vec<Section>,
}

impl DocumentBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            metadata: Metadata {
                title: title.into(),
                ..Metadata::default()
            },
            sections: Vec::new(),
        }
    }

    pub fn author(mut self, author: &HashUri, name: Option<&str>) -> Self {
        self.metadata.author = author.with_kind("entity");
        self.metadata.author_name = name.map(str::to_string);
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.metadata.keywords.push(keyword.into());
        self
    }

    /// Start a new section.
    pub fn section(mut self, title: Option<&str>) -> Self {
        self.sections.push(Section {
            title: title.map(str::to_string),
            paragraphs: Vec::new(),
        });
        self
    }

    /// Start a new paragraph in the current section.
    pub fn paragraph(mut self) -> Self {
        if self.sections.is_empty() {
            self.sections.push(Section::default());
        }
        if let Some(section) = self.sections.last_mut() {
            section.paragraphs.push(Paragraph::default());
        }
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        let needs_paragraph = self
            .sections
            .last()
            .map_or(true, |s| s.paragraphs.is_empty());
        if needs_paragraph {
            self = self.paragraph();
        }
        if let Some(paragraph) = self.sections.last_mut().and_then(|s| s.paragraphs.last_mut()) {
            paragraph.spans.push(span);
        }
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.span(Span::plain(text))
    }

    pub fn cite_statement(self, text: impl Into<String>, uri: &HashUri) -> Self {
        self.span(Span::statement(text, uri))
    }

    pub fn cite_assertion(self, text: impl Into<String>, uri: &HashUri) -> Self {
        self.span(Span::assertion(text, uri))
    }

    /// Serialize to XML without building a [`Document`].
    pub fn to_xml(&self) -> Result<String, CoreError> {
        let mut writer = Writer::new(Vec::new());
        let w = &mut writer;

        emit(w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        emit(w, Event::Start(BytesStart::new("document")))?;

        emit(w, Event::Start(BytesStart::new("metadata")))?;
        let mut author = BytesStart::new("author");
        if let Some(name) = &self.metadata.author_name {
            author.push_attribute(("name", name.as_str()));
        }
        let author_text = if self.metadata.author.is_empty() {
            String::new()
        } else {
            self.metadata.author.to_string()
        };
        text_element(w, author, &author_text)?;
        text_element(w, BytesStart::new("title"), &self.metadata.title)?;
        text_element(w, BytesStart::new("keywords"), &self.metadata.keywords.join(", "))?;
        emit(w, Event::End(BytesEnd::new("metadata")))?;

        for section in &self.sections {
            emit(w, Event::Start(BytesStart::new("section")))?;
            if let Some(title) = &section.title {
                text_element(w, BytesStart::new("title"), title)?;
            }
            for paragraph in &section.paragraphs {
                emit(w, Event::Start(BytesStart::new("paragraph")))?;
                for span in &paragraph.spans {
                    let mut start = BytesStart::new("span");
                    if let Some(reference) = &span.reference {
                        let uri = reference.uri().to_string();
                        start.push_attribute((reference.attribute(), uri.as_str()));
                    }
                    text_element(w, start, &span.text)?;
                }
                emit(w, Event::End(BytesEnd::new("paragraph")))?;
            }
            emit(w, Event::End(BytesEnd::new("section")))?;
        }

        emit(w, Event::End(BytesEnd::new("document")))?;

        String::from_utf8(writer.into_inner()).map_err(xml_err)
    }

    /// Serialize and parse back, yielding an addressed document.
    pub fn build(&self) -> Result<Document, CoreError> {
        Document::parse_content(&self.to_xml()?)
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), CoreError> {
    writer.write_event(event).map_err(xml_err)
}

fn text_element(
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'_>,
    text: &str,
) -> Result<(), CoreError> {
    let end = start.to_end().into_owned();
    emit(writer, Event::Start(start))?;
    if !text.is_empty() {
        emit(writer, Event::Text(BytesText::new(text)))?;
    }
    emit(writer, Event::End(end))
}
