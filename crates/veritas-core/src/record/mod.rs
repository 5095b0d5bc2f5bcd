//! The four storable record kinds and their shared capability.
//!
//! Every record computes its address once, at construction, from its
//! canonical content. Records are immutable afterwards.

mod assertion;
mod document;
mod entity;
mod statement;

pub use assertion::{humanize_category, Assertion};
pub use document::{
    Document, DocumentBuilder, Metadata, Paragraph, Section, Span, SpanRef,
};
pub use entity::Entity;
pub use statement::Statement;

use std::fmt;

use crate::error::CoreError;
use crate::hashuri::HashUri;

/// Shared surface of every storable record.
pub trait Referenceable: Send + Sync {
    /// Content address, tagged with the record kind.
    fn uri(&self) -> &HashUri;

    fn kind(&self) -> RecordKind;

    /// Canonical serialized form. Hashing this yields [`Referenceable::uri`].
    fn content(&self) -> &str;

    /// Short human label.
    fn summary(&self) -> String;

    /// Flattened plain text for the search index.
    fn text_content(&self) -> String;

    /// Addresses this record points to, in a stable order.
    fn references(&self) -> Vec<HashUri>;

    /// Rebuild a record from a previous [`Referenceable::content`].
    fn parse_content(raw: &str) -> Result<Self, CoreError>
    where
        Self: Sized;
}

/// Record discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Statement,
    Entity,
    Assertion,
    Document,
    /// Any kind string not recognised above.
    Unknown,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Statement,
        RecordKind::Entity,
        RecordKind::Assertion,
        RecordKind::Document,
    ];

    /// Display name, e.g. `"Statement"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Statement => "Statement",
            RecordKind::Entity => "Entity",
            RecordKind::Assertion => "Assertion",
            RecordKind::Document => "Document",
            RecordKind::Unknown => "Unknown",
        }
    }

    /// Lowercase tag used in addresses, e.g. `"statement"`.
    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::Statement => "statement",
            RecordKind::Entity => "entity",
            RecordKind::Assertion => "assertion",
            RecordKind::Document => "document",
            RecordKind::Unknown => "unknown",
        }
    }

    /// Case-insensitive lookup. Unrecognised names map to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "statement" => RecordKind::Statement,
            "entity" => RecordKind::Entity,
            "assertion" => RecordKind::Assertion,
            "document" => RecordKind::Document,
            _ => RecordKind::Unknown,
        }
    }

    /// Address for canonical content of this kind.
    ///
    /// Entities and assertions have no meaningful empty form, so empty
    /// content cannot be addressed.
    pub fn address_for(&self, content: &str) -> Result<HashUri, CoreError> {
        match self {
            RecordKind::Entity | RecordKind::Assertion if content.is_empty() => Err(
                CoreError::Addressing(format!("{} has no canonical content", self.as_str())),
            ),
            RecordKind::Unknown => Err(CoreError::Addressing("unknown record kind".into())),
            _ => Ok(HashUri::from_content(content, Some(self.tag()))),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any one of the four record kinds.
#[derive(Debug, Clone)]
pub enum Record {
    Entity(Entity),
    Statement(Statement),
    Assertion(Assertion),
    Document(Document),
}

impl Record {
    /// Parse `raw` as a record of `kind`.
    pub fn parse(kind: RecordKind, raw: &str) -> Result<Self, CoreError> {
        match kind {
            RecordKind::Entity => Entity::parse_content(raw).map(Record::Entity),
            RecordKind::Statement => Statement::parse_content(raw).map(Record::Statement),
            RecordKind::Assertion => Assertion::parse_content(raw).map(Record::Assertion),
            RecordKind::Document => Document::parse_content(raw).map(Record::Document),
            RecordKind::Unknown => Err(CoreError::WrongKind {
                expected: "a known record kind".into(),
                found: kind.as_str().into(),
            }),
        }
    }

    fn inner(&self) -> &dyn Referenceable {
        match self {
            Record::Entity(r) => r,
            Record::Statement(r) => r,
            Record::Assertion(r) => r,
            Record::Document(r) => r,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Record::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Record::Statement(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_assertion(&self) -> Option<&Assertion> {
        match self {
            Record::Assertion(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Record::Document(d) => Some(d),
            _ => None,
        }
    }
}

impl Referenceable for Record {
    fn uri(&self) -> &HashUri {
        self.inner().uri()
    }

    fn kind(&self) -> RecordKind {
        self.inner().kind()
    }

    fn content(&self) -> &str {
        self.inner().content()
    }

    fn summary(&self) -> String {
        self.inner().summary()
    }

    fn text_content(&self) -> String {
        self.inner().text_content()
    }

    fn references(&self) -> Vec<HashUri> {
        self.inner().references()
    }

    /// Sniffs the kind first.
    fn parse_content(raw: &str) -> Result<Self, CoreError> {
        Record::parse(crate::sniff::guess_content_type(raw), raw)
    }
}

impl From<Entity> for Record {
    fn from(e: Entity) -> Self {
        Record::Entity(e)
    }
}

impl From<Statement> for Record {
    fn from(s: Statement) -> Self {
        Record::Statement(s)
    }
}

impl From<Assertion> for Record {
    fn from(a: Assertion) -> Self {
        Record::Assertion(a)
    }
}

impl From<Document> for Record {
    fn from(d: Document) -> Self {
        Record::Document(d)
    }
}

/// Truncate `text` to at most `max` characters, appending an ellipsis.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
