use super::{truncate, RecordKind, Referenceable};
use crate::error::CoreError;
use crate::hashuri::HashUri;

const SUMMARY_LEN: usize = 80;

/// A bare claim: opaque text, unsigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    uri: HashUri,
    text: String,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            uri: HashUri::from_content(&text, Some(RecordKind::Statement.tag())),
            text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Referenceable for Statement {
    fn uri(&self) -> &HashUri {
        &self.uri
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Statement
    }

    fn content(&self) -> &str {
        &self.text
    }

    fn summary(&self) -> String {
        truncate(&self.text, SUMMARY_LEN)
    }

    fn text_content(&self) -> String {
        self.text.clone()
    }

    fn references(&self) -> Vec<HashUri> {
        Vec::new()
    }

    fn parse_content(raw: &str) -> Result<Self, CoreError> {
        Ok(Self::new(raw))
    }
}
