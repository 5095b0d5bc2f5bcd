//! Sample records for auto-init backends.

use tracing::debug;
use veritas_core::{Assertion, Document, DocumentBuilder, Entity, Referenceable, Statement};
use veritas_store::Resolver;

use crate::error::Result;
use crate::ledger::Ledger;

/// Common name of the seeded authority.
pub const SAMPLE_AUTHORITY: &str = "Veritas Sample Authority";

/// Seeded statements with the category and confidence asserted for each.
pub const SAMPLE_CLAIMS: [(&str, &str, f64); 3] = [
    ("Water boils at 100 degrees Celsius at sea level", "IsTrue", 0.99),
    ("The Earth orbits the Sun", "IsTrue", 1.0),
    ("The Moon is made of cheese", "IsFalse", 0.95),
];

pub const SAMPLE_DOCUMENT_TITLE: &str = "Welcome to Veritas";

/// Everything [`seed`] wrote.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub authority: Entity,
    pub statements: Vec<Statement>,
    pub assertions: Vec<Assertion>,
    pub document: Document,
}

impl SeedReport {
    /// Number of records written.
    pub fn record_count(&self) -> usize {
        1 + self.statements.len() + self.assertions.len() + 1
    }
}

/// Write one authority, its claims and a welcome document citing them.
pub async fn seed<S: Resolver>(ledger: &Ledger<S>) -> Result<SeedReport> {
    let authority = ledger.issue_entity(SAMPLE_AUTHORITY).await?;

    let mut statements = Vec::with_capacity(SAMPLE_CLAIMS.len());
    let mut assertions = Vec::with_capacity(SAMPLE_CLAIMS.len());
    for (text, category, confidence) in SAMPLE_CLAIMS {
        let statement = ledger.publish_statement(text).await?;
        let assertion = ledger
            .assert(statement.uri(), authority.uri(), category, confidence)
            .await?;
        statements.push(statement);
        assertions.push(assertion);
    }

    let mut builder = DocumentBuilder::new(SAMPLE_DOCUMENT_TITLE)
        .author(authority.uri(), Some(SAMPLE_AUTHORITY))
        .keyword("sample")
        .keyword("getting started")
        .section(Some("What is recorded here"))
        .text("Every record is addressed by the hash of its content. ")
        .text("Statements are claims; assertions are signed opinions about them.")
        .section(Some("Sample claims"));
    for (statement, assertion) in statements.iter().zip(&assertions) {
        builder = builder
            .paragraph()
            .cite_statement(statement.text(), statement.uri())
            .text(" ")
            .cite_assertion("(signed)", assertion.uri());
    }
    let document = ledger.publish_document(&builder).await?;

    debug!(document = %document.uri(), "seed complete");
    Ok(SeedReport {
        authority,
        statements,
        assertions,
        document,
    })
}
