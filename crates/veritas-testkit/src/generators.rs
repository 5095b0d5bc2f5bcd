//! Proptest generators for property-based testing.

use proptest::prelude::*;

use veritas_core::{
    CoreError, Document, DocumentBuilder, HashUri, Keypair, Referenceable, Statement,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a kind tag as it appears in addresses.
pub fn kind_tag() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("statement".to_string())),
        Just(Some("entity".to_string())),
        Just(Some("assertion".to_string())),
        Just(Some("document".to_string())),
    ]
}

/// Generate an address over random content.
pub fn hash_uri() -> impl Strategy<Value = HashUri> {
    (any::<Vec<u8>>(), kind_tag())
        .prop_map(|(content, kind)| HashUri::from_content(content, kind.as_deref()))
}

/// Generate statement text, including unicode and markup characters.
pub fn statement_text() -> impl Strategy<Value = String> {
    "\\PC{1,200}"
}

pub fn statement() -> impl Strategy<Value = Statement> {
    statement_text().prop_map(Statement::new)
}

/// Generate a single search word.
pub fn word() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,12}[.,?;:]?"
}

/// Generate a sentence of search words.
pub fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 0..16).prop_map(|words| words.join(" "))
}

/// Generate a CamelCase assertion category.
pub fn category() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("IsTrue".to_string()),
        Just("IsFalse".to_string()),
        Just("IsMisleading".to_string()),
        "[A-Z][a-z]{1,6}[A-Z][a-z]{1,6}",
    ]
}

/// Generate a valid confidence.
pub fn confidence() -> impl Strategy<Value = f64> {
    0.0f64..=1.0f64
}

/// Text safe to place in a document span.
pub fn span_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9<>&\"'][A-Za-z0-9 <>&\"',.]{0,40}"
}

/// One span: plain text or a citation.
#[derive(Debug, Clone)]
pub enum SpanParams {
    Plain(String),
    Statement(String, HashUri),
    Assertion(String, HashUri),
}

/// Parameters for generating a document.
#[derive(Debug, Clone)]
pub struct DocumentParams {
    pub title: String,
    pub author: Option<(HashUri, Option<String>)>,
    pub keywords: Vec<String>,
    pub sections: Vec<(Option<String>, Vec<Vec<SpanParams>>)>,
}

fn span_params() -> impl Strategy<Value = SpanParams> {
    prop_oneof![
        span_text().prop_map(SpanParams::Plain),
        (span_text(), any::<[u8; 8]>())
            .prop_map(|(t, c)| SpanParams::Statement(t, HashUri::from_content(c, Some("statement")))),
        (span_text(), any::<[u8; 8]>())
            .prop_map(|(t, c)| SpanParams::Assertion(t, HashUri::from_content(c, Some("assertion")))),
    ]
}

impl Arbitrary for DocumentParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let author = proptest::option::of((
            any::<[u8; 8]>().prop_map(|c| HashUri::from_content(c, Some("entity"))),
            proptest::option::of("[A-Z][a-z]{2,10}"),
        ));
        let paragraph = prop::collection::vec(span_params(), 1..4);
        let section = (
            proptest::option::of("[A-Z][a-z ]{0,20}"),
            prop::collection::vec(paragraph, 0..3),
        );

        (
            "[A-Z][A-Za-z ]{0,30}",
            author,
            prop::collection::vec("[a-z]{2,10}", 0..4),
            prop::collection::vec(section, 0..3),
        )
            .prop_map(|(title, author, keywords, sections)| DocumentParams {
                title,
                author,
                keywords,
                sections,
            })
            .boxed()
    }
}

impl DocumentParams {
    /// Addresses the built document must report, in order.
    pub fn expected_references(&self) -> Vec<HashUri> {
        let author = self.author.iter().map(|(uri, _)| uri.clone());
        let cited = self
            .sections
            .iter()
            .flat_map(|(_, paragraphs)| paragraphs.iter().flatten())
            .filter_map(|span| match span {
                SpanParams::Plain(_) => None,
                SpanParams::Statement(_, uri) | SpanParams::Assertion(_, uri) => Some(uri.clone()),
            });
        author.chain(cited).collect()
    }
}

/// Build a document from parameters.
pub fn document_from_params(params: &DocumentParams) -> Result<Document, CoreError> {
    let mut builder = DocumentBuilder::new(params.title.as_str());
    if let Some((uri, name)) = &params.author {
        builder = builder.author(uri, name.as_deref());
    }
    for keyword in &params.keywords {
        builder = builder.keyword(keyword.as_str());
    }
    for (title, paragraphs) in &params.sections {
        builder = builder.section(title.as_deref());
        for spans in paragraphs {
            builder = builder.paragraph();
            for span in spans {
                builder = match span {
                    SpanParams::Plain(text) => builder.text(text.as_str()),
                    SpanParams::Statement(text, uri) => builder.cite_statement(text.as_str(), uri),
                    SpanParams::Assertion(text, uri) => builder.cite_assertion(text.as_str(), uri),
                };
            }
        }
    }
    builder.build()
}
