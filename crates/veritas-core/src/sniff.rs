//! Best-effort record kind detection for raw content with no address.

use crate::certificate::PEM_HEADER;
use crate::record::RecordKind;
use crate::token::TOKEN_PREFIX;

/// Certificates and signed tokens are always at least this long.
pub const MIN_SIGNED_LEN: usize = 512;

/// Classify `raw` by its leading bytes.
///
/// Checks run in a fixed order: XML document, short payload, certificate,
/// token. Anything else is a statement.
pub fn guess_content_type(raw: &str) -> RecordKind {
    let trimmed = raw.trim_start();

    if trimmed.starts_with("<?xml") && raw.contains("<document>") {
        return RecordKind::Document;
    }
    if raw.len() < MIN_SIGNED_LEN {
        return RecordKind::Statement;
    }
    if trimmed.starts_with(PEM_HEADER) {
        return RecordKind::Entity;
    }
    if trimmed.starts_with(TOKEN_PREFIX) {
        return RecordKind::Assertion;
    }
    RecordKind::Statement
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_document_still_document() {
        let xml = r#"<?xml version="1.0"?><document></document>"#;
        assert_eq!(guess_content_type(xml), RecordKind::Document);
    }

    #[test]
    fn test_short_payloads_are_statements() {
        assert_eq!(guess_content_type(PEM_HEADER), RecordKind::Statement);
        assert_eq!(guess_content_type("eyJhbGciOi"), RecordKind::Statement);
        assert_eq!(guess_content_type(""), RecordKind::Statement);
    }

    #[test]
    fn test_long_prefixes() {
        let padding = "A".repeat(MIN_SIGNED_LEN);
        assert_eq!(
            guess_content_type(&format!("{PEM_HEADER}\n{padding}")),
            RecordKind::Entity
        );
        assert_eq!(
            guess_content_type(&format!("eyJ{padding}")),
            RecordKind::Assertion
        );
        assert_eq!(guess_content_type(&padding), RecordKind::Statement);
    }

    #[test]
    fn test_xml_without_document_tag() {
        let xml = format!("<?xml version=\"1.0\"?><note>{}</note>", "x".repeat(600));
        assert_eq!(guess_content_type(&xml), RecordKind::Statement);
    }
}
