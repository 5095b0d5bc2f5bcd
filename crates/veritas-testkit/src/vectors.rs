//! Golden address vectors.
//!
//! SHA-256 digests of well-known inputs, with the canonical and escaped
//! address strings every implementation must produce for them.

use veritas_core::{HashUri, Referenceable, Statement};

/// A golden address vector.
#[derive(Debug, Clone)]
pub struct AddressVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Content bytes.
    pub content: &'static str,
    /// Kind tag attached to the address.
    pub kind: Option<&'static str>,
    /// Expected digest (hex).
    pub expected_hash: &'static str,
    /// Expected canonical string.
    pub expected_uri: &'static str,
}

/// Get all golden address vectors.
pub fn address_vectors() -> Vec<AddressVector> {
    vec![
        AddressVector {
            name: "empty content",
            content: "",
            kind: None,
            expected_hash: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            expected_uri:
                "hash://sha256/e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        AddressVector {
            name: "abc statement",
            content: "abc",
            kind: Some("statement"),
            expected_hash: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            expected_uri: "hash://sha256/ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad?type=statement",
        },
        AddressVector {
            name: "hello world statement",
            content: "hello world",
            kind: Some("statement"),
            expected_hash: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
            expected_uri: "hash://sha256/b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9?type=statement",
        },
        AddressVector {
            name: "pangram document tag",
            content: "The quick brown fox jumps over the lazy dog",
            kind: Some("document"),
            expected_hash: "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592",
            expected_uri: "hash://sha256/d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592?type=document",
        },
    ]
}

/// Expected escaped form: the kind-less canonical string, percent-encoded.
pub fn expected_escape(vector: &AddressVector) -> String {
    format!(
        "hash%3A%2F%2Fsha256%2F{}",
        vector.expected_hash
    )
}

/// Check every vector, reporting `(name, matches, produced uri)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    address_vectors()
        .iter()
        .map(|v| {
            let uri = HashUri::from_content(v.content, v.kind);
            let produced = uri.to_string();
            let matches = uri.hash() == v.expected_hash
                && produced == v.expected_uri
                && uri.escape() == expected_escape(v);
            (v.name.to_string(), matches, produced)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, produced) in verify_all_vectors() {
            assert!(matches, "vector '{name}' produced {produced}");
        }
    }

    #[test]
    fn test_vectors_parse_back() {
        for vector in address_vectors() {
            let parsed = HashUri::parse(vector.expected_uri).unwrap();
            assert_eq!(parsed.hash(), vector.expected_hash);
            assert_eq!(parsed.kind(), vector.kind);

            let escaped = HashUri::parse(&expected_escape(&vector)).unwrap();
            assert_eq!(escaped, parsed);
            assert_eq!(escaped.kind(), None);

            let bare = HashUri::parse(vector.expected_hash).unwrap();
            assert_eq!(bare, parsed);
        }
    }

    #[test]
    fn test_statement_addresses_match_vectors() {
        for vector in address_vectors()
            .iter()
            .filter(|v| v.kind == Some("statement"))
        {
            let statement = Statement::new(vector.content);
            assert_eq!(statement.uri().to_string(), vector.expected_uri, "{}", vector.name);
        }
    }
}
