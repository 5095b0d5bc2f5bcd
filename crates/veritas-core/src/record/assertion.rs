use super::{Entity, RecordKind, Referenceable};
use crate::crypto::{Keypair, PublicKey};
use crate::error::{CoreError, VerificationError};
use crate::hashuri::HashUri;
use crate::token::{self, AssertionClaims};

/// A signed claim by an entity about another record.
///
/// Parsing does not check the signature. Call [`Assertion::verify`] or
/// [`crate::validation::verify_assertion`] before trusting the claims.
#[derive(Debug, Clone)]
pub struct Assertion {
    uri: HashUri,
    token: String,
    claims: AssertionClaims,
}

impl Assertion {
    /// Sign a new assertion about `subject` as `issuer`.
    ///
    /// `keypair` must be the issuer's key.
    pub fn issue(
        subject: &HashUri,
        issuer: &Entity,
        keypair: &Keypair,
        category: &str,
        confidence: f64,
    ) -> Result<Self, CoreError> {
        let claims = AssertionClaims::now(
            subject.clone(),
            issuer.uri().clone(),
            category,
            confidence,
        )?;
        Self::sign(claims, issuer, keypair)
    }

    /// Like [`Assertion::issue`] with an explicit issuance time (Unix seconds).
    pub fn issue_at(
        subject: &HashUri,
        issuer: &Entity,
        keypair: &Keypair,
        category: &str,
        confidence: f64,
        issued_at: i64,
    ) -> Result<Self, CoreError> {
        let claims = AssertionClaims::new(
            subject.clone(),
            issuer.uri().clone(),
            category,
            confidence,
            issued_at,
        )?;
        Self::sign(claims, issuer, keypair)
    }

    fn sign(claims: AssertionClaims, issuer: &Entity, keypair: &Keypair) -> Result<Self, CoreError> {
        if &keypair.public_key() != issuer.public_key() {
            return Err(CoreError::InvalidKey(format!(
                "keypair does not belong to entity {}",
                issuer.uri().short_hash()
            )));
        }
        let token = token::sign_token(&claims, keypair)?;
        Self::from_parts(token, claims)
    }

    fn from_parts(token: String, claims: AssertionClaims) -> Result<Self, CoreError> {
        let uri = RecordKind::Assertion.address_for(&token)?;
        Ok(Self { uri, token, claims })
    }

    /// Check the signature and validity window against `key`.
    pub fn verify(&self, key: &PublicKey) -> Result<(), VerificationError> {
        token::verify_token(&self.token, key).map(|_| ())
    }

    /// Verify against a specific entity, which must be the named issuer.
    pub fn verify_with(&self, entity: &Entity) -> Result<(), VerificationError> {
        if entity.uri() != self.issuer() {
            return Err(VerificationError::IssuerMismatch {
                claimed: self.issuer().clone(),
                actual: entity.uri().clone(),
            });
        }
        self.verify(entity.public_key())
    }

    pub fn subject(&self) -> &HashUri {
        &self.claims.sub
    }

    pub fn issuer(&self) -> &HashUri {
        &self.claims.iss
    }

    pub fn category(&self) -> &str {
        &self.claims.category
    }

    pub fn confidence(&self) -> f64 {
        self.claims.confidence
    }

    /// Unix seconds.
    pub fn issued_at(&self) -> i64 {
        self.claims.iat
    }

    /// Unix seconds.
    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    pub fn token_id(&self) -> &str {
        &self.claims.jti
    }

    pub fn claims(&self) -> &AssertionClaims {
        &self.claims
    }
}

impl Referenceable for Assertion {
    fn uri(&self) -> &HashUri {
        &self.uri
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Assertion
    }

    fn content(&self) -> &str {
        &self.token
    }

    fn summary(&self) -> String {
        format!(
            "{} asserts {} {}",
            self.issuer().short_hash(),
            self.subject().short_hash(),
            humanize_category(self.category())
        )
    }

    fn text_content(&self) -> String {
        humanize_category(self.category())
    }

    fn references(&self) -> Vec<HashUri> {
        vec![self.subject().clone(), self.issuer().clone()]
    }

    fn parse_content(raw: &str) -> Result<Self, CoreError> {
        // The address covers the exact token bytes; padding would fork it.
        if raw.trim() != raw {
            return Err(CoreError::Token("surrounding whitespace".into()));
        }
        let claims = token::peek_claims(raw)?;
        Self::from_parts(raw.to_string(), claims)
    }
}

/// Split a CamelCase category into lowercase words: `"IsTrue"` -> `"is true"`.
pub fn humanize_category(category: &str) -> String {
    let mut out = String::with_capacity(category.len() + 4);
    for (i, c) in category.chars().enumerate() {
        if c.is_uppercase() && i > 0 && !out.ends_with(' ') {
            out.push(' ');
        }
        if c == '_' || c == '-' {
            if !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }
        out.extend(c.to_lowercase());
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Statement;

    fn issuer() -> (Entity, Keypair) {
        let keypair = Keypair::generate();
        (Entity::issue("Alice", &keypair).unwrap(), keypair)
    }

    #[test]
    fn test_issue_parse_roundtrip() {
        let (alice, keypair) = issuer();
        let statement = Statement::new("The sky is blue");
        let assertion = Assertion::issue(statement.uri(), &alice, &keypair, "IsTrue", 0.8).unwrap();

        let parsed = Assertion::parse_content(assertion.content()).unwrap();
        assert!(parsed.uri().identical(assertion.uri()));
        assert_eq!(parsed.content(), assertion.content());
        assert_eq!(parsed.subject(), statement.uri());
        assert_eq!(parsed.issuer(), alice.uri());
        assert_eq!(parsed.category(), "IsTrue");
        assert_eq!(parsed.confidence(), 0.8);
        assert!(parsed.verify(alice.public_key()).is_ok());
        assert_eq!(parsed.token_id(), assertion.token_id());
        assert_eq!(parsed.expires_at(), assertion.expires_at());
    }

    #[test]
    fn test_token_ids_unique_and_expiry_after_issue() {
        let (alice, keypair) = issuer();
        let statement = Statement::new("x");
        let a = Assertion::issue_at(statement.uri(), &alice, &keypair, "IsTrue", 1.0, 1_700_000_000)
            .unwrap();
        let b = Assertion::issue_at(statement.uri(), &alice, &keypair, "IsTrue", 1.0, 1_700_000_000)
            .unwrap();

        assert_ne!(a.token_id(), b.token_id());
        assert!(!a.token_id().is_empty());
        assert_eq!(a.issued_at(), 1_700_000_000);
        assert!(a.expires_at() > a.issued_at());
    }

    #[test]
    fn test_parse_rejects_padded_token() {
        let (alice, keypair) = issuer();
        let statement = Statement::new("x");
        let assertion = Assertion::issue(statement.uri(), &alice, &keypair, "IsTrue", 1.0).unwrap();

        for padded in [
            format!("{}\n", assertion.content()),
            format!(" {}", assertion.content()),
        ] {
            assert!(matches!(
                Assertion::parse_content(&padded),
                Err(CoreError::Token(_))
            ));
        }
    }

    #[test]
    fn test_issue_with_foreign_key_rejected() {
        let (alice, _) = issuer();
        let mallory = Keypair::generate();
        let statement = Statement::new("x");
        assert!(matches!(
            Assertion::issue(statement.uri(), &alice, &mallory, "IsTrue", 1.0),
            Err(CoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_verify_with_other_entity() {
        let (alice, keypair) = issuer();
        let (bob, _) = issuer();
        let statement = Statement::new("x");
        let assertion = Assertion::issue(statement.uri(), &alice, &keypair, "IsTrue", 1.0).unwrap();

        assert!(assertion.verify_with(&alice).is_ok());
        assert!(matches!(
            assertion.verify_with(&bob),
            Err(VerificationError::IssuerMismatch { .. })
        ));
        assert!(matches!(
            assertion.verify(bob.public_key()),
            Err(VerificationError::SignatureFailed)
        ));
    }

    #[test]
    fn test_references_and_text() {
        let (alice, keypair) = issuer();
        let statement = Statement::new("x");
        let assertion = Assertion::issue(statement.uri(), &alice, &keypair, "IsFalse", 0.3).unwrap();

        assert_eq!(
            assertion.references(),
            vec![statement.uri().clone(), alice.uri().clone()]
        );
        assert_eq!(assertion.text_content(), "is false");
    }

    #[test]
    fn test_humanize_category() {
        assert_eq!(humanize_category("IsTrue"), "is true");
        assert_eq!(humanize_category("IsMostlyTrue"), "is mostly true");
        assert_eq!(humanize_category("is_false"), "is false");
        assert_eq!(humanize_category("Disputed"), "disputed");
    }
}
