//! Signed assertion tokens.
//!
//! An assertion travels as a JWT compact serialization signed with EdDSA.
//! The token text is the assertion's canonical content, so the address
//! covers the header, the claims and the signature.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::certificate::{now_secs, VALIDITY_SECS};
use crate::crypto::{Keypair, PublicKey};
use crate::error::{CoreError, VerificationError};
use crate::hashuri::HashUri;

/// Every compact JWT with a JSON header starts with this.
pub const TOKEN_PREFIX: &str = "eyJ";

/// Claims carried by an assertion token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Address of the record being asserted about.
    pub sub: HashUri,
    /// Address of the issuing entity.
    pub iss: HashUri,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
    pub confidence: f64,
    pub category: String,
}

impl AssertionClaims {
    /// Build claims issued at `issued_at`, valid for two years.
    pub fn new(
        subject: HashUri,
        issuer: HashUri,
        category: impl Into<String>,
        confidence: f64,
        issued_at: i64,
    ) -> Result<Self, CoreError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CoreError::InvalidConfidence(confidence));
        }
        let category = category.into();
        if category.trim().is_empty() {
            return Err(CoreError::Token("empty category".into()));
        }

        Ok(Self {
            sub: subject,
            iss: issuer,
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at + VALIDITY_SECS,
            jti: uuid::Uuid::new_v4().to_string(),
            confidence,
            category,
        })
    }

    /// Claims issued now.
    pub fn now(
        subject: HashUri,
        issuer: HashUri,
        category: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, CoreError> {
        Self::new(subject, issuer, category, confidence, now_secs())
    }
}

/// Sign claims into a compact token.
pub fn sign_token(claims: &AssertionClaims, keypair: &Keypair) -> Result<String, CoreError> {
    let key = EncodingKey::from_ed_der(&keypair.pkcs8_v1_der()?);
    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), claims, &key)
        .map_err(|e| CoreError::Signing(e.to_string()))
}

/// Verify a token's signature and validity window against `key`.
pub fn verify_token(token: &str, key: &PublicKey) -> Result<AssertionClaims, VerificationError> {
    let key = DecodingKey::from_ed_components(&URL_SAFE_NO_PAD.encode(key.as_bytes()))
        .map_err(|e| VerificationError::StructuralError(e.to_string()))?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss"]);
    validation.validate_nbf = true;

    jsonwebtoken::decode::<AssertionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => VerificationError::SignatureFailed,
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => VerificationError::Expired,
            _ => VerificationError::StructuralError(e.to_string()),
        })
}

/// Read the claims without checking the signature.
///
/// Used when reconstructing a stored assertion. The result is untrusted
/// until [`verify_token`] succeeds.
pub fn peek_claims(token: &str) -> Result<AssertionClaims, CoreError> {
    if !token.starts_with(TOKEN_PREFIX) {
        return Err(CoreError::Token("not a compact JWT".into()));
    }

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<AssertionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| CoreError::Token(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> HashUri {
        HashUri::from_content("The sky is blue", Some("statement"))
    }

    fn issuer() -> HashUri {
        HashUri::from_content("issuer", Some("entity"))
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let claims = AssertionClaims::now(subject(), issuer(), "IsTrue", 0.9).unwrap();
        let token = sign_token(&claims, &keypair).unwrap();

        assert!(token.starts_with(TOKEN_PREFIX));
        assert!(token.len() > 512);

        let verified = verify_token(&token, &keypair.public_key()).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_wrong_key_is_signature_failure() {
        let alice = Keypair::from_seed(&[1; 32]);
        let bob = Keypair::from_seed(&[2; 32]);
        let claims = AssertionClaims::now(subject(), issuer(), "IsTrue", 1.0).unwrap();
        let token = sign_token(&claims, &alice).unwrap();

        assert!(matches!(
            verify_token(&token, &bob.public_key()),
            Err(VerificationError::SignatureFailed)
        ));
    }

    #[test]
    fn test_expired_token() {
        let keypair = Keypair::generate();
        let claims =
            AssertionClaims::new(subject(), issuer(), "IsTrue", 0.5, 1_000_000_000).unwrap();
        let token = sign_token(&claims, &keypair).unwrap();

        assert!(matches!(
            verify_token(&token, &keypair.public_key()),
            Err(VerificationError::Expired)
        ));
    }

    #[test]
    fn test_peek_does_not_verify() {
        let keypair = Keypair::generate();
        let claims = AssertionClaims::now(subject(), issuer(), "IsFalse", 0.1).unwrap();
        let token = sign_token(&claims, &keypair).unwrap();

        assert_eq!(peek_claims(&token).unwrap(), claims);
        assert!(peek_claims("hello").is_err());
        assert!(peek_claims("eyJnot.a.token").is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        for bad in [-0.1, 1.01, f64::NAN] {
            assert!(matches!(
                AssertionClaims::now(subject(), issuer(), "IsTrue", bad),
                Err(CoreError::InvalidConfidence(_))
            ));
        }
        assert!(AssertionClaims::now(subject(), issuer(), "IsTrue", 0.0).is_ok());
    }
}
