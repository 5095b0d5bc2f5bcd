//! Assertion verification against resolved issuer keys.

use std::collections::HashMap;

use crate::crypto::PublicKey;
use crate::error::VerificationError;
use crate::hashuri::HashUri;
use crate::record::{Assertion, Entity, Referenceable};

/// Something that can produce an entity's public key by address.
pub trait KeyResolver {
    fn resolve_key(&self, issuer: &HashUri) -> Option<PublicKey>;
}

impl KeyResolver for HashMap<HashUri, PublicKey> {
    fn resolve_key(&self, issuer: &HashUri) -> Option<PublicKey> {
        self.get(issuer).copied()
    }
}

impl KeyResolver for [Entity] {
    fn resolve_key(&self, issuer: &HashUri) -> Option<PublicKey> {
        self.iter()
            .find(|e| e.uri() == issuer)
            .map(|e| *e.public_key())
    }
}

impl KeyResolver for Vec<Entity> {
    fn resolve_key(&self, issuer: &HashUri) -> Option<PublicKey> {
        self.as_slice().resolve_key(issuer)
    }
}

/// Verify an assertion against its issuer's key.
///
/// This performs:
/// - Issuer key lookup
/// - Signature check over the token
/// - Validity window check
pub fn verify_assertion<R>(assertion: &Assertion, keys: &R) -> Result<(), VerificationError>
where
    R: KeyResolver + ?Sized,
{
    let key = keys
        .resolve_key(assertion.issuer())
        .ok_or_else(|| VerificationError::KeyNotFound(assertion.issuer().clone()))?;
    assertion.verify(&key)
}
