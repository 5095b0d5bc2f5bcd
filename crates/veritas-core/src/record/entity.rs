use super::{RecordKind, Referenceable};
use crate::certificate::{Certificate, SerialNumber};
use crate::crypto::{Keypair, PublicKey};
use crate::error::CoreError;
use crate::hashuri::HashUri;

/// A signing identity backed by a self-signed certificate.
#[derive(Debug, Clone)]
pub struct Entity {
    uri: HashUri,
    certificate: Certificate,
    pem: String,
    public_key: PublicKey,
}

impl Entity {
    /// Issue a new identity for `keypair` with a fresh random serial.
    pub fn issue(common_name: &str, keypair: &Keypair) -> Result<Self, CoreError> {
        let certificate = Certificate::self_signed(common_name, SerialNumber::random(), keypair)?;
        Self::from_certificate(certificate)
    }

    pub fn from_certificate(certificate: Certificate) -> Result<Self, CoreError> {
        let pem = certificate.to_pem()?;
        let public_key = certificate.public_key()?;
        let uri = RecordKind::Entity.address_for(&pem)?;
        Ok(Self {
            uri,
            certificate,
            pem,
            public_key,
        })
    }

    pub fn common_name(&self) -> &str {
        self.certificate.common_name()
    }

    pub fn serial_number(&self) -> SerialNumber {
        self.certificate.serial_number()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Referenceable for Entity {
    fn uri(&self) -> &HashUri {
        &self.uri
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Entity
    }

    fn content(&self) -> &str {
        &self.pem
    }

    fn summary(&self) -> String {
        self.common_name().to_string()
    }

    fn text_content(&self) -> String {
        self.common_name().to_string()
    }

    fn references(&self) -> Vec<HashUri> {
        Vec::new()
    }

    fn parse_content(raw: &str) -> Result<Self, CoreError> {
        let certificate = Certificate::from_pem(raw)?;
        let entity = Self::from_certificate(certificate)?;
        // Re-encoding must reproduce the stored bytes, or the address drifts.
        if entity.pem != raw {
            return Err(CoreError::Certificate("non-canonical certificate encoding".into()));
        }
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_parse_roundtrip() {
        let keypair = Keypair::generate();
        let entity = Entity::issue("Alice", &keypair).unwrap();

        assert_eq!(entity.uri().kind(), Some("entity"));
        assert_eq!(entity.public_key(), &keypair.public_key());
        assert!(entity.content().starts_with("-----BEGIN CERTIFICATE-----"));

        let parsed = Entity::parse_content(entity.content()).unwrap();
        assert_eq!(parsed.serial_number(), entity.serial_number());
        assert_eq!(parsed.common_name(), "Alice");
        assert_eq!(parsed.public_key(), entity.public_key());
        assert!(parsed.uri().identical(entity.uri()));
        assert_eq!(parsed.content(), entity.content());
    }

    #[test]
    fn test_distinct_serials_give_distinct_addresses() {
        let keypair = Keypair::from_seed(&[9; 32]);
        let a = Entity::issue("Same", &keypair).unwrap();
        let b = Entity::issue("Same", &keypair).unwrap();
        assert_ne!(a.serial_number(), b.serial_number());
        assert_ne!(a.uri(), b.uri());
    }

    #[test]
    fn test_parse_rejects_statement_text() {
        assert!(matches!(
            Entity::parse_content("just words"),
            Err(CoreError::Certificate(_))
        ));
    }

    #[test]
    fn test_summary_is_common_name() {
        let entity = Entity::issue("Bob", &Keypair::generate()).unwrap();
        assert_eq!(entity.summary(), "Bob");
        assert!(entity.references().is_empty());
    }
}
