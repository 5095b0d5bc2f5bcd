//! Self-signed entity certificates.
//!
//! A certificate binds an Ed25519 public key to a common name and a random
//! serial number. The layout follows X.509 (to-be-signed body, algorithm,
//! signature value); the body is encoded as CBOR and the whole certificate
//! is PEM-armored.
//!
//! Field order in the structs below is part of the wire format: serde emits
//! fields in declaration order and the signature covers those exact bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto::{Keypair, PublicKey, Sha256Hash};
use crate::error::CoreError;

pub const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
pub const PEM_FOOTER: &str = "-----END CERTIFICATE-----";

/// Certificate format version (X.509 v3 equivalent).
pub const CERTIFICATE_VERSION: u8 = 3;

/// Signature algorithm name carried in the certificate.
pub const SIGNATURE_ALGORITHM: &str = "Ed25519";

/// Validity window: two years.
pub const VALIDITY_SECS: i64 = 2 * 365 * 24 * 60 * 60;

const SERIAL_LEN: usize = 17;
const PEM_LINE_LEN: usize = 64;

/// A 130-bit serial number, big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerialNumber(pub [u8; SERIAL_LEN]);

impl SerialNumber {
    /// Draw a serial uniformly from [0, 2^130).
    pub fn random() -> Self {
        let mut bytes = [0u8; SERIAL_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        // 17 bytes = 136 bits; keep the low 2 bits of the top byte.
        bytes[0] &= 0x03;
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Serial({})", self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    pub common_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    /// Unix seconds.
    pub not_before: i64,
    /// Unix seconds.
    pub not_after: i64,
}

impl Validity {
    pub fn contains(&self, at: i64) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicConstraints {
    pub ca: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extensions {
    pub basic_constraints: BasicConstraints,
    pub key_usage: Vec<String>,
    pub subject_key_identifier: Vec<u8>,
    pub authority_key_identifier: Vec<u8>,
}

/// The signed portion of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbsCertificate {
    pub version: u8,
    pub serial_number: SerialNumber,
    pub signature_algorithm: String,
    pub issuer: DistinguishedName,
    pub validity: Validity,
    pub subject: DistinguishedName,
    pub subject_public_key: Vec<u8>,
    pub extensions: Extensions,
}

/// A complete certificate: body, algorithm, signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub tbs_certificate: TbsCertificate,
    pub signature_algorithm: String,
    pub signature_value: Vec<u8>,
}

impl Certificate {
    /// Issue a self-signed certificate for `common_name`, valid from now.
    pub fn self_signed(
        common_name: &str,
        serial_number: SerialNumber,
        keypair: &Keypair,
    ) -> Result<Self, CoreError> {
        Self::self_signed_at(common_name, serial_number, keypair, now_secs())
    }

    /// Issue a self-signed certificate valid from `issued_at`.
    pub fn self_signed_at(
        common_name: &str,
        serial_number: SerialNumber,
        keypair: &Keypair,
        issued_at: i64,
    ) -> Result<Self, CoreError> {
        let public_key = keypair.public_key();
        let key_id = Sha256Hash::hash(public_key.as_bytes()).0.to_vec();
        let name = DistinguishedName {
            common_name: common_name.to_string(),
        };

        let tbs_certificate = TbsCertificate {
            version: CERTIFICATE_VERSION,
            serial_number,
            signature_algorithm: SIGNATURE_ALGORITHM.to_string(),
            issuer: name.clone(),
            validity: Validity {
                not_before: issued_at,
                not_after: issued_at + VALIDITY_SECS,
            },
            subject: name,
            subject_public_key: public_key.0.to_vec(),
            extensions: Extensions {
                basic_constraints: BasicConstraints { ca: true },
                key_usage: vec![
                    "digitalSignature".to_string(),
                    "keyCertSign".to_string(),
                    "cRLSign".to_string(),
                ],
                subject_key_identifier: key_id.clone(),
                authority_key_identifier: key_id,
            },
        };

        let signature_value = keypair.sign(&encode_cbor(&tbs_certificate)?);

        Ok(Self {
            tbs_certificate,
            signature_algorithm: SIGNATURE_ALGORITHM.to_string(),
            signature_value,
        })
    }

    pub fn serial_number(&self) -> SerialNumber {
        self.tbs_certificate.serial_number
    }

    pub fn common_name(&self) -> &str {
        &self.tbs_certificate.subject.common_name
    }

    pub fn validity(&self) -> Validity {
        self.tbs_certificate.validity
    }

    pub fn is_ca(&self) -> bool {
        self.tbs_certificate.extensions.basic_constraints.ca
    }

    pub fn public_key(&self) -> Result<PublicKey, CoreError> {
        PublicKey::from_slice(&self.tbs_certificate.subject_public_key)
    }

    /// Check the self-signature against the embedded public key.
    pub fn verify_self_signature(&self) -> Result<(), CoreError> {
        if self.signature_algorithm != SIGNATURE_ALGORITHM {
            return Err(CoreError::Certificate(format!(
                "unsupported signature algorithm: {}",
                self.signature_algorithm
            )));
        }
        let message = encode_cbor(&self.tbs_certificate)?;
        self.public_key()?
            .verify(&message, &self.signature_value)
            .map_err(|_| CoreError::Certificate("self-signature does not verify".into()))
    }

    /// DER-equivalent bytes (canonical CBOR of the whole certificate).
    pub fn to_der(&self) -> Result<Vec<u8>, CoreError> {
        encode_cbor(self)
    }

    /// PEM armor, 64-column base64 body.
    pub fn to_pem(&self) -> Result<String, CoreError> {
        let body = STANDARD.encode(self.to_der()?);
        let mut pem = String::with_capacity(body.len() + 64);
        pem.push_str(PEM_HEADER);
        pem.push('\n');
        for line in body.as_bytes().chunks(PEM_LINE_LEN) {
            // base64 output is ASCII
            pem.push_str(std::str::from_utf8(line).unwrap_or_default());
            pem.push('\n');
        }
        pem.push_str(PEM_FOOTER);
        pem.push('\n');
        Ok(pem)
    }

    /// Parse a PEM certificate and verify its self-signature.
    pub fn from_pem(pem: &str) -> Result<Self, CoreError> {
        let body = pem
            .trim()
            .strip_prefix(PEM_HEADER)
            .and_then(|rest| rest.trim_end().strip_suffix(PEM_FOOTER))
            .ok_or_else(|| CoreError::Certificate("missing PEM armor".into()))?;

        let b64: String = body.split_whitespace().collect();
        let der = STANDARD
            .decode(b64)
            .map_err(|e| CoreError::Certificate(e.to_string()))?;

        let cert: Certificate = ciborium::from_reader(der.as_slice())
            .map_err(|e| CoreError::Certificate(e.to_string()))?;

        cert.verify_self_signature()?;
        Ok(cert)
    }
}

fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Current time in Unix seconds.
pub(crate) fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
