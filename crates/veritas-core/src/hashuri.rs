//! Content addresses.
//!
//! Every record is named by a [`HashUri`]: the SHA-256 of its canonical
//! content, optionally tagged with the record kind.
//!
//! ```text
//! hash://sha256/<64 lowercase hex>[?type=<kind>]
//! ```
//!
//! The kind tag is advisory. Two addresses with the same digest are equal
//! whether or not either carries a kind.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::crypto::Sha256Hash;
use crate::error::CoreError;

/// The only supported digest algorithm.
pub const ALGORITHM: &str = "sha256";

const SCHEME: &str = "hash://";
const TYPE_PARAM: &str = "type=";
const HEX_LEN: usize = 64;

/// A typed content address.
#[derive(Clone)]
pub struct HashUri {
    hash: String,
    kind: Option<String>,
}

impl HashUri {
    /// The distinguished empty address, returned where parsing must not fail.
    pub const EMPTY: Self = Self {
        hash: String::new(),
        kind: None,
    };

    /// Build an address from an existing hex digest.
    ///
    /// `hash` must be 64 hex characters; use [`HashUri::parse`] for
    /// untrusted input.
    pub fn new(hash: impl Into<String>, kind: Option<&str>) -> Self {
        let hash = hash.into().to_ascii_lowercase();
        debug_assert!(is_hex_digest(&hash), "not a sha256 hex digest: {hash:?}");
        Self {
            hash,
            kind: normalize_kind(kind),
        }
    }

    /// Hash `content` and build its address.
    pub fn from_content(content: impl AsRef<[u8]>, kind: Option<&str>) -> Self {
        Self::new(Sha256Hash::hash(content.as_ref()).to_hex(), kind)
    }

    /// Parse an address from any accepted form.
    ///
    /// Tried in order: canonical `hash://` form, path-escaped form, bare hex.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();

        if s.starts_with(SCHEME) {
            return Self::parse_canonical(s);
        }

        if s.contains('%') {
            let decoded = urlencoding::decode(s)
                .map_err(|e| CoreError::InvalidAddress(e.to_string()))?;
            return Self::parse_canonical(&decoded);
        }

        if is_hex_digest(s) {
            return Ok(Self::new(s, None));
        }

        Err(CoreError::InvalidAddress(s.to_string()))
    }

    fn parse_canonical(s: &str) -> Result<Self, CoreError> {
        let rest = s
            .strip_prefix(SCHEME)
            .ok_or_else(|| CoreError::InvalidAddress(s.to_string()))?;

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let (algorithm, hash) = path
            .split_once('/')
            .ok_or_else(|| CoreError::InvalidAddress(s.to_string()))?;

        if algorithm != ALGORITHM {
            return Err(CoreError::InvalidAddress(format!(
                "unsupported algorithm: {algorithm}"
            )));
        }
        if !is_hex_digest(hash) {
            return Err(CoreError::InvalidAddress(format!("bad digest: {hash}")));
        }

        let kind = query.and_then(|q| {
            q.split('&')
                .find_map(|pair| pair.strip_prefix(TYPE_PARAM))
        });

        Ok(Self::new(hash, kind))
    }

    /// Reverse [`HashUri::escape`], re-tagging with `kind` when given.
    ///
    /// Malformed input yields [`HashUri::EMPTY`].
    pub fn unescape(escaped: &str, kind: Option<&str>) -> Self {
        let decoded = match urlencoding::decode(escaped) {
            Ok(decoded) => decoded,
            Err(_) => return Self::EMPTY,
        };

        match Self::parse_canonical(&decoded) {
            Ok(uri) => match kind {
                Some(kind) => uri.with_kind(kind),
                None => uri,
            },
            Err(_) => Self::EMPTY,
        }
    }

    /// Path-safe form of the kind-less address, usable as a flat storage key.
    pub fn escape(&self) -> String {
        urlencoding::encode(&self.unadorned()).into_owned()
    }

    /// Canonical string without the kind tag.
    pub fn unadorned(&self) -> String {
        format!("{SCHEME}{ALGORITHM}/{}", self.hash)
    }

    /// A copy of this address carrying `kind`.
    pub fn with_kind(&self, kind: &str) -> Self {
        Self {
            hash: self.hash.clone(),
            kind: normalize_kind(Some(kind)),
        }
    }

    /// The lowercase hex digest.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The kind tag, if any.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// The digest algorithm name.
    pub fn algorithm(&self) -> &'static str {
        ALGORITHM
    }

    /// Last 8 hex characters, for compact display.
    pub fn short_hash(&self) -> &str {
        let start = self.hash.len().saturating_sub(8);
        &self.hash[start..]
    }

    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }

    /// Strict comparison, including the kind tag.
    pub fn identical(&self, other: &Self) -> bool {
        self.hash == other.hash && self.kind == other.kind
    }

    /// Web route for this address, e.g. `/statements/<escaped>`.
    pub fn web_path(&self) -> String {
        format!("/{}/{}", plural_segment(self.kind()), self.escape())
    }

    /// API route for this address, e.g. `/api/v1/statements/<escaped>`.
    pub fn api_path(&self) -> String {
        format!("/api/v1/{}/{}", plural_segment(self.kind()), self.escape())
    }
}

/// Route segment for a kind tag. Unknown kinds route to `error`.
pub fn plural_segment(kind: Option<&str>) -> &'static str {
    match kind {
        Some("entity") => "entities",
        Some("statement") => "statements",
        Some("assertion") => "assertions",
        Some("document") => "documents",
        _ => "error",
    }
}

fn normalize_kind(kind: Option<&str>) -> Option<String> {
    kind.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_ascii_lowercase)
}

fn is_hex_digest(s: &str) -> bool {
    s.len() == HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl PartialEq for HashUri {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for HashUri {}

impl Hash for HashUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for HashUri {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HashUri {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl Default for HashUri {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for HashUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{ALGORITHM}/{}", self.hash)?;
        if let Some(kind) = &self.kind {
            write!(f, "?{TYPE_PARAM}{kind}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for HashUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "HashUri({kind}:{})", self.short_hash()),
            None => write!(f, "HashUri({})", self.short_hash()),
        }
    }
}

impl FromStr for HashUri {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for HashUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HashUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
