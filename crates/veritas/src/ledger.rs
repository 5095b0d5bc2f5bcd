//! The Ledger: unified API for Veritas.
//!
//! The Ledger brings together records, storage and credentials. It issues
//! entities and keeps their private keys, publishes statements and
//! documents, signs and verifies assertions, and answers reference and
//! search queries.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use veritas_auth::{is_sealed, AuthError, KeyVault, PasswordPolicy, User};
use veritas_core::{
    guess_content_type, Assertion, CoreError, Document, DocumentBuilder, Entity, HashUri, Keypair,
    Record, RecordKind, Referenceable, Statement,
};
use veritas_store::{Reference, Resolver, ResolverExt, SearchResult};

use crate::error::{LedgerError, Result};
use crate::seed::{self, SeedReport};

/// Configuration for the Ledger.
#[derive(Clone)]
pub struct LedgerConfig {
    /// Verify assertion signatures before ingesting them.
    pub verify_on_store: bool,
    /// Populate auto-init backends with sample records on open.
    pub seed_on_init: bool,
    /// Seal stored private keys under this passphrase.
    pub key_passphrase: Option<String>,
    /// Argon2 cost for user passwords and key sealing.
    pub password_policy: PasswordPolicy,
    /// Maximum number of search hits returned.
    pub search_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            verify_on_store: true,
            seed_on_init: true,
            key_passphrase: None,
            password_policy: PasswordPolicy::default(),
            search_limit: 50,
        }
    }
}

impl fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("verify_on_store", &self.verify_on_store)
            .field("seed_on_init", &self.seed_on_init)
            .field("key_passphrase", &self.key_passphrase.as_ref().map(|_| "<redacted>"))
            .field("password_policy", &self.password_policy)
            .field("search_limit", &self.search_limit)
            .finish()
    }
}

/// The main Ledger struct.
pub struct Ledger<S: Resolver> {
    store: Arc<S>,
    config: LedgerConfig,
    vault: Option<KeyVault>,
}

impl<S: Resolver> Ledger<S> {
    /// Open a ledger over `store`, seeding it if the backend asks for it.
    pub async fn open(store: S, config: LedgerConfig) -> Result<Self> {
        Self::open_shared(Arc::new(store), config).await
    }

    /// Like [`Ledger::open`] over a store shared with other owners.
    pub async fn open_shared(store: Arc<S>, config: LedgerConfig) -> Result<Self> {
        let vault = config
            .key_passphrase
            .as_ref()
            .map(|passphrase| KeyVault::new(passphrase.clone(), config.password_policy));

        let ledger = Self {
            store,
            config,
            vault,
        };

        if ledger.store.auto_init() && ledger.config.seed_on_init {
            let report = seed::seed(&ledger).await?;
            info!(
                backend = ledger.store.name(),
                records = report.record_count(),
                "seeded sample records"
            );
        }

        Ok(ledger)
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entities & Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a new entity with a fresh keypair and keep its private key.
    pub async fn issue_entity(&self, common_name: &str) -> Result<Entity> {
        let keypair = Keypair::generate();
        let entity = Entity::issue(common_name, &keypair)?;
        self.import_entity(&entity, &keypair).await?;

        info!(entity = %entity.uri(), common_name, "issued entity");
        Ok(entity)
    }

    /// Issue an entity and bind it to `user`.
    pub async fn issue_entity_for(&self, user: &mut User, common_name: &str) -> Result<Entity> {
        let entity = self.issue_entity(common_name).await?;
        user.add_key(entity.uri(), common_name);
        Ok(entity)
    }

    /// Store an externally created entity together with its private key.
    pub async fn import_entity(&self, entity: &Entity, keypair: &Keypair) -> Result<()> {
        if &keypair.public_key() != entity.public_key() {
            return Err(LedgerError::Core(CoreError::InvalidKey(format!(
                "keypair does not belong to entity {}",
                entity.uri()
            ))));
        }

        let pem = keypair.to_pem()?;
        let secret = match &self.vault {
            Some(vault) => vault.seal(&pem)?,
            None => pem,
        };

        self.store.store(entity).await?;
        self.store.store_key(entity.uri(), &secret).await?;
        Ok(())
    }

    /// Load the private key kept for `entity`.
    pub async fn signing_key(&self, entity: &HashUri) -> Result<Keypair> {
        let secret = self.store.fetch_key(entity).await?;
        let pem = if is_sealed(&secret) {
            self.vault
                .as_ref()
                .ok_or(AuthError::Unsealing)?
                .unseal(&secret)?
        } else {
            secret
        };
        Ok(Keypair::from_pem(&pem)?)
    }

    /// Create a user under the configured password policy.
    pub fn new_user(&self, id: &str, password: &str) -> User {
        User::new(id, password, &self.config.password_policy)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publishing
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish a statement.
    pub async fn publish_statement(&self, text: &str) -> Result<Statement> {
        let statement = Statement::new(text);
        self.store.store(&statement).await?;

        info!(statement = %statement.uri(), "published statement");
        Ok(statement)
    }

    /// Sign and store an assertion about `subject` as `issuer`.
    pub async fn assert(
        &self,
        subject: &HashUri,
        issuer: &HashUri,
        category: &str,
        confidence: f64,
    ) -> Result<Assertion> {
        let entity = self.store.fetch_entity(issuer).await?;
        let keypair = self.signing_key(issuer).await?;
        let assertion = Assertion::issue(subject, &entity, &keypair, category, confidence)?;
        self.store.store(&assertion).await?;

        info!(
            assertion = %assertion.uri(),
            subject = %subject,
            issuer = %issuer,
            category,
            "signed assertion"
        );
        Ok(assertion)
    }

    /// Like [`Ledger::assert`], refusing issuers `user` holds no key for.
    pub async fn assert_as(
        &self,
        user: &User,
        subject: &HashUri,
        issuer: &HashUri,
        category: &str,
        confidence: f64,
    ) -> Result<Assertion> {
        if let Err(e) = user.authorize(issuer) {
            warn!(user = %user.id, issuer = %issuer, "signing refused");
            return Err(e.into());
        }
        self.assert(subject, issuer, category, confidence).await
    }

    /// Build and store a document.
    pub async fn publish_document(&self, builder: &DocumentBuilder) -> Result<Document> {
        let document = builder.build()?;
        self.store.store(&document).await?;

        info!(
            document = %document.uri(),
            title = document.title(),
            references = document.references().len(),
            "published document"
        );
        Ok(document)
    }

    /// Ingest raw content, guessing its kind.
    pub async fn ingest(&self, raw: &str) -> Result<Record> {
        self.ingest_as(guess_content_type(raw), raw).await
    }

    /// Ingest raw content of a known kind.
    ///
    /// Assertions are verified first when `verify_on_store` is set.
    pub async fn ingest_as(&self, kind: RecordKind, raw: &str) -> Result<Record> {
        let record = Record::parse(kind, raw)?;

        if self.config.verify_on_store {
            if let Record::Assertion(assertion) = &record {
                self.verify(assertion).await?;
            }
        }

        self.store.store(&record).await?;
        debug!(uri = %record.uri(), kind = kind.as_str(), "ingested record");
        Ok(record)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify an assertion against its stored issuer.
    pub async fn verify(&self, assertion: &Assertion) -> Result<()> {
        match self.store.verify_assertion(assertion).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    assertion = %assertion.uri(),
                    issuer = %assertion.issuer(),
                    error = %e,
                    "assertion failed verification"
                );
                Err(e.into())
            }
        }
    }

    /// Fetch an assertion and verify it in one step.
    pub async fn fetch_verified(&self, uri: &HashUri) -> Result<Assertion> {
        let assertion = self.store.fetch_assertion(uri).await?;
        self.verify(&assertion).await?;
        Ok(assertion)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn fetch_record(&self, uri: &HashUri) -> Result<Record> {
        Ok(self.store.fetch_record(uri).await?)
    }

    pub async fn fetch_entity(&self, uri: &HashUri) -> Result<Entity> {
        Ok(self.store.fetch_entity(uri).await?)
    }

    pub async fn fetch_statement(&self, uri: &HashUri) -> Result<Statement> {
        Ok(self.store.fetch_statement(uri).await?)
    }

    pub async fn fetch_assertion(&self, uri: &HashUri) -> Result<Assertion> {
        Ok(self.store.fetch_assertion(uri).await?)
    }

    pub async fn fetch_document(&self, uri: &HashUri) -> Result<Document> {
        Ok(self.store.fetch_document(uri).await?)
    }

    /// Inbound references to `target`, described from their sources.
    pub async fn refs(&self, target: &HashUri) -> Result<Vec<Reference>> {
        Ok(self.store.describe_refs(target).await?)
    }

    /// Free-text search, capped at `search_limit` hits.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mut hits = self.store.search(query).await?;
        hits.truncate(self.config.search_limit);
        debug!(query, hits = hits.len(), "search");
        Ok(hits)
    }

    /// Seed sample records regardless of backend.
    pub async fn seed(&self) -> Result<SeedReport> {
        seed::seed(self).await
    }
}
