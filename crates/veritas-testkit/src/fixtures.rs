//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use anyhow::Context;
use veritas_auth::PasswordPolicy;
use veritas_core::{
    Assertion, Certificate, Entity, Keypair, Referenceable, SerialNumber, Statement,
};
use veritas_store::{MemoryStore, Resolver};

/// Fixed issuance time for deterministic entities: 2026-01-01T00:00:00Z.
pub const FIXED_ISSUED_AT: i64 = 1_767_225_600;

/// An issuer identity, its keypair and a memory store that already holds
/// the entity and its private key.
pub struct TestFixture {
    pub keypair: Keypair,
    pub entity: Entity,
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    /// Create a fixture with a random keypair.
    pub async fn new(common_name: &str) -> anyhow::Result<Self> {
        let keypair = Keypair::generate();
        let entity = Entity::issue(common_name, &keypair)?;
        Self::register(keypair, entity, Arc::new(MemoryStore::new())).await
    }

    /// Create with a deterministic keypair, serial and issuance time.
    ///
    /// The same seed always yields the same entity address.
    pub async fn with_seed(common_name: &str, seed: [u8; 32]) -> anyhow::Result<Self> {
        let keypair = Keypair::from_seed(&seed);
        let entity = deterministic_entity(common_name, &keypair)?;
        Self::register(keypair, entity, Arc::new(MemoryStore::new())).await
    }

    /// Another identity sharing this fixture's store.
    pub async fn peer(&self, common_name: &str) -> anyhow::Result<Self> {
        let keypair = Keypair::generate();
        let entity = Entity::issue(common_name, &keypair)?;
        Self::register(keypair, entity, Arc::clone(&self.store)).await
    }

    async fn register(
        keypair: Keypair,
        entity: Entity,
        store: Arc<MemoryStore>,
    ) -> anyhow::Result<Self> {
        store.store(&entity).await.context("storing fixture entity")?;
        store
            .store_key(entity.uri(), &keypair.to_pem()?)
            .await
            .context("storing fixture key")?;
        Ok(Self {
            keypair,
            entity,
            store,
        })
    }

    /// Publish a statement.
    pub async fn statement(&self, text: &str) -> anyhow::Result<Statement> {
        let statement = Statement::new(text);
        self.store.store(&statement).await?;
        Ok(statement)
    }

    /// Sign and store an assertion about `subject`.
    pub async fn assert(
        &self,
        subject: &dyn Referenceable,
        category: &str,
        confidence: f64,
    ) -> anyhow::Result<Assertion> {
        let assertion =
            Assertion::issue(subject.uri(), &self.entity, &self.keypair, category, confidence)?;
        self.store.store(&assertion).await?;
        Ok(assertion)
    }
}

/// Build an entity whose address depends only on `common_name` and `keypair`.
pub fn deterministic_entity(common_name: &str, keypair: &Keypair) -> anyhow::Result<Entity> {
    let mut serial = [0u8; 17];
    serial[1..].copy_from_slice(&keypair.public_key().as_bytes()[..16]);
    let certificate =
        Certificate::self_signed_at(common_name, SerialNumber(serial), keypair, FIXED_ISSUED_AT)?;
    Ok(Entity::from_certificate(certificate)?)
}

/// Create fixtures with distinct deterministic identities.
pub async fn multi_party_fixtures(count: usize) -> anyhow::Result<Vec<TestFixture>> {
    let mut fixtures = Vec::with_capacity(count);
    for i in 0..count {
        let mut seed = [0u8; 32];
        seed[0] = i as u8;
        fixtures.push(TestFixture::with_seed(&format!("party-{i}"), seed).await?);
    }
    Ok(fixtures)
}

/// Smallest Argon2 cost that still hashes, for fast tests.
pub fn cheap_policy() -> PasswordPolicy {
    PasswordPolicy {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritas_store::ResolverExt;

    #[tokio::test]
    async fn test_fixture_signs_verifiable_assertions() {
        let fixture = TestFixture::new("Alice").await.unwrap();
        let statement = fixture.statement("Snow is white").await.unwrap();
        let assertion = fixture.assert(&statement, "IsTrue", 0.8).await.unwrap();

        fixture.store.verify_assertion(&assertion).await.unwrap();
        assert_eq!(fixture.store.len(), 3);
    }

    #[tokio::test]
    async fn test_seeded_fixture_is_deterministic() {
        let a = TestFixture::with_seed("Alice", [7; 32]).await.unwrap();
        let b = TestFixture::with_seed("Alice", [7; 32]).await.unwrap();
        assert!(a.entity.uri().identical(b.entity.uri()));

        let c = TestFixture::with_seed("Alice", [8; 32]).await.unwrap();
        assert_ne!(a.entity.uri(), c.entity.uri());
    }

    #[tokio::test]
    async fn test_peers_share_store() {
        let alice = TestFixture::new("Alice").await.unwrap();
        let bob = alice.peer("Bob").await.unwrap();
        let statement = alice.statement("shared").await.unwrap();
        bob.assert(&statement, "IsTrue", 0.5).await.unwrap();

        let refs = alice.store.fetch_refs(statement.uri()).await.unwrap();
        assert_eq!(refs.len(), 1);
    }

    #[tokio::test]
    async fn test_multi_party() {
        let parties = multi_party_fixtures(3).await.unwrap();
        assert_eq!(parties.len(), 3);
        assert_ne!(parties[0].entity.uri(), parties[1].entity.uri());
        assert_eq!(parties[2].entity.common_name(), "party-2");
    }
}
