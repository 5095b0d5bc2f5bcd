//! End-to-end tests through the Ledger on both backends.

use std::collections::BTreeSet;
use std::sync::Arc;

use veritas::core::token::{sign_token, AssertionClaims};
use veritas::core::{tokenize, Keypair};
use veritas::store::{MemoryStore, Resolver, SqliteStore};
use veritas::{
    DocumentBuilder, HashUri, Ledger, LedgerConfig, Record, RecordKind, Referenceable, Statement,
};
use veritas_testkit::{cheap_policy, init_tracing};

fn config() -> LedgerConfig {
    LedgerConfig {
        seed_on_init: false,
        password_policy: cheap_policy(),
        ..LedgerConfig::default()
    }
}

async fn memory_ledger() -> Ledger<MemoryStore> {
    init_tracing();
    Ledger::open(MemoryStore::new(), config()).await.unwrap()
}

async fn sqlite_ledger() -> Ledger<SqliteStore> {
    init_tracing();
    Ledger::open(SqliteStore::open_memory().unwrap(), config())
        .await
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Addressing
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_address_determinism() {
    let ledger = memory_ledger().await;

    let a = ledger.publish_statement("The sky is blue").await.unwrap();
    let b = ledger.publish_statement("The sky is blue").await.unwrap();
    assert!(a.uri().identical(b.uri()));
    assert_eq!(ledger.store().len(), 1);

    let c = ledger.publish_statement("The sky is blue.").await.unwrap();
    assert_ne!(a.uri(), c.uri());
}

#[test]
fn test_equality_ignores_kind() {
    let tagged = HashUri::from_content("x", Some("statement"));
    let bare = HashUri::from_content("x", None);
    assert_eq!(tagged, bare);
    assert!(!tagged.identical(&bare));
    assert!(tagged.with_kind("document").identical(&bare.with_kind("document")));
}

#[test]
fn test_escape_roundtrip_and_invalid() {
    let uri = Statement::new("escape me").uri().clone();
    let back = HashUri::unescape(&uri.escape(), None);
    assert_eq!(back, uri);
    assert_eq!(back.kind(), None);
    assert_eq!(HashUri::unescape(&uri.escape(), Some("statement")).kind(), Some("statement"));

    for junk in ["", "%zz", "hash%3A%2F%2Fmd5%2Fabc", "not an address"] {
        assert!(HashUri::unescape(junk, None).is_empty(), "{junk}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Round trips
// ─────────────────────────────────────────────────────────────────────────────

async fn roundtrip_all_kinds<S: Resolver>(ledger: &Ledger<S>) {
    let alice = ledger.issue_entity("Alice").await.unwrap();
    let statement = ledger.publish_statement("Water is wet").await.unwrap();
    let assertion = ledger
        .assert(statement.uri(), alice.uri(), "IsTrue", 0.75)
        .await
        .unwrap();
    let document = ledger
        .publish_document(
            &DocumentBuilder::new("On water")
                .author(alice.uri(), Some("Alice"))
                .keyword("water")
                .section(Some("Claims"))
                .cite_statement("water is wet", statement.uri())
                .cite_assertion(" (Alice agrees)", assertion.uri()),
        )
        .await
        .unwrap();

    let entity = ledger.fetch_entity(alice.uri()).await.unwrap();
    assert!(entity.uri().identical(alice.uri()));
    assert_eq!(entity.common_name(), "Alice");
    assert_eq!(entity.serial_number(), alice.serial_number());
    assert_eq!(entity.public_key(), alice.public_key());

    let fetched = ledger.fetch_statement(statement.uri()).await.unwrap();
    assert_eq!(fetched, statement);

    let fetched = ledger.fetch_assertion(assertion.uri()).await.unwrap();
    assert_eq!(fetched.content(), assertion.content());
    assert_eq!(fetched.subject(), statement.uri());
    assert_eq!(fetched.issuer(), alice.uri());
    assert_eq!(fetched.confidence(), 0.75);

    let fetched = ledger.fetch_document(document.uri()).await.unwrap();
    assert_eq!(fetched, document);
    assert_eq!(
        fetched.references(),
        vec![alice.uri().clone(), statement.uri().clone(), assertion.uri().clone()]
    );

    match ledger.fetch_record(assertion.uri()).await.unwrap() {
        Record::Assertion(a) => assert!(a.uri().identical(assertion.uri())),
        other => panic!("expected assertion, got {:?}", other.kind()),
    }
}

#[tokio::test]
async fn test_roundtrip_memory() {
    roundtrip_all_kinds(&memory_ledger().await).await;
}

#[tokio::test]
async fn test_roundtrip_sqlite() {
    roundtrip_all_kinds(&sqlite_ledger().await).await;
}

#[tokio::test]
async fn test_wrong_kind_is_parse_failure() {
    let ledger = memory_ledger().await;
    let statement = ledger.publish_statement("just text").await.unwrap();

    let err = ledger.fetch_entity(statement.uri()).await.unwrap_err();
    assert_eq!(err.code(), "E_PARSE");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_tokenizer_equivalence_classes() {
    let expected: BTreeSet<String> = ["exist", "universe"].iter().map(|s| s.to_string()).collect();
    assert_eq!(tokenize("The Universe exists."), expected);
    assert_eq!(tokenize("universal EXIST"), expected);
    assert_eq!(tokenize("  it is  the universe; existing  "), expected);
    assert!(tokenize("a an the . , ?").is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Verification
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_verification_wrong_key() {
    let ledger = memory_ledger().await;
    let alice = ledger.issue_entity("Alice").await.unwrap();
    let statement = ledger.publish_statement("Forged").await.unwrap();

    // Claims name Alice as issuer but are signed with another key.
    let mallory = Keypair::generate();
    let claims =
        AssertionClaims::now(statement.uri().clone(), alice.uri().clone(), "IsTrue", 1.0).unwrap();
    let token = sign_token(&claims, &mallory).unwrap();

    let err = ledger.ingest_as(RecordKind::Assertion, &token).await.unwrap_err();
    assert_eq!(err.code(), "E_VERIFICATION");
    assert!(ledger.refs(statement.uri()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verification_bit_flip() {
    let ledger = memory_ledger().await;
    let alice = ledger.issue_entity("Alice").await.unwrap();
    let statement = ledger.publish_statement("Tamper").await.unwrap();
    let assertion = ledger
        .assert(statement.uri(), alice.uri(), "IsTrue", 0.5)
        .await
        .unwrap();
    ledger.verify(&assertion).await.unwrap();

    // Flip one character of the signature segment.
    let token = assertion.content();
    let (body, signature) = token.rsplit_once('.').unwrap();
    let first = signature.chars().next().unwrap();
    let flipped = if first == 'A' { 'B' } else { 'A' };
    let tampered = format!("{body}.{flipped}{}", &signature[1..]);

    let err = ledger.ingest_as(RecordKind::Assertion, &tampered).await.unwrap_err();
    assert!(matches!(err.code(), "E_VERIFICATION" | "E_PARSE"), "{err}");
}

#[tokio::test]
async fn test_verification_unknown_issuer() {
    let ledger = memory_ledger().await;
    let statement = ledger.publish_statement("Orphan").await.unwrap();

    let stranger = Keypair::generate();
    let entity = veritas::Entity::issue("Stranger", &stranger).unwrap();
    let assertion =
        veritas::Assertion::issue(statement.uri(), &entity, &stranger, "IsTrue", 0.4).unwrap();

    let err = ledger.verify(&assertion).await.unwrap_err();
    assert_eq!(err.code(), "E_KEY_NOT_FOUND");
}

// ─────────────────────────────────────────────────────────────────────────────
// Reference graph & search
// ─────────────────────────────────────────────────────────────────────────────

async fn reference_graph<S: Resolver>(ledger: &Ledger<S>) {
    let alice = ledger.issue_entity("Alice").await.unwrap();
    let statement = ledger.publish_statement("Grass is green").await.unwrap();
    let other = ledger.publish_statement("Snow is white").await.unwrap();

    let assertion = ledger
        .assert(statement.uri(), alice.uri(), "IsTrue", 0.9)
        .await
        .unwrap();
    let document = ledger
        .publish_document(
            &DocumentBuilder::new("Colours")
                .author(alice.uri(), Some("Alice"))
                .section(None)
                .cite_statement("grass", statement.uri())
                .text(" and ")
                .cite_statement("snow", other.uri()),
        )
        .await
        .unwrap();

    let refs = ledger.refs(statement.uri()).await.unwrap();
    let sources: Vec<&HashUri> = refs.iter().map(|r| &r.source).collect();
    assert_eq!(refs.len(), 2);
    assert!(sources.contains(&assertion.uri()));
    assert!(sources.contains(&document.uri()));

    let summaries: Vec<&str> = refs.iter().map(|r| r.summary.as_str()).collect();
    assert!(summaries.contains(&"Alice claims that 'Grass is green' is true"));
    assert!(summaries.contains(&"referenced in document 'Colours'"));

    // The author is referenced by both the assertion and the document.
    assert_eq!(ledger.refs(alice.uri()).await.unwrap().len(), 2);
    assert_eq!(ledger.refs(other.uri()).await.unwrap().len(), 1);

    let nobody = HashUri::from_content("nothing points here", None);
    assert!(ledger.refs(&nobody).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reference_graph_memory() {
    reference_graph(&memory_ledger().await).await;
}

#[tokio::test]
async fn test_reference_graph_sqlite() {
    reference_graph(&sqlite_ledger().await).await;
}

async fn green_search<S: Resolver>(ledger: &Ledger<S>) {
    let first = ledger.publish_statement("Red Green Blue").await.unwrap();
    ledger.publish_statement("Red Yellow Blue").await.unwrap();
    let third = ledger.publish_statement("White Green Blue").await.unwrap();

    let hits = ledger.search("green").await.unwrap();
    let found: BTreeSet<&HashUri> = hits.iter().map(|h| &h.uri).collect();
    let expected: BTreeSet<&HashUri> = [first.uri(), third.uri()].into_iter().collect();
    assert_eq!(found, expected);

    assert!(ledger.search("purple").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_green_search_memory() {
    green_search(&memory_ledger().await).await;
}

#[tokio::test]
async fn test_green_search_sqlite() {
    green_search(&sqlite_ledger().await).await;
}

#[tokio::test]
async fn test_search_limit() {
    init_tracing();
    let ledger = Ledger::open(
        MemoryStore::new(),
        LedgerConfig {
            search_limit: 2,
            ..config()
        },
    )
    .await
    .unwrap();

    for i in 0..5 {
        ledger.publish_statement(&format!("green item {i}")).await.unwrap();
    }
    assert_eq!(ledger.search("green").await.unwrap().len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Not found
// ─────────────────────────────────────────────────────────────────────────────

async fn not_found<S: Resolver>(ledger: &Ledger<S>) {
    let missing = HashUri::from_content("never stored", Some("statement"));

    let err = ledger.fetch_statement(&missing).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.incident().code, "E_NOT_FOUND");

    let err = ledger.fetch_record(&missing).await.unwrap_err();
    assert!(err.is_not_found());

    let err = ledger.signing_key(&missing).await.unwrap_err();
    assert_eq!(err.code(), "E_KEY_NOT_FOUND");

    let err = ledger
        .assert(&missing, &missing.with_kind("entity"), "IsTrue", 0.5)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_not_found_memory() {
    not_found(&memory_ledger().await).await;
}

#[tokio::test]
async fn test_not_found_sqlite() {
    not_found(&sqlite_ledger().await).await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Credentials & keys
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_signing_requires_authorization() {
    let ledger = memory_ledger().await;
    let mut alice = ledger.new_user("alice", "alice-pw");
    let bob = ledger.new_user("bob", "bob-pw");
    assert!(alice.verify_password("alice-pw"));

    let identity = ledger.issue_entity_for(&mut alice, "Alice").await.unwrap();
    let statement = ledger.publish_statement("Authorized").await.unwrap();

    ledger
        .assert_as(&alice, statement.uri(), identity.uri(), "IsTrue", 0.6)
        .await
        .unwrap();

    let err = ledger
        .assert_as(&bob, statement.uri(), identity.uri(), "IsTrue", 0.6)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E_NOT_AUTHORIZED");
    assert_eq!(ledger.refs(statement.uri()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_confidence_rejected() {
    let ledger = memory_ledger().await;
    let alice = ledger.issue_entity("Alice").await.unwrap();
    let statement = ledger.publish_statement("Overconfident").await.unwrap();

    for confidence in [1.5, -0.1, f64::NAN] {
        let err = ledger
            .assert(statement.uri(), alice.uri(), "IsTrue", confidence)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E_PARSE");
    }
}

#[tokio::test]
async fn test_key_transport_is_bit_identical() {
    let ledger = memory_ledger().await;
    let keypair = Keypair::generate();
    let entity = veritas::Entity::issue("Imported", &keypair).unwrap();
    ledger.import_entity(&entity, &keypair).await.unwrap();

    let loaded = ledger.signing_key(entity.uri()).await.unwrap();
    assert_eq!(loaded.seed(), keypair.seed());

    let stranger = Keypair::generate();
    assert_eq!(
        ledger.import_entity(&entity, &stranger).await.unwrap_err().code(),
        "E_KEY_INVALID"
    );
}

#[tokio::test]
async fn test_sealed_keys() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let sealed = Ledger::open_shared(
        Arc::clone(&store),
        LedgerConfig {
            key_passphrase: Some("correct horse".into()),
            ..config()
        },
    )
    .await
    .unwrap();

    let alice = sealed.issue_entity("Alice").await.unwrap();
    let secret = store.fetch_key(alice.uri()).await.unwrap();
    assert!(veritas::auth::is_sealed(&secret));
    assert!(!secret.contains("PRIVATE KEY"));

    let statement = sealed.publish_statement("Sealed").await.unwrap();
    sealed
        .assert(statement.uri(), alice.uri(), "IsTrue", 0.9)
        .await
        .unwrap();

    let unsealed = Ledger::open_shared(Arc::clone(&store), config()).await.unwrap();
    let err = unsealed.signing_key(alice.uri()).await.unwrap_err();
    assert_eq!(err.code(), "E_CREDENTIALS");

    let wrong = Ledger::open_shared(
        store,
        LedgerConfig {
            key_passphrase: Some("battery staple".into()),
            ..config()
        },
    )
    .await
    .unwrap();
    assert_eq!(
        wrong.signing_key(alice.uri()).await.unwrap_err().code(),
        "E_CREDENTIALS"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Persistence & seeding
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sqlite_persists_across_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("veritas.db");

    let (alice, assertion) = {
        let ledger = Ledger::open(SqliteStore::open(&path).unwrap(), LedgerConfig::default())
            .await
            .unwrap();
        let alice = ledger.issue_entity("Alice").await.unwrap();
        let statement = ledger.publish_statement("Persistent green claim").await.unwrap();
        let assertion = ledger
            .assert(statement.uri(), alice.uri(), "IsTrue", 0.8)
            .await
            .unwrap();
        (alice, assertion)
    };

    let ledger = Ledger::open(SqliteStore::open(&path).unwrap(), LedgerConfig::default())
        .await
        .unwrap();
    ledger.fetch_verified(assertion.uri()).await.unwrap();
    assert_eq!(ledger.signing_key(alice.uri()).await.unwrap().public_key(), *alice.public_key());
    assert_eq!(ledger.search("green").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_durable_backend_is_not_seeded() {
    init_tracing();
    let ledger = Ledger::open(SqliteStore::open_memory().unwrap(), LedgerConfig::default())
        .await
        .unwrap();
    assert!(ledger.search("cheese").await.unwrap().is_empty());

    let ledger = Ledger::open(MemoryStore::new(), LedgerConfig::default())
        .await
        .unwrap();
    assert!(!ledger.search("cheese").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ingest_sniffs_kind() {
    let ledger = memory_ledger().await;

    let record = ledger.ingest("A short claim").await.unwrap();
    assert_eq!(record.kind(), RecordKind::Statement);

    let xml = DocumentBuilder::new("Sniffed").to_xml().unwrap();
    let record = ledger.ingest(&xml).await.unwrap();
    assert_eq!(record.kind(), RecordKind::Document);
    assert_eq!(ledger.fetch_document(record.uri()).await.unwrap().title(), "Sniffed");
}
