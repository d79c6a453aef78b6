//! End-to-end scenario against a real server over HTTP.

use strongbox_client::{
    CacheError, ClientError, OfflineFallback, SecretCache, Source, Synchronizer,
};
use strongbox_core::{Code, Secret, SecretKind, SecretString};
use strongbox_integration_tests::TestServer;

#[tokio::test]
async fn test_register_store_sync_and_delete() {
    let server = TestServer::start().await;
    let anon = server.client();

    // Register alice and log in again with the same password.
    anon.register("alice", SecretString::new("pw1")).await.unwrap();
    let token = anon.login("alice", SecretString::new("pw1")).await.unwrap();

    let wrong = anon.login("alice", SecretString::new("nope")).await.unwrap_err();
    assert_eq!(wrong.code(), Some(Code::PermissionDenied));

    let k1 = server
        .client()
        .with_token(token.clone())
        .with_secret_key(SecretString::new("k1"));
    let k2 = server
        .client()
        .with_token(token.clone())
        .with_secret_key(SecretString::new("k2"));

    // Store under k1; only k1 decrypts.
    k1.add(&Secret::new("note1", SecretKind::Text, b"hello".to_vec()))
        .await
        .unwrap();
    let note = k1.get("note1").await.unwrap();
    assert_eq!(note.data, b"hello");
    assert_eq!(note.version, 1);

    let err = k2.get("note1").await.unwrap_err();
    assert_eq!(err.code(), Some(Code::DecryptionFailed));

    let dup = k1
        .add(&Secret::new("note1", SecretKind::Text, b"other".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(dup.code(), Some(Code::AlreadyExists));

    // Each update bumps the version.
    let version = k1
        .update(&Secret::new("note1", SecretKind::Text, b"hello again".to_vec()))
        .await
        .unwrap();
    assert_eq!(version, 2);

    k1.add(&Secret::new("blob", SecretKind::Binary, vec![0u8, 255]))
        .await
        .unwrap();

    let items = k1.list().await.unwrap();
    let names: Vec<_> = items.iter().map(|i| (i.name.as_str(), i.version)).collect();
    assert_eq!(names, [("blob", 1), ("note1", 2)]);

    // Sync into a fresh cache.
    let cache_path = server.dir.path().join("client").join("cache.db");
    let cache = SecretCache::init(&cache_path).await.unwrap();
    let report = Synchronizer::new(&k1, &cache).run().await.unwrap();
    assert_eq!(report.added, ["blob", "note1"]);
    assert_eq!(cache.get("note1").await.unwrap().data, b"hello again");

    // Deleting remotely is pruned locally on the next pass.
    k1.delete("blob").await.unwrap();
    let report = Synchronizer::new(&k1, &cache).run().await.unwrap();
    assert_eq!(report.removed, ["blob"]);
    assert_eq!(report.unchanged, 1);
    assert!(matches!(
        cache.get("blob").await,
        Err(CacheError::NotFound(_))
    ));

    let url = server.url.clone();
    server.shutdown().await;

    // With the server gone, reads fall back to the cache.
    let offline = strongbox_client::RpcClient::new(&url, std::time::Duration::from_secs(2))
        .unwrap()
        .with_token(token)
        .with_secret_key(SecretString::new("k1"));
    let fetched = OfflineFallback::new(&cache_path)
        .get(&offline, "note1")
        .await
        .unwrap();
    assert_eq!(fetched.source, Source::Cache);
    assert_eq!(fetched.value.data, b"hello again");
}

#[tokio::test]
async fn test_note_lifecycle() {
    let server = TestServer::start().await;
    let anon = server.client();

    anon.register("alice", SecretString::new("pw1")).await.unwrap();
    let token = anon.login("alice", SecretString::new("pw1")).await.unwrap();
    let alice = server
        .client()
        .with_token(token.clone())
        .with_secret_key(SecretString::new("k1"));

    alice
        .add(&Secret::new("note1", SecretKind::Text, b"hello".to_vec()))
        .await
        .unwrap();
    let note = alice.get("note1").await.unwrap();
    assert_eq!((note.data.as_slice(), note.version), (&b"hello"[..], 1));

    alice
        .update(&Secret::new("note1", SecretKind::Text, b"world".to_vec()))
        .await
        .unwrap();
    let note = alice.get("note1").await.unwrap();
    assert_eq!((note.data.as_slice(), note.version), (&b"world"[..], 2));

    let wrong_key = server
        .client()
        .with_token(token)
        .with_secret_key(SecretString::new("k2"));
    let err = wrong_key.get("note1").await.unwrap_err();
    assert_eq!(err.code(), Some(Code::DecryptionFailed));

    alice.delete("note1").await.unwrap();
    let err = alice.get("note1").await.unwrap_err();
    assert_eq!(err.code(), Some(Code::NotFound));

    server.shutdown().await;
}

#[tokio::test]
async fn test_users_are_isolated() {
    let server = TestServer::start().await;
    let anon = server.client();

    let alice = anon.register("alice", SecretString::new("pw1")).await.unwrap();
    let bob = anon.register("bob", SecretString::new("pw2")).await.unwrap();

    let alice = server
        .client()
        .with_token(alice)
        .with_secret_key(SecretString::new("k"));
    let bob = server
        .client()
        .with_token(bob)
        .with_secret_key(SecretString::new("k"));

    alice
        .add(&Secret::new("shared-name", SecretKind::Text, b"alice".to_vec()))
        .await
        .unwrap();
    bob.add(&Secret::new("shared-name", SecretKind::Text, b"bob".to_vec()))
        .await
        .unwrap();

    assert_eq!(alice.get("shared-name").await.unwrap().data, b"alice");
    assert_eq!(bob.get("shared-name").await.unwrap().data, b"bob");

    bob.delete("shared-name").await.unwrap();
    assert!(bob.list().await.unwrap().is_empty());
    assert_eq!(alice.list().await.unwrap().len(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_protected_calls_need_a_valid_token() {
    let server = TestServer::start().await;

    let err = server.client().list().await.unwrap_err();
    assert_eq!(err.code(), Some(Code::Unauthenticated));

    let err = server
        .client()
        .with_token(SecretString::new("not.a.token"))
        .list()
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::Unauthenticated));
    assert!(!matches!(err, ClientError::Transport(_)));

    server.shutdown().await;
}
