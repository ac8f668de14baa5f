mod common;

use ::common::crypto::{Envelope, EnvelopeError};
use reqwest::StatusCode;
use sealdrop_client::api::{ApiError, Relay};
use sealdrop_client::transfer::{TransferError, LIST_HEADER};

use self::common::LiveRelay;

#[tokio::test]
async fn ping_and_identity() {
    let relay = LiveRelay::start().await;
    let client = relay.anonymous();

    assert_eq!(client.ping().await.unwrap().trim(), "pong");
    assert_eq!(
        client.identity().await.unwrap().public_key,
        relay.identity.to_hex()
    );
}

#[tokio::test]
async fn registration_binds_machine_and_reverse_lookup() {
    let relay = LiveRelay::start().await;
    let alice = relay.join().await;

    assert_eq!(alice.config.machine_id.as_deref(), Some("test-machine"));
    assert!(alice.config.machine_token.is_some());

    let client = relay.anonymous();
    let name = client
        .username_from_pub_id(&alice.key.public().to_hex())
        .await
        .unwrap();
    assert_eq!(name, alice.name());
    assert_eq!(
        client.lookup_key(alice.name()).await.unwrap(),
        alice.key.public().to_hex()
    );

    // the same key cannot register twice
    let again = client
        .register(&alice.key.public().to_hex(), None)
        .await
        .unwrap_err();
    assert!(matches!(again, ApiError::HttpStatus(status, _) if status == StatusCode::CONFLICT));
}

#[tokio::test]
async fn send_to_two_then_each_downloads_once() {
    let relay = LiveRelay::start().await;
    let alice = relay.join().await;
    let bob = relay.join().await;
    let carol = relay.join().await;

    let mut sender = alice.session();
    sender.book_mut().add_entry(bob.name(), "bob").unwrap();
    sender.book_mut().add_entry(carol.name(), "carol").unwrap();

    let receipt = sender
        .upload_file("bob, carol, mallory", "plan.txt", b"meet at noon")
        .await
        .unwrap();
    assert_eq!(
        receipt.recipients,
        vec![bob.name().to_string(), carol.name().to_string()]
    );
    assert_eq!(receipt.skipped, vec!["mallory".to_string()]);
    // keys fetched from the relay are cached
    assert_eq!(
        sender.book().pubkey_by_alias("carol"),
        carol.key.public().to_hex()
    );

    let listing = bob.session().list_files().await.unwrap();
    let rows: Vec<&str> = listing.lines().collect();
    assert_eq!(rows[0], LIST_HEADER);
    assert_eq!(rows.len(), 2);
    assert!(rows[1].starts_with(&format!("'{}'", receipt.blob_id)));

    for member in [&bob, &carol] {
        let mut session = member.session();
        session.book_mut().add_entry(alice.name(), "alice").unwrap();
        session
            .book_mut()
            .add_key(alice.name(), &alice.key.public().to_hex())
            .unwrap();

        let received = session.download_file(&receipt.blob_id).await.unwrap();
        assert_eq!(received.contents, b"meet at noon");
        assert_eq!(received.filename, "plan.txt");
        assert_eq!(received.sender, alice.key.public());
        assert_eq!(received.sender_alias.as_deref(), Some("alice"));

        let second = session.download_file(&receipt.blob_id).await;
        assert!(matches!(second, Err(TransferError::Api(e)) if e.is_not_found()));
    }

    let listing = bob.session().list_files().await.unwrap();
    assert_eq!(listing, LIST_HEADER);
}

#[tokio::test]
async fn outsiders_cannot_fetch_or_open() {
    let relay = LiveRelay::start().await;
    let alice = relay.join().await;
    let bob = relay.join().await;
    let eve = relay.join().await;

    let mut sender = alice.session();
    sender.book_mut().add_entry(bob.name(), "bob").unwrap();
    let receipt = sender.upload_file("bob", "secret.txt", b"x").await.unwrap();

    // another account's namespace is off limits
    let stolen = eve.client.download(bob.name(), &receipt.blob_id).await;
    assert!(matches!(stolen, Err(e) if e.is_unauthorized()));

    // and the ciphertext is useless to a non-recipient
    let sealed = bob.client.download(bob.name(), &receipt.blob_id).await.unwrap();
    assert!(matches!(
        Envelope::open(&eve.key, &sealed),
        Err(EnvelopeError::NotARecipient)
    ));
}

#[tokio::test]
async fn unknown_recipients_only_is_rejected() {
    let relay = LiveRelay::start().await;
    let alice = relay.join().await;

    let mut sender = alice.session();
    sender.book_mut().add_entry("4kXvQ2pZ", "typo").unwrap();
    let result = sender.upload_file("typo,nobody", "a.txt", b"x").await;
    assert!(matches!(result, Err(TransferError::NoRecipients)));
}

#[tokio::test]
async fn config_backup_roundtrip() {
    let relay = LiveRelay::start().await;
    let alice = relay.join().await;
    let bob = relay.join().await;

    let mut session = alice.session();
    session.book_mut().add_entry(bob.name(), "bob").unwrap();
    session.push_config(&alice.config).await.unwrap();

    // a fresh session on another machine starts with an empty book
    let mut restored = alice.session();
    let config = restored.pull_config().await.unwrap();
    assert_eq!(config, alice.config);
    assert_eq!(restored.book().name_by_alias("bob"), bob.name());

    // bob cannot read alice's slot
    let denied = bob.client.pull_config(alice.name()).await;
    assert!(matches!(denied, Err(e) if e.is_unauthorized()));
}
