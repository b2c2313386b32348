//! Certificate rotation tests: source, notifier, and active-cert store.

use std::sync::Arc;

use admission_warden::tls::{
    parse_bundle, CertificateNotifier, CertificateSource, CertificateStore, GeneratedSource,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_empty_store_offers_no_certificate() {
    let store = CertificateStore::new();
    assert!(store.current().is_none());
}

#[tokio::test]
async fn test_generated_bundle_flows_into_the_store() {
    let source = GeneratedSource::new("Test Warden", vec!["warden.default.svc".to_string()]);
    let bundle = source.next().await.unwrap();

    let store = CertificateStore::new();
    store.publish(parse_bundle(&bundle).unwrap());
    assert!(store.current().is_some());
}

#[tokio::test]
async fn test_rotation_replaces_the_active_certificate() {
    let store = CertificateStore::new();

    let first_source = GeneratedSource::new("Test Warden", vec!["a.svc".to_string()]);
    let first = first_source.next().await.unwrap();
    store.publish(parse_bundle(&first).unwrap());
    let before = store.current().unwrap();

    let second_source = GeneratedSource::new("Test Warden", vec!["b.svc".to_string()]);
    let second = second_source.next().await.unwrap();
    assert_ne!(first, second);
    store.publish(parse_bundle(&second).unwrap());

    let after = store.current().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
}

#[tokio::test]
async fn test_notifier_delivers_a_parsable_bundle() {
    let (tx, mut rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let notifier = CertificateNotifier::new(
        Arc::new(GeneratedSource::new(
            "Test Warden",
            vec!["warden.default.svc".to_string()],
        )),
        tx,
        token.clone(),
    );
    let task = tokio::spawn(notifier.run());

    let bundle = rx.recv().await.unwrap();
    assert!(parse_bundle(&bundle).is_ok());
    // self-signed bundles carry their own trust anchor for registration
    assert_eq!(bundle.ca_cert, bundle.cert);

    token.cancel();
    task.await.unwrap();
}
