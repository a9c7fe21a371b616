//! Keychain store against the real platform keychain
//!
//! Ignored by default: CI containers usually have no keychain the process
//! may write to. Run with `cargo test -p authpipe-infra --test
//! keychain_integration -- --ignored` on a developer machine.
//!
//! Kept in its own test binary so no other test installs the keyring mock
//! backend in this process.

use authpipe_common::CredentialStore;
use authpipe_domain::Credential;
use authpipe_infra::KeychainCredentialStore;

const SERVICE: &str = "authpipe-keychain-integration";

fn account(name: &str) -> String {
    format!("{name}-{}@example.com", std::process::id())
}

#[tokio::test]
#[ignore = "requires the platform keychain"]
async fn test_credential_is_visible_to_a_second_store_instance() {
    let account = account("shared");
    let first = KeychainCredentialStore::new(SERVICE, &account).unwrap();
    first.set(&Credential::new("a1", "r1")).await.unwrap();

    let second = KeychainCredentialStore::new(SERVICE, &account).unwrap();
    let seen = second.get().await.unwrap();

    second.clear().await.unwrap();
    assert_eq!(seen, Some(Credential::new("a1", "r1")));
    assert_eq!(first.get().await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires the platform keychain"]
async fn test_rotation_through_one_instance_is_seen_by_another() {
    let account = account("rotation");
    let writer = KeychainCredentialStore::new(SERVICE, &account).unwrap();
    let reader = KeychainCredentialStore::new(SERVICE, &account).unwrap();

    writer.set(&Credential::new("a1", "r1")).await.unwrap();
    writer.set(&Credential::new("a2", "r2")).await.unwrap();
    let rotated = reader.get().await.unwrap();

    writer.clear().await.unwrap();
    assert_eq!(rotated, Some(Credential::new("a2", "r2")));
}
