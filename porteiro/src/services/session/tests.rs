use std::sync::Arc;
use std::time::Duration;

use base64::prelude::*;
use secrecy::SecretString;
use sha2::{Digest, Sha256};
use tempfile::tempdir;

use porteiro_core::module_id::ModuleId;
use porteiro_core::permission::{Action, Capabilities};

use super::blob::{BlobStore, FileBlobStore};
use super::service::SessionService;
use super::token::SessionSealer;
use crate::services::entity_store::{EntityStore, NewUser};

const SECRET: &str = "test-secret";
const STATE_KEY: &str = "session";

async fn seeded_store() -> EntityStore {
    let store = EntityStore::in_memory(Duration::from_secs(5), 4);
    let user_type = store.create_user_type("Vendedor").await.unwrap();
    store.create_module("Vendas").await.unwrap();
    store.create_module("Pedidos").await.unwrap();
    store
        .upsert_permission(
            &user_type.id,
            &ModuleId::Custom("vendas".to_string()),
            Capabilities {
                access: true,
                create: true,
                edit: true,
                delete: false,
            },
        )
        .await
        .unwrap();
    store
        .create_user(NewUser {
            full_name: "Vendedor".to_string(),
            username: "vendedor".to_string(),
            email: "vendedor@example.com".to_string(),
            user_type_id: user_type.id,
            password: SecretString::from("password".to_string()),
        })
        .await
        .unwrap();
    store
}

fn service_in(dir: &std::path::Path, ttl_minutes: i64) -> SessionService {
    SessionService::new(
        Arc::new(FileBlobStore::new(dir)),
        SessionSealer::new(SecretString::from(SECRET.to_string()), ttl_minutes),
        STATE_KEY,
    )
}

fn password() -> SecretString {
    SecretString::from("password".to_string())
}

#[tokio::test]
async fn test_gate_denies_everything_while_anonymous() {
    let dir = tempdir().unwrap();
    let service = service_in(dir.path(), 60);

    for module in [
        ModuleId::Users,
        ModuleId::Custom("vendas".to_string()),
        ModuleId::Custom("does-not-exist".to_string()),
    ] {
        for action in Action::all() {
            assert!(!service.has_permission(&module, action).await);
        }
    }
    assert!(!service.is_authenticated().await);
}

#[tokio::test]
async fn test_both_auth_failures_read_the_same() {
    let dir = tempdir().unwrap();
    let store = seeded_store().await;
    let service = service_in(dir.path(), 60);

    let unknown = service
        .login(&store, "ghost@example.com", &password())
        .await
        .unwrap_err();
    let bad_secret = service
        .login(
            &store,
            "vendedor@example.com",
            &SecretString::from("wrong".to_string()),
        )
        .await
        .unwrap_err();

    assert_eq!(unknown.to_string(), bad_secret.to_string());
    assert!(!service.is_authenticated().await);
}

#[tokio::test]
async fn test_login_then_restore_round_trips_the_snapshot() {
    let dir = tempdir().unwrap();
    let store = seeded_store().await;
    let vendas = ModuleId::Custom("vendas".to_string());

    let service = service_in(dir.path(), 60);
    let session = service
        .login(&store, "vendedor@example.com", &password())
        .await
        .unwrap();
    assert!(session.user.password_hash.is_empty());

    // Simulated process restart: fresh service over the same state dir.
    let restarted = service_in(dir.path(), 60);
    let restored = restarted.restore().await.unwrap();
    assert_eq!(restored, session);

    assert!(restarted.has_permission(&vendas, Action::Create).await);
    assert!(!restarted.has_permission(&vendas, Action::Delete).await);
    // Module with no grant row resolved to a fail-closed row.
    assert!(
        !restarted
            .has_permission(&ModuleId::Custom("pedidos".to_string()), Action::Access)
            .await
    );
}

#[tokio::test]
async fn test_user_type_without_grants_is_denied() {
    let dir = tempdir().unwrap();
    let store = EntityStore::in_memory(Duration::from_secs(5), 4);
    let user_type = store.create_user_type("Estoquista").await.unwrap();
    store.create_module("Estoque").await.unwrap();
    store
        .create_user(NewUser {
            full_name: "Estoquista".to_string(),
            username: "estoquista".to_string(),
            email: "estoquista@example.com".to_string(),
            user_type_id: user_type.id,
            password: password(),
        })
        .await
        .unwrap();

    let service = service_in(dir.path(), 60);
    service
        .login(&store, "estoquista@example.com", &password())
        .await
        .unwrap();

    let estoque = ModuleId::Custom("estoque".to_string());
    assert!(!service.has_permission(&estoque, Action::Access).await);
}

#[tokio::test]
async fn test_logout_clears_memory_and_disk() {
    let dir = tempdir().unwrap();
    let store = seeded_store().await;
    let service = service_in(dir.path(), 60);

    service
        .login(&store, "vendedor@example.com", &password())
        .await
        .unwrap();
    service.logout().await;

    assert!(!service.is_authenticated().await);
    let restarted = service_in(dir.path(), 60);
    assert!(restarted.restore().await.is_none());
}

#[tokio::test]
async fn test_tampered_blob_is_rejected_and_discarded() {
    let dir = tempdir().unwrap();
    let store = seeded_store().await;
    let service = service_in(dir.path(), 60);
    service
        .login(&store, "vendedor@example.com", &password())
        .await
        .unwrap();

    let blobs = FileBlobStore::new(dir.path());
    let blob = blobs.read(STATE_KEY).await.unwrap().unwrap();
    let tampered = format!("X{}", &blob[1..]);
    blobs.write(STATE_KEY, &tampered).await.unwrap();

    let restarted = service_in(dir.path(), 60);
    assert!(restarted.restore().await.is_none());
    assert!(!restarted.is_authenticated().await);
    // The bad blob is discarded; the next restore finds nothing.
    assert!(blobs.read(STATE_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_session_requires_fresh_login() {
    let dir = tempdir().unwrap();
    let store = seeded_store().await;

    // TTL in the past: the blob is expired the moment it is written.
    let service = service_in(dir.path(), -1);
    service
        .login(&store, "vendedor@example.com", &password())
        .await
        .unwrap();

    let restarted = service_in(dir.path(), 60);
    assert!(restarted.restore().await.is_none());
}

#[tokio::test]
async fn test_unknown_schema_version_is_rejected() {
    let dir = tempdir().unwrap();

    // A well-signed envelope with a future schema version.
    let payload = br#"{"version":99,"expires_at":"2999-01-01T00:00:00Z","session":{}}"#;
    let mut hasher = Sha256::new();
    hasher.update(SECRET.as_bytes());
    hasher.update(payload);
    let signature: [u8; 32] = hasher.finalize().into();
    let blob = format!(
        "{}.{}",
        BASE64_URL_SAFE_NO_PAD.encode(payload),
        BASE64_URL_SAFE_NO_PAD.encode(signature)
    );

    let blobs = FileBlobStore::new(dir.path());
    blobs.write(STATE_KEY, &blob).await.unwrap();

    let service = service_in(dir.path(), 60);
    assert!(service.restore().await.is_none());
}
