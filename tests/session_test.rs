use anyhow::Result;
use aula_access::core::credentials::{SecureCredentialStore, StoredCredentials, TOKEN_KEY};
use aula_access::domain::model::Subject;
use aula_access::domain::ports::SecretStorage;
use aula_access::{
    AulaClient, ClientConfig, Credentials, FileSecretStorage, MemorySecretStorage, SessionState,
};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn stored(token: &str) -> StoredCredentials {
    StoredCredentials {
        token: token.to_string(),
        subject: Subject {
            id: 7,
            display_name: "ana".to_string(),
            email: "ana@alumno.edu".to_string(),
            roles: vec!["student".to_string()],
        },
    }
}

async fn seeded_storage(token: &str) -> Result<MemorySecretStorage> {
    let storage = MemorySecretStorage::new();
    SecureCredentialStore::new(storage.clone())
        .save(&stored(token))
        .await?;
    Ok(storage)
}

#[tokio::test]
async fn test_rejected_token_expires_on_restore() -> Result<()> {
    let server = MockServer::start_async().await;
    let profile = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/user/profile")
                .header("authorization", "Bearer stale-token");
            then.status(401).json_body(json!({"message": "Token expired"}));
        })
        .await;

    let client = AulaClient::new(ClientConfig::live(server.url("/api")))?;
    let session = client.session(seeded_storage("stale-token").await?);

    assert_eq!(session.hydrate().await, SessionState::Expired);
    profile.assert_async().await;
    assert!(session.store().storage().is_empty().await);
    assert!(client.context().executor().bearer_token().is_none());
    Ok(())
}

#[tokio::test]
async fn test_accepted_token_is_restored() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/user/profile")
                .header("authorization", "Bearer good-token");
            then.status(200).json_body(json!({
                "id": 7, "username": "ana", "email": "ana@alumno.edu"
            }));
        })
        .await;

    let client = AulaClient::new(ClientConfig::live(server.url("/api")))?;
    let session = client.session(seeded_storage("good-token").await?);

    assert_eq!(session.hydrate().await, SessionState::Authenticated);
    assert_eq!(session.subject().unwrap().display_name, "ana");
    assert_eq!(
        client.context().executor().bearer_token().as_deref(),
        Some("good-token")
    );
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_keeps_stored_session() -> Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let base_url = format!("http://127.0.0.1:{}/api", listener.local_addr()?.port());
    drop(listener);

    let client = AulaClient::new(ClientConfig::live(base_url).with_timeout_ms(2_000))?;
    let session = client.session(seeded_storage("offline-token").await?);

    assert_eq!(session.hydrate().await, SessionState::Authenticated);
    assert_eq!(session.store().storage().len().await, 2);
    Ok(())
}

#[tokio::test]
async fn test_nothing_stored_is_unauthenticated() -> Result<()> {
    let client = AulaClient::new(ClientConfig::demo())?;
    let session = client.session(MemorySecretStorage::new());

    assert_eq!(session.hydrate().await, SessionState::Unauthenticated);
    assert!(session.subject().is_none());
    Ok(())
}

#[tokio::test]
async fn test_login_survives_restart_with_file_storage() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let client = AulaClient::new(ClientConfig::demo())?;
    let session = client.session(FileSecretStorage::new(temp_dir.path()));
    let envelope = session
        .login(&Credentials::new("juan.perez@alumno.edu", "demo123"))
        .await;
    assert!(envelope.success);
    assert!(temp_dir.path().exists());

    // A fresh client over the same directory picks the session up again.
    let restarted = AulaClient::new(ClientConfig::demo())?;
    let restored = restarted.session(FileSecretStorage::new(temp_dir.path()));
    assert_eq!(restored.hydrate().await, SessionState::Authenticated);
    assert_eq!(restored.subject().unwrap().email, "juan.perez@alumno.edu");

    let profile = restarted.auth().profile().await.into_result().unwrap();
    assert_eq!(profile.username, "juan.perez");
    Ok(())
}

#[tokio::test]
async fn test_logout_clears_locally_when_server_fails() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/user/profile");
            then.status(200).json_body(json!({
                "id": 7, "username": "ana", "email": "ana@alumno.edu"
            }));
        })
        .await;
    let remote_logout = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/logout");
            then.status(500);
        })
        .await;

    let client = AulaClient::new(ClientConfig::live(server.url("/api")))?;
    let storage = seeded_storage("good-token").await?;
    let session = client.session(storage.clone());
    assert_eq!(session.hydrate().await, SessionState::Authenticated);

    let envelope = session.logout().await;

    remote_logout.assert_async().await;
    assert!(envelope.success);
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(storage.read_entry(TOKEN_KEY).await?.is_none());
    assert!(client.context().executor().bearer_token().is_none());
    Ok(())
}

#[tokio::test]
async fn test_expired_session_can_log_in_again() -> Result<()> {
    let client = AulaClient::new(ClientConfig::demo())?;
    let session = client.session(seeded_storage("revoked-token").await?);
    assert_eq!(session.hydrate().await, SessionState::Expired);

    let envelope = session
        .login(&Credentials::new("maria.gonzalez", "profe123"))
        .await;
    assert!(envelope.success);
    assert_eq!(session.state(), SessionState::Authenticated);
    Ok(())
}
