//! Integration tests for the token cipher and connection repository
//!
//! Verifies end-to-end encryption flows: tokens written through the
//! repository are ciphertext at rest and round-trip back to plaintext only
//! through the cipher.

use std::sync::Arc;

use dealcast::models::social_connection::Entity as SocialConnection;
use dealcast::repositories::ConnectionRepository;
use sea_orm::EntityTrait;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{ConnectionSpec, insert_connection, setup_test_db, test_cipher};

#[tokio::test]
async fn test_tokens_are_ciphertext_at_rest() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let cipher = test_cipher();

    let connection = insert_connection(
        &db,
        &cipher,
        ConnectionSpec {
            access_token: "EAAG-super-secret".to_string(),
            refresh_token: Some("refresh-super-secret".to_string()),
            ..Default::default()
        },
    )
    .await?;

    let stored = SocialConnection::find_by_id(connection.id)
        .one(&*db)
        .await?
        .expect("connection persisted");

    assert!(!stored.access_token_ciphertext.contains("EAAG-super-secret"));
    assert!(
        !stored
            .refresh_token_ciphertext
            .as_deref()
            .unwrap()
            .contains("refresh-super-secret")
    );
    // Stored form is the delimited hex triple.
    assert_eq!(stored.access_token_ciphertext.split(':').count(), 3);

    Ok(())
}

#[tokio::test]
async fn test_repository_decrypts_tokens() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let cipher = test_cipher();
    let repo = ConnectionRepository::new(db.clone(), Arc::new(cipher.clone()));

    let connection = insert_connection(
        &db,
        &cipher,
        ConnectionSpec {
            access_token: "access-123".to_string(),
            refresh_token: Some("refresh-456".to_string()),
            ..Default::default()
        },
    )
    .await?;

    let (access, refresh) = repo.decrypt_tokens(&connection).await?;
    assert_eq!(access, "access-123");
    assert_eq!(refresh.as_deref(), Some("refresh-456"));

    Ok(())
}

#[tokio::test]
async fn test_decrypt_with_wrong_key_fails() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let cipher = test_cipher();

    let connection = insert_connection(&db, &cipher, ConnectionSpec::default()).await?;

    let wrong_cipher = dealcast::crypto::TokenCipher::new(vec![9u8; 32])?;
    let repo = ConnectionRepository::new(db.clone(), Arc::new(wrong_cipher));

    assert!(repo.decrypt_tokens(&connection).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_store_refreshed_tokens_rotates_ciphertext() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let cipher = test_cipher();
    let repo = ConnectionRepository::new(db.clone(), Arc::new(cipher.clone()));

    let connection = insert_connection(
        &db,
        &cipher,
        ConnectionSpec {
            access_token: "old-access".to_string(),
            refresh_token: Some("old-refresh".to_string()),
            ..Default::default()
        },
    )
    .await?;
    let old_ciphertext = connection.access_token_ciphertext.clone();

    let expires_at = chrono::Utc::now() + chrono::Duration::hours(2);
    let updated = repo
        .store_refreshed_tokens(&connection.id, "new-access", Some("new-refresh"), Some(expires_at))
        .await?;

    assert_ne!(updated.access_token_ciphertext, old_ciphertext);
    assert!(updated.token_expires_at.is_some());
    assert!(updated.last_error.is_none());

    let (access, refresh) = repo.decrypt_tokens(&updated).await?;
    assert_eq!(access, "new-access");
    assert_eq!(refresh.as_deref(), Some("new-refresh"));

    Ok(())
}

#[tokio::test]
async fn test_record_error_and_post_outcome_updates() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let cipher = test_cipher();
    let repo = ConnectionRepository::new(db.clone(), Arc::new(cipher.clone()));

    let connection = insert_connection(&db, &cipher, ConnectionSpec::default()).await?;

    repo.record_error(&connection.id, "token refresh failed: HTTP 400")
        .await?;
    let stored = repo.get_by_id(&connection.id).await?.unwrap();
    assert_eq!(
        stored.last_error.as_deref(),
        Some("token refresh failed: HTTP 400")
    );

    // A successful post clears the error and stamps last_posted_at.
    let now = chrono::Utc::now();
    repo.apply_post_outcome(&connection.id, true, None, now).await?;
    let stored = repo.get_by_id(&connection.id).await?.unwrap();
    assert!(stored.last_error.is_none());
    assert!(stored.last_posted_at.is_some());

    // A failed post records the error but keeps last_posted_at.
    repo.apply_post_outcome(&connection.id, false, Some("HTTP 500"), now)
        .await?;
    let stored = repo.get_by_id(&connection.id).await?.unwrap();
    assert_eq!(stored.last_error.as_deref(), Some("HTTP 500"));
    assert!(stored.last_posted_at.is_some());

    Ok(())
}

#[tokio::test]
async fn test_find_eligible_scopes_to_vendor_and_brand() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let cipher = test_cipher();
    let repo = ConnectionRepository::new(db.clone(), Arc::new(cipher.clone()));

    let vendor_id = uuid::Uuid::new_v4();
    let other_vendor = uuid::Uuid::new_v4();

    let own = insert_connection(
        &db,
        &cipher,
        ConnectionSpec {
            vendor_id: Some(vendor_id),
            ..Default::default()
        },
    )
    .await?;
    let brand = insert_connection(
        &db,
        &cipher,
        ConnectionSpec {
            platform: "twitter".to_string(),
            vendor_id: None,
            is_brand_account: true,
            ..Default::default()
        },
    )
    .await?;
    // Another vendor's connection and an inactive one must not appear.
    insert_connection(
        &db,
        &cipher,
        ConnectionSpec {
            vendor_id: Some(other_vendor),
            ..Default::default()
        },
    )
    .await?;
    insert_connection(
        &db,
        &cipher,
        ConnectionSpec {
            vendor_id: Some(vendor_id),
            is_active: false,
            ..Default::default()
        },
    )
    .await?;

    let eligible = repo.find_eligible(&vendor_id).await?;
    let ids: Vec<_> = eligible.iter().map(|c| c.id).collect();
    assert_eq!(eligible.len(), 2);
    assert!(ids.contains(&own.id));
    assert!(ids.contains(&brand.id));

    Ok(())
}
