//! Integration tests for the token refresh service
//!
//! Exercises the refresh decision boundary and the platform-specific refresh
//! flows against wiremock stand-ins, verifying that refreshed tokens are
//! re-encrypted and persisted and that every failure is recorded on the
//! connection instead of crashing the caller.

use std::sync::Arc;

use chrono::{Duration, Utc};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dealcast::config::AppConfig;
use dealcast::repositories::ConnectionRepository;
use dealcast::social::token_refresh::TokenRefreshService;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{ConnectionSpec, insert_connection, setup_test_db, test_cipher};

fn service_config(server: &MockServer) -> AppConfig {
    AppConfig {
        meta_app_id: Some("meta-app".to_string()),
        meta_app_secret: Some("meta-secret".to_string()),
        twitter_client_id: Some("tw-client".to_string()),
        twitter_client_secret: Some("tw-secret".to_string()),
        tiktok_client_key: Some("tt-key".to_string()),
        tiktok_client_secret: Some("tt-secret".to_string()),
        graph_api_base: server.uri(),
        twitter_api_base: server.uri(),
        tiktok_api_base: server.uri(),
        ..Default::default()
    }
}

struct Harness {
    db: Arc<sea_orm::DatabaseConnection>,
    repo: Arc<ConnectionRepository>,
    service: TokenRefreshService,
}

async fn harness(config: AppConfig) -> anyhow::Result<Harness> {
    let db = setup_test_db().await?;
    let repo = Arc::new(ConnectionRepository::new(
        db.clone(),
        Arc::new(test_cipher()),
    ));
    let service = TokenRefreshService::from_config(reqwest::Client::new(), repo.clone(), &config);
    Ok(Harness { db, repo, service })
}

#[tokio::test]
async fn test_long_lived_token_is_returned_unchanged() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let h = harness(service_config(&server)).await?;

    let connection = insert_connection(
        &h.db,
        &test_cipher(),
        ConnectionSpec {
            access_token: "long-lived-token".to_string(),
            token_expires_at: None,
            ..Default::default()
        },
    )
    .await?;

    let token = h.service.ensure_valid_token(&connection).await;
    assert_eq!(token.as_deref(), Some("long-lived-token"));
    assert!(server.received_requests().await.unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_token_outside_buffer_is_not_refreshed() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness(service_config(&server)).await?;

    let connection = insert_connection(
        &h.db,
        &test_cipher(),
        ConnectionSpec {
            access_token: "still-fresh".to_string(),
            token_expires_at: Some(Utc::now() + Duration::minutes(6)),
            ..Default::default()
        },
    )
    .await?;

    let token = h.service.ensure_valid_token(&connection).await;
    assert_eq!(token.as_deref(), Some("still-fresh"));

    Ok(())
}

#[tokio::test]
async fn test_token_inside_buffer_is_exchanged_and_persisted() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .and(query_param("grant_type", "fb_exchange_token"))
        .and(query_param("fb_exchange_token", "nearly-expired"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-long-lived",
            "token_type": "bearer",
            "expires_in": 5184000,
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(service_config(&server)).await?;

    let connection = insert_connection(
        &h.db,
        &test_cipher(),
        ConnectionSpec {
            platform: "facebook".to_string(),
            access_token: "nearly-expired".to_string(),
            token_expires_at: Some(Utc::now() + Duration::minutes(4)),
            ..Default::default()
        },
    )
    .await?;

    let token = h.service.ensure_valid_token(&connection).await;
    assert_eq!(token.as_deref(), Some("fresh-long-lived"));

    // The refreshed token is re-encrypted at rest with a new expiry and a
    // cleared error.
    let stored = h.repo.get_by_id(&connection.id).await?.unwrap();
    assert_ne!(
        stored.access_token_ciphertext,
        connection.access_token_ciphertext
    );
    assert!(stored.last_error.is_none());
    let expires_at = stored.token_expires_at.unwrap();
    assert!(expires_at.with_timezone(&Utc) > Utc::now() + Duration::days(30));

    let (access, _) = h.repo.decrypt_tokens(&stored).await?;
    assert_eq!(access, "fresh-long-lived");

    Ok(())
}

#[tokio::test]
async fn test_twitter_refresh_rotates_refresh_token() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-rt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "new-at",
            "refresh_token": "rotated-rt",
            "expires_in": 7200,
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(service_config(&server)).await?;

    let connection = insert_connection(
        &h.db,
        &test_cipher(),
        ConnectionSpec {
            platform: "twitter".to_string(),
            access_token: "expired-at".to_string(),
            refresh_token: Some("old-rt".to_string()),
            token_expires_at: Some(Utc::now() - Duration::minutes(10)),
            platform_page_id: None,
            ..Default::default()
        },
    )
    .await?;

    let token = h.service.ensure_valid_token(&connection).await;
    assert_eq!(token.as_deref(), Some("new-at"));

    let stored = h.repo.get_by_id(&connection.id).await?.unwrap();
    let (access, refresh) = h.repo.decrypt_tokens(&stored).await?;
    assert_eq!(access, "new-at");
    assert_eq!(refresh.as_deref(), Some("rotated-rt"));

    Ok(())
}

#[tokio::test]
async fn test_tiktok_refresh_uses_client_key_grant() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/oauth/token/"))
        .and(body_string_contains("client_key=tt-key"))
        .and(body_string_contains("refresh_token=tt-old-rt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tt-new-at",
            "refresh_token": "tt-new-rt",
            "expires_in": 86400,
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(service_config(&server)).await?;

    let connection = insert_connection(
        &h.db,
        &test_cipher(),
        ConnectionSpec {
            platform: "tiktok".to_string(),
            access_token: "tt-expired".to_string(),
            refresh_token: Some("tt-old-rt".to_string()),
            token_expires_at: Some(Utc::now() + Duration::minutes(2)),
            platform_page_id: None,
            ..Default::default()
        },
    )
    .await?;

    let token = h.service.ensure_valid_token(&connection).await;
    assert_eq!(token.as_deref(), Some("tt-new-at"));

    Ok(())
}

#[tokio::test]
async fn test_missing_refresh_token_records_error_and_skips() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let h = harness(service_config(&server)).await?;

    let connection = insert_connection(
        &h.db,
        &test_cipher(),
        ConnectionSpec {
            platform: "twitter".to_string(),
            access_token: "expired-at".to_string(),
            refresh_token: None,
            token_expires_at: Some(Utc::now() - Duration::minutes(1)),
            platform_page_id: None,
            ..Default::default()
        },
    )
    .await?;

    let token = h.service.ensure_valid_token(&connection).await;
    assert!(token.is_none());

    let stored = h.repo.get_by_id(&connection.id).await?.unwrap();
    assert!(
        stored
            .last_error
            .as_deref()
            .unwrap()
            .contains("no refresh token")
    );
    assert!(server.received_requests().await.unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_missing_app_credentials_is_a_recorded_failure() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    // No Meta credentials configured at all.
    let config = AppConfig {
        graph_api_base: server.uri(),
        ..Default::default()
    };
    let h = harness(config).await?;

    let connection = insert_connection(
        &h.db,
        &test_cipher(),
        ConnectionSpec {
            platform: "facebook".to_string(),
            access_token: "nearly-expired".to_string(),
            token_expires_at: Some(Utc::now() + Duration::minutes(3)),
            ..Default::default()
        },
    )
    .await?;

    let token = h.service.ensure_valid_token(&connection).await;
    assert!(token.is_none());

    let stored = h.repo.get_by_id(&connection.id).await?.unwrap();
    assert!(
        stored
            .last_error
            .as_deref()
            .unwrap()
            .contains("credentials not configured")
    );

    Ok(())
}

#[tokio::test]
async fn test_refresh_http_failure_records_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(service_config(&server)).await?;

    let connection = insert_connection(
        &h.db,
        &test_cipher(),
        ConnectionSpec {
            platform: "twitter".to_string(),
            access_token: "expired-at".to_string(),
            refresh_token: Some("revoked-rt".to_string()),
            token_expires_at: Some(Utc::now() - Duration::minutes(5)),
            platform_page_id: None,
            ..Default::default()
        },
    )
    .await?;

    let token = h.service.ensure_valid_token(&connection).await;
    assert!(token.is_none());

    let stored = h.repo.get_by_id(&connection.id).await?.unwrap();
    let last_error = stored.last_error.unwrap();
    assert!(last_error.contains("400"), "{last_error}");
    assert!(last_error.contains("invalid_grant"), "{last_error}");

    Ok(())
}
