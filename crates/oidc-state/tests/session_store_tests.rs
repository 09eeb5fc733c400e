//! Integration tests for the session store lifecycle and its concurrency guarantees.

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use url::Url;

use oidc_state::config::SessionConfig;
use oidc_state::error::SessionError;
use oidc_state::session::{AuthorizeArgs, ResponseType, Scopes, SessionState, SessionStore, Tokens};

fn auth_args(client_id: &str) -> AuthorizeArgs {
    AuthorizeArgs {
        response_type: ResponseType::Code,
        client_id: client_id.to_string(),
        redirect_uri: "https://app.example.com/callback".to_string(),
        parsed_redirect: Url::parse("https://app.example.com/callback").unwrap(),
        scope: "openid".to_string(),
        state: None,
        nonce: Some("n-0S6_WzA2Mj".to_string()),
    }
}

fn short_lived_store() -> SessionStore {
    SessionStore::new(SessionConfig { ttl: Duration::from_millis(30), ..SessionConfig::default() })
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let store = SessionStore::default();
    let scopes = Scopes { openid: true, ..Scopes::default() };

    let id = store.create_session(auth_args("abc"), scopes).await.unwrap();
    store
        .complete_session(
            id.as_str(),
            Tokens { access_token: "tok1".into(), refresh_token: String::new(), id_token: None },
        )
        .await
        .unwrap();

    let session = store.consume_session(id.as_str()).await.unwrap();
    assert_eq!(session.auth_args.client_id, "abc");
    assert_eq!(session.tokens.unwrap().access_token, "tok1");

    assert!(store.consume_session(id.as_str()).await.is_none());
}

#[tokio::test]
async fn test_tokens_absent_until_completed() {
    let store = SessionStore::default();
    let id = store.create_session(auth_args("abc"), Scopes::default()).await.unwrap();

    let before = store.get_session(id.as_str()).await.unwrap();
    assert_eq!(before.state(), SessionState::Created);
    assert!(before.tokens.is_none());

    let tokens = Tokens {
        access_token: "access".into(),
        refresh_token: "refresh".into(),
        id_token: Some("id".into()),
    };
    store.complete_session(id.as_str(), tokens.clone()).await.unwrap();

    let after = store.get_session(id.as_str()).await.unwrap();
    assert_eq!(after.state(), SessionState::Completed);
    assert_eq!(after.tokens, Some(tokens.clone()));

    let consumed = store.consume_completed(id.as_str()).await.unwrap();
    assert_eq!(consumed.tokens, Some(tokens));
}

#[tokio::test]
async fn test_unknown_identifier() {
    let store = SessionStore::default();
    assert!(store.get_session("doesnotexist").await.is_none());
    assert!(store.consume_session("doesnotexist").await.is_none());
    assert!(store.consume_completed("doesnotexist").await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_consume_exactly_once() {
    let store = SessionStore::default();

    for _ in 0..20 {
        let id = store.create_session(auth_args("abc"), Scopes::default()).await.unwrap();

        let handles = (0..16).map(|_| {
            let store = store.clone();
            let id = id.clone();
            tokio::spawn(async move { store.consume_session(id.as_str()).await.is_some() })
        });

        let winners = join_all(handles)
            .await
            .into_iter()
            .map(Result::unwrap)
            .filter(|found| *found)
            .count();
        assert_eq!(winners, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_consume_completed_exactly_once() {
    let store = SessionStore::default();
    let id = store.create_session(auth_args("abc"), Scopes::default()).await.unwrap();
    store
        .complete_session(
            id.as_str(),
            Tokens { access_token: "a".into(), refresh_token: "r".into(), id_token: None },
        )
        .await
        .unwrap();

    let handles = (0..32).map(|_| {
        let store = store.clone();
        let id = id.clone();
        tokio::spawn(async move { store.consume_completed(id.as_str()).await.is_some() })
    });

    let winners =
        join_all(handles).await.into_iter().map(Result::unwrap).filter(|found| *found).count();
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_are_all_kept() {
    let store = SessionStore::default();

    let handles = (0..200).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            store.create_session(auth_args(&format!("client-{i}")), Scopes::default()).await
        })
    });

    let ids: Vec<_> =
        join_all(handles).await.into_iter().map(|r| r.unwrap().unwrap()).collect();
    let unique: HashSet<_> = ids.iter().cloned().collect();

    assert_eq!(unique.len(), 200);
    assert_eq!(store.session_count().await, 200);
    for id in &ids {
        assert!(store.get_session(id.as_str()).await.is_some());
    }
}

#[tokio::test]
async fn test_created_session_expires() {
    let store = short_lived_store();
    let id = store.create_session(auth_args("abc"), Scopes::default()).await.unwrap();
    assert!(store.get_session(id.as_str()).await.is_some());

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(store.get_session(id.as_str()).await.is_none());
    assert!(store.consume_session(id.as_str()).await.is_none());
}

#[tokio::test]
async fn test_completed_session_expires() {
    let store = short_lived_store();
    let id = store.create_session(auth_args("abc"), Scopes::default()).await.unwrap();
    store
        .complete_session(
            id.as_str(),
            Tokens { access_token: "a".into(), refresh_token: "r".into(), id_token: None },
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(store.consume_completed(id.as_str()).await.is_none());
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_complete_after_expiry_is_not_found() {
    let store = short_lived_store();
    let id = store.create_session(auth_args("abc"), Scopes::default()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;

    let err = store
        .complete_session(
            id.as_str(),
            Tokens { access_token: "a".into(), refresh_token: "r".into(), id_token: None },
        )
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NotFound);
}

#[tokio::test]
async fn test_background_sweep_reclaims_sessions() {
    let store = std::sync::Arc::new(SessionStore::new(SessionConfig {
        ttl: Duration::from_millis(20),
        cleanup_interval: Duration::from_millis(25),
        ..SessionConfig::default()
    }));
    for _ in 0..5 {
        store.create_session(auth_args("abc"), Scopes::default()).await.unwrap();
    }
    std::sync::Arc::clone(&store).start_cleanup_task();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_generated_ids_follow_config() {
    let store = SessionStore::new(SessionConfig { id_length: 20, ..SessionConfig::default() });
    let id = store.generate_session_id();
    assert_eq!(id.as_str().len(), 20);

    let created = store.create_session(auth_args("abc"), Scopes::default()).await.unwrap();
    assert_eq!(created.as_str().len(), 20);
}

#[tokio::test]
async fn test_collisions_retry_instead_of_overwriting() {
    // One-character ids leave exactly 36 slots.
    let store = SessionStore::new(SessionConfig {
        id_length: 1,
        max_id_attempts: 5_000,
        ..SessionConfig::default()
    });

    let mut created = Vec::new();
    let mut conflicts = 0;
    for i in 0..40 {
        match store.create_session(auth_args(&format!("client-{i}")), Scopes::default()).await {
            Ok(id) => created.push((id, format!("client-{i}"))),
            Err(SessionError::Conflict { attempts }) => {
                assert_eq!(attempts, 5_000);
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let unique: HashSet<_> = created.iter().map(|(id, _)| id.clone()).collect();
    assert_eq!(created.len(), 36);
    assert_eq!(unique.len(), 36);
    assert_eq!(conflicts, 4);
    assert_eq!(store.session_count().await, 36);

    // Every record still belongs to the create that returned its id.
    for (id, client_id) in &created {
        let session = store.get_session(id.as_str()).await.unwrap();
        assert_eq!(&session.auth_args.client_id, client_id);
    }
}
