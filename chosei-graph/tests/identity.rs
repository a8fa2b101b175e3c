use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chosei_core::invite::MeetingInvite;
use chosei_graph::actions::send_invite;
use chosei_graph::auth::{
    AuthorizationResponse, INVITE_SCOPES, LOGIN_SCOPES, Prompt,
};
use chosei_graph::{
    AppConfig, GraphClient, GraphError, GraphResult, IdentitySession, Interaction, SessionState,
    TokenCache, TokenOutcome,
};
use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/contoso/oauth2/v2.0/token";

/// Answers the authorization request like a browser that consents at once.
#[derive(Clone, Default)]
struct ConsentingBrowser {
    visited: Arc<Mutex<Vec<Url>>>,
    tamper_state: bool,
}

impl ConsentingBrowser {
    fn visits(&self) -> Vec<Url> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interaction for ConsentingBrowser {
    async fn authorize(&self, authorize_url: &Url) -> GraphResult<AuthorizationResponse> {
        self.visited.lock().unwrap().push(authorize_url.clone());
        let state = authorize_url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.to_string())
            .unwrap_or_default();
        Ok(AuthorizationResponse {
            code: "auth-code".to_string(),
            state: if self.tamper_state {
                "forged".to_string()
            } else {
                state
            },
        })
    }
}

fn id_token(username: &str, name: &str) -> String {
    let claims = json!({ "preferred_username": username, "name": name, "oid": "o", "tid": "t" });
    format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

fn config(server: &MockServer) -> AppConfig {
    AppConfig {
        client_id: "client".to_string(),
        tenant_id: "contoso".to_string(),
        authority_host: server.uri(),
        graph_base_url: server.uri(),
        ..AppConfig::default()
    }
}

fn session(server: &MockServer, dir: &TempDir, browser: &ConsentingBrowser) -> IdentitySession {
    IdentitySession::new(
        config(server),
        TokenCache::new(dir.path()),
        Box::new(browser.clone()),
    )
}

async fn mount_code_exchange(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "interactive-token",
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "id_token": id_token("ren@example.com", "Akiyama Ren"),
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_requests_consent_and_caches_account() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    let dir = TempDir::new().unwrap();
    let browser = ConsentingBrowser::default();
    let mut identity = session(&server, &dir, &browser);

    identity.initialize().unwrap();
    assert_eq!(identity.state(), &SessionState::Ready { account: None });

    let account = identity.login().await.unwrap();
    assert_eq!(account.greeting(), "ようこそ、Akiyama Renさん");

    let visit = &browser.visits()[0];
    let query: Vec<(String, String)> = visit.query_pairs().into_owned().collect();
    assert!(query.contains(&("prompt".to_string(), "consent".to_string())));
    assert!(query.contains(&("code_challenge_method".to_string(), "S256".to_string())));
    assert!(query.contains(&(
        "scope".to_string(),
        "User.Read Calendars.Read Calendars.Read.Shared openid profile offline_access".to_string()
    )));

    // A fresh process restores the account from the cache.
    let mut restarted = session(&server, &dir, &browser);
    restarted.initialize().unwrap();
    assert_eq!(restarted.account().map(|a| a.username.as_str()), Some("ren@example.com"));
}

#[tokio::test]
async fn test_silent_uses_cached_token_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "interactive-token",
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "id_token": id_token("ren@example.com", "Akiyama Ren"),
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let browser = ConsentingBrowser::default();
    let mut identity = session(&server, &dir, &browser);
    identity.initialize().unwrap();
    identity.login().await.unwrap();

    match identity.acquire_token_silent(LOGIN_SCOPES).await {
        TokenOutcome::Acquired(token) => assert_eq!(token.secret, "interactive-token"),
        other => panic!("expected a cached token, got {other:?}"),
    }
}

#[tokio::test]
async fn test_silent_refreshes_for_new_scopes() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "write-token",
            "refresh_token": "refresh-2",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let browser = ConsentingBrowser::default();
    let mut identity = session(&server, &dir, &browser);
    identity.initialize().unwrap();
    identity.login().await.unwrap();

    let token = identity.acquire_token(INVITE_SCOPES).await.unwrap();
    assert_eq!(token.secret, "write-token");
    assert_eq!(browser.visits().len(), 1);

    let cached = TokenCache::new(dir.path())
        .load("ren@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(cached.refresh_token, "refresh-2");
}

#[tokio::test]
async fn test_interaction_required_falls_back_to_browser_once() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "AADSTS65001: consent required",
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let browser = ConsentingBrowser::default();
    let mut identity = session(&server, &dir, &browser);
    identity.initialize().unwrap();
    identity.login().await.unwrap();

    assert_eq!(
        identity.acquire_token_silent(INVITE_SCOPES).await,
        TokenOutcome::NeedsInteraction
    );

    let token = identity.acquire_token(INVITE_SCOPES).await.unwrap();
    assert_eq!(token.secret, "interactive-token");

    let visits = browser.visits();
    assert_eq!(visits.len(), 2);
    let hint = visits[1]
        .query_pairs()
        .find(|(k, _)| k == "login_hint")
        .map(|(_, v)| v.to_string());
    assert_eq!(hint.as_deref(), Some("ren@example.com"));
}

#[tokio::test]
async fn test_other_token_errors_fail_without_prompting() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: bad client",
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let browser = ConsentingBrowser::default();
    let mut identity = session(&server, &dir, &browser);
    identity.initialize().unwrap();
    identity.login().await.unwrap();

    let err = identity.acquire_token(INVITE_SCOPES).await.unwrap_err();
    assert!(matches!(err, GraphError::Auth(ref reason) if reason.contains("AADSTS7000215")));
    assert_eq!(browser.visits().len(), 1);
}

#[tokio::test]
async fn test_state_mismatch_is_rejected() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    let dir = TempDir::new().unwrap();
    let browser = ConsentingBrowser {
        tamper_state: true,
        ..ConsentingBrowser::default()
    };
    let mut identity = session(&server, &dir, &browser);
    identity.initialize().unwrap();

    let err = identity
        .acquire_token_interactive(LOGIN_SCOPES, Some(Prompt::Consent))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("state mismatch"));
    assert!(identity.account().is_none());
}

#[tokio::test]
async fn test_logout_forgets_account() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    let dir = TempDir::new().unwrap();
    let browser = ConsentingBrowser::default();
    let mut identity = session(&server, &dir, &browser);
    identity.initialize().unwrap();
    identity.login().await.unwrap();

    let forgotten = identity.logout().unwrap();
    assert_eq!(forgotten.map(|a| a.username), Some("ren@example.com".to_string()));
    assert_eq!(
        identity.acquire_token_silent(LOGIN_SCOPES).await,
        TokenOutcome::NeedsInteraction
    );
    assert!(TokenCache::new(dir.path()).first_account().unwrap().is_none());
}

#[tokio::test]
async fn test_send_invite_acquires_write_scope_then_posts() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "write-token",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/me/events"))
        .and(wiremock::matchers::header("authorization", "Bearer write-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "evt-1" })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let browser = ConsentingBrowser::default();
    let mut identity = session(&server, &dir, &browser);
    identity.initialize().unwrap();
    identity.login().await.unwrap();

    let day = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
    let invite = MeetingInvite {
        subject: "s".to_string(),
        body: "b".to_string(),
        location: "オンライン".to_string(),
        start: day.and_hms_opt(16, 0, 0).unwrap(),
        end: day.and_hms_opt(17, 0, 0).unwrap(),
        time_zone: "Asia/Tokyo".to_string(),
        attendees: Vec::new(),
    };

    let client = GraphClient::from_config(identity.config());
    let created = send_invite(&mut identity, &client, &invite).await.unwrap();
    assert_eq!(created.id, "evt-1");

    // Refresh without rotation keeps the old refresh token.
    let cached = TokenCache::new(dir.path())
        .load("ren@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(cached.refresh_token, "refresh-1");
}
