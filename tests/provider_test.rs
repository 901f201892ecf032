mod common;

use common::*;
use plain_oidc::prelude::*;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DISCOVERY_PATH: &str = "/oauth2/default/.well-known/openid-configuration";

fn issuer(server: &MockServer) -> String {
    format!("{}/oauth2/default", server.uri())
}

fn discovery_document(issuer: &str) -> serde_json::Value {
    json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/v1/authorize"),
        "token_endpoint": format!("{issuer}/v1/token"),
        "jwks_uri": format!("{issuer}/v1/keys"),
        "end_session_endpoint": format!("{issuer}/v1/logout"),
        "response_types_supported": ["code"],
    })
}

fn client() -> ProviderClient {
    ProviderClient::new(Duration::from_secs(10)).unwrap()
}

fn token_request() -> TokenRequest<'static> {
    TokenRequest {
        grant_type: "authorization_code",
        code: "auth-code",
        redirect_uri: "http://localhost:8080/authorization-code/callback",
        client_id: CLIENT_ID,
        client_secret: CLIENT_SECRET,
    }
}

#[tokio::test]
async fn discovery_fetches_the_well_known_document() {
    init_tracing();
    let server = MockServer::start().await;
    let issuer = issuer(&server);
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document(&issuer)))
        .expect(1)
        .mount(&server)
        .await;

    let document = client().discover(&issuer).await.unwrap();
    assert_eq!(document.issuer, issuer);
    assert_eq!(document.jwks_uri.as_str(), format!("{issuer}/v1/keys"));
    assert_eq!(
        document.end_session_endpoint.map(|u| u.to_string()),
        Some(format!("{issuer}/v1/logout"))
    );
}

#[tokio::test]
async fn discovery_failures_are_malformed_responses() {
    let server = MockServer::start().await;
    let issuer = issuer(&server);

    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let err = client().discover(&issuer).await.unwrap_err();
    assert!(matches!(&err, OidcError::MalformedResponse(msg) if msg.contains("404")), "{err}");

    server.reset().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    assert!(matches!(
        client().discover(&issuer).await,
        Err(OidcError::MalformedResponse(_))
    ));

    server.reset().await;
    let mut incomplete = discovery_document(&issuer);
    incomplete.as_object_mut().unwrap().remove("token_endpoint");
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(incomplete))
        .mount(&server)
        .await;
    assert!(matches!(
        client().discover(&issuer).await,
        Err(OidcError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn unreachable_provider_is_a_network_error() {
    // Bind and immediately release a port so nothing listens on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let result = client().discover(&format!("http://127.0.0.1:{port}")).await;
    assert!(matches!(result, Err(OidcError::Network(_))));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    let issuer = issuer(&server);
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(discovery_document(&issuer))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let impatient = ProviderClient::new(Duration::from_millis(200)).unwrap();
    let result = impatient.discover(&issuer).await;
    assert!(matches!(&result, Err(OidcError::Network(e)) if e.is_timeout()), "{result:?}");
}

#[tokio::test]
async fn jwks_fetch_preserves_key_order() {
    let server = MockServer::start().await;
    let jwks = json!({
        "keys": [
            { "kty": "EC", "kid": "ec", "crv": "P-256", "x": "AA", "y": "AA" },
            rsa_jwk(OTHER_KEY_PEM, Some("k0")),
            rsa_jwk(SIGNING_KEY_PEM, Some("k1")),
        ]
    });
    Mock::given(method("GET"))
        .and(path("/v1/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
        .mount(&server)
        .await;

    let uri = Url::parse(&format!("{}/v1/keys", server.uri())).unwrap();
    let keys = client().fetch_keys(&uri).await.unwrap();
    let kids: Vec<_> = keys.keys.iter().map(|k| k.kid.as_deref()).collect();
    assert_eq!(kids, vec![Some("ec"), Some("k0"), Some("k1")]);
}

#[tokio::test]
async fn jwks_failures_are_malformed_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/keys"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/no-keys-member"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let uri = Url::parse(&format!("{}/v1/keys", server.uri())).unwrap();
    assert!(matches!(client().fetch_keys(&uri).await, Err(OidcError::MalformedResponse(_))));

    let uri = Url::parse(&format!("{}/v1/no-keys-member", server.uri())).unwrap();
    assert!(matches!(client().fetch_keys(&uri).await, Err(OidcError::MalformedResponse(_))));
}

#[tokio::test]
async fn code_exchange_posts_the_expected_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauthorization-code%2Fcallback",
        ))
        .and(body_string_contains("client_id=abc123"))
        .and(body_string_contains("client_secret=test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at",
            "id_token": "a.b.c",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = Url::parse(&format!("{}/v1/token", server.uri())).unwrap();
    let tokens = client().exchange_code(&endpoint, &token_request()).await.unwrap();
    assert_eq!(tokens.id_token.as_deref(), Some("a.b.c"));
    assert_eq!(tokens.token_type.as_deref(), Some("Bearer"));
    assert_eq!(tokens.expires_in, Some(3600));
}

#[tokio::test]
async fn code_exchange_failures() {
    let server = MockServer::start().await;
    let endpoint = Url::parse(&format!("{}/v1/token", server.uri())).unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("{\"error\":\"invalid_grant\"}"))
        .mount(&server)
        .await;
    let err = client().exchange_code(&endpoint, &token_request()).await.unwrap_err();
    assert!(matches!(&err, OidcError::TokenExchange(msg) if msg.contains("400") && msg.contains("invalid_grant")), "{err}");

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Client authentication failed",
        })))
        .mount(&server)
        .await;
    let err = client().exchange_code(&endpoint, &token_request()).await.unwrap_err();
    assert!(matches!(&err, OidcError::TokenExchange(msg) if msg == "invalid_client - Client authentication failed"), "{err}");

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    assert!(matches!(
        client().exchange_code(&endpoint, &token_request()).await,
        Err(OidcError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn cached_provider_fetches_once_per_ttl() {
    let server = MockServer::start().await;
    let issuer = issuer(&server);
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document(&issuer)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth2/default/v1/keys"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "keys": [rsa_jwk(SIGNING_KEY_PEM, Some("k1"))] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cached = CachedProvider::new(client(), Duration::from_secs(300));

    let first = cached.discover(&issuer).await.unwrap();
    let second = cached.discover(&issuer).await.unwrap();
    assert_eq!(first, second);

    let keys_a = cached.fetch_keys(&first.jwks_uri).await.unwrap();
    let keys_b = cached.fetch_keys(&first.jwks_uri).await.unwrap();
    assert_eq!(keys_a, keys_b);

    cached.invalidate_all();
    cached.discover(&issuer).await.unwrap();
}

#[tokio::test]
async fn cached_provider_does_not_cache_failures() {
    let server = MockServer::start().await;
    let issuer = issuer(&server);
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document(&issuer)))
        .mount(&server)
        .await;

    let cached = CachedProvider::new(client(), Duration::from_secs(300));
    assert!(cached.discover(&issuer).await.is_err());
    assert!(cached.discover(&issuer).await.is_ok());
}
