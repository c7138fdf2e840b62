#![allow(clippy::unwrap_used)]
// Integration tests for `ManagerClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netprobe_api::{Error, ManagerClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ManagerClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ManagerClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "JSESSIONID=abc123; Path=/; HttpOnly"),
        )
        .mount(server)
        .await;
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("j_username=devnetuser"))
        .and(body_string_contains("j_password=secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "JSESSIONID=abc123; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.login("devnetuser", &password("secret")).await.unwrap();
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_login_rejected_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("set-cookie", "JSESSIONID=abc123; Path=/")
                .set_body_string("Forbidden"),
        )
        .mount(&server)
        .await;

    let result = client.login("devnetuser", &password("wrong")).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("403"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_without_session_cookie() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "OTHER=1; Path=/")
                .set_body_string("<html>login</html>"),
        )
        .mount(&server)
        .await;

    let result = client.login("devnetuser", &password("secret")).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("JSESSIONID"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_non_200_success_class_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(
            ResponseTemplate::new(204).insert_header("set-cookie", "JSESSIONID=abc123; Path=/"),
        )
        .mount(&server)
        .await;

    let result = client.login("devnetuser", &password("secret")).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_cookie_set_on_redirect_hop() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("set-cookie", "JSESSIONID=redir42; Path=/; HttpOnly")
                .insert_header("location", "/welcome"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/welcome"))
        .and(header("cookie", "JSESSIONID=redir42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>welcome</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .and(header("cookie", "JSESSIONID=redir42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "host-name": "r1", "deviceId": "d1" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.login("devnetuser", &password("secret")).await.unwrap();
    assert!(client.is_authenticated());

    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn test_rejected_login_leaves_no_session_behind() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(
            ResponseTemplate::new(403).insert_header("set-cookie", "JSESSIONID=stale; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .and(header("cookie", "JSESSIONID=stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(client.login("devnetuser", &password("wrong")).await.is_err());
    assert!(!client.is_authenticated());

    let err = client.list_devices().await.unwrap_err();
    assert!(matches!(err, Error::Retrieval { status: 401, .. }));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path("/logout"))
        .and(header("cookie", "JSESSIONID=abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.login("devnetuser", &password("secret")).await.unwrap();
    client.logout().await.unwrap();
    assert!(!client.is_authenticated());
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_sends_session_cookie() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    let body = json!({
        "header": { "generatedOn": 1_700_000_000_000_u64 },
        "data": [
            { "host-name": "r1", "deviceId": "d1", "reachability": "reachable" },
            { "host-name": "r2", "deviceId": "d2", "reachability": "unreachable" }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .and(header("cookie", "JSESSIONID=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    client.login("devnetuser", &password("secret")).await.unwrap();
    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    let lines: Vec<String> = devices
        .into_summary_lines(false)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(lines, ["r1 (d1)", "r2 (d2)"]);
}

#[tokio::test]
async fn test_list_devices_failure_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let result = client.list_devices().await;

    match result {
        Err(Error::Retrieval { status, ref message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("Internal"), "unexpected message: {message}");
        }
        other => panic!("expected Retrieval error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_devices_unauthorized_is_retrieval_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_devices().await.unwrap_err();
    assert!(matches!(err, Error::Retrieval { status: 401, .. }));
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_list_devices_malformed_json() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    match client.list_devices().await {
        Err(Error::Deserialization { ref body, .. }) => {
            assert!(body.contains("not json"));
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_devices_without_data_field_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "header": {} })))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert!(devices.is_empty());
}

// ── Base path prefix ────────────────────────────────────────────────

#[tokio::test]
async fn test_base_path_prefix_is_kept_for_every_endpoint() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/vmanage", server.uri())).unwrap();
    let client = ManagerClient::new(base_url, &TransportConfig::default()).unwrap();

    Mock::given(method("POST"))
        .and(path("/vmanage/j_security_check"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "JSESSIONID=pfx; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vmanage/dataservice/device"))
        .and(header("cookie", "JSESSIONID=pfx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "host-name": "r1", "deviceId": "d1" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vmanage/logout"))
        .and(header("cookie", "JSESSIONID=pfx"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.login("devnetuser", &password("secret")).await.unwrap();
    assert_eq!(client.list_devices().await.unwrap().len(), 1);
    client.logout().await.unwrap();
    assert!(!client.is_authenticated());
}

// ── Transport tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_insecure_transport_works_end_to_end() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path("/dataservice/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "host-name": "vEdge-Cloud", "deviceId": "1.1.1.7" }]
        })))
        .mount(&server)
        .await;

    let transport = TransportConfig::default().insecure();
    let client = ManagerClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    client.login("devnetuser", &password("secret")).await.unwrap();
    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn test_unreachable_manager_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ManagerClient::new(
        Url::parse(&format!("http://{addr}")).unwrap(),
        &TransportConfig::default(),
    )
    .unwrap();

    let err = client
        .login("devnetuser", &password("secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_connect_failure());
}
