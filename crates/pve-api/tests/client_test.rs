#![allow(clippy::unwrap_used)]
// Integration tests for `PveClient` using wiremock.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use secrecy::SecretString;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pve_api::{
    ActionResult, ConnectionConfig, Error, PveClient, Scheme, TransportConfig, VmAction,
};

// ── Helpers ─────────────────────────────────────────────────────────

const API: &str = "/api2/json";

fn api(suffix: &str) -> String {
    format!("{API}{suffix}")
}

fn config_for(server: &MockServer) -> ConnectionConfig {
    let port = Url::parse(&server.uri()).unwrap().port().unwrap();
    let secret: SecretString = "secret".to_string().into();
    ConnectionConfig::new("127.0.0.1", "root", "pam", secret, port, false)
        .unwrap()
        .with_scheme(Scheme::Http)
}

async fn setup() -> (MockServer, PveClient) {
    let server = MockServer::start().await;
    let client = PveClient::with_client(config_for(&server), reqwest::Client::new());
    (server, client)
}

async fn mount_ticket(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(api("/access/ticket")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "ticket": "T", "CSRFPreventionToken": "C", "username": "root@pam" }
        })))
        .mount(server)
        .await;
}

async fn mount_nodes(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(api("/nodes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "node": "pve1", "status": "online", "cpu": 0.05, "maxcpu": 8 },
                { "node": "pve2", "status": "online", "cpu": 0.11, "maxcpu": 16 }
            ]
        })))
        .mount(server)
        .await;
}

/// A 200 response wrapping `value` in the `data` envelope.
fn data(value: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": value }))
}

/// Mounts ticket + node listing and logs in.
async fn logged_in() -> (MockServer, PveClient) {
    let (server, client) = setup().await;
    mount_ticket(&server).await;
    mount_nodes(&server).await;
    client.login().await.unwrap();
    (server, client)
}

/// Fails the test if any request reaches the server.
async fn forbid_requests(server: &MockServer) {
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_then_get_version() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("/access/ticket")))
        .and(body_string("username=root&password=secret&realm=pam"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "ticket": "T", "CSRFPreventionToken": "C" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_nodes(&server).await;

    Mock::given(method("GET"))
        .and(path(api("/version")))
        .and(header("cookie", "PVEAuthCookie=T"))
        .respond_with(data(json!({ "version": "7.4" })))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    assert!(client.ticket_valid().await);

    let version = client.get("/version").await.unwrap();
    assert_eq!(version, json!({ "version": "7.4" }));
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("/access/ticket")))
        .respond_with(ResponseTemplate::new(401).set_body_string("authentication failure"))
        .mount(&server)
        .await;

    let result = client.login().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.ticket_valid().await);
}

#[tokio::test]
async fn test_login_without_ticket_data() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("/access/ticket")))
        .respond_with(data(json!(null)))
        .mount(&server)
        .await;

    assert!(matches!(client.login().await, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_failed_relogin_discards_ticket() {
    let (server, client) = logged_in().await;
    assert!(client.ticket_valid().await);

    server.reset().await;
    Mock::given(method("POST"))
        .and(path(api("/access/ticket")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(client.login().await.is_err());
    assert!(!client.ticket_valid().await);
}

#[tokio::test]
async fn test_login_connection_refused() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    drop(server);

    let client = PveClient::with_client(config, reqwest::Client::new());
    let result = client.login().await;
    assert!(
        matches!(result, Err(Error::Transport(_))),
        "expected Transport error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_session_info_after_login() {
    let (_server, client) = logged_in().await;

    let info = client.session_info().await.unwrap();
    assert_eq!(info.username.as_deref(), Some("root@pam"));
    assert!(info.remaining <= pve_api::TICKET_LIFETIME);
}

// ── Authorization gate ──────────────────────────────────────────────

#[tokio::test]
async fn test_get_before_login_sends_nothing() {
    let (server, client) = setup().await;
    forbid_requests(&server).await;

    let result = client.get("/version").await;
    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_every_verb_refused_without_ticket() {
    let (server, client) = setup().await;
    forbid_requests(&server).await;

    assert!(matches!(client.put("/x", &[("a", "1")]).await, Err(Error::NotAuthenticated)));
    assert!(matches!(client.post("/x", &[("a", "1")]).await, Err(Error::NotAuthenticated)));
    assert!(matches!(client.delete("/x").await, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_logout_blocks_further_calls() {
    let (_server, client) = logged_in().await;

    client.logout().await;
    assert!(!client.ticket_valid().await);
    assert!(matches!(client.get("/version").await, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_unsupported_verb_sends_nothing() {
    let (server, client) = setup().await;
    forbid_requests(&server).await;

    let result = client.request::<()>("PATCH", "/x", None).await;
    match result {
        Err(Error::UnsupportedMethod(verb)) => assert_eq!(verb, "PATCH"),
        other => panic!("expected UnsupportedMethod, got: {other:?}"),
    }
}

// ── Request executor ────────────────────────────────────────────────

#[tokio::test]
async fn test_put_returns_completed() {
    let (server, client) = logged_in().await;

    Mock::given(method("PUT"))
        .and(path(api("/nodes/pve1/qemu/100/config")))
        .and(header("cookie", "PVEAuthCookie=T"))
        .and(header("CSRFPreventionToken", "C"))
        .and(body_string("memory=2048"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ignored"))
        .expect(2)
        .mount(&server)
        .await;

    client
        .put("/nodes/pve1/qemu/100/config", &[("memory", "2048")])
        .await
        .unwrap();

    let raw = client
        .request("put", "/nodes/pve1/qemu/100/config", Some(&[("memory", "2048")]))
        .await
        .unwrap();
    assert_eq!(raw, ActionResult::Completed);
}

#[tokio::test]
async fn test_post_sends_form_and_csrf() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path(api("/nodes/pve1/qemu/100/status/start")))
        .and(header("CSRFPreventionToken", "C"))
        .and(body_string("timeout=30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": "UPID:pve1:0000A1B2:qmstart:100:root@pam:"
        })))
        .mount(&server)
        .await;

    let data = client
        .post("/nodes/pve1/qemu/100/status/start", &[("timeout", "30")])
        .await
        .unwrap();
    assert_eq!(data, json!("UPID:pve1:0000A1B2:qmstart:100:root@pam:"));
}

#[tokio::test]
async fn test_get_omits_csrf_header() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path(api("/cluster/status")))
        .respond_with(data(json!([])))
        .mount(&server)
        .await;

    client.get("/cluster/status").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let get = requests
        .iter()
        .find(|r| r.url.path() == api("/cluster/status"))
        .unwrap();
    assert!(get.headers.get("CSRFPreventionToken").is_none());
    assert_eq!(get.headers.get("cookie").unwrap(), "PVEAuthCookie=T");
}

#[tokio::test]
async fn test_delete_sends_csrf_and_returns_data() {
    let (server, client) = logged_in().await;

    Mock::given(method("DELETE"))
        .and(path(api("/nodes/pve1/qemu/100/snapshot/pre-upgrade")))
        .and(header("CSRFPreventionToken", "C"))
        .respond_with(data(json!("UPID:pve1:1:qmdelsnapshot")))
        .mount(&server)
        .await;

    let data = client
        .delete("/nodes/pve1/qemu/100/snapshot/pre-upgrade")
        .await
        .unwrap();
    assert_eq!(data, json!("UPID:pve1:1:qmdelsnapshot"));
}

#[tokio::test]
async fn test_path_without_leading_slash() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path(api("/version")))
        .respond_with(data(json!({ "version": "8.1" })))
        .mount(&server)
        .await;

    let data = client.get("version").await.unwrap();
    assert_eq!(data["version"], "8.1");
}

#[tokio::test]
async fn test_server_error_for_every_verb() {
    let (server, client) = logged_in().await;

    Mock::given(path(api("/broken")))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&server)
        .await;

    let results = [
        client.get("/broken").await.map(|_| ()),
        client.put("/broken", &[("a", "1")]).await,
        client.post("/broken", &[("a", "1")]).await.map(|_| ()),
        client.delete("/broken").await.map(|_| ()),
    ];

    for result in results {
        match result {
            Err(Error::Http { code, reason, body }) => {
                assert_eq!(code, 500);
                assert_eq!(reason, "Internal Server Error");
                assert_eq!(body, "internal failure");
            }
            other => panic!("expected Http error, got: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_non_200_success_is_http_error() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path(api("/accepted")))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    assert!(matches!(
        client.get("/accepted").await,
        Err(Error::Http { code: 202, .. })
    ));
}

#[tokio::test]
async fn test_explicit_null_data() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path(api("/nodes/pve1/qemu/100/resize")))
        .respond_with(data(json!(null)))
        .mount(&server)
        .await;

    let result = client
        .request("POST", "/nodes/pve1/qemu/100/resize", Some(&[("disk", "scsi0")]))
        .await
        .unwrap();
    assert_eq!(result, ActionResult::Data(serde_json::Value::Null));
}

#[tokio::test]
async fn test_missing_data_is_empty_payload() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path(api("/weird")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errors": {} })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/html")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    for target in ["/weird", "/html"] {
        match client.get(target).await {
            Err(Error::EmptyPayload { path }) => assert_eq!(path, target),
            other => panic!("expected EmptyPayload, got: {other:?}"),
        }
    }
}

// ── Transport-level failures ────────────────────────────────────────

const TICKET_BODY: &str = r#"{"data":{"ticket":"T","CSRFPreventionToken":"C"}}"#;
const NODES_BODY: &str = r#"{"data":[{"node":"pve1"}]}"#;

fn json_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

/// Canned reply for a request line, plus whether to hang up afterwards.
fn raw_reply(request_line: &str) -> (String, bool) {
    if request_line.contains("/api2/json/access/ticket ") {
        (json_response(TICKET_BODY), false)
    } else if request_line.contains("/api2/json/nodes ") {
        (json_response(NODES_BODY), false)
    } else if request_line.contains("/api2/json/truncated ") {
        let head = "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\n";
        (format!("{head}short"), true)
    } else {
        ("GARBAGE STATUS LINE\r\n\r\n{}".to_owned(), true)
    }
}

/// Minimal HTTP/1.1 responder that can send replies hyper refuses to parse.
async fn start_raw_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (read, mut write) = stream.into_split();
                let mut reader = BufReader::new(read);
                loop {
                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                        return;
                    }

                    let mut content_length = 0;
                    loop {
                        let mut line = String::new();
                        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                            return;
                        }
                        if line == "\r\n" {
                            break;
                        }
                        if let Some((name, value)) = line.split_once(':') {
                            if name.eq_ignore_ascii_case("content-length") {
                                content_length = value.trim().parse().unwrap();
                            }
                        }
                    }
                    let mut body = vec![0; content_length];
                    reader.read_exact(&mut body).await.unwrap();

                    let (reply, hang_up) = raw_reply(&request_line);
                    write.write_all(reply.as_bytes()).await.unwrap();
                    if hang_up {
                        return;
                    }
                }
            });
        }
    });
    port
}

/// TLS listener presenting a freshly generated self-signed certificate.
async fn start_self_signed_server() -> u16 {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_owned()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let tls = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .unwrap();
    let acceptor = tokio_rustls::TlsAcceptor::from(Arc::new(tls));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let _ = acceptor.accept(stream).await;
            });
        }
    });
    port
}

fn local_config(port: u16, verify_tls: bool) -> ConnectionConfig {
    let secret: SecretString = "secret".to_string().into();
    ConnectionConfig::new("127.0.0.1", "root", "pam", secret, port, verify_tls).unwrap()
}

#[tokio::test]
async fn test_unparsable_status_line_is_malformed_response() {
    let port = start_raw_server().await;
    let config = local_config(port, false).with_scheme(Scheme::Http);
    let client = PveClient::with_client(config, reqwest::Client::new());
    client.login().await.unwrap();

    let result = client.get("/version").await;
    assert!(
        matches!(result, Err(Error::MalformedResponse { .. })),
        "expected MalformedResponse, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unreadable_error_body_keeps_status() {
    let port = start_raw_server().await;
    let config = local_config(port, false).with_scheme(Scheme::Http);
    let client = PveClient::with_client(config, reqwest::Client::new());
    client.login().await.unwrap();

    match client.get("/truncated").await {
        Err(Error::Http { code, body, .. }) => {
            assert_eq!(code, 500);
            assert_eq!(body, "");
        }
        other => panic!("expected Http 500, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_self_signed_certificate_is_untrusted() {
    let port = start_self_signed_server().await;
    let client = PveClient::new(local_config(port, true), &TransportConfig::default()).unwrap();

    match client.login().await {
        Err(Error::UntrustedCertificate { host, .. }) => assert_eq!(host, "127.0.0.1"),
        other => panic!("expected UntrustedCertificate, got: {other:?}"),
    }
    assert!(!client.ticket_valid().await);
}

#[tokio::test]
async fn test_disabled_verification_skips_certificate_check() {
    let port = start_self_signed_server().await;
    let client = PveClient::new(local_config(port, false), &TransportConfig::default()).unwrap();

    // The listener hangs up after the handshake, so login still fails,
    // but never on the certificate.
    let result = client.login().await;
    assert!(
        !matches!(result, Err(Error::UntrustedCertificate { .. })),
        "certificate must not be checked: {result:?}"
    );
}

// ── Node inventory ──────────────────────────────────────────────────

#[tokio::test]
async fn test_node_list_loaded_on_login() {
    let (_server, client) = logged_in().await;
    assert_eq!(client.get_node_list().await.unwrap(), ["pve1", "pve2"]);
}

#[tokio::test]
async fn test_node_list_cached_after_first_load() {
    let (server, client) = setup().await;
    mount_ticket(&server).await;

    Mock::given(method("GET"))
        .and(path(api("/nodes")))
        .respond_with(data(json!([{ "node": "pve1" }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/version")))
        .respond_with(data(json!({})))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    client.get("/version").await.unwrap();
    client.get("/version").await.unwrap();
    assert_eq!(client.get_node_list().await.unwrap(), ["pve1"]);
}

#[tokio::test]
async fn test_reload_replaces_inventory() {
    let (server, client) = logged_in().await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path(api("/nodes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "node": "pve3" }, { "node": "pve1" }]
        })))
        .mount(&server)
        .await;

    client.reload_node_list().await.unwrap();
    assert_eq!(client.get_node_list().await.unwrap(), ["pve3", "pve1"]);
}

#[tokio::test]
async fn test_empty_node_list_leaves_cache_unset() {
    let (server, client) = setup().await;
    mount_ticket(&server).await;

    Mock::given(method("GET"))
        .and(path(api("/nodes")))
        .respond_with(data(json!([])))
        .mount(&server)
        .await;

    // Login itself succeeds; the empty listing is only logged.
    client.login().await.unwrap();
    assert!(matches!(client.get_node_list().await, Err(Error::EmptyNodeList)));
    assert!(matches!(client.get("/version").await, Err(Error::EmptyNodeList)));
}

#[tokio::test]
async fn test_list_nodes_summaries() {
    let (_server, client) = logged_in().await;

    let nodes = client.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].node, "pve2");
    assert_eq!(nodes[1].maxcpu, Some(16));
}

// ── VM helpers ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_vm_action_returns_upid() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path(api("/nodes/pve1/qemu/100/status/shutdown")))
        .and(header("CSRFPreventionToken", "C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": "UPID:pve1:00001234:qmshutdown:100:root@pam:"
        })))
        .mount(&server)
        .await;

    let upid = client.vm_action("pve1", 100, VmAction::Shutdown).await.unwrap();
    assert_eq!(upid, "UPID:pve1:00001234:qmshutdown:100:root@pam:");
}

#[tokio::test]
async fn test_list_vms() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path(api("/nodes/pve1/qemu")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "vmid": 100, "name": "web", "status": "running", "cpus": 2,
                  "maxmem": 2_147_483_648_u64 },
                { "vmid": "101", "status": "stopped", "template": 1 }
            ]
        })))
        .mount(&server)
        .await;

    let vms = client.list_vms("pve1").await.unwrap();
    assert_eq!(vms.len(), 2);
    assert_eq!(vms[0].name.as_deref(), Some("web"));
    assert_eq!(vms[1].vmid, 101);
    assert_eq!(vms[1].template, Some(1));
}

#[tokio::test]
async fn test_clone_vm_form() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path(api("/nodes/pve1/qemu/9000/clone")))
        .and(body_string("newid=105&name=web-02&full=1"))
        .respond_with(data(json!("UPID:pve1:2:qmclone")))
        .mount(&server)
        .await;

    let upid = client
        .clone_vm("pve1", 9000, 105, Some("web-02"), true)
        .await
        .unwrap();
    assert_eq!(upid, "UPID:pve1:2:qmclone");
}

#[tokio::test]
async fn test_snapshot_lifecycle() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path(api("/nodes/pve1/qemu/100/snapshot")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "name": "pre-upgrade", "description": "before 8.x",
                  "snaptime": 1_700_000_000, "vmstate": 0 },
                { "name": "current", "parent": "pre-upgrade", "description": "You are here!" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("/nodes/pve1/qemu/100/snapshot")))
        .and(body_string("snapname=nightly&description=auto"))
        .respond_with(data(json!("UPID:pve1:3:qmsnapshot")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("/nodes/pve1/qemu/100/snapshot/nightly/rollback")))
        .respond_with(data(json!("UPID:pve1:4:qmrollback")))
        .mount(&server)
        .await;

    let snaps = client.list_snapshots("pve1", 100).await.unwrap();
    assert_eq!(snaps[0].snaptime, Some(1_700_000_000));
    assert_eq!(snaps[1].parent.as_deref(), Some("pre-upgrade"));

    let created = client
        .create_snapshot("pve1", 100, "nightly", Some("auto"))
        .await
        .unwrap();
    assert_eq!(created, "UPID:pve1:3:qmsnapshot");

    let rolled = client.rollback_snapshot("pve1", 100, "nightly").await.unwrap();
    assert_eq!(rolled, "UPID:pve1:4:qmrollback");
}

#[tokio::test]
async fn test_next_vmid_from_string() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path(api("/cluster/nextid")))
        .respond_with(data(json!("105")))
        .mount(&server)
        .await;

    assert_eq!(client.next_vmid().await.unwrap(), 105);
}

#[tokio::test]
async fn test_task_status() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path(api("/nodes/pve1/tasks/UPID:pve1:5:qmstart/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "upid": "UPID:pve1:5:qmstart", "node": "pve1", "status": "stopped",
                "exitstatus": "OK", "type": "qmstart", "user": "root@pam",
                "starttime": 1_700_000_100
            }
        })))
        .mount(&server)
        .await;

    let task = client.task_status("pve1", "UPID:pve1:5:qmstart").await.unwrap();
    assert!(task.succeeded());
    assert_eq!(task.task_type, "qmstart");
}
