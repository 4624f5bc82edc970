mod common;

use common::{MockEngine, ScriptedReply};
use mimicnet::rotation::{HeaderRotator, Proxy, ProxyRotator, Strategy, TlsIdentifierRotator};
use mimicnet::{Auth, Client, Error, HeaderSet};
use std::sync::Arc;

fn client_with(engine: Arc<MockEngine>) -> Client {
    Client::builder().engine(engine).build().unwrap()
}

#[test]
fn test_local_engine_failure_is_a_soft_status_zero() {
    let engine = Arc::new(MockEngine::new());
    engine.route(
        "http://host.test/slow",
        ScriptedReply::soft_failure("timeout awaiting response headers"),
    );

    let client = client_with(engine.clone());
    let response = client.get("http://host.test/slow").send().unwrap();

    assert_eq!(response.status_code(), 0);
    assert_eq!(response.reason(), "timeout awaiting response headers");
    assert!(!response.ok());
    assert!(response.error_for_status().is_err());
}

#[test]
fn test_dispatch_payload_contract() {
    let engine = Arc::new(MockEngine::new());
    engine.route("https://host.test/api?q=1&page=2", ScriptedReply::status(200));

    let client = Client::builder()
        .engine(engine.clone())
        .tls_identifier("firefox_133")
        .verify(false)
        .build()
        .unwrap();
    client
        .get("https://host.test/api")
        .query("q", "1")
        .query("page", "2")
        .cookie("session", "abc")
        .send()
        .unwrap();

    let payload = &engine.recorded_requests()[0];
    assert_eq!(payload.request_method, "GET");
    assert_eq!(payload.request_url, "https://host.test/api?q=1&page=2");
    assert!(!payload.follow_redirects, "engine must never follow redirects");
    assert!(payload.insecure_skip_verify);
    assert!(!payload.force_http1);
    assert_eq!(payload.timeout_seconds, 30);
    assert_eq!(payload.tls_client_identifier.as_deref(), Some("firefox_133"));
    assert!(payload.request_body.is_none());
    assert!(!payload.is_byte_request);
    assert!(payload.is_byte_response);
    assert!(!payload.session_id.is_empty());
    assert_eq!(
        payload
            .request_cookies
            .iter()
            .map(|c| (c.name.as_str(), c.value.as_str()))
            .collect::<Vec<_>>(),
        [("session", "abc")]
    );

    // Default headers ride along and the Host header is auto-populated.
    assert_eq!(payload.headers.get("host").unwrap(), "host.test");
    assert_eq!(payload.headers.get("accept").unwrap(), "*/*");
    assert!(payload.header_order.contains(&"user-agent".to_string()));
}

#[test]
fn test_body_precedence_and_base64_transport() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/submit", ScriptedReply::status(200));

    let client = client_with(engine.clone());
    client
        .post("http://host.test/submit")
        .form([("name", "ferris"), ("lang", "rust")])
        .json(&serde_json::json!({"ignored": true}))
        .send()
        .unwrap();

    let payload = &engine.recorded_requests()[0];
    assert!(payload.is_byte_request);
    let decoded = {
        use base64::{engine::general_purpose, Engine as _};
        general_purpose::STANDARD
            .decode(payload.request_body.as_deref().unwrap())
            .unwrap()
    };
    // Form data wins over the JSON payload.
    assert_eq!(decoded, &b"name=ferris&lang=rust"[..]);
    assert_eq!(
        payload.headers.get("content-type").unwrap(),
        "application/x-www-form-urlencoded"
    );
}

#[test]
fn test_every_engine_reply_is_freed_exactly_once() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/a", ScriptedReply::redirect(302, "/b"));
    engine.route("http://host.test/b", ScriptedReply::redirect(302, "/ok"));
    engine.route("http://host.test/ok", ScriptedReply::status(200));

    let client = client_with(engine.clone());
    client.get("http://host.test/a").send().unwrap();

    let freed = engine.freed_ids();
    assert_eq!(freed.len(), 3);
    let unique: std::collections::HashSet<_> = freed.iter().collect();
    assert_eq!(unique.len(), 3, "a reply id must be freed exactly once");
}

#[test]
fn test_lifecycle_rejects_reuse_after_close() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::status(200));

    let client = client_with(engine.clone());
    let session = client.session_id();
    client.get("http://host.test/").send().unwrap();
    client.close().unwrap();

    assert!(client.is_closed());
    assert_eq!(engine.destroyed(), vec![session]);
    assert!(matches!(
        client.get("http://host.test/").send(),
        Err(Error::ClientClosed)
    ));
    assert!(matches!(client.open(), Err(Error::ClientClosed)));
    // Closing twice is harmless.
    client.close().unwrap();
}

#[test]
fn test_open_twice_is_a_usage_error() {
    let engine = Arc::new(MockEngine::new());
    let client = client_with(engine);
    client.open().unwrap();
    assert!(matches!(client.open(), Err(Error::AlreadyOpened)));
}

#[test]
fn test_request_hooks_run_in_order_and_may_mutate() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::status(200));

    let client = Client::builder()
        .engine(engine.clone())
        .request_hook(|request| request.headers_mut().insert("x-trace", "first"))
        .request_hook(|request| request.headers_mut().insert("x-trace", "second"))
        .build()
        .unwrap();
    client.get("http://host.test/").send().unwrap();

    let payload = &engine.recorded_requests()[0];
    assert_eq!(payload.headers.get("x-trace").unwrap(), "second");
}

#[test]
fn test_request_hook_error_aborts_send() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::builder()
        .engine(engine.clone())
        .request_hook(|_| Err(Error::RemoteProtocol("rejected by hook".to_string())))
        .build()
        .unwrap();

    assert!(client.get("http://host.test/").send().is_err());
    assert!(engine.recorded_requests().is_empty());
}

#[test]
fn test_response_hooks_observe_the_response() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::ok_with_body("payload"));

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let client = Client::builder()
        .engine(engine.clone())
        .response_hook(move |response| {
            recorder.lock().unwrap().push(response.status_code());
            Ok(())
        })
        .build()
        .unwrap();
    client.get("http://host.test/").send().unwrap();

    assert_eq!(*seen.lock().unwrap(), [200]);
}

#[test]
fn test_basic_auth_sets_authorization_header() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::status(200));

    let client = client_with(engine.clone());
    client
        .get("http://host.test/")
        .auth(Auth::basic("user", "pass"))
        .send()
        .unwrap();

    let payload = &engine.recorded_requests()[0];
    assert_eq!(
        payload.headers.get("authorization").unwrap(),
        "Basic dXNlcjpwYXNz"
    );
}

#[test]
fn test_per_call_overrides_do_not_mutate_client_defaults() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::status(200));

    let client = Client::builder()
        .engine(engine.clone())
        .cookie("base", "1")
        .param("api", "v1")
        .build()
        .unwrap();

    client
        .get("http://host.test/")
        .cookie("extra", "2")
        .query("page", "9")
        .send()
        .unwrap();
    client.get("http://host.test/").send().unwrap();

    let requests = engine.recorded_requests();
    let second = &requests[1];
    assert_eq!(second.request_url, "http://host.test/?api=v1");
    assert_eq!(
        second
            .request_cookies
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>(),
        ["base"]
    );
}

#[test]
fn test_proxy_rotator_receives_feedback_from_send() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/good", ScriptedReply::status(200));
    engine.route("http://host.test/bad", ScriptedReply::status(500));

    let rotator = Arc::new(ProxyRotator::with_strategy(
        vec![Proxy::parse("10.0.0.1:8080").unwrap()],
        Strategy::Weighted,
    ));
    let client = Client::builder()
        .engine(engine.clone())
        .proxy_rotator(rotator.clone())
        .build()
        .unwrap();

    client.get("http://host.test/good").send().unwrap();
    assert_eq!(
        engine.recorded_requests()[0].proxy_url,
        "http://10.0.0.1:8080"
    );
    let after_success = rotator.items()[0].clone();
    assert!((after_success.weight() - 1.05).abs() < 1e-9);
    assert!(after_success.latency().is_some());

    client.get("http://host.test/bad").send().unwrap();
    let after_failure = rotator.items()[0].clone();
    assert!(after_failure.weight() < after_success.weight());
    assert_eq!(after_failure.failures(), 1);
}

#[test]
fn test_proxy_auth_407_counts_as_failure() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::status(407));

    let rotator = Arc::new(ProxyRotator::new(vec![
        Proxy::parse("10.0.0.1:8080").unwrap()
    ]));
    let client = Client::builder()
        .engine(engine.clone())
        .proxy_rotator(rotator.clone())
        .build()
        .unwrap();
    client.get("http://host.test/").send().unwrap();

    assert_eq!(rotator.items()[0].failures(), 1);
}

#[test]
fn test_header_rotator_supplies_per_request_headers() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::status(200));

    let template =
        HeaderSet::from_pairs([("accept", "text/html"), ("user-agent", "Rotated/1.0")]).unwrap();
    let client = Client::builder()
        .engine(engine.clone())
        .header_rotator(HeaderRotator::new(vec![template]))
        .build()
        .unwrap();
    client.get("http://host.test/").send().unwrap();

    let payload = &engine.recorded_requests()[0];
    assert_eq!(payload.headers.get("user-agent").unwrap(), "Rotated/1.0");
    assert_eq!(payload.headers.get("accept").unwrap(), "text/html");
}

#[test]
fn test_tls_identifier_rotator_cycles_identities() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::status(200));

    let rotator =
        TlsIdentifierRotator::new(vec!["chrome_133".to_string(), "firefox_133".to_string()]);
    let client = Client::builder()
        .engine(engine.clone())
        .tls_identifier_rotator(rotator)
        .build()
        .unwrap();

    client.get("http://host.test/").send().unwrap();
    client.get("http://host.test/").send().unwrap();
    client.get("http://host.test/").send().unwrap();

    let identifiers: Vec<String> = engine
        .recorded_requests()
        .iter()
        .map(|r| r.tls_client_identifier.clone().unwrap())
        .collect();
    assert_eq!(identifiers, ["chrome_133", "firefox_133", "chrome_133"]);
}

#[test]
fn test_response_text_uses_declared_charset() {
    let engine = Arc::new(MockEngine::new());
    engine.route(
        "http://host.test/latin",
        ScriptedReply::ok_with_body("cafe latte").header(
            "Content-Type",
            "text/plain; charset=iso-8859-1",
        ),
    );

    let client = client_with(engine.clone());
    let response = client.get("http://host.test/latin").send().unwrap();
    assert_eq!(response.charset().as_deref(), Some("iso-8859-1"));
    assert_eq!(response.text(), "cafe latte");
}

#[tokio::test]
async fn test_async_client_basic_flow() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::ok_with_body("async body"));

    let client = mimicnet::AsyncClient::builder()
        .engine(engine.clone())
        .build_async()
        .unwrap();
    let response = client.get("http://host.test/").send().await.unwrap();
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "async body");

    client.close().await.unwrap();
    assert!(client.is_closed());
    assert!(matches!(
        client.get("http://host.test/").send().await,
        Err(Error::ClientClosed)
    ));
}

#[tokio::test]
async fn test_async_client_with_rotators() {
    let engine = Arc::new(MockEngine::new());
    engine.route("http://host.test/", ScriptedReply::status(200));

    let client = mimicnet::AsyncClient::builder()
        .engine(engine.clone())
        .proxy_rotator(ProxyRotator::new(vec![
            Proxy::parse("10.0.0.1:8080").unwrap()
        ]))
        .tls_identifier_rotator(TlsIdentifierRotator::default())
        .build_async()
        .unwrap();

    let response = client.get("http://host.test/").send().await.unwrap();
    assert_eq!(response.status_code(), 200);

    let payload = &engine.recorded_requests()[0];
    assert_eq!(payload.proxy_url, "http://10.0.0.1:8080");
    assert!(payload.tls_client_identifier.is_some());
}
