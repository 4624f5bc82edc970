use mimicnet::rotation::{HeaderRotator, Proxy, ProxyRotator, Strategy, TlsIdentifierRotator};
use mimicnet::Error;
use std::io::Write;

fn proxies(urls: &[&str]) -> Vec<Proxy> {
    urls.iter().map(|u| Proxy::parse(u).unwrap()).collect()
}

#[test]
fn test_round_robin_visits_each_item_twice_over_two_laps() {
    let pool = proxies(&["10.0.0.1:1", "10.0.0.2:2", "10.0.0.3:3"]);
    let rotator = ProxyRotator::with_strategy(pool.clone(), Strategy::RoundRobin);

    let drawn: Vec<String> = (0..6).map(|_| rotator.next().unwrap().url()).collect();
    let expected: Vec<String> = pool.iter().chain(pool.iter()).map(|p| p.url()).collect();
    assert_eq!(drawn, expected);
}

#[test]
fn test_next_on_empty_rotator_fails() {
    let rotator = ProxyRotator::new(Vec::new());
    assert!(matches!(rotator.next(), Err(Error::EmptyRotator)));
}

#[tokio::test]
async fn test_anext_on_empty_rotator_fails() {
    let rotator = ProxyRotator::new(Vec::new());
    assert!(matches!(rotator.anext().await, Err(Error::EmptyRotator)));
}

#[test]
fn test_proxy_rotator_from_file_defaults_to_random() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# fleet A").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "10.0.0.1:3128|2.0|us-east").unwrap();
    writeln!(file, "10.0.0.2:3128  # inline comment").unwrap();

    let rotator = ProxyRotator::from_file(file.path()).unwrap();
    assert_eq!(rotator.strategy(), Strategy::Random);
    assert_eq!(rotator.len(), 2);

    let first = &rotator.items()[0];
    assert_eq!(first.weight(), 2.0);
    assert_eq!(first.region(), Some("us-east"));
}

#[test]
fn test_proxy_rotator_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proxies.json");
    std::fs::write(
        &path,
        r#"[
            {"url": "10.0.0.1:3128", "weight": 3.5, "region": "eu"},
            {"url": "socks5://10.0.0.2:1080"},
            {"weight": 1.0},
            "10.0.0.3:8080|0.5"
        ]"#,
    )
    .unwrap();

    let rotator = ProxyRotator::from_file(&path).unwrap();
    // The entry without a `url` key is silently dropped.
    assert_eq!(rotator.len(), 3);
    assert_eq!(rotator.items()[0].weight(), 3.5);
    assert_eq!(rotator.items()[2].weight(), 0.5);
}

#[test]
fn test_tls_identifier_rotator_defaults_to_round_robin() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "chrome_133").unwrap();
    writeln!(file, "firefox_133").unwrap();

    let rotator = TlsIdentifierRotator::from_file(file.path()).unwrap();
    assert_eq!(rotator.strategy(), Strategy::RoundRobin);
    assert_eq!(rotator.next().unwrap(), "chrome_133");
    assert_eq!(rotator.next().unwrap(), "firefox_133");
    assert_eq!(rotator.next().unwrap(), "chrome_133");
}

#[test]
fn test_header_rotator_from_file_defaults_to_random() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headers.json");
    std::fs::write(
        &path,
        r#"[
            {"accept": "application/json", "user-agent": "Bot/1.0"},
            {"accept": "*/*", "user-agent": "Mobile/1.0"},
            "not-a-template"
        ]"#,
    )
    .unwrap();

    let rotator = HeaderRotator::from_file(&path).unwrap();
    assert_eq!(rotator.strategy(), Strategy::Random);
    assert_eq!(rotator.len(), 2);
}

#[test]
fn test_header_rotator_user_agent_override_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headers.json");
    std::fs::write(&path, r#"[{"accept": "*/*", "user-agent": "Template/1.0"}]"#).unwrap();
    let rotator = HeaderRotator::from_file(&path).unwrap();

    let overridden = rotator.next(Some("Custom/2.0")).unwrap();
    assert_eq!(overridden.get("user-agent").unwrap(), "Custom/2.0");

    // The stored template is untouched by the override.
    let plain = rotator.next(None).unwrap();
    assert_eq!(plain.get("user-agent").unwrap(), "Template/1.0");
}

#[tokio::test]
async fn test_header_rotator_async_override() {
    let rotator = HeaderRotator::default();
    let drawn = rotator.anext(Some("Async/1.0")).await.unwrap();
    assert_eq!(drawn.get("user-agent").unwrap(), "Async/1.0");
}

#[test]
fn test_weighted_sampling_tracks_weight_ordering() {
    let mut pool = proxies(&["10.0.0.1:1", "10.0.0.2:2", "10.0.0.3:3"]);
    pool[0].set_weight(1.0);
    pool[1].set_weight(2.0);
    pool[2].set_weight(3.0);
    let heavy = pool[2].url();
    let light = pool[0].url();

    let rotator = ProxyRotator::with_strategy(pool, Strategy::Weighted);
    let mut counts: std::collections::HashMap<String, usize> = Default::default();
    for _ in 0..300 {
        *counts.entry(rotator.next().unwrap().url()).or_default() += 1;
    }
    assert!(
        counts.get(&heavy).copied().unwrap_or(0) > counts.get(&light).copied().unwrap_or(0),
        "heaviest proxy should be drawn more often: {counts:?}"
    );
}

#[test]
fn test_weighted_sampler_rebuilds_after_mark_result() {
    let pool = proxies(&["10.0.0.1:1", "10.0.0.2:2"]);
    let starved = pool[0].clone();
    let favored = pool[1].clone();
    let rotator = ProxyRotator::with_strategy(pool, Strategy::Weighted);

    // Push the weights to their bounds through feedback alone.
    for _ in 0..50 {
        rotator.mark_result(&starved, false, None);
        rotator.mark_result(&favored, true, None);
    }
    assert_eq!(rotator.items()[0].weight(), 0.1);
    assert_eq!(rotator.items()[1].weight(), 10.0);

    let mut favored_count = 0;
    for _ in 0..200 {
        if rotator.next().unwrap() == favored {
            favored_count += 1;
        }
    }
    assert!(
        favored_count > 150,
        "favored proxy drawn only {favored_count}/200 times"
    );
}

#[tokio::test]
async fn test_async_add_remove_and_mark() {
    let rotator = ProxyRotator::with_strategy(Vec::new(), Strategy::RoundRobin);
    let proxy = Proxy::parse("10.0.0.1:8080").unwrap();
    rotator.aadd(proxy.clone()).await;
    assert_eq!(rotator.anext().await.unwrap(), proxy);

    rotator.amark_result(&proxy, false, None).await;
    assert_eq!(rotator.aitems().await[0].failures(), 1);

    rotator.aremove(&proxy).await;
    assert!(matches!(rotator.anext().await, Err(Error::EmptyRotator)));
}

#[test]
fn test_missing_source_file_is_an_error() {
    assert!(ProxyRotator::from_file("/nonexistent/proxies.txt").is_err());
}

#[test]
fn test_json_source_must_be_an_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"url": "10.0.0.1:1"}"#).unwrap();
    assert!(matches!(
        ProxyRotator::from_file(&path),
        Err(Error::RotatorSource(_))
    ));
}
