use kliv_client::{with_query, ClientConfig, ClientError, KlivClient, Params, Transport};
use pretty_assertions::assert_eq;

// ── Defaults ────────────────────────────────────────────────────

#[test]
fn default_config() {
    let config = ClientConfig::default();
    assert_eq!(config.api_root, "http://localhost:8080/api");
    assert_eq!(config.timeout_secs, None);
    assert!(config.user_agent.starts_with("kliv-client/"));
    assert!(config.function_headers.is_empty());
    assert_eq!(config.upload_chunk_size, 64 * 1024);
    assert!(config.validate().is_ok());
}

#[test]
fn partial_json_fills_defaults() {
    let config: ClientConfig =
        serde_json::from_str(r#"{"api_root": "https://app.example.com/api/", "timeout_secs": 30}"#)
            .unwrap();
    assert_eq!(config.normalized_root(), "https://app.example.com/api");
    assert_eq!(config.timeout_secs, Some(30));
    assert_eq!(config.upload_chunk_size, 64 * 1024);
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn rejects_bad_roots() {
    for root in ["", "not a url", "ftp://example.com/api"] {
        let err = ClientConfig::new(root).validate().unwrap_err();
        assert!(matches!(err, ClientError::Config(_)), "accepted {root:?}");
    }
}

#[test]
fn rejects_zero_chunk_size() {
    let config = ClientConfig {
        upload_chunk_size: 0,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ClientError::Config(_))));
}

#[test]
fn rejects_invalid_function_header() {
    let mut config = ClientConfig::default();
    config
        .function_headers
        .insert("bad header".to_string(), "v".to_string());
    assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    assert!(KlivClient::new(config).is_err());
}

// ── Endpoints ───────────────────────────────────────────────────

#[test]
fn endpoint_joins_root_base_and_resource() {
    let transport = Transport::new(ClientConfig::new("https://app.example.com/api///")).unwrap();
    assert_eq!(
        transport.endpoint("/v2/database", None),
        "https://app.example.com/api/v2/database"
    );
    assert_eq!(
        transport.endpoint("/v2/database", Some("blog posts")),
        "https://app.example.com/api/v2/database/blog%20posts"
    );
    assert_eq!(
        transport.endpoint("/v2/function", Some("a/b")),
        "https://app.example.com/api/v2/function/a%2Fb"
    );
}

#[test]
fn query_is_added_only_for_present_values() {
    let url = "https://x/api/v2/database/posts";
    assert_eq!(with_query(url, None), url);
    assert_eq!(with_query(url, Some(&Params::new())), url);
    assert_eq!(
        with_query(url, Some(&Params::new().with_opt("a", None::<&str>))),
        url
    );
    assert_eq!(
        with_query(url, Some(&Params::new().with("a", "1").with("b", "x y"))),
        "https://x/api/v2/database/posts?a=1&b=x%20y"
    );
}
