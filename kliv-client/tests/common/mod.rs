#![allow(dead_code)]

use kliv_client::{ClientConfig, KlivClient};
use wiremock::MockServer;

/// Config pointing at `<mock>/api`.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(format!("{}/api", server.uri()))
}

pub fn client_for(server: &MockServer) -> KlivClient {
    KlivClient::new(config_for(server)).unwrap()
}

/// Query string of the `index`-th request the server received.
pub async fn query_of(server: &MockServer, index: usize) -> Option<String> {
    let requests = server.received_requests().await.unwrap_or_default();
    requests
        .get(index)
        .and_then(|r| r.url.query().map(str::to_string))
}

/// Body of the `index`-th request the server received, as text.
pub async fn body_of(server: &MockServer, index: usize) -> String {
    let requests = server.received_requests().await.unwrap_or_default();
    requests
        .get(index)
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .unwrap_or_default()
}
