//! In-process phpIPAM double for tests

use crate::client::ApiClient;
use crate::config::Config;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const APP: &str = "netops";
const PREFIX: &str = "/api/netops/";

/// Hands out subnet IDs 101, 102, ... and CIDRs 10.0.1.0/24, 10.0.2.0/24, ...
struct Allocator {
    calls: AtomicU64,
    fail_at: Option<u64>,
}

impl Respond for Allocator {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(n) == self.fail_at {
            return ResponseTemplate::new(200).set_body_json(json!({
                "code": 409, "success": false, "message": "No subnets found"
            }));
        }
        ResponseTemplate::new(201).set_body_json(json!({
            "code": 201,
            "success": true,
            "id": 100 + n,
            "data": format!("10.0.{n}.0/24"),
        }))
    }
}

pub struct MockIpam {
    pub server: MockServer,
    pub client: ApiClient,
}

impl MockIpam {
    pub async fn start() -> Self {
        Self::with_failure(None).await
    }

    /// The `n`th subnet request (1-based) answers with code 409.
    pub async fn start_failing_at(n: u64) -> Self {
        Self::with_failure(Some(n)).await
    }

    async fn with_failure(fail_at: Option<u64>) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/api/netops/subnets/\d+/(first|last)_subnet/\d+/$"))
            .respond_with(Allocator {
                calls: AtomicU64::new(0),
                fail_at,
            })
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/netops/addresses/first_free/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "code": 201, "success": true, "id": "900", "data": "10.0.1.1"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/api/netops/tools/nameservers/\d+/$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "success": true,
                "data": {"id": "3", "name": "AWS resolvers", "namesrv1": "10.10.0.2;10.20.0.2"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/api/netops/subnets/\d+/$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "success": true,
                "data": {"id": "76", "subnet": "10.64.0.0", "mask": "12", "description": "eu-west-1"}
            })))
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/api/{APP}", server.uri()), "test-token");
        Self { server, client }
    }

    pub fn config(&self) -> Config {
        Config {
            server: self.server.uri(),
            token: "test-token".into(),
            appid: APP.into(),
            regions: BTreeMap::new(),
        }
    }

    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    pub async fn total_calls(&self) -> usize {
        self.requests().await.len()
    }

    /// `(path relative to the API root, description)` of each subnet request
    pub async fn subnet_calls(&self) -> Vec<(String, String)> {
        self.subnet_requests()
            .await
            .into_iter()
            .map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                let path = r.url.path().trim_start_matches(PREFIX).to_string();
                (path, body["description"].as_str().unwrap_or_default().to_string())
            })
            .collect()
    }

    pub async fn subnet_body(&self, index: usize) -> serde_json::Value {
        let requests = self.subnet_requests().await;
        serde_json::from_slice(&requests[index].body).unwrap()
    }

    pub async fn address_calls(&self) -> usize {
        self.requests()
            .await
            .iter()
            .filter(|r| r.url.path().ends_with("/addresses/first_free/"))
            .count()
    }

    async fn subnet_requests(&self) -> Vec<Request> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method.as_str() == "POST" && r.url.path().contains("_subnet/"))
            .collect()
    }
}
