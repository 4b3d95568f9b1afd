//! Shared test fixtures: a canned transport and token/store helpers.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use aquadesk::clients::backend::{ApiError, ApiRequest, ApiResponse, Transport};
use aquadesk::session::SessionStore;

#[derive(Clone)]
struct Route {
    method: String,
    path_prefix: String,
    status: u16,
    body: Value,
    delay: Duration,
    once: bool,
}

/// Transport that serves canned responses. `route` entries persist;
/// `route_once` entries are consumed ahead of them, which lets a test
/// model "the response changed between two overlapping refreshes".
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, method: &str, path_prefix: &str, status: u16, body: Value) {
        self.push(method, path_prefix, status, body, Duration::ZERO, false);
    }

    pub fn route_once_delayed(
        &self,
        method: &str,
        path_prefix: &str,
        status: u16,
        body: Value,
        delay: Duration,
    ) {
        self.push(method, path_prefix, status, body, delay, true);
    }

    fn push(
        &self,
        method: &str,
        path_prefix: &str,
        status: u16,
        body: Value,
        delay: Duration,
        once: bool,
    ) {
        self.routes.lock().unwrap().push(Route {
            method: method.to_string(),
            path_prefix: path_prefix.to_string(),
            status,
            body,
            delay,
            once,
        });
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, req: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((req.method.to_string(), req.path.clone()));

        let matched = {
            let mut routes = self.routes.lock().unwrap();
            let index = routes
                .iter()
                .enumerate()
                // once-routes win over persistent ones for the same path
                .filter(|(_, r)| {
                    r.method.eq_ignore_ascii_case(req.method.as_str())
                        && req.path.starts_with(&r.path_prefix)
                })
                .max_by_key(|(_, r)| u8::from(r.once))
                .map(|(i, _)| i);

            index.map(|i| {
                let route = routes[i].clone();
                if route.once {
                    routes.remove(i);
                }
                route
            })
        };

        let Some(route) = matched else {
            return Ok(ApiResponse {
                status: 404,
                body: json!({ "message": format!("no mock route for {}", req.path) }),
            });
        };

        if route.delay > Duration::ZERO {
            tokio::time::sleep(route.delay).await;
        }

        Ok(ApiResponse {
            status: route.status,
            body: route.body,
        })
    }
}

/// Unsigned JWT carrying only an `exp` claim.
pub fn token_with_exp(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"test","exp":{exp}}}"#));
    format!("{header}.{payload}.sig")
}

/// Token with an exp far enough out that no test ever hits it.
pub fn long_lived_token() -> String {
    token_with_exp(chrono::Utc::now().timestamp() + 3600)
}

pub fn temp_store() -> SessionStore {
    let path = std::env::temp_dir()
        .join(format!("aquadesk-test-{}", uuid::Uuid::new_v4()))
        .join("session.json");
    SessionStore::new(path)
}

pub fn cashier_json() -> Value {
    json!({
        "id": "u-7",
        "name": "Ana Reyes",
        "email": "ana@example.com",
        "role": "cashier",
        "deviceApproved": true
    })
}

pub fn login_ok_body(token: &str) -> Value {
    json!({ "data": { "token": token, "user": cashier_json() } })
}
