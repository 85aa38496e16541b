#[cfg(test)]
pub mod mock {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use reqwest::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
    use reqwest::{Method, Response};
    use serde_json::Value;

    use crate::api::client::{ApiClient, Transport};
    use crate::error::ApiError;
    use crate::session::{MemoryStore, SessionManager};

    pub const GET: Method = Method::GET;
    pub const POST: Method = Method::POST;
    pub const PUT: Method = Method::PUT;
    pub const DELETE: Method = Method::DELETE;

    const BASE: &str = "http://mock.local/api";

    /// In-process backend. Routes match in registration order; a route with
    /// `times` stops matching once used up.
    #[derive(Clone, Default)]
    pub struct MockServer {
        inner: Arc<Mutex<Inner>>,
    }

    #[derive(Default)]
    struct Inner {
        routes: Vec<Route>,
        requests: Vec<RecordedRequest>,
    }

    struct Route {
        method: Method,
        path: String,
        bearer: Option<String>,
        query: Vec<(String, String)>,
        remaining: Option<usize>,
        status: u16,
        body: Option<Value>,
        yields: usize,
    }

    impl Route {
        fn matches(&self, request: &RecordedRequest) -> bool {
            self.remaining != Some(0)
                && self.method == request.method
                && self.path == request.path
                && self
                    .bearer
                    .as_ref()
                    .map_or(true, |t| request.bearer() == Some(t.as_str()))
                && self
                    .query
                    .iter()
                    .all(|pair| request.query.iter().any(|q| q == pair))
        }
    }

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: Method,
        pub path: String,
        pub query: Vec<(String, String)>,
        pub authorization: Option<String>,
        pub content_type: Option<String>,
        pub body: Option<Vec<u8>>,
    }

    impl RecordedRequest {
        pub fn bearer(&self) -> Option<&str> {
            self.authorization
                .as_deref()
                .and_then(|v| v.strip_prefix("Bearer "))
        }

        pub fn json(&self) -> Option<Value> {
            self.body
                .as_ref()
                .and_then(|b| serde_json::from_slice(b).ok())
        }
    }

    impl MockServer {
        pub fn start() -> Self {
            Self::default()
        }

        pub fn base_url(&self) -> String {
            BASE.to_string()
        }

        /// A client wired to this server with an empty in-memory session.
        pub fn client(&self) -> ApiClient {
            self.client_with_session(Arc::new(SessionManager::new(Arc::new(MemoryStore::new()))))
        }

        pub fn client_with_session(&self, session: Arc<SessionManager>) -> ApiClient {
            ApiClient::new_with_base_url(self.base_url())
                .with_transport(Arc::new(self.clone()))
                .with_session(session)
        }

        pub fn mock<F>(&self, f: F)
        where
            F: FnOnce(&mut When, &mut Then),
        {
            let mut when = When::default();
            let mut then = Then::default();
            f(&mut when, &mut then);

            let route = Route {
                method: when.method.expect("mock requires method"),
                path: when.path.expect("mock requires path"),
                bearer: when.bearer,
                query: when.query,
                remaining: when.times,
                status: then.status.unwrap_or(200),
                body: then.body,
                yields: then.yields,
            };
            self.inner.lock().expect("mock lock").routes.push(route);
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.inner.lock().expect("mock lock").requests.clone()
        }

        pub fn hits(&self, method: Method, path: &str) -> usize {
            self.requests()
                .iter()
                .filter(|r| r.method == method && r.path == path)
                .count()
        }

        pub fn last_request(&self, method: Method, path: &str) -> RecordedRequest {
            self.requests()
                .into_iter()
                .rev()
                .find(|r| r.method == method && r.path == path)
                .unwrap_or_else(|| panic!("no request for {} {}", method, path))
        }

        fn record(&self, request: &reqwest::Request) -> RecordedRequest {
            let url = request.url();
            let path = url.path().to_string();
            let header = |name: HeaderName| {
                request
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            RecordedRequest {
                method: request.method().clone(),
                path,
                query: url.query_pairs().into_owned().collect(),
                authorization: header(AUTHORIZATION),
                content_type: header(CONTENT_TYPE),
                body: request
                    .body()
                    .and_then(|b| b.as_bytes())
                    .map(|b| b.to_vec()),
            }
        }
    }

    #[async_trait]
    impl Transport for MockServer {
        async fn execute(&self, request: reqwest::Request) -> Result<Response, ApiError> {
            let recorded = self.record(&request);
            let (status, body, yields) = {
                let mut inner = self
                    .inner
                    .lock()
                    .map_err(|_| ApiError::Network("mock lock".into()))?;
                inner.requests.push(recorded.clone());
                let route = inner
                    .routes
                    .iter_mut()
                    .find(|route| route.matches(&recorded))
                    .ok_or_else(|| {
                        ApiError::Network(format!(
                            "No mock for {} {}",
                            recorded.method, recorded.path
                        ))
                    })?;
                if let Some(remaining) = route.remaining.as_mut() {
                    *remaining -= 1;
                }
                (route.status, route.body.clone(), route.yields)
            };

            for _ in 0..yields {
                tokio::task::yield_now().await;
            }

            let mut builder = http::Response::builder().status(status);
            let bytes = match body {
                Some(body) => {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                    serde_json::to_vec(&body).map_err(|e| ApiError::Decode(e.to_string()))?
                }
                None => Vec::new(),
            };
            let response = builder
                .body(bytes)
                .map_err(|e| ApiError::Network(e.to_string()))?;
            Ok(Response::from(response))
        }
    }

    #[derive(Default)]
    pub struct When {
        method: Option<Method>,
        path: Option<String>,
        bearer: Option<String>,
        query: Vec<(String, String)>,
        times: Option<usize>,
    }

    impl When {
        pub fn method(&mut self, method: Method) -> &mut Self {
            self.method = Some(method);
            self
        }

        pub fn path(&mut self, path: &str) -> &mut Self {
            self.path = Some(path.to_string());
            self
        }

        pub fn bearer(&mut self, token: &str) -> &mut Self {
            self.bearer = Some(token.to_string());
            self
        }

        pub fn query_param(&mut self, name: &str, value: &str) -> &mut Self {
            self.query.push((name.to_string(), value.to_string()));
            self
        }

        pub fn times(&mut self, times: usize) -> &mut Self {
            self.times = Some(times);
            self
        }
    }

    #[derive(Default)]
    pub struct Then {
        status: Option<u16>,
        body: Option<Value>,
        yields: usize,
    }

    impl Then {
        pub fn status(&mut self, status: u16) -> &mut Self {
            self.status = Some(status);
            self
        }

        pub fn json_body(&mut self, body: Value) -> &mut Self {
            self.body = Some(body);
            self
        }

        /// Yields to the executor before answering so joined futures
        /// interleave.
        pub fn yield_first(&mut self, times: usize) -> &mut Self {
            self.yields = times;
            self
        }
    }
}
