use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use std::fmt;
use std::sync::Arc;

use crate::types::ServiceKind;

/// Authenticated handle bound to one Google API.
///
/// Carries the transport, the API host and a bearer token valid at the time
/// the handle was issued. Handles are cheap to clone.
#[derive(Clone)]
pub struct ServiceHandle {
    service: ServiceKind,
    api_base: String,
    access_token: String,
    http_client: Arc<dyn HttpClient>,
}

impl ServiceHandle {
    pub fn new(
        service: ServiceKind,
        access_token: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            service,
            api_base: service.api_base().to_string(),
            access_token: access_token.into(),
            http_client,
        }
    }

    /// Point the handle at another host (e.g. a local emulator).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http_client)
    }

    /// Absolute URL for an API path such as `drive/v3/files`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Request carrying the bearer token. `target` may be an API path or an
    /// absolute URL (resumable session URIs are absolute).
    pub fn request(&self, method: HttpMethod, target: &str) -> HttpRequest {
        let url = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            self.url(target)
        };
        HttpRequest::new(method, url).bearer_token(&self.access_token)
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("service", &self.service)
            .field("api_base", &self.api_base)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}
