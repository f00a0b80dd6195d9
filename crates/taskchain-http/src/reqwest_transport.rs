//! [`HttpTransport`] backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::trace;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,

    /// Time allowed for the whole request, body included.
    pub request_timeout: Duration,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("taskchain/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Transport over a `reqwest::Client`.
///
/// Redirects are never followed, so tasks can verify 3xx responses
/// themselves.
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let inner = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.inner.get(&request.url),
            Method::Post => self.inner.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await?;
        let mut received = HttpResponse::new(response.status().as_u16());
        for (name, value) in response.headers() {
            received = received.with_header(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }

        let body = response.bytes().await?;
        trace!(len = body.len(), "Response body read");
        Ok(received.with_body(body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("taskchain/"));
    }

    #[test]
    fn test_transport_builds_from_default_config() {
        assert!(ReqwestTransport::new(&HttpConfig::default()).is_ok());
    }
}
