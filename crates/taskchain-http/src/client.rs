//! Request building on top of an [`HttpTransport`].

use std::sync::Arc;

use taskchain_core::TaskExecutionFailed;
use tracing::debug;

use crate::error::TransportError;
use crate::reqwest_transport::{HttpConfig, ReqwestTransport};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};

type ResponseHandler = Box<dyn FnOnce(&HttpResponse) -> Result<(), TaskExecutionFailed> + Send>;

/// HTTP client handed to tasks.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
}

impl HttpClient {
    /// Create a client over an arbitrary transport.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Create a client backed by `reqwest`.
    pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(config)?)))
    }

    /// Start a GET request.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::Get, url)
    }

    /// Start a POST request.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::Post, url)
    }

    fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            transport: Arc::clone(&self.transport),
            request: HttpRequest::new(method, url),
            expected_status: None,
            handler: None,
        }
    }
}

/// A request being prepared. Nothing is sent until [`execute`](Self::execute).
pub struct RequestBuilder {
    transport: Arc<dyn HttpTransport>,
    request: HttpRequest,
    expected_status: Option<u16>,
    handler: Option<ResponseHandler>,
}

impl RequestBuilder {
    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Add a URL-encoded form field to the body.
    pub fn form(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.form.push((field.into(), value.into()));
        self
    }

    /// Fail the call when the response status differs from `code`.
    pub fn expect_status_code(mut self, code: u16) -> Self {
        self.expected_status = Some(code);
        self
    }

    /// Callback run against the response once the status check passed.
    pub fn set_handler<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&HttpResponse) -> Result<(), TaskExecutionFailed> + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Send the request, check the status, then run the handler.
    pub async fn execute(self) -> Result<HttpResponse, TransportError> {
        debug!(method = %self.request.method, url = %self.request.url, "Sending request");

        let response = self.transport.send(self.request).await?;
        debug!(status = response.status(), "Response received");

        if let Some(expected) = self.expected_status {
            if response.status() != expected {
                return Err(TransportError::UnexpectedStatus {
                    expected,
                    actual: response.status(),
                });
            }
        }

        if let Some(handler) = self.handler {
            handler(&response)?;
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed response and remembers the last request.
    struct Canned {
        response: HttpResponse,
        seen: Mutex<Option<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for Canned {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            *self.seen.lock().unwrap() = Some(request);
            Ok(self.response.clone())
        }
    }

    fn canned(response: HttpResponse) -> Arc<Canned> {
        Arc::new(Canned {
            response,
            seen: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn test_builder_forwards_request() {
        let transport = canned(HttpResponse::new(200));
        let client = HttpClient::new(transport.clone());

        client
            .post("http://example.test/form")
            .header("Accept", "application/json")
            .form("name", "value")
            .execute()
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.method, Method::Post);
        assert_eq!(seen.url, "http://example.test/form");
        assert_eq!(seen.form, vec![("name".to_string(), "value".to_string())]);
        assert_eq!(seen.headers.len(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_status_skips_handler() {
        let client = HttpClient::new(canned(HttpResponse::new(200)));

        let err = client
            .get("http://google.fr")
            .expect_status_code(301)
            .set_handler(|_| panic!("handler must not run"))
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransportError::UnexpectedStatus {
                expected: 301,
                actual: 200
            }
        ));
    }

    #[tokio::test]
    async fn test_handler_failure_is_returned() {
        let client = HttpClient::new(canned(HttpResponse::new(301)));

        let err = client
            .get("http://google.fr")
            .expect_status_code(301)
            .set_handler(|_| Err(TaskExecutionFailed::new("bad response")))
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Handler(ref e) if e.message() == "bad response"));
    }
}
