//! Tasks that verify a single HTTP exchange.

use async_trait::async_trait;
use taskchain_core::{Task, TaskExecutionFailed};
use tracing::debug;

use crate::client::HttpClient;
use crate::transport::{media_type, HttpResponse, Method};

/// A property a response must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseAssertion {
    /// Media type, compared without parameters.
    ContentType(String),
    /// First value of the header equals `value`.
    Header { name: String, value: String },
    /// The header is present, whatever its value.
    HeaderPresent(String),
    /// The body holds at least one byte.
    NonEmptyBody,
}

impl ResponseAssertion {
    /// Shorthand for [`ResponseAssertion::Header`].
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Check the assertion, describing expected and actual value on failure.
    pub fn check(&self, response: &HttpResponse) -> Result<(), TaskExecutionFailed> {
        match self {
            Self::ContentType(expected) => {
                let actual = response.content_type();
                if actual.is_none() || actual != media_type(expected) {
                    return Err(TaskExecutionFailed::expected("content type", expected, actual));
                }
            }
            Self::Header { name, value } => {
                let actual = response.first_header_value(name);
                if actual != Some(value.as_str()) {
                    return Err(TaskExecutionFailed::expected(
                        &format!("{name} header"),
                        value,
                        actual,
                    ));
                }
            }
            Self::HeaderPresent(name) => {
                if response.first_header_value(name).is_none() {
                    return Err(TaskExecutionFailed::new(format!(
                        "Expected {name} header to be present"
                    )));
                }
            }
            Self::NonEmptyBody => {
                if response.body().is_empty() {
                    return Err(TaskExecutionFailed::new("Expected a non-empty body, got 0 bytes"));
                }
            }
        }
        Ok(())
    }
}

/// Issues one request and asserts properties of the response.
///
/// The status code is enforced by the client; the remaining assertions run
/// in order and stop at the first one that does not hold.
pub struct VerifiableHttpTask {
    name: String,
    reference_url: Option<String>,
    client: HttpClient,
    method: Method,
    url: String,
    form: Vec<(String, String)>,
    expected_status: u16,
    assertions: Vec<ResponseAssertion>,
}

impl VerifiableHttpTask {
    /// A GET task expecting `200 OK` until told otherwise.
    pub fn get(name: impl Into<String>, client: HttpClient, url: impl Into<String>) -> Self {
        Self::new(name, client, Method::Get, url)
    }

    /// A POST task expecting `200 OK` until told otherwise.
    pub fn post(name: impl Into<String>, client: HttpClient, url: impl Into<String>) -> Self {
        Self::new(name, client, Method::Post, url)
    }

    fn new(name: impl Into<String>, client: HttpClient, method: Method, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference_url: None,
            client,
            method,
            url: url.into(),
            form: Vec::new(),
            expected_status: 200,
            assertions: Vec::new(),
        }
    }

    /// Builder method to attach an informational link.
    pub fn with_reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = Some(url.into());
        self
    }

    /// Builder method to add a form field to the request body.
    pub fn with_form_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((field.into(), value.into()));
        self
    }

    /// Builder method to set the required status code.
    pub fn expect_status_code(mut self, code: u16) -> Self {
        self.expected_status = code;
        self
    }

    /// Builder method to append an assertion.
    pub fn assert_that(mut self, assertion: ResponseAssertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn assertions(&self) -> &[ResponseAssertion] {
        &self.assertions
    }
}

#[async_trait]
impl Task for VerifiableHttpTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn reference_url(&self) -> Option<&str> {
        self.reference_url.as_deref()
    }

    async fn run(&self) -> Result<(), TaskExecutionFailed> {
        let mut request = match self.method {
            Method::Get => self.client.get(&self.url),
            Method::Post => self.client.post(&self.url),
        };
        for (field, value) in &self.form {
            request = request.form(field, value);
        }

        let assertions = self.assertions.clone();
        request
            .expect_status_code(self.expected_status)
            .set_handler(move |response| {
                debug!(assertions = assertions.len(), "Checking response");
                assertions.iter().try_for_each(|a| a.check(response))
            })
            .execute()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect_response(location: &str) -> HttpResponse {
        HttpResponse::new(301)
            .with_header("Content-Type", "text/html; charset=UTF-8")
            .with_header("Location", location)
    }

    #[test]
    fn test_header_assertion_names_both_values() {
        let assertion = ResponseAssertion::header("Location", "http://www.google.fr/");
        let err = assertion
            .check(&redirect_response("http://other.example/"))
            .unwrap_err();

        assert!(err.message().contains("http://www.google.fr/"));
        assert!(err.message().contains("http://other.example/"));
    }

    #[test]
    fn test_content_type_assertion() {
        let response = redirect_response("http://www.google.fr/");
        assert!(ResponseAssertion::ContentType("text/html".into()).check(&response).is_ok());

        let err = ResponseAssertion::ContentType("application/json".into())
            .check(&response)
            .unwrap_err();
        assert_eq!(err.message(), "Expected content type application/json, got text/html");
    }

    #[test]
    fn test_content_type_assertion_ignores_parameters() {
        let response = redirect_response("http://www.google.fr/");
        let assertion = ResponseAssertion::ContentType("Text/HTML; charset=utf-8".into());
        assert!(assertion.check(&response).is_ok());

        let bare = HttpResponse::new(301).with_header("Content-Type", "text/html");
        assert!(assertion.check(&bare).is_ok());
    }

    #[test]
    fn test_presence_and_body_assertions() {
        let response = HttpResponse::new(200).with_body("hello");
        assert!(ResponseAssertion::NonEmptyBody.check(&response).is_ok());
        assert!(ResponseAssertion::HeaderPresent("ETag".into())
            .check(&response)
            .is_err());
        assert!(ResponseAssertion::NonEmptyBody
            .check(&HttpResponse::new(200))
            .is_err());
    }
}
