//! The demo pipeline: download a file, check a permanent redirect, post a
//! form.

use std::sync::Arc;

use taskchain_core::Task;

use crate::client::HttpClient;
use crate::verify::{ResponseAssertion, VerifiableHttpTask};

/// Where the demo tasks are implemented, shown as their reference link.
pub const SOURCE_URL: &str = concat!(
    env!("CARGO_PKG_REPOSITORY"),
    "/blob/main/crates/taskchain-http/src/demo.rs"
);

/// Endpoints the demo tasks talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoUrls {
    /// File fetched by the download task.
    pub download_url: String,

    /// URL expected to answer with `301 Moved Permanently`.
    pub redirect_url: String,

    /// `Location` the redirect must point to.
    pub expected_location: String,

    /// Endpoint echoing posted forms back as JSON.
    pub post_url: String,
}

impl Default for DemoUrls {
    fn default() -> Self {
        Self {
            download_url: "https://httpbin.org/image/png".to_string(),
            redirect_url: "http://google.fr".to_string(),
            expected_location: "http://www.google.fr/".to_string(),
            post_url: "https://httpbin.org/post".to_string(),
        }
    }
}

pub fn download_file_task(client: HttpClient, url: &str) -> VerifiableHttpTask {
    VerifiableHttpTask::get("Download file", client, url)
        .with_reference_url(SOURCE_URL)
        .expect_status_code(200)
        .assert_that(ResponseAssertion::NonEmptyBody)
}

/// Checks a permanent redirect without following it.
pub fn redirect_task(client: HttpClient, url: &str, location: &str) -> VerifiableHttpTask {
    VerifiableHttpTask::get("Redirect", client, url)
        .with_reference_url(SOURCE_URL)
        .expect_status_code(301)
        .assert_that(ResponseAssertion::ContentType("text/html".to_string()))
        .assert_that(ResponseAssertion::header("Location", location))
}

pub fn post_form_task(client: HttpClient, url: &str) -> VerifiableHttpTask {
    VerifiableHttpTask::post("Post form", client, url)
        .with_reference_url(SOURCE_URL)
        .with_form_field("name", "taskchain")
        .with_form_field("message", "Hello from the demo pipeline")
        .expect_status_code(200)
        .assert_that(ResponseAssertion::ContentType("application/json".to_string()))
}

/// The demo tasks in execution order.
pub fn demo_tasks(client: &HttpClient, urls: &DemoUrls) -> Vec<Arc<dyn Task>> {
    let download: Arc<dyn Task> = Arc::new(download_file_task(client.clone(), &urls.download_url));
    let redirect: Arc<dyn Task> = Arc::new(redirect_task(
        client.clone(),
        &urls.redirect_url,
        &urls.expected_location,
    ));
    let post: Arc<dyn Task> = Arc::new(post_form_task(client.clone(), &urls.post_url));

    vec![download, redirect, post]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connection("offline".into()))
        }
    }

    #[test]
    fn test_demo_tasks_order_and_metadata() {
        let client = HttpClient::new(Arc::new(Unreachable));
        let tasks = demo_tasks(&client, &DemoUrls::default());

        let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Download file", "Redirect", "Post form"]);
        assert!(tasks
            .iter()
            .all(|t| t.reference_url() == Some(SOURCE_URL)));
        assert!(SOURCE_URL.ends_with("crates/taskchain-http/src/demo.rs"));
    }

    #[test]
    fn test_redirect_task_assertions() {
        let client = HttpClient::new(Arc::new(Unreachable));
        let task = redirect_task(client, "http://google.fr", "http://www.google.fr/");

        assert_eq!(task.url(), "http://google.fr");
        assert_eq!(
            task.assertions(),
            &[
                ResponseAssertion::ContentType("text/html".to_string()),
                ResponseAssertion::header("Location", "http://www.google.fr/"),
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_fails_task() {
        let client = HttpClient::new(Arc::new(Unreachable));
        let err = post_form_task(client, "http://example.test/post")
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.message(), "HTTP request failed");
    }
}
