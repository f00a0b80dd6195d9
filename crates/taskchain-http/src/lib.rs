//! HTTP verification tasks for Taskchain.
//!
//! Tasks in this crate issue one HTTP request each and assert properties of
//! the response. The transport is reached only through the
//! [`HttpTransport`] trait, so tests can swap the network for canned
//! responses.
//!
//! # Example
//!
//! ```rust,no_run
//! use taskchain_core::Task;
//! use taskchain_http::{HttpClient, HttpConfig, ResponseAssertion, VerifiableHttpTask};
//!
//! async fn check() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::from_config(&HttpConfig::default())?;
//!     let task = VerifiableHttpTask::get("Redirect", client, "http://google.fr")
//!         .expect_status_code(301)
//!         .assert_that(ResponseAssertion::ContentType("text/html".into()));
//!
//!     task.run().await?;
//!     Ok(())
//! }
//! ```

mod client;
pub mod demo;
mod error;
mod reqwest_transport;
mod transport;
mod verify;

pub use client::{HttpClient, RequestBuilder};
pub use demo::{demo_tasks, DemoUrls};
pub use error::TransportError;
pub use reqwest_transport::{HttpConfig, ReqwestTransport};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method};
pub use verify::{ResponseAssertion, VerifiableHttpTask};
