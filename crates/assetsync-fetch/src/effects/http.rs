use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status, change indicators and body of one GET.
pub struct HttpResponse<E> {
    pub status: u16,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

impl<E> std::fmt::Debug for HttpResponse<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("etag", &self.etag)
            .field("last_modified", &self.last_modified)
            .field("content_length", &self.content_length)
            .field("body", &"{ ... }")
            .finish()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface a conditional fetch needs: one
/// GET with caller-supplied headers. Implementations handle their own
/// redirect following, timeouts and error mapping, and must hand back
/// non-success statuses (notably `304`) as responses rather than errors.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + 'static;

    /// Issue a GET for `url` with `headers` and return the response head
    /// together with its body stream.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received (DNS failure, connection
    /// error, timeout).
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

/// Lets one client serve every fetcher built over a program's lifetime.
impl<T: HttpClient> HttpClient for std::sync::Arc<T> {
    type Error = T::Error;

    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpResponse<Self::Error>, Self::Error>> + Send {
        (**self).get(url, headers)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;
    use crate::error::{Error, Result};

    /// Production HTTP client implementation using reqwest.
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a client whose requests time out after `timeout`.
        pub fn new(timeout: Duration) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| Error::Network(e.to_string()))?;
            Ok(Self { client })
        }
    }

    fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<HttpResponse<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let etag = header_value(&response, reqwest::header::ETAG);
            let last_modified = header_value(&response, reqwest::header::LAST_MODIFIED);
            let content_length = response.content_length();
            let body = response.bytes_stream().map(|result| result.map(Bytes::from));

            Ok(HttpResponse {
                status,
                etag,
                last_modified,
                content_length,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
