//! HTTP fetcher with tracing and a request timeout.
//!
//! Wraps a reqwest client and translates between the engine's
//! [`Request`]/[`Response`] models and the wire.

use async_trait::async_trait;
use reqwest::Client;
use shellcache_core::{Request, RequestMode, Response, ResponseType};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::Fetcher;
use crate::error::FetchError;

/// User agent string for shellcache.
const USER_AGENT: &str = concat!("shellcache/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Fetcher
// ============================================================================

/// Fetches requests over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    inner: Client,
    origin: Url,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher for an application served from `origin`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, which usually
    /// means the TLS configuration is broken.
    pub fn new(origin: Url, timeout: Duration) -> Result<Self, FetchError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Http)?;

        Ok(Self {
            inner,
            origin,
            timeout,
        })
    }

    /// Returns the origin responses are typed against.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout.as_secs())
        } else {
            FetchError::Http(err)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

        let mut builder = self.inner.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        debug!("Sending request");
        let resp = builder.send().await.map_err(|e| self.map_error(e))?;
        debug!(status = %resp.status(), "Response received");

        let kind = response_type(request, &self.origin);
        if kind == ResponseType::Opaque {
            return Ok(Response::new(0, Vec::new()).with_kind(kind));
        }

        let status = resp.status();
        let mut response = Response::new(status.as_u16(), Vec::new())
            .with_status_text(status.canonical_reason().unwrap_or_default())
            .with_kind(kind);
        for (name, value) in resp.headers() {
            if let Ok(value) = value.to_str() {
                response = response.with_header(name.as_str(), value);
            }
        }
        response.body = resp
            .bytes()
            .await
            .map_err(|e| self.map_error(e))?
            .to_vec();

        Ok(response)
    }
}

/// How a response to `request` is typed relative to the app origin.
pub fn response_type(request: &Request, origin: &Url) -> ResponseType {
    if request.is_same_origin(origin) {
        ResponseType::Basic
    } else if request.mode == RequestMode::NoCors {
        ResponseType::Opaque
    } else {
        ResponseType::Cors
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn origin() -> Url {
        Url::parse("https://bus.example/").unwrap()
    }

    #[test]
    fn test_response_type() {
        let same = Request::parse_get("https://bus.example/app.js").unwrap();
        assert_eq!(response_type(&same, &origin()), ResponseType::Basic);

        let cors = Request::parse_get("https://api.example/routes").unwrap();
        assert_eq!(response_type(&cors, &origin()), ResponseType::Cors);

        let opaque = cors.clone().with_mode(RequestMode::NoCors);
        assert_eq!(response_type(&opaque, &origin()), ResponseType::Opaque);
    }

    async fn serve_once(reply: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_translates_response() {
        let base = serve_once(
            "HTTP/1.1 404 Not Found\r\ncontent-type: text/plain\r\ncontent-length: 4\r\nconnection: close\r\n\r\ngone",
        )
        .await;
        let fetcher = HttpFetcher::new(base.clone(), Duration::from_secs(5)).unwrap();

        let request = Request::get(base.join("/missing").unwrap());
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.status_text, "Not Found");
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.text(), "gone");
        assert_eq!(response.kind, ResponseType::Basic);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("http://{addr}/")).unwrap();
        let fetcher = HttpFetcher::new(base.clone(), Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&Request::get(base)).await.unwrap_err();

        assert!(err.is_network_failure());
    }
}
