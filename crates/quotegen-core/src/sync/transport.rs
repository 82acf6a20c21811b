//! Remote transport
//!
//! The remote end is a plain JSON collection endpoint:
//! - `GET <url>?_limit=N` returns an array of records shaped `{title, ...}`
//! - `POST <url>` accepts the local collection as a JSON body; any 2xx is
//!   success

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::TransportError;
use crate::models::Quote;

/// One record from the remote collection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRecord {
    #[serde(default)]
    pub title: Option<String>,
    /// Present only when the remote side stores quotes natively
    #[serde(default)]
    pub category: Option<String>,
}

impl RemoteRecord {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            category: None,
        }
    }

    /// Map into a local quote, labelling it with `fallback_category` when
    /// the record carries none
    ///
    /// Records without a usable title map to `None`.
    pub fn into_quote(self, fallback_category: &str) -> Option<Quote> {
        let text = self.title.filter(|t| !t.trim().is_empty())?;
        let category = self
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| fallback_category.to_string());
        Some(Quote::new(text, category))
    }
}

/// Access to the remote quote collection
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Fetch up to `limit` records
    async fn fetch(&self, limit: usize) -> Result<Vec<RemoteRecord>, TransportError>;

    /// Send the full local collection
    async fn upload(&self, quotes: &[Quote]) -> Result<(), TransportError>;

    /// Endpoint description for status output
    fn endpoint(&self) -> &str;
}

/// HTTP transport using JSON over `reqwest`
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Create a transport for `url` with a per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quotegen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        Ok(Self { client, url })
    }

    /// Create a transport from the sync settings in `config`
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        if config.sync_url.trim().is_empty() {
            return Err(TransportError::NotConfigured("sync_url is empty".to_string()));
        }
        Self::new(config.sync_url.clone(), config.request_timeout())
    }

    fn request_error(&self, source: reqwest::Error) -> TransportError {
        TransportError::Request {
            url: self.url.clone(),
            source,
        }
    }

    fn check_status(&self, status: reqwest::StatusCode) -> Result<(), TransportError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn fetch(&self, limit: usize) -> Result<Vec<RemoteRecord>, TransportError> {
        debug!("Fetching up to {} records from {}", limit, self.url);
        let response = self
            .client
            .get(&self.url)
            .query(&[("_limit", limit)])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        self.check_status(response.status())?;

        response
            .json::<Vec<RemoteRecord>>()
            .await
            .map_err(|e| TransportError::Decode {
                url: self.url.clone(),
                details: e.to_string(),
            })
    }

    async fn upload(&self, quotes: &[Quote]) -> Result<(), TransportError> {
        debug!("Uploading {} quotes to {}", quotes.len(), self.url);
        let response = self
            .client
            .post(&self.url)
            .json(quotes)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        self.check_status(response.status())
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve a single canned HTTP response, returning the raw request
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/posts", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (url, handle)
    }

    /// Read headers plus a Content-Length body
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    #[test]
    fn test_record_mapping() {
        let quote = RemoteRecord::titled("sunt aut facere").into_quote("Server");
        assert_eq!(quote, Some(Quote::new("sunt aut facere", "Server")));

        let native = RemoteRecord {
            title: Some("Native".to_string()),
            category: Some("Wisdom".to_string()),
        };
        assert_eq!(native.into_quote("Server"), Some(Quote::new("Native", "Wisdom")));

        assert_eq!(RemoteRecord::titled("  ").into_quote("Server"), None);
        let untitled = RemoteRecord {
            title: None,
            category: None,
        };
        assert_eq!(untitled.into_quote("Server"), None);
    }

    #[test]
    fn test_record_deserialize_ignores_extra_fields() {
        let records: Vec<RemoteRecord> = serde_json::from_str(
            r#"[{"userId": 1, "id": 1, "title": "first", "body": "..."}, {"id": 2}]"#,
        )
        .unwrap();
        assert_eq!(records[0], RemoteRecord::titled("first"));
        assert!(records[1].title.is_none());
    }

    #[tokio::test]
    async fn test_http_fetch() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"userId": 1, "id": 1, "title": "first"}, {"id": 2, "title": "second"}]"#,
        )
        .await;

        let transport = HttpTransport::new(url, Duration::from_secs(5)).unwrap();
        let records = transport.fetch(2).await.unwrap();
        assert_eq!(
            records,
            vec![RemoteRecord::titled("first"), RemoteRecord::titled("second")]
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /posts?_limit=2 "));
    }

    #[tokio::test]
    async fn test_http_upload() {
        let (url, server) = serve_once("201 Created", r#"{"id": 101}"#).await;

        let transport = HttpTransport::new(url, Duration::from_secs(5)).unwrap();
        transport
            .upload(&[Quote::new("Uploaded text", "Mine")])
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /posts "));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.contains(r#"[{"text":"Uploaded text","category":"Mine"}]"#));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let (url, server) = serve_once("500 Internal Server Error", "{}").await;

        let transport = HttpTransport::new(url, Duration::from_secs(5)).unwrap();
        let err = transport.fetch(5).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_undecodable_body() {
        let (url, server) = serve_once("200 OK", r#"{"not": "an array"}"#).await;

        let transport = HttpTransport::new(url, Duration::from_secs(5)).unwrap();
        let err = transport.fetch(5).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/posts", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new(url, Duration::from_secs(2)).unwrap();
        let err = transport.upload(&[]).await.unwrap_err();
        assert!(matches!(err, TransportError::Request { .. }));
    }

    #[test]
    fn test_from_config_requires_url() {
        let config = Config {
            sync_url: String::new(),
            ..Config::default()
        };
        assert!(matches!(
            HttpTransport::from_config(&config),
            Err(TransportError::NotConfigured(_))
        ));
    }
}
