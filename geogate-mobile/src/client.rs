//! ConfigClient: one POST to the lookup endpoint, response parsed into a RemoteDecision.

use std::future::Future;
use std::time::Duration;

use geogate_core::{parse_decision, DecisionError, LookupPayload, RemoteDecision};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("lookup request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("malformed lookup response: {0}")]
    Malformed(#[from] DecisionError),
}

/// Where remote decisions come from. The controller depends on this seam.
pub trait DecisionSource: Send + Sync {
    fn fetch_decision(
        &self,
        payload: LookupPayload,
    ) -> impl Future<Output = Result<RemoteDecision, ClientError>> + Send;
}

pub struct ConfigClient {
    http: reqwest::Client,
    endpoint: String,
    authorization: Option<String>,
}

impl ConfigClient {
    /// `authorization` is the full header value (`Basic ...`), sent as-is.
    pub fn new(
        endpoint: impl Into<String>,
        authorization: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            authorization,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            config.endpoint.clone(),
            config.authorization(),
            config.request_timeout(),
        )
    }

    /// Full request URL for `payload`. The query string is appended without encoding.
    pub fn request_url(&self, payload: &LookupPayload) -> String {
        payload.url(&self.endpoint)
    }
}

impl DecisionSource for ConfigClient {
    async fn fetch_decision(&self, payload: LookupPayload) -> Result<RemoteDecision, ClientError> {
        let url = self.request_url(&payload);
        debug!(%url, "lookup request");
        let mut req = self
            .http
            .post(url.as_str())
            .header(CONTENT_TYPE, "application/json");
        if let Some(auth) = &self.authorization {
            req = req.header(AUTHORIZATION, auth.as_str());
        }
        let res = req.send().await.map_err(ClientError::Network)?;
        let status = res.status();
        let body = res.bytes().await.map_err(ClientError::Network)?;
        // Status is not part of the contract; the body decides.
        debug!(%status, len = body.len(), "lookup response");
        Ok(parse_decision(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// What the test server saw.
    #[derive(Debug)]
    struct Seen {
        method: String,
        path: String,
        headers: Vec<(String, String)>,
    }

    impl Seen {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Accept one connection, record the request head, reply with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Seen>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let seen = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                let mut headers = [httparse::EMPTY_HEADER; 32];
                let mut req = httparse::Request::new(&mut headers);
                if req.parse(&buf).unwrap().is_complete() {
                    break Seen {
                        method: req.method.unwrap().to_string(),
                        path: req.path.unwrap().to_string(),
                        headers: req
                            .headers
                            .iter()
                            .map(|h| {
                                (h.name.to_string(), String::from_utf8_lossy(h.value).to_string())
                            })
                            .collect(),
                    };
                }
            };
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            seen
        });
        (format!("http://{}/index/get-product", addr), handle)
    }

    fn payload(cc: &str) -> LookupPayload {
        LookupPayload::for_country(cc.parse().unwrap())
    }

    #[tokio::test]
    async fn posts_query_and_headers() {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"data":{"display":0,"home_url":"https://x.test"}}"#).await;
        let client = ConfigClient::new(
            endpoint,
            Some("Basic dG9rZW4=".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        let decision = client.fetch_decision(payload("IN")).await.unwrap();
        assert_eq!(decision.navigation_target(), Some("https://x.test"));

        let seen = server.await.unwrap();
        assert_eq!(seen.method, "POST");
        assert_eq!(
            seen.path,
            "/index/get-product?m_country=IN&ip_country=IN&appcode=22win_android&panel=main"
        );
        assert_eq!(seen.header("content-type"), Some("application/json"));
        assert_eq!(seen.header("authorization"), Some("Basic dG9rZW4="));
    }

    #[tokio::test]
    async fn no_credential_no_header() {
        let (endpoint, server) = serve_once("200 OK", r#"{"data":{"display":1}}"#).await;
        let client = ConfigClient::new(endpoint, None, Duration::from_secs(5)).unwrap();
        let decision = client.fetch_decision(payload("DE")).await.unwrap();
        assert!(decision.display);
        assert_eq!(server.await.unwrap().header("authorization"), None);
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let (endpoint, server) = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;
        let client = ConfigClient::new(endpoint, None, Duration::from_secs(5)).unwrap();
        let err = client.fetch_decision(payload("DE")).await.unwrap_err();
        assert!(matches!(err, ClientError::Malformed(DecisionError::Json(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_data_is_malformed() {
        let (endpoint, server) = serve_once("200 OK", r#"{"code":0}"#).await;
        let client = ConfigClient::new(endpoint, None, Duration::from_secs(5)).unwrap();
        let err = client.fetch_decision(payload("DE")).await.unwrap_err();
        assert!(matches!(err, ClientError::Malformed(DecisionError::MissingData)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client =
            ConfigClient::new(format!("http://{}/x", addr), None, Duration::from_secs(5)).unwrap();
        let err = client.fetch_decision(payload("DE")).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn slow_server_hits_client_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(stream);
        });
        let client = ConfigClient::new(
            format!("http://{}/x", addr),
            None,
            Duration::from_millis(100),
        )
        .unwrap();
        match client.fetch_decision(payload("DE")).await {
            Err(ClientError::Network(e)) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
        server.abort();
    }

    #[test]
    fn request_url_from_config() {
        let config = Config {
            endpoint: "https://api.test/lookup".into(),
            ..Config::default()
        };
        let client = ConfigClient::from_config(&config).unwrap();
        assert_eq!(
            client.request_url(&payload("JP")),
            "https://api.test/lookup?m_country=JP&ip_country=JP&appcode=22win_android&panel=main"
        );
    }
}
