//! Typed transport for the analytics service.
//!
//! [`Transport`] is the seam between the [`TrackerClient`](crate::client::TrackerClient)
//! and the network. [`HttpTransport`] is the real implementation: one JSON request per
//! call, no retries, no timeouts, and every non-2xx status mapped to
//! [`TrackerError::Http`].

use async_trait::async_trait;
use reqwest::Method;

use crate::config::{ClientConfig, ConfigError};
use crate::errors::TrackerError;
use crate::model::{AnonymousId, CreateSessionRequest, Event, JsonObject, LogEventRequest, ReportRecord, Session};
use crate::net::fetch;

pub const SESSION_PATH: &str = "/api";
pub const EVENT_PATH: &str = "/api/event";

/// The three remote operations the tracker depends on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Reads the latest aggregated report.
    async fn fetch_report(&self) -> Result<ReportRecord, TrackerError>;

    /// Creates a session for `anonymous_id`.
    async fn create_session(
        &self,
        anonymous_id: &AnonymousId,
        metadata: Option<&JsonObject>,
    ) -> Result<Session, TrackerError>;

    /// Records one event in `session_id`.
    async fn log_event(
        &self,
        session_id: &str,
        event_type: &str,
        metadata: Option<&JsonObject>,
        data: Option<&JsonObject>,
    ) -> Result<Event, TrackerError>;
}

/// JSON-over-HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    report_path: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            report_path: config.report_path.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, TrackerError> {
        let full = format!("{}{}", self.base_url, path);
        url::Url::parse(&full).map_err(|_| TrackerError::Config(ConfigError::InvalidBaseUrl(full)))
    }

    async fn send_json<T>(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<T, TrackerError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let resp = fetch(&self.client, method, url, body).await?;
        if !resp.is_success() {
            log::debug!("{} answered {} {}", resp.url, resp.status, resp.status_text);
        }
        resp.into_json()
    }
}

fn encode<B: serde::Serialize>(body: &B) -> Result<Vec<u8>, TrackerError> {
    serde_json::to_vec(body).map_err(|e| TrackerError::Encode(e.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_report(&self) -> Result<ReportRecord, TrackerError> {
        self.send_json(Method::GET, &self.report_path, None).await
    }

    async fn create_session(
        &self,
        anonymous_id: &AnonymousId,
        metadata: Option<&JsonObject>,
    ) -> Result<Session, TrackerError> {
        let body = encode(&CreateSessionRequest { anonymous_id, metadata })?;
        self.send_json(Method::POST, SESSION_PATH, Some(body)).await
    }

    async fn log_event(
        &self,
        session_id: &str,
        event_type: &str,
        metadata: Option<&JsonObject>,
        data: Option<&JsonObject>,
    ) -> Result<Event, TrackerError> {
        let body = encode(&LogEventRequest {
            session_id,
            event_type,
            metadata,
            data,
        })?;
        self.send_json(Method::POST, EVENT_PATH, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves exactly one canned response and hands back the raw request it received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let request = read_request(&mut sock).await;
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(reply.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            request
        });

        (format!("http://{addr}"), handle)
    }

    async fn read_request(sock: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn transport(base: &str) -> HttpTransport {
        let cfg = ClientConfig::builder().base_url(base).build().unwrap();
        HttpTransport::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn create_session_posts_json_body() {
        let (base, server) =
            serve_once("200 OK", r#"{"id":"s1","anonymousId":"anon-1","createdAt":"t0"}"#).await;

        let mut meta = JsonObject::new();
        meta.insert("plan".into(), json!("free"));
        let session = transport(&base)
            .create_session(&AnonymousId::from("anon-1"), Some(&meta))
            .await
            .unwrap();
        assert_eq!(session.id, "s1");
        assert_eq!(session.created_at.as_deref(), Some("t0"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body, json!({"anonymousId": "anon-1", "metadata": {"plan": "free"}}));
    }

    #[tokio::test]
    async fn log_event_posts_to_event_endpoint() {
        let (base, server) = serve_once(
            "201 Created",
            r#"{"id":"e1","sessionId":"s1","type":"click","createdAt":"t1"}"#,
        )
        .await;

        let event = transport(&base).log_event("s1", "click", None, None).await.unwrap();
        assert_eq!(event.id, "e1");
        assert_eq!(event.event_type, "click");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/event HTTP/1.1"));
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body, json!({"sessionId": "s1", "type": "click"}));
    }

    #[tokio::test]
    async fn fetch_report_uses_configured_path() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"id":"r1","data":{"totalSessions":0,"sessions":[]},"createdAt":"t2"}"#,
        )
        .await;

        let cfg = ClientConfig::builder()
            .base_url(format!("{base}/"))
            .report_path("/api/session/report")
            .build()
            .unwrap();
        let report = HttpTransport::new(&cfg).unwrap().fetch_report().await.unwrap();
        assert_eq!(report.id, "r1");
        assert_eq!(report.data.total_sessions, 0);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/session/report HTTP/1.1"));
    }

    #[tokio::test]
    async fn non_success_status_becomes_http_error() {
        let (base, _server) = serve_once("500 Internal Server Error", "server error").await;

        let err = transport(&base)
            .create_session(&AnonymousId::from("anon-1"), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        let msg = err.to_string();
        assert!(msg.contains("500"), "{msg}");
        assert!(msg.contains("server error"), "{msg}");
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let (base, _server) = serve_once("200 OK", r#"{"unexpected":true}"#).await;

        let err = transport(&base).fetch_report().await.unwrap_err();
        assert!(matches!(err, TrackerError::Decode(_)), "{err:?}");
    }

    #[test]
    fn unserializable_body_is_an_encode_error() {
        struct Unserializable;

        impl serde::Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("metadata holds a non-string map key"))
            }
        }

        let err = encode(&Unserializable).unwrap_err();
        assert!(matches!(err, TrackerError::Encode(_)), "{err:?}");
        assert!(err.to_string().starts_with("Encode error:"), "{err}");
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        // Bind and drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport(&format!("http://{addr}")).fetch_report().await.unwrap_err();
        assert!(matches!(err, TrackerError::Network(_)), "{err:?}");
    }
}
