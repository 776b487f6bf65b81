//! Pinecone REST client (write side only)

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    IndexRecord, KbError, PINECONE_API_VERSION, PINECONE_CONTROL_PLANE, PineconeConfig, Result,
    VectorIndex,
};

/// A connection to one Pinecone index.
///
/// The data-plane host is resolved once in [`PineconeIndex::connect`] and
/// reused for every upsert.
pub struct PineconeIndex {
    client: Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<&'a IndexRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

impl PineconeIndex {
    /// Connect to the index described by `config`.
    pub fn connect(config: &PineconeConfig) -> Result<Self> {
        Self::connect_via(config, PINECONE_CONTROL_PLANE)
    }

    pub(crate) fn connect_via(config: &PineconeConfig, control_plane: &str) -> Result<Self> {
        let api_key = required(&config.api_key, "api_key (PINECONE_API_KEY)")?;
        let client = Client::builder().build()?;

        let host = match &config.host {
            Some(host) => normalize_host(host),
            None => {
                let index = required(&config.index, "index (PINECONE_INDEX)")?;
                if let Some(env) = config.environment.as_deref().filter(|e| !e.trim().is_empty()) {
                    tracing::info!(
                        "Pinecone environment {} is not used, host comes from the control plane",
                        env
                    );
                }
                let url = describe_url(control_plane, &index);
                resolve_host(&client, &api_key, &url)?
            }
        };

        tracing::info!("Connected to Pinecone index at {}", host);

        Ok(Self {
            client,
            host,
            api_key,
            namespace: config.namespace.clone(),
        })
    }

    /// The resolved data-plane URL.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl VectorIndex for PineconeIndex {
    fn upsert(&self, record: &IndexRecord) -> Result<()> {
        let body = UpsertRequest {
            vectors: vec![record],
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(&body)
            .send()?;

        // The write already succeeded once the status is 2xx
        match check_status(response, "upsert")?.json::<UpsertResponse>() {
            Ok(parsed) if parsed.upserted_count != 1 => tracing::warn!(
                "Pinecone reported {} upserted vectors for {}",
                parsed.upserted_count,
                record.id
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!("Unreadable upsert response for {}: {}", record.id, e),
        }

        Ok(())
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| KbError::Config(format!("Pinecone {} is not set", name)))
}

/// Where to ask for an index's host.
fn describe_url(control_plane: &str, index: &str) -> String {
    format!("{}/indexes/{}", control_plane.trim_end_matches('/'), index)
}

fn resolve_host(client: &Client, api_key: &str, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
        .send()?;

    let description: Value = check_status(response, "describe index")?.json()?;

    description
        .get("host")
        .and_then(Value::as_str)
        .map(normalize_host)
        .ok_or_else(|| KbError::Index(format!("No host in index description from {}", url)))
}

fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(KbError::Index(format!(
        "Pinecone {} failed ({}): {}",
        action,
        status,
        body.trim()
    )))
}

/// Hosts come back without a scheme; default to https.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChunkMetadata;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answer a single HTTP request with a canned response; the join handle yields the raw request.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });

        (format!("http://{}", addr), handle)
    }

    fn read_request(stream: &mut impl Read) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).to_string()
    }

    fn record() -> IndexRecord {
        IndexRecord {
            id: "0b6c1c1e-2f0a-4a53-9d4e-3c5e8e0f8a11".to_string(),
            values: vec![0.25, -0.5],
            metadata: ChunkMetadata {
                file: "guide.md".to_string(),
                start_line: 1,
                end_line: 2,
                code: "# Guide\nintro\n".to_string(),
            },
        }
    }

    fn config_with_host(host: String) -> PineconeConfig {
        PineconeConfig {
            api_key: Some("secret".to_string()),
            host: Some(host),
            namespace: Some("kb".to_string()),
            ..PineconeConfig::default()
        }
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("docs-abc123.svc.us-east1-gcp.pinecone.io/"),
            "https://docs-abc123.svc.us-east1-gcp.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080"), "http://localhost:5080");
    }

    #[test]
    fn test_describe_url() {
        assert_eq!(
            describe_url(PINECONE_CONTROL_PLANE, "docs"),
            "https://api.pinecone.io/indexes/docs"
        );
        assert_eq!(
            describe_url("http://127.0.0.1:5080/", "docs"),
            "http://127.0.0.1:5080/indexes/docs"
        );
    }

    #[test]
    fn test_missing_api_key() {
        let config = PineconeConfig {
            index: Some("docs".to_string()),
            ..PineconeConfig::default()
        };
        let err = PineconeIndex::connect(&config).err().unwrap();
        assert!(matches!(err, KbError::Config(msg) if msg.contains("PINECONE_API_KEY")));
    }

    #[test]
    fn test_missing_index_name() {
        let config = PineconeConfig {
            api_key: Some("secret".to_string()),
            ..PineconeConfig::default()
        };
        let err = PineconeIndex::connect(&config).err().unwrap();
        assert!(matches!(err, KbError::Config(msg) if msg.contains("PINECONE_INDEX")));
    }

    #[test]
    fn test_upsert_request() {
        let (url, server) = serve_once("200 OK", r#"{"upsertedCount":1}"#);
        let index = PineconeIndex::connect(&config_with_host(url)).unwrap();

        index.upsert(&record()).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /vectors/upsert HTTP/1.1"));
        assert!(request.to_lowercase().contains("api-key: secret"));

        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let json: Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["namespace"], "kb");
        assert_eq!(json["vectors"][0]["id"], record().id);
        assert_eq!(json["vectors"][0]["values"], serde_json::json!([0.25, -0.5]));
        assert_eq!(json["vectors"][0]["metadata"]["file"], "guide.md");
        assert_eq!(json["vectors"][0]["metadata"]["end_line"], 2);
    }

    #[test]
    fn test_upsert_error_status() {
        let (url, server) = serve_once("401 Unauthorized", r#"{"message":"Invalid API Key"}"#);
        let index = PineconeIndex::connect(&config_with_host(url)).unwrap();

        let err = index.upsert(&record()).unwrap_err();
        server.join().unwrap();

        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("Invalid API Key"));
    }

    #[test]
    fn test_host_lookup() {
        let (url, server) = serve_once("200 OK", r#"{"name":"docs","host":"docs-abc123.svc.pinecone.io"}"#);
        let config = PineconeConfig {
            api_key: Some("secret".to_string()),
            index: Some("docs".to_string()),
            ..PineconeConfig::default()
        };

        let index = PineconeIndex::connect_via(&config, &url).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("GET /indexes/docs HTTP/1.1"));
        assert_eq!(index.host(), "https://docs-abc123.svc.pinecone.io");
    }

    #[test]
    fn test_environment_still_uses_control_plane() {
        let (url, server) =
            serve_once("200 OK", r#"{"name":"docs","host":"docs-abc123.svc.pinecone.io"}"#);
        let config = PineconeConfig {
            api_key: Some("secret".to_string()),
            environment: Some("us-west1-gcp".to_string()),
            index: Some("docs".to_string()),
            ..PineconeConfig::default()
        };

        let index = PineconeIndex::connect_via(&config, &url).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("GET /indexes/docs HTTP/1.1"));
        assert_eq!(index.host(), "https://docs-abc123.svc.pinecone.io");
    }

    #[test]
    fn test_unparseable_success_body_is_not_a_failure() {
        let (url, server) = serve_once("200 OK", "upserted");
        let index = PineconeIndex::connect(&config_with_host(url)).unwrap();

        assert!(index.upsert(&record()).is_ok());
        server.join().unwrap();
    }
}
