//! HTTP client for HAPI services.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use hapi_types::{
    HapiCapabilities, HapiCatalog, HapiEndpoint, HapiError, HapiInfo, HapiStatus, HapiVersion,
    ServiceError, find_status_code,
};
use reqwest::{Client, Response, StatusCode, Url, header::LOCATION, redirect};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use crate::url::{dataset_of, endpoint_of, query_url};

/// A response body (or a concatenation of bodies) as a stream of byte chunks.
///
/// Dropping the stream closes whatever connection is still open behind it.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Response content decoding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentCoding {
    /// Ask for and decode gzip-compressed responses.
    #[default]
    Gzip,
    /// Take bodies exactly as sent.
    Identity,
}

/// Configuration for the service client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum number of redirects followed for one request.
    pub max_redirects: u32,
    /// Response decoding policy.
    pub content_coding: ContentCoding,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300), // Large data chunks can be slow to generate
            connect_timeout: Duration::from_secs(10),
            max_redirects: 8,
            content_coding: ContentCoding::Gzip,
            user_agent: format!("hapi-stream/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Something that can turn a request URL into a response byte stream.
///
/// [`HapiService`] is the network implementation; the chunk streamer only
/// depends on this trait.
#[async_trait]
pub trait DataService: Send + Sync + std::fmt::Debug {
    /// Issues a request and returns its body.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::Service`] when the server reports a protocol
    /// error code, [`HapiError::Status`] for other non-success responses and
    /// [`HapiError::Http`] for transport failures.
    async fn open_stream(&self, url: &Url) -> Result<ByteStream, HapiError>;
}

/// Client for one HAPI server.
///
/// Apart from its base URL the client holds no per-request state and may be
/// shared between concurrent requests.
#[derive(Debug, Clone)]
pub struct HapiService {
    base_url: Url,
    client: Client,
    config: ClientConfig,
}

impl HapiService {
    /// Creates a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: Url, config: ClientConfig) -> Result<Self, HapiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            // Redirects are followed by hand in open_stream
            .redirect(redirect::Policy::none())
            .gzip(config.content_coding == ContentCoding::Gzip)
            .build()
            .map_err(|e| HapiError::Http(e.to_string()))?;
        Ok(Self {
            base_url,
            client,
            config,
        })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults(base_url: Url) -> Result<Self, HapiError> {
        Self::new(base_url, ClientConfig::default())
    }

    /// Returns the service base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds a request URL for an endpoint of this service.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path.
    pub fn create_query<K, V>(
        &self,
        endpoint: HapiEndpoint,
        params: &[(K, V)],
    ) -> Result<Url, HapiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        query_url(&self.base_url, endpoint, params)
    }

    /// Requests an endpoint and parses the whole body as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is empty, malformed
    /// or not an object.
    pub async fn read_json<K, V>(
        &self,
        endpoint: HapiEndpoint,
        params: &[(K, V)],
    ) -> Result<serde_json::Map<String, serde_json::Value>, HapiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = self.create_query(endpoint, params)?;
        let body: Vec<u8> = self
            .open_stream(&url)
            .await?
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(HapiError::Format(format!("empty response from {url}")));
        }
        let json: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| HapiError::Format(format!("malformed JSON from {url}: {e}")))?;
        match json {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(HapiError::Format(format!(
                "expected JSON object from {url}, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Reads a typed metadata document.
    async fn read_document<T, K, V>(
        &self,
        endpoint: HapiEndpoint,
        params: &[(K, V)],
    ) -> Result<T, HapiError>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let map = self.read_json(endpoint, params).await?;
        Ok(serde_json::from_value(serde_json::Value::Object(map))?)
    }

    /// Fetches the dataset catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the document is malformed.
    pub async fn catalog(&self) -> Result<HapiCatalog, HapiError> {
        self.read_document::<_, &str, &str>(HapiEndpoint::Catalog, &[])
            .await
    }

    /// Fetches the server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the document is malformed.
    pub async fn capabilities(&self) -> Result<HapiCapabilities, HapiError> {
        self.read_document::<_, &str, &str>(HapiEndpoint::Capabilities, &[])
            .await
    }

    /// Fetches the metadata of one dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the document is malformed.
    pub async fn info(&self, version: HapiVersion, dataset: &str) -> Result<HapiInfo, HapiError> {
        self.read_document(HapiEndpoint::Info, &[(version.dataset_param(), dataset)])
            .await
    }

    /// Sends a GET, following redirects by hand up to the configured limit.
    async fn send_following_redirects(&self, url: &Url) -> Result<Response, HapiError> {
        let mut target = url.clone();
        for _ in 0..=self.config.max_redirects {
            let response = self
                .client
                .get(target.clone())
                .send()
                .await
                .map_err(|e| HapiError::Http(e.to_string()))?;
            if !response.status().is_redirection() {
                return Ok(response);
            }
            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                // A redirect status with nowhere to go is handed back as is.
                return Ok(response);
            };
            let next = target
                .join(location)
                .map_err(|e| HapiError::Format(format!("bad redirect {location:?}: {e}")))?;
            debug!("HAPI redirect {} -> {}", response.status(), next);
            target = next;
        }
        Err(HapiError::Redirects(self.config.max_redirects))
    }
}

#[async_trait]
impl DataService for HapiService {
    async fn open_stream(&self, url: &Url) -> Result<ByteStream, HapiError> {
        let endpoint = endpoint_of(url).map_or("request", |e| e.as_str());
        match dataset_of(url) {
            Some(dataset) => info!("HAPI {} request for {}", endpoint, dataset),
            None => info!("HAPI {} request", endpoint),
        }
        debug!("HAPI request URL: {}", url);

        let response = self.send_following_redirects(url).await?;
        let status = response.status();
        if !status.is_success() {
            let phrase = response
                .extensions()
                .get::<hyper::ext::ReasonPhrase>()
                .map(|p| String::from_utf8_lossy(p.as_bytes()).into_owned());
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, phrase.as_deref(), &body));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| std::io::Error::from(HapiError::Http(e.to_string()))))
            .boxed())
    }
}

/// Builds the error for a non-success response.
///
/// A protocol code is taken from the reason phrase the server sent, then from
/// the JSON `status` object of the body, then from a `1xxx` code in the
/// canonical reason or the first body line.
fn status_error(status: StatusCode, phrase: Option<&str>, body: &str) -> HapiError {
    if let Some(phrase) = phrase.map(str::trim)
        && let Some(code) = find_status_code(phrase)
    {
        return ServiceError::new(code, phrase).into();
    }
    let reason = status.canonical_reason().unwrap_or("");

    let json_status = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("status").cloned())
        .and_then(|s| serde_json::from_value::<HapiStatus>(s).ok());
    if let Some(st) = json_status.filter(|s| !s.is_ok()) {
        return ServiceError::new(st.code, st.message).into();
    }

    let first_line = body.lines().next().unwrap_or("").trim();
    for text in [reason, first_line] {
        if let Some(code) = find_status_code(text) {
            return ServiceError::new(code, text).into();
        }
    }

    HapiError::Status {
        status: status.as_u16(),
        message: if first_line.is_empty() {
            phrase.unwrap_or(reason).trim().to_string()
        } else {
            first_line.to_string()
        },
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
