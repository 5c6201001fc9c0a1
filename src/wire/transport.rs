use crate::config::TallyConfig;
use crate::error::{Result, TallyError};
use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;

/// One request/response exchange with the report source. No retries at this layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TallyError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &TallyConfig) -> Result<Self> {
        Self::new(config.tally_url.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &[u8]) -> Result<Vec<u8>> {
        debug!("POST {} ({} bytes)", self.endpoint, request.len());

        let res = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(request.to_vec())
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TallyError::Transport(format!(
                "Tally returned HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(res.bytes().await?.to_vec())
    }
}

#[derive(Debug, Clone)]
enum Canned {
    Body(Vec<u8>),
    Failure(String),
}

/// Canned responses keyed by a marker found in the request body. Used to run
/// the pipeline without a live Tally instance.
#[derive(Debug)]
pub struct StaticTransport {
    routes: Vec<(String, Canned)>,
    fallback: Canned,
    requests: Mutex<Vec<Vec<u8>>>,
}

impl StaticTransport {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            routes: Vec::new(),
            fallback: Canned::Body(body.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            routes: Vec::new(),
            fallback: Canned::Failure(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers with `body` whenever the request contains `marker`.
    pub fn with_route(mut self, marker: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push((marker.into(), Canned::Body(body.into())));
        self
    }

    pub fn with_failing_route(mut self, marker: impl Into<String>, message: impl Into<String>) -> Self {
        self.routes.push((marker.into(), Canned::Failure(message.into())));
        self
    }

    /// Request bodies received so far, as text.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|reqs| {
                reqs.iter()
                    .map(|r| String::from_utf8_lossy(r).into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn send(&self, request: &[u8]) -> Result<Vec<u8>> {
        if let Ok(mut reqs) = self.requests.lock() {
            reqs.push(request.to_vec());
        }

        let text = String::from_utf8_lossy(request);
        let canned = self
            .routes
            .iter()
            .find(|(marker, _)| text.contains(marker.as_str()))
            .map(|(_, canned)| canned)
            .unwrap_or(&self.fallback);

        match canned {
            Canned::Body(body) => Ok(body.clone()),
            Canned::Failure(message) => Err(TallyError::Transport(message.clone())),
        }
    }
}
