use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use portal_core::{JobRequest, JobStatus};
use portal_logging::portal_debug;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Response, Url};

use crate::types::{ClientError, FailureKind};
use crate::wire::{decode_job_status, decode_submit_ack, is_json_content_type, SubmitAck};

const ERROR_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    /// `None` lets a submission wait indefinitely.
    pub submit_timeout: Option<Duration>,
    pub probe_timeout: Option<Duration>,
    pub redirect_limit: usize,
    pub max_body_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            submit_timeout: None,
            probe_timeout: Some(Duration::from_secs(30)),
            redirect_limit: 10,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// The remote batch processor.
#[async_trait::async_trait]
pub trait JobClient: Send + Sync {
    /// Sends one job. `Ok` only for a `processing_started` acknowledgment.
    async fn submit(&self, request: &JobRequest) -> Result<(), ClientError>;

    /// Asks the remote what the current job is doing.
    async fn probe_status(&self) -> Result<JobStatus, ClientError>;
}

pub struct ReqwestJobClient {
    endpoint: Url,
    http: reqwest::Client,
    settings: ClientSettings,
    last_cache_bust: AtomicI64,
}

impl ReqwestJobClient {
    pub fn new(endpoint: &str, settings: ClientSettings) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            endpoint,
            http,
            settings,
            last_cache_bust: AtomicI64::new(0),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Status URL with a query value that never repeats, so no cache layer
    /// can answer for the remote.
    fn status_url(&self) -> Url {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_cache_bust
            .fetch_max(now, Ordering::Relaxed);
        let token = if now > previous {
            now
        } else {
            self.last_cache_bust.fetch_add(1, Ordering::Relaxed) + 1
        };

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", "getJobStatus")
            .append_pair("cachebust", &token.to_string());
        url
    }

    async fn read_json_body(&self, response: Response) -> Result<Vec<u8>, ClientError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        if !content_type.as_deref().is_some_and(is_json_content_type) {
            return Err(ClientError::new(
                FailureKind::UnexpectedContentType { content_type },
                "Received unexpected response format from server.",
            ));
        }
        read_body(response, self.settings.max_body_bytes).await
    }
}

#[async_trait::async_trait]
impl JobClient for ReqwestJobClient {
    async fn submit(&self, request: &JobRequest) -> Result<(), ClientError> {
        let payload = serde_json::to_string(request)
            .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload)
            .finish();

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form);
        if let Some(timeout) = self.settings.submit_timeout {
            builder = builder.timeout(timeout);
        }

        portal_debug!(
            "Submitting job output_name={} keys={} type={}",
            request.output_name,
            request.keys.len(),
            request.output_type
        );
        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            // Best effort: the excerpt is only there to help the user.
            let body = read_body(response, self.settings.max_body_bytes)
                .await
                .unwrap_or_default();
            let excerpt: String = String::from_utf8_lossy(&body)
                .chars()
                .take(ERROR_EXCERPT_CHARS)
                .collect();
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("Request failed ({}): {}", status.as_u16(), excerpt),
            ));
        }

        let body = self.read_json_body(response).await?;
        match decode_submit_ack(&body)? {
            SubmitAck::Started => Ok(()),
            SubmitAck::Error { message } => Err(ClientError::new(FailureKind::Remote, message)),
        }
    }

    async fn probe_status(&self) -> Result<JobStatus, ClientError> {
        let mut builder = self
            .http
            .get(self.status_url())
            .header(CACHE_CONTROL, "no-cache");
        if let Some(timeout) = self.settings.probe_timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("Status probe failed with status {}", status.as_u16()),
            ));
        }

        let body = self.read_json_body(response).await?;
        decode_job_status(&body)
    }
}

async fn read_body(response: Response, max_bytes: u64) -> Result<Vec<u8>, ClientError> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(too_large(max_bytes, Some(content_len)));
        }
    }
    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(too_large(max_bytes, Some(next_len)));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> ClientError {
    ClientError::new(
        FailureKind::TooLarge { max_bytes, actual },
        "Response from server was too large.",
    )
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return ClientError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
