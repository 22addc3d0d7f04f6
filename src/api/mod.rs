//! HTTP client for the VisionGuard detection server.
//!
//! Two endpoints, one request each, no retries:
//! - `POST /detect/image` with a multipart form (`file` field)
//! - `GET /` liveness probe

pub mod multipart;

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::time::{Duration, Instant};

use crate::config::{ClientConfig, DEFAULT_TIMEOUT};
use crate::detect::{DetectionResponse, DetectionService, HealthStatus};
use crate::upload::SelectedFile;

pub use multipart::MultipartBody;

pub const DETECT_IMAGE_PATH: &str = "/detect/image";
pub const HEALTH_PATH: &str = "/";
pub const FILE_FIELD: &str = "file";

/// Cap on response bodies; annotated images arrive inline as base64.
const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::default_base_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl From<&ClientConfig> for ApiConfig {
    fn from(cfg: &ClientConfig) -> Self {
        Self {
            base_url: cfg.api_base_url.clone(),
            timeout: cfg.timeout,
        }
    }
}

/// Blocking HTTP client bound to one server.
pub struct ApiClient {
    cfg: ApiConfig,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(cfg: ApiConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(cfg.timeout)
            .user_agent(concat!("visionguard/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { cfg, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.cfg.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.cfg.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    /// Upload one image and parse the detections.
    pub fn detect_image(&self, file: &SelectedFile) -> Result<DetectionResponse> {
        let url = self.endpoint(DETECT_IMAGE_PATH);
        let form =
            MultipartBody::single_file(FILE_FIELD, file.name(), file.mime_type(), file.bytes());
        log::info!(
            "POST {} ({}, {} byte form)",
            url,
            file.name(),
            form.len()
        );
        let started = Instant::now();
        let result = self
            .agent
            .post(&url)
            .set("Content-Type", &form.content_type())
            .set("Accept", "application/json")
            .send_bytes(form.as_bytes());
        let response = self.check_status(result)?;
        let parsed: DetectionResponse = self.read_json(response)?;
        log::info!(
            "{} returned {} detection(s) in {} ms",
            DETECT_IMAGE_PATH,
            parsed.detections.len(),
            started.elapsed().as_millis()
        );
        Ok(parsed)
    }

    /// Liveness probe.
    pub fn check_health(&self) -> Result<HealthStatus> {
        let url = self.endpoint(HEALTH_PATH);
        log::debug!("GET {}", url);
        let result = self.agent.get(&url).set("Accept", "application/json").call();
        let response = self.check_status(result)?;
        self.read_json(response)
    }

    fn check_status(
        &self,
        result: std::result::Result<ureq::Response, ureq::Error>,
    ) -> Result<ureq::Response> {
        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(code, response)) => {
                let detail = read_body(response)
                    .ok()
                    .and_then(|body| error_detail(&body));
                let message = match detail {
                    Some(detail) => format!("Request failed with status code {code}: {detail}"),
                    None => format!("Request failed with status code {code}"),
                };
                log::warn!("{}", message);
                Err(anyhow!(message))
            }
            Err(ureq::Error::Transport(transport)) => {
                if transport_timed_out(&transport) {
                    log::warn!("request timed out: {}", transport);
                    Err(anyhow!(self.timeout_message()))
                } else {
                    log::warn!("network error: {}", transport);
                    Err(anyhow!("Network Error: {}", transport))
                }
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, response: ureq::Response) -> Result<T> {
        let body = read_body(response).map_err(|err| {
            if is_timeout_io(&err) {
                anyhow!(self.timeout_message())
            } else {
                anyhow!("failed to read response body: {}", err)
            }
        })?;
        serde_json::from_str(&body).context("invalid response from detection server")
    }

    fn timeout_message(&self) -> String {
        format!("timeout of {}ms exceeded", self.cfg.timeout.as_millis())
    }
}

impl DetectionService for ApiClient {
    fn name(&self) -> &str {
        "http"
    }

    fn detect_image(&self, file: &SelectedFile) -> Result<DetectionResponse> {
        ApiClient::detect_image(self, file)
    }

    fn check_health(&self) -> Result<HealthStatus> {
        ApiClient::check_health(self)
    }
}

fn read_body(response: ureq::Response) -> std::io::Result<String> {
    let mut body = String::new();
    response
        .into_reader()
        .take(MAX_RESPONSE_BYTES)
        .read_to_string(&mut body)?;
    Ok(body)
}

/// `detail` field of an error body, as the detection server sends it.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => {
            Some(detail.trim().to_string())
        }
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn is_timeout_io(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
    )
}

fn transport_timed_out(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if is_timeout_io(io) {
                return true;
            }
        }
        source = err.source();
    }
    transport.to_string().contains("timed out")
}
