//! HTTP client for the derive endpoint.
//!
//! Thin wrapper over `reqwest`. Status handling and body parsing are plain
//! functions so they can be tested without a server.

use std::time::Duration;

use async_trait::async_trait;
use cabinetkit_core::{CalcError, CancellationToken, FieldError};
use cabinetkit_settings::ServiceSettings;
use serde::Deserialize;

use super::{CalculationService, DeriveRequest, Envelope};

/// Longest response body kept in a [`CalcError::Service`]
const MAX_ERROR_BODY: usize = 512;

pub struct HttpCalculationService {
    http: reqwest::Client,
    url: String,
    timeout_ms: u64,
}

impl HttpCalculationService {
    pub fn new(settings: &ServiceSettings) -> Result<Self, CalcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .build()
            .map_err(|e| CalcError::Transport {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            url: settings.derive_url(),
            timeout_ms: settings.timeout_ms,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, request: &DeriveRequest) -> Result<Envelope, CalcError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        match status {
            200..=299 => parse_envelope(&text),
            400 | 422 => Err(CalcError::Validation {
                fields: parse_validation_detail(&text),
            }),
            _ => Err(CalcError::Service {
                status,
                body: truncate(text),
            }),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> CalcError {
        if err.is_timeout() {
            CalcError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            CalcError::Transport {
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl CalculationService for HttpCalculationService {
    async fn derive(
        &self,
        request: DeriveRequest,
        cancel: CancellationToken,
    ) -> Result<Envelope, CalcError> {
        if cancel.is_cancelled() {
            return Err(CalcError::Cancelled);
        }

        tracing::debug!(
            "POST {} width_in={:.2} height_in={:.2}",
            self.url,
            request.width_in,
            request.height_in
        );

        // Dropping the send future on cancel aborts the connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CalcError::Cancelled),
            result = self.send(&request) => result,
        }
    }
}

/// Decode a success body
pub fn parse_envelope(body: &str) -> Result<Envelope, CalcError> {
    serde_json::from_str(body).map_err(|e| CalcError::Decode {
        reason: e.to_string(),
    })
}

#[derive(Deserialize)]
struct ValidationBody {
    detail: ValidationDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValidationDetail {
    Items(Vec<ValidationItem>),
    Message(String),
}

#[derive(Deserialize)]
struct ValidationItem {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    #[serde(default)]
    msg: String,
}

/// Extract one [`FieldError`] per rejected input from a 400/422 body.
///
/// Understands `{"detail": [{"loc": [..., "field"], "msg": ...}]}` and
/// `{"detail": "message"}`; anything else becomes a single `body` entry.
pub fn parse_validation_detail(body: &str) -> Vec<FieldError> {
    let parsed = match serde_json::from_str::<ValidationBody>(body) {
        Ok(parsed) => parsed,
        Err(_) => return vec![FieldError::new("body", truncate(body.to_string()))],
    };

    match parsed.detail {
        ValidationDetail::Message(msg) => vec![FieldError::new("body", msg)],
        ValidationDetail::Items(items) if items.is_empty() => {
            vec![FieldError::new("body", "request rejected")]
        }
        ValidationDetail::Items(items) => items
            .into_iter()
            .map(|item| {
                let field = item
                    .loc
                    .last()
                    .map(|segment| match segment {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| "body".to_string());
                FieldError::new(field, item.msg)
            })
            .collect(),
    }
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}
