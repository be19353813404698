use std::{error::Error as StdError, fmt};

use serde_json::Value;
use taskforge_core::api::SynthesisConfig;

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiServiceErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Status,
    Empty,
}

impl AiServiceErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Status => "status",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for AiServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct AiServiceError {
    kind: AiServiceErrorKind,
    status: Option<u16>,
    url: String,
    message: String,
    source: Option<anyhow::Error>,
}

impl AiServiceError {
    pub fn kind(&self) -> AiServiceErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        let kind = if err.is_timeout() {
            AiServiceErrorKind::Timeout
        } else if err.is_connect() {
            AiServiceErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            AiServiceErrorKind::Body
        } else {
            AiServiceErrorKind::Request
        };
        Self {
            kind,
            status: err.status().map(|s| s.as_u16()),
            url: url.to_string(),
            message: err.to_string(),
            source: Some(anyhow::Error::new(err)),
        }
    }

    fn status_error(status: u16, url: &str, preview: String) -> Self {
        Self {
            kind: AiServiceErrorKind::Status,
            status: Some(status),
            url: url.to_string(),
            message: preview,
            source: None,
        }
    }

    fn empty(url: &str) -> Self {
        Self {
            kind: AiServiceErrorKind::Empty,
            status: None,
            url: url.to_string(),
            message: "response contained no text".to_string(),
            source: None,
        }
    }
}

impl fmt::Display for AiServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aiservice error kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        write!(f, " url={}: {}", self.url, self.message)
    }
}

impl StdError for AiServiceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

/// Pull the generated text out of the common response shapes.
pub fn extract_textish(v: &Value) -> Option<String> {
    if let Some(s) = v.as_str() {
        return Some(s.to_string());
    }
    for key in ["text", "output", "response", "content", "stdout"] {
        if let Some(s) = v.get(key).and_then(|x| x.as_str()) {
            return Some(s.to_string());
        }
    }
    // OpenAI-ish: { choices: [ { message: { content: "..." } } ] }
    if let Some(s) = v
        .get("choices")
        .and_then(|x| x.get(0))
        .and_then(|x| x.get("message"))
        .and_then(|x| x.get("content"))
        .and_then(|x| x.as_str())
    {
        return Some(s.to_string());
    }
    None
}

/// Non-streaming client for an HTTP text-generation endpoint.
///
/// Sends `{"prompt", "model", "stream": false}` and returns the reply text.
#[derive(Clone)]
pub struct AiServiceClient {
    http: reqwest::Client,
    url: String,
    model: Option<String>,
    api_key: String,
}

impl AiServiceClient {
    pub fn new(
        url: impl Into<String>,
        model: Option<String>,
        api_key: impl Into<String>,
        timeout_ms: u64,
    ) -> anyhow::Result<Self> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("aiservice url must be http(s), got: {}", url);
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            http,
            url,
            model,
            api_key: api_key.into(),
        })
    }

    pub fn from_config(cfg: &SynthesisConfig) -> anyhow::Result<Self> {
        Self::new(
            cfg.url.trim(),
            cfg.model.clone(),
            cfg.api_key.clone(),
            cfg.timeout_ms,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }

    pub async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        tracing::debug!(
            target: "taskforge.aiservice",
            url = %self.url,
            prompt_len = prompt.len(),
            model = ?self.model,
            "aiservice request"
        );
        let payload = serde_json::json!({
            "prompt": prompt,
            "model": self.model,
            "stream": false,
        });

        let req = self.http.post(&self.url).json(&payload);
        let resp = self
            .auth(req)
            .send()
            .await
            .map_err(|err| AiServiceError::from_reqwest(err, &self.url))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| AiServiceError::from_reqwest(err, &self.url))?;
        if !status.is_success() {
            return Err(
                AiServiceError::status_error(status.as_u16(), &self.url, preview_body(&body))
                    .into(),
            );
        }

        // JSON replies carry the text in a field; anything else is the text itself.
        let text = match serde_json::from_str::<Value>(&body) {
            Ok(v) => extract_textish(&v).unwrap_or_else(|| v.to_string()),
            Err(_) => body,
        };
        if text.trim().is_empty() {
            return Err(AiServiceError::empty(&self.url).into());
        }

        tracing::debug!(
            target: "taskforge.aiservice",
            status = %status,
            reply_len = text.len(),
            "aiservice reply"
        );
        Ok(text)
    }
}
