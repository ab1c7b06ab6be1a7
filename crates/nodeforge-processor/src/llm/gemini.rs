use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::images::{InlineImage, load_image};
use super::{LlmClient, LlmConfig, LlmError, LlmRequest};

/// [`LlmClient`] backed by the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
  config: LlmConfig,
  http: Client,
}

impl GeminiClient {
  pub fn new(config: LlmConfig) -> Self {
    Self {
      config,
      http: Client::new(),
    }
  }

  async fn generate_with(
    &self,
    api_key: &str,
    model: &str,
    body: &serde_json::Value,
  ) -> Result<String, LlmError> {
    let url = format!(
      "{}/models/{}:generateContent",
      self.config.base_url.trim_end_matches('/'),
      model
    );
    debug!(model = %model, "llm_request");

    let response = self
      .http
      .post(&url)
      .header("x-goog-api-key", api_key)
      .json(body)
      .send()
      .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
      return Err(classify_error(status, &text, model));
    }

    let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| LlmError::Api {
      status: status.as_u16(),
      message: format!("unexpected response: {e}"),
    })?;
    let completion = parsed.text();
    if completion.is_empty() {
      return Err(LlmError::EmptyResponse);
    }
    Ok(completion)
  }
}

#[async_trait]
impl LlmClient for GeminiClient {
  async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
    let api_key = self
      .config
      .api_key
      .as_deref()
      .filter(|k| !k.is_empty())
      .ok_or(LlmError::MissingApiKey)?;

    let mut images = Vec::new();
    for url in request.images.iter().filter(|u| !u.is_empty()) {
      match load_image(&self.http, url).await {
        Ok(image) => images.push(image),
        Err(error) => warn!(url = %truncate(url), error = %error, "image_skipped"),
      }
    }
    let body = request_body(&request.prompt(), &images);

    match self
      .generate_with(api_key, &self.config.primary_model, &body)
      .await
    {
      Err(LlmError::ModelNotFound { model }) => {
        let Some(fallback) = self.config.fallback_model.as_deref() else {
          return Err(LlmError::ModelNotFound { model });
        };
        warn!(primary = %model, fallback = %fallback, "llm_model_fallback");
        self
          .generate_with(api_key, fallback, &body)
          .await
          .map_err(|e| match e {
            LlmError::QuotaExceeded => LlmError::QuotaExceeded,
            _ => LlmError::ModelUnavailable,
          })
      }
      other => other,
    }
  }
}

fn request_body(prompt: &str, images: &[InlineImage]) -> serde_json::Value {
  let mut parts = vec![json!({ "text": prompt })];
  parts.extend(images.iter().map(|image| {
    json!({
      "inlineData": { "mimeType": image.mime_type, "data": image.data }
    })
  }));
  json!({ "contents": [{ "role": "user", "parts": parts }] })
}

/// Map a non-success response onto an [`LlmError`].
fn classify_error(status: StatusCode, body: &str, model: &str) -> LlmError {
  let lower = body.to_lowercase();

  if status == StatusCode::TOO_MANY_REQUESTS
    || ["quota", "resource exhausted", "resource_exhausted", "rate limit"]
      .iter()
      .any(|needle| lower.contains(needle))
  {
    return LlmError::QuotaExceeded;
  }

  if status == StatusCode::NOT_FOUND
    || [
      "not found",
      "no longer available",
      "is not supported for generatecontent",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
  {
    return LlmError::ModelNotFound {
      model: model.to_string(),
    };
  }

  let message = serde_json::from_str::<ErrorEnvelope>(body)
    .map(|e| e.error.message)
    .unwrap_or_else(|_| body.to_string());
  LlmError::Api {
    status: status.as_u16(),
    message,
  }
}

fn truncate(url: &str) -> &str {
  match url.char_indices().nth(64) {
    Some((idx, _)) => &url[..idx],
    None => url,
  }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

impl GenerateResponse {
  fn text(&self) -> String {
    self
      .candidates
      .first()
      .and_then(|c| c.content.as_ref())
      .map(|content| {
        content
          .parts
          .iter()
          .filter_map(|p| p.text.as_deref())
          .collect::<String>()
      })
      .unwrap_or_default()
  }
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  message: String,
}
