//! Media operations delegated to an external task queue.
//!
//! Cropping and frame extraction need ffmpeg-class tooling, so the engine
//! only describes the work and hands it to a [`MediaService`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// A crop rectangle in percentages of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
  pub x_percent: f64,
  pub y_percent: f64,
  pub width_percent: f64,
  pub height_percent: f64,
}

impl Default for CropRegion {
  fn default() -> Self {
    Self {
      x_percent: 0.0,
      y_percent: 0.0,
      width_percent: 100.0,
      height_percent: 100.0,
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
  #[error("media service endpoint is not configured")]
  NotConfigured,

  #[error("media task failed: {0}")]
  Task(String),

  #[error("invalid media task response: {0}")]
  InvalidResponse(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait MediaService: Send + Sync {
  /// Crop an image and return the URL of the result.
  async fn crop_image(&self, image_url: &str, region: CropRegion) -> Result<String, MediaError>;

  /// Probe a video's duration in seconds. `None` when unknown.
  async fn video_duration(&self, video_url: &str) -> Result<Option<f64>, MediaError>;

  /// Extract the frame at `seconds` and return the URL of the image.
  async fn extract_frame(&self, video_url: &str, seconds: f64) -> Result<String, MediaError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
  /// Base URL of the task queue, e.g. `http://localhost:8787`.
  pub endpoint: Option<String>,
}

/// [`MediaService`] that posts tasks to `{endpoint}/tasks/{task}`.
///
/// The queue replies with `{"output": ...}` on success or
/// `{"error": "..."}` on failure.
#[derive(Debug, Clone)]
pub struct HttpMediaService {
  endpoint: Option<String>,
  http: Client,
}

#[derive(Debug, Deserialize)]
struct TaskReply {
  #[serde(default)]
  output: serde_json::Value,
  error: Option<String>,
}

impl HttpMediaService {
  pub fn new(config: MediaConfig) -> Self {
    Self {
      endpoint: config.endpoint.filter(|e| !e.is_empty()),
      http: Client::new(),
    }
  }

  async fn submit(
    &self,
    task: &str,
    payload: serde_json::Value,
  ) -> Result<serde_json::Value, MediaError> {
    let endpoint = self.endpoint.as_deref().ok_or(MediaError::NotConfigured)?;
    let url = format!("{}/tasks/{}", endpoint.trim_end_matches('/'), task);
    debug!(task = %task, "media_task_submitted");

    let response = self.http.post(&url).json(&payload).send().await?;
    let status = response.status();
    let body = response.text().await?;
    parse_reply(status.is_success(), status.as_u16(), &body)
  }
}

fn parse_reply(success: bool, status: u16, body: &str) -> Result<serde_json::Value, MediaError> {
  let reply: TaskReply = match serde_json::from_str(body) {
    Ok(reply) => reply,
    Err(_) if !success => return Err(MediaError::Task(format!("status {status}: {body}"))),
    Err(e) => return Err(MediaError::InvalidResponse(e.to_string())),
  };
  if let Some(error) = reply.error {
    return Err(MediaError::Task(error));
  }
  if !success {
    return Err(MediaError::Task(format!("status {status}")));
  }
  Ok(reply.output)
}

fn output_url(output: serde_json::Value) -> Result<String, MediaError> {
  match output {
    serde_json::Value::String(url) if !url.is_empty() => Ok(url),
    other => Err(MediaError::InvalidResponse(format!(
      "expected a URL, got {other}"
    ))),
  }
}

#[async_trait]
impl MediaService for HttpMediaService {
  async fn crop_image(&self, image_url: &str, region: CropRegion) -> Result<String, MediaError> {
    let output = self
      .submit(
        "crop-image",
        json!({
          "image_url": image_url,
          "x_percent": region.x_percent,
          "y_percent": region.y_percent,
          "width_percent": region.width_percent,
          "height_percent": region.height_percent,
        }),
      )
      .await?;
    output_url(output)
  }

  async fn video_duration(&self, video_url: &str) -> Result<Option<f64>, MediaError> {
    let output = self
      .submit("video-duration", json!({ "video_url": video_url }))
      .await?;
    Ok(output.as_f64().filter(|d| d.is_finite() && *d > 0.0))
  }

  async fn extract_frame(&self, video_url: &str, seconds: f64) -> Result<String, MediaError> {
    let output = self
      .submit(
        "extract-frame",
        json!({ "video_url": video_url, "timestamp": seconds }),
      )
      .await?;
    output_url(output)
  }
}
