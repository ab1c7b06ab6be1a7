use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::error::ProcessorError;
use crate::media::MediaService;
use crate::processor::{Inputs, Outputs, Processor, ProcessorContext, parse_inputs, single_output};
use crate::value::Timestamp;

#[derive(Debug, Deserialize)]
struct FrameInput {
  #[serde(default)]
  video_url: Option<String>,
  #[serde(default)]
  timestamp: Option<serde_json::Value>,
}

/// Runs the `extractFrame` node type through a [`MediaService`].
pub struct ExtractFrameProcessor {
  media: Arc<dyn MediaService>,
}

impl ExtractFrameProcessor {
  pub fn new(media: Arc<dyn MediaService>) -> Self {
    Self { media }
  }
}

#[async_trait]
impl Processor for ExtractFrameProcessor {
  async fn process(
    &self,
    ctx: &ProcessorContext,
    inputs: &Inputs,
  ) -> Result<Outputs, ProcessorError> {
    let input: FrameInput = parse_inputs(inputs)?;

    let video_url = input
      .video_url
      .filter(|u| !u.is_empty())
      .ok_or_else(|| ProcessorError::invalid_input("video_url", "a video URL is required"))?;
    let timestamp = Timestamp::parse(input.timestamp.as_ref())
      .map_err(|message| ProcessorError::invalid_input("timestamp", message))?;

    let duration = match timestamp {
      Timestamp::Seconds(_) => None,
      Timestamp::Percent(_) => match self.media.video_duration(&video_url).await {
        Ok(duration) => duration,
        Err(error) => {
          warn!(node_id = %ctx.node_id, error = %error, "video_duration_unavailable");
          None
        }
      },
    };

    let seconds = timestamp.to_seconds(duration);
    let url = self.media.extract_frame(&video_url, seconds).await?;
    Ok(single_output(url))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::testing::RecordingMedia;
  use serde_json::json;

  fn inputs(value: serde_json::Value) -> Inputs {
    value.as_object().cloned().unwrap()
  }

  #[tokio::test]
  async fn test_percentage_resolves_against_duration() {
    let media = Arc::new(RecordingMedia {
      duration: Some(40.0),
      ..Default::default()
    });
    let processor = ExtractFrameProcessor::new(media.clone());

    let outputs = processor
      .process(
        &ProcessorContext::new("r", "f"),
        &inputs(json!({ "video_url": "https://v/a.mp4", "timestamp": "25%" })),
      )
      .await
      .unwrap();
    assert_eq!(outputs["output"], json!("https://v/a.mp4@10"));
  }

  #[tokio::test]
  async fn test_percentage_without_duration_uses_start() {
    let media = Arc::new(RecordingMedia::default());
    let processor = ExtractFrameProcessor::new(media.clone());

    processor
      .process(
        &ProcessorContext::new("r", "f"),
        &inputs(json!({ "video_url": "https://v/a.mp4", "timestamp": "50%" })),
      )
      .await
      .unwrap();
    assert_eq!(media.frames.lock().unwrap()[0].1, 0.0);
  }

  #[tokio::test]
  async fn test_seconds_timestamp() {
    let media = Arc::new(RecordingMedia::default());
    let processor = ExtractFrameProcessor::new(media.clone());

    processor
      .process(
        &ProcessorContext::new("r", "f"),
        &inputs(json!({ "video_url": "https://v/a.mp4", "timestamp": "3.5" })),
      )
      .await
      .unwrap();
    assert_eq!(media.frames.lock().unwrap()[0].1, 3.5);
  }

  #[tokio::test]
  async fn test_requires_video_url() {
    let processor = ExtractFrameProcessor::new(Arc::new(RecordingMedia::default()));
    let err = processor
      .process(
        &ProcessorContext::new("r", "f"),
        &inputs(json!({ "timestamp": 1 })),
      )
      .await
      .unwrap_err();
    assert!(matches!(err, ProcessorError::InvalidInput { ref field, .. } if field == "video_url"));
  }
}
