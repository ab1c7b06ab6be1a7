use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProcessorError;
use crate::media::{CropRegion, MediaService};
use crate::processor::{Inputs, Outputs, Processor, ProcessorContext, parse_inputs, single_output};
use crate::value::parse_percent;

#[derive(Debug, Deserialize)]
struct CropInput {
  #[serde(default)]
  image_url: Option<String>,
  #[serde(default)]
  x_percent: Option<serde_json::Value>,
  #[serde(default)]
  y_percent: Option<serde_json::Value>,
  #[serde(default)]
  width_percent: Option<serde_json::Value>,
  #[serde(default)]
  height_percent: Option<serde_json::Value>,
}

/// Runs the `cropImage` node type through a [`MediaService`].
pub struct CropImageProcessor {
  media: Arc<dyn MediaService>,
}

impl CropImageProcessor {
  pub fn new(media: Arc<dyn MediaService>) -> Self {
    Self { media }
  }
}

fn percent(
  value: Option<&serde_json::Value>,
  field: &str,
  default: f64,
) -> Result<f64, ProcessorError> {
  parse_percent(value, default).map_err(|message| ProcessorError::invalid_input(field, message))
}

#[async_trait]
impl Processor for CropImageProcessor {
  async fn process(
    &self,
    _ctx: &ProcessorContext,
    inputs: &Inputs,
  ) -> Result<Outputs, ProcessorError> {
    let input: CropInput = parse_inputs(inputs)?;

    let image_url = input
      .image_url
      .filter(|u| !u.is_empty())
      .ok_or_else(|| ProcessorError::invalid_input("image_url", "an image URL is required"))?;

    let region = CropRegion {
      x_percent: percent(input.x_percent.as_ref(), "x_percent", 0.0)?,
      y_percent: percent(input.y_percent.as_ref(), "y_percent", 0.0)?,
      width_percent: percent(input.width_percent.as_ref(), "width_percent", 100.0)?,
      height_percent: percent(input.height_percent.as_ref(), "height_percent", 100.0)?,
    };
    if region.width_percent <= 0.0 || region.height_percent <= 0.0 {
      return Err(ProcessorError::invalid_input(
        "width_percent",
        "crop region must have a non-zero size",
      ));
    }

    let url = self.media.crop_image(&image_url, region).await?;
    Ok(single_output(url))
  }
}
