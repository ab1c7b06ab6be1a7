//! Loading image references into inline base64 payloads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Why an image reference could not be loaded.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ImageError {
  #[error("malformed data URL")]
  MalformedDataUrl,

  #[error("image request failed with status {0}")]
  Status(u16),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

/// An image ready to be embedded in a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InlineImage {
  pub mime_type: String,
  pub data: String,
}

/// Parse `data:<mime>;base64,<payload>`.
pub(crate) fn parse_data_url(url: &str) -> Option<InlineImage> {
  let rest = url.strip_prefix("data:")?;
  let (mime_type, data) = rest.split_once(";base64,")?;
  if mime_type.is_empty() || data.is_empty() {
    return None;
  }
  Some(InlineImage {
    mime_type: mime_type.to_string(),
    data: data.to_string(),
  })
}

/// Resolve an image reference, either inline or over HTTP.
pub(crate) async fn load_image(http: &Client, url: &str) -> Result<InlineImage, ImageError> {
  if url.starts_with("data:") {
    return parse_data_url(url).ok_or(ImageError::MalformedDataUrl);
  }

  let response = http.get(url).send().await?;
  if !response.status().is_success() {
    return Err(ImageError::Status(response.status().as_u16()));
  }

  let mime_type = response
    .headers()
    .get(reqwest::header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.to_string())
    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
  let bytes = response.bytes().await?;

  Ok(InlineImage {
    mime_type,
    data: STANDARD.encode(&bytes),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_data_url() {
    let image = parse_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, "iVBORw0KGgo=");
  }

  #[test]
  fn test_parse_data_url_rejects_non_base64() {
    assert!(parse_data_url("data:text/plain,hello").is_none());
    assert!(parse_data_url("data:;base64,abc").is_none());
    assert!(parse_data_url("https://example.com/a.png").is_none());
  }

  #[tokio::test]
  async fn test_load_malformed_data_url_fails() {
    let err = load_image(&Client::new(), "data:image/png,raw").await.unwrap_err();
    assert!(matches!(err, ImageError::MalformedDataUrl));
    assert_eq!(err.to_string(), "malformed data URL");
  }
}
