//! Parsing helpers for loosely-typed numeric inputs.
//!
//! Values arrive either from static node configuration or from upstream
//! text outputs, so numbers may be JSON numbers, numeric strings, or
//! strings with a trailing `%`.

use serde_json::Value;

/// A frame position within a video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestamp {
  Seconds(f64),
  Percent(f64),
}

impl Timestamp {
  /// Parse a timestamp input. Missing, null, and empty values mean 0 s.
  pub fn parse(value: Option<&Value>) -> Result<Self, String> {
    let timestamp = match value {
      None | Some(Value::Null) => Timestamp::Seconds(0.0),
      Some(Value::Number(n)) => Timestamp::Seconds(n.as_f64().unwrap_or_default()),
      Some(Value::String(s)) => {
        let s = s.trim();
        if s.is_empty() {
          Timestamp::Seconds(0.0)
        } else if let Some(percent) = s.strip_suffix('%') {
          Timestamp::Percent(parse_number(percent)?)
        } else {
          Timestamp::Seconds(parse_number(s)?)
        }
      }
      Some(other) => return Err(format!("expected seconds or a percentage, got {other}")),
    };

    match timestamp {
      Timestamp::Seconds(v) | Timestamp::Percent(v) if v < 0.0 => {
        Err(format!("must not be negative, got {v}"))
      }
      Timestamp::Percent(v) if v > 100.0 => Err(format!("percentage must be at most 100, got {v}")),
      _ => Ok(timestamp),
    }
  }

  /// Absolute position in seconds. A percentage with an unknown duration
  /// resolves to 0.
  pub fn to_seconds(self, duration: Option<f64>) -> f64 {
    match (self, duration) {
      (Timestamp::Seconds(s), _) => s,
      (Timestamp::Percent(p), Some(d)) => d * p / 100.0,
      (Timestamp::Percent(_), None) => 0.0,
    }
  }
}

/// Parse a percentage in `[0, 100]`, accepting a trailing `%`.
pub fn parse_percent(value: Option<&Value>, default: f64) -> Result<f64, String> {
  let percent = match value {
    None | Some(Value::Null) => return Ok(default),
    Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
    Some(Value::String(s)) => {
      let s = s.trim();
      if s.is_empty() {
        return Ok(default);
      }
      parse_number(s.strip_suffix('%').unwrap_or(s))?
    }
    Some(other) => return Err(format!("expected a percentage, got {other}")),
  };

  if !(0.0..=100.0).contains(&percent) {
    return Err(format!("must be between 0 and 100, got {percent}"));
  }
  Ok(percent)
}

fn parse_number(s: &str) -> Result<f64, String> {
  s.trim()
    .parse::<f64>()
    .ok()
    .filter(|v| v.is_finite())
    .ok_or_else(|| format!("'{s}' is not a number"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_timestamp_forms() {
    assert_eq!(Timestamp::parse(None), Ok(Timestamp::Seconds(0.0)));
    assert_eq!(Timestamp::parse(Some(&json!(5))), Ok(Timestamp::Seconds(5.0)));
    assert_eq!(Timestamp::parse(Some(&json!("2.5"))), Ok(Timestamp::Seconds(2.5)));
    assert_eq!(Timestamp::parse(Some(&json!("50%"))), Ok(Timestamp::Percent(50.0)));
    assert_eq!(Timestamp::parse(Some(&json!(" 10 % "))), Ok(Timestamp::Percent(10.0)));
    assert!(Timestamp::parse(Some(&json!("abc"))).is_err());
    assert!(Timestamp::parse(Some(&json!(-1))).is_err());
    assert!(Timestamp::parse(Some(&json!("150%"))).is_err());
  }

  #[test]
  fn test_percent_timestamp_needs_duration() {
    assert_eq!(Timestamp::Percent(50.0).to_seconds(Some(30.0)), 15.0);
    assert_eq!(Timestamp::Percent(50.0).to_seconds(None), 0.0);
    assert_eq!(Timestamp::Seconds(4.0).to_seconds(None), 4.0);
  }

  #[test]
  fn test_parse_percent() {
    assert_eq!(parse_percent(None, 100.0), Ok(100.0));
    assert_eq!(parse_percent(Some(&json!(null)), 0.0), Ok(0.0));
    assert_eq!(parse_percent(Some(&json!(25)), 0.0), Ok(25.0));
    assert_eq!(parse_percent(Some(&json!("40%")), 0.0), Ok(40.0));
    assert!(parse_percent(Some(&json!(101)), 0.0).is_err());
    assert!(parse_percent(Some(&json!(true)), 0.0).is_err());
  }
}
