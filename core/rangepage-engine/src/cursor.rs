//! Cursor codec.
//!
//! Continuation cursors are the JSON form of a [`ResumePoint`] in unpadded
//! URL-safe base64. Decoding never fails: anything that does not decode to a
//! non-empty resume point means "start of partition".

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rangepage_types::{KeyComponent, KeyValue, ResumePoint};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Upper bound on accepted token length.
pub const MAX_CURSOR_TOKEN_LEN: usize = 8 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
enum CursorDecodeError {
    #[error("cursor token is empty")]
    Empty,

    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor token is not base64url: {0}")]
    Base64(String),

    #[error("cursor token is not a resume point: {0}")]
    Json(String),
}

/// Accepted wire forms: the component list we emit, and the flat key map
/// older clients hold.
#[derive(Deserialize)]
#[serde(untagged)]
enum WirePoint {
    Components(ResumePoint),
    KeyMap(BTreeMap<String, KeyValue>),
}

/// Encodes a resume point as a cursor. Empty or absent points yield `None`.
#[must_use]
pub fn encode_cursor(point: Option<&ResumePoint>) -> Option<String> {
    let point = point.filter(|p| !p.is_empty())?;
    match serde_json::to_vec(point) {
        Ok(json) => Some(URL_SAFE_NO_PAD.encode(json)),
        Err(e) => {
            debug!("Failed to serialize resume point: {}", e);
            None
        }
    }
}

/// Decodes a cursor. Absent, empty, oversized or garbled tokens yield `None`.
#[must_use]
pub fn decode_cursor(token: Option<&str>) -> Option<ResumePoint> {
    let token = token?;
    match try_decode(token) {
        Ok(point) if !point.is_empty() => Some(point),
        Ok(_) => None,
        Err(CursorDecodeError::Empty) => None,
        Err(e) => {
            debug!("Ignoring undecodable cursor: {}", e);
            None
        }
    }
}

fn try_decode(token: &str) -> Result<ResumePoint, CursorDecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CursorDecodeError::Empty);
    }
    if token.len() > MAX_CURSOR_TOKEN_LEN {
        return Err(CursorDecodeError::TooLong {
            len: token.len(),
            max: MAX_CURSOR_TOKEN_LEN,
        });
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim_end_matches('='))
        .map_err(|e| CursorDecodeError::Base64(e.to_string()))?;
    let wire: WirePoint =
        serde_json::from_slice(&bytes).map_err(|e| CursorDecodeError::Json(e.to_string()))?;

    Ok(match wire {
        WirePoint::Components(point) => point,
        WirePoint::KeyMap(keys) => {
            ResumePoint::from_components(keys.into_iter().map(|(k, v)| KeyComponent::new(k, v)))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_decode_reports_each_failure() {
        assert_eq!(try_decode("  "), Err(CursorDecodeError::Empty));
        assert!(matches!(
            try_decode(&"a".repeat(MAX_CURSOR_TOKEN_LEN + 1)),
            Err(CursorDecodeError::TooLong { .. })
        ));
        assert!(matches!(try_decode("%%%"), Err(CursorDecodeError::Base64(_))));
        let not_json = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(matches!(try_decode(&not_json), Err(CursorDecodeError::Json(_))));
    }
}
