//! Visible-area capture and tab focus.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::Value;
use tracing::debug;

use crate::capability::ViewportCapture;
use crate::error::{Error, Result};
use crate::protocol::{BrowsingContextCommand, Command};

use super::Tab;

// ============================================================================
// Constants
// ============================================================================

/// Format requested from the browser; frames must be lossless to stitch.
const CAPTURE_FORMAT: &str = "png";

// ============================================================================
// Tab - Screenshot
// ============================================================================

impl Tab {
    /// Captures what the tab currently shows and returns the PNG bytes.
    ///
    /// Uses the browser's native visible-tab capture, so the tab must be
    /// in the foreground and the page must already be settled.
    pub async fn capture_visible_png(&self) -> Result<Vec<u8>> {
        debug!(tab_id = %self.inner.tab_id, "Capturing visible area");

        let command = Command::BrowsingContext(BrowsingContextCommand::CaptureScreenshot {
            format: CAPTURE_FORMAT.to_string(),
            quality: None,
        });

        let result = self.send_command(command).await?.into_result()?;
        decode_capture(&result)
    }

    /// Brings the tab to the foreground.
    pub async fn focus(&self) -> Result<()> {
        debug!(tab_id = %self.inner.tab_id, "Focusing tab");

        let command = Command::BrowsingContext(BrowsingContextCommand::FocusTab);
        self.send_command(command).await?.into_result()?;
        Ok(())
    }
}

#[async_trait]
impl ViewportCapture for Tab {
    async fn capture_visible(&self) -> Result<Vec<u8>> {
        self.capture_visible_png().await
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Decodes the base64 payload of a capture result.
///
/// Accepts raw base64 as well as a `data:image/png;base64,` URL.
fn decode_capture(result: &Value) -> Result<Vec<u8>> {
    let data = result
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::protocol(format!("Screenshot response missing data field. Got: {result}"))
        })?;

    let encoded = data
        .split_once(";base64,")
        .map_or(data, |(_, payload)| payload);

    Base64Standard
        .decode(encoded)
        .map_err(|e| Error::protocol(format!("Failed to decode base64: {e}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_decode_raw_base64() {
        let bytes = decode_capture(&json!({ "data": "iVBORw==" })).expect("decode");
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_decode_data_url() {
        let bytes =
            decode_capture(&json!({ "data": "data:image/png;base64,iVBORw==" })).expect("decode");
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_decode_missing_data() {
        let err = decode_capture(&json!({})).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_invalid_base64() {
        let err = decode_capture(&json!({ "data": "***" })).unwrap_err();
        assert!(err.to_string().contains("base64"));
    }
}
