//! Command definitions organized by module.
//!
//! Commands follow `module.methodName` format.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `browsingContext` | Visible-tab capture, focus |
//! | `script` | JavaScript execution in the page |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// BrowsingContext module commands.
    BrowsingContext(BrowsingContextCommand),
    /// Script module commands.
    Script(ScriptCommand),
}

// ============================================================================
// BrowsingContext Commands
// ============================================================================

/// BrowsingContext module commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowsingContextCommand {
    /// Capture the visible area of the foreground tab.
    #[serde(rename = "browsingContext.captureScreenshot")]
    CaptureScreenshot {
        /// Image format (`png`).
        format: String,
        /// Encoder quality, ignored for lossless formats.
        #[serde(skip_serializing_if = "Option::is_none")]
        quality: Option<u8>,
    },

    /// Focus tab (make it the visible one).
    #[serde(rename = "browsingContext.focusTab")]
    FocusTab,
}

// ============================================================================
// Script Commands
// ============================================================================

/// Script module commands for JavaScript execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ScriptCommand {
    /// Execute synchronous script.
    #[serde(rename = "script.evaluate")]
    Evaluate {
        /// JavaScript code.
        script: String,
        /// Script arguments.
        #[serde(default)]
        args: Vec<Value>,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_capture_screenshot() {
        let cmd = Command::BrowsingContext(BrowsingContextCommand::CaptureScreenshot {
            format: "png".to_string(),
            quality: None,
        });
        let value = serde_json::to_value(&cmd).expect("serialize");
        assert_eq!(
            value,
            json!({
                "method": "browsingContext.captureScreenshot",
                "params": { "format": "png" }
            })
        );
    }

    #[test]
    fn test_focus_tab() {
        let cmd = BrowsingContextCommand::FocusTab;
        let json = serde_json::to_string(&cmd).expect("serialize");
        assert!(json.contains("browsingContext.focusTab"));
    }

    #[test]
    fn test_script_evaluate() {
        let cmd = ScriptCommand::Evaluate {
            script: "return window.scrollY".to_string(),
            args: vec![json!(1)],
        };
        let json = serde_json::to_string(&cmd).expect("serialize");
        assert!(json.contains("script.evaluate"));
        assert!(json.contains("window.scrollY"));
    }
}
