//! JavaScript execution methods.

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::protocol::{Command, ScriptCommand};

use super::Tab;

// ============================================================================
// Tab - Script Execution
// ============================================================================

impl Tab {
    /// Executes synchronous JavaScript in the page context.
    ///
    /// The script should use `return` to return a value.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let title = tab.execute_script("return document.title").await?;
    /// ```
    pub async fn execute_script(&self, script: &str) -> Result<Value> {
        debug!(tab_id = %self.inner.tab_id, script_len = script.len(), "Executing script");

        let command = Command::Script(ScriptCommand::Evaluate {
            script: script.to_string(),
            args: vec![],
        });

        let value = script_value(self.send_command(command).await?.into_result()?);
        debug!(tab_id = %self.inner.tab_id, "Script executed");
        Ok(value)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Unwraps the `{ "value": ... }` envelope of a script result.
fn script_value(result: Value) -> Value {
    result.get("value").cloned().unwrap_or(Value::Null)
}

/// Escapes a string for safe use in JavaScript.
pub(crate) fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

// ============================================================================
// Tests
// ============================================================================
