//! Scrolling and measurement inside the page.
//!
//! Every call re-resolves the scroll root from a JavaScript expression:
//! the document scrolling element, or an inner container the discovery
//! script tagged with [`ROOT_ATTRIBUTE`].

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::capability::{PageContext, PageMetrics, ScrollRoot};
use crate::error::Result;

use super::Tab;
use super::script::json_string;

// ============================================================================
// Constants
// ============================================================================

/// Attribute marking the inner scroll container.
const ROOT_ATTRIBUTE: &str = "data-fullpage-capture-root";

/// An element must beat the current best by more than this to win.
const ROOT_MARGIN_PX: u32 = 50;

/// Window scroll offset across engines.
const WINDOW_OFFSET_JS: &str = "(window.scrollY || window.pageYOffset || \
     document.documentElement.scrollTop || (document.body && document.body.scrollTop) || 0)";

// ============================================================================
// Tab - PageContext
// ============================================================================

#[async_trait]
impl PageContext for Tab {
    async fn find_scroll_root(&self) -> Result<ScrollRoot> {
        let token = Uuid::new_v4().simple().to_string();
        let result = self.execute_script(&find_root_script(&token)).await?;

        let root = match result.get("token").and_then(Value::as_str) {
            Some(found) => ScrollRoot::Element {
                token: found.to_string(),
                scrollable_height: px(&result, "scrollable"),
            },
            None => ScrollRoot::Document,
        };

        debug!(tab_id = %self.inner.tab_id, ?root, "Scroll root resolved");
        Ok(root)
    }

    async fn measure(&self, root: &ScrollRoot) -> Result<PageMetrics> {
        let script = format!(
            "const root = {};
             return {{
                 contentHeight: root.scrollHeight,
                 viewportHeight: window.innerHeight,
                 viewportWidth: window.innerWidth
             }};",
            root_expr(root)
        );
        let result = self.execute_script(&script).await?;

        Ok(PageMetrics {
            content_height: px(&result, "contentHeight"),
            viewport_height: px(&result, "viewportHeight"),
            viewport_width: px(&result, "viewportWidth"),
        })
    }

    async fn scroll_offset(&self, root: &ScrollRoot) -> Result<u32> {
        let result = self
            .execute_script(&format!("return {{ offset: {} }};", offset_expr(root)))
            .await?;
        Ok(px(&result, "offset"))
    }

    async fn scroll_to(&self, root: &ScrollRoot, offset: u32) -> Result<()> {
        debug!(tab_id = %self.inner.tab_id, offset, "Scrolling to");
        self.execute_script(&scroll_to_script(root, offset)).await?;
        Ok(())
    }

    async fn scroll_by(&self, root: &ScrollRoot, delta: i64) -> Result<()> {
        debug!(tab_id = %self.inner.tab_id, delta, "Scrolling by");

        let script = match root {
            ScrollRoot::Document => format!("window.scrollBy(0, {delta});"),
            ScrollRoot::Element { .. } => format!(
                "window.scrollBy(0, {delta}); {}.scrollTop += {delta};",
                root_expr(root)
            ),
        };
        self.execute_script(&script).await?;
        Ok(())
    }

    async fn flush_layout(&self) -> Result<()> {
        self.execute_script(
            "void document.documentElement.offsetHeight;
             if (document.body) { void document.body.offsetHeight; }",
        )
        .await?;
        Ok(())
    }

    async fn scroll_to_top_smooth(&self, root: &ScrollRoot) -> Result<()> {
        let script = match root {
            ScrollRoot::Document => {
                "window.scrollTo({ top: 0, left: 0, behavior: 'smooth' });".to_string()
            }
            ScrollRoot::Element { .. } => format!(
                "window.scrollTo({{ top: 0, left: 0, behavior: 'smooth' }});
                 {}.scrollTo({{ top: 0, behavior: 'smooth' }});",
                root_expr(root)
            ),
        };
        self.execute_script(&script).await?;
        Ok(())
    }
}

// ============================================================================
// Script Builders
// ============================================================================

/// Discovery script: tags the winning inner container with `token`.
///
/// Returns `{ token: null }` when the document itself scrolls furthest.
fn find_root_script(token: &str) -> String {
    format!(
        "const base = document.scrollingElement || document.documentElement;
         let best = null;
         let bestScrollable = (base.scrollHeight - base.clientHeight) || 0;
         document.querySelectorAll('[{attr}]').forEach(el => el.removeAttribute('{attr}'));
         try {{
             for (const el of document.querySelectorAll('*')) {{
                 if (!(el instanceof HTMLElement)) continue;
                 if (el === base || el === document.body) continue;
                 const overflowY = getComputedStyle(el).overflowY;
                 const scrollable = el.scrollHeight - el.clientHeight;
                 if ((overflowY === 'auto' || overflowY === 'scroll' || overflowY === 'overlay')
                     && scrollable > bestScrollable + {margin}
                     && el.clientHeight > 0) {{
                     best = el;
                     bestScrollable = scrollable;
                 }}
             }}
         }} catch (e) {{}}
         if (best === null) {{
             return {{ token: null, scrollable: bestScrollable }};
         }}
         best.setAttribute('{attr}', {token});
         return {{ token: {token}, scrollable: bestScrollable }};",
        attr = ROOT_ATTRIBUTE,
        margin = ROOT_MARGIN_PX,
        token = json_string(token),
    )
}

/// JavaScript expression evaluating to the root element.
fn root_expr(root: &ScrollRoot) -> String {
    match root {
        ScrollRoot::Document => "(document.scrollingElement || document.documentElement)".to_string(),
        ScrollRoot::Element { token, .. } => format!(
            "(document.querySelector({}) || document.scrollingElement || document.documentElement)",
            json_string(&format!("[{ROOT_ATTRIBUTE}=\"{token}\"]"))
        ),
    }
}

/// JavaScript expression evaluating to the current vertical offset.
fn offset_expr(root: &ScrollRoot) -> String {
    match root {
        ScrollRoot::Document => WINDOW_OFFSET_JS.to_string(),
        ScrollRoot::Element { .. } => format!("({}.scrollTop || 0)", root_expr(root)),
    }
}

/// Sets the offset through every scroll API, then flushes layout.
fn scroll_to_script(root: &ScrollRoot, offset: u32) -> String {
    format!(
        "window.scrollTo({{ top: {offset}, left: 0, behavior: 'instant' }});
         window.scroll(0, {offset});
         document.documentElement.scrollTop = {offset};
         if (document.body) {{ document.body.scrollTop = {offset}; }}
         {root}.scrollTop = {offset};
         void document.documentElement.offsetHeight;",
        root = root_expr(root),
    )
}

/// Reads a pixel measurement, rounding fractional CSS pixels.
fn px(value: &Value, key: &str) -> u32 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v.round().min(f64::from(u32::MAX)) as u32)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn element_root() -> ScrollRoot {
        ScrollRoot::Element {
            token: "abc123".to_string(),
            scrollable_height: 4000,
        }
    }

    #[test]
    fn test_px_rounds_and_clamps() {
        let value = json!({ "a": 1000.6, "b": -5, "c": "x" });
        assert_eq!(px(&value, "a"), 1001);
        assert_eq!(px(&value, "b"), 0);
        assert_eq!(px(&value, "c"), 0);
        assert_eq!(px(&value, "missing"), 0);
    }

    #[test]
    fn test_root_expr_addresses_tagged_element() {
        let expr = root_expr(&element_root());
        assert!(expr.contains(ROOT_ATTRIBUTE));
        assert!(expr.contains("abc123"));
        assert!(root_expr(&ScrollRoot::Document).contains("scrollingElement"));
    }

    #[test]
    fn test_offset_expr_per_root() {
        assert!(offset_expr(&ScrollRoot::Document).contains("window.scrollY"));
        assert!(offset_expr(&element_root()).contains(".scrollTop"));
    }

    #[test]
    fn test_scroll_to_script_uses_every_api() {
        let script = scroll_to_script(&element_root(), 900);
        assert!(script.contains("window.scrollTo({ top: 900"));
        assert!(script.contains("window.scroll(0, 900)"));
        assert!(script.contains("document.documentElement.scrollTop = 900"));
        assert!(script.contains("document.body.scrollTop = 900"));
        assert!(script.contains("abc123"));
    }

    #[test]
    fn test_find_root_script_embeds_token_and_margin() {
        let script = find_root_script("tok");
        assert!(script.contains("\"tok\""));
        assert!(script.contains("bestScrollable + 50"));
        assert!(script.contains("el.clientHeight > 0"));
    }
}
