//! Markup scrubbing for free-text form fields.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("valid script regex"));
static IFRAME_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<iframe\b.*?</iframe\s*>").expect("valid iframe regex"));
static JAVASCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript:").expect("valid scheme regex"));
static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("valid handler regex"));

/// Removes `<script>` and `<iframe>` blocks, `javascript:` schemes and inline
/// `on*=` handlers, then trims surrounding whitespace.
///
/// Other text, including harmless markup, is left alone; HTML escaping happens
/// where the text is rendered.
pub fn sanitize_text(input: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(input, "");
    let text = IFRAME_BLOCK.replace_all(&text, "");
    let text = JAVASCRIPT_SCHEME.replace_all(&text, "");
    let text = EVENT_HANDLER.replace_all(&text, "");
    text.trim().to_string()
}
