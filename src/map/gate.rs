//! Client-side access gate injection.
//!
//! Post-processes the rendered document: a script spliced in right after
//! the head-open tag checks an `access` query parameter against a stored
//! SHA-256 digest and blanks the page on mismatch, and an Update Map
//! button spliced in before the body-close tag POSTs to the external
//! trigger endpoint.
//!
//! This is obfuscation, not security: the check and the target digest
//! both ship inside the published document, readable by any viewer.

use crate::config::GateConfig;
use tracing::debug;

/// User agents allowed through without the access check, so link
/// previews and crawlers keep working.
const BOT_PATTERN: &str = "HubSpot|HubSpot-Webhooks|HubSpot-Crawler|bot|crawl|spider";

/// Inject the gate script and the refresh button into a rendered document.
///
/// Both insertions are first-occurrence string splices; a document
/// missing a marker passes through unchanged for that insertion.
pub fn inject_gate(html: &str, config: &GateConfig) -> String {
    let with_gate = splice_after(html, "<head>", &gate_script(config));
    splice_before(&with_gate, "</body>", &trigger_button(config))
}

/// Insert `insertion` immediately after the first occurrence of `marker`.
fn splice_after(document: &str, marker: &str, insertion: &str) -> String {
    match document.find(marker) {
        Some(pos) => {
            let split = pos + marker.len();
            format!("{}{}{}", &document[..split], insertion, &document[split..])
        }
        None => {
            debug!("Marker {:?} not found; document left unchanged", marker);
            document.to_string()
        }
    }
}

/// Insert `insertion` immediately before the last occurrence of `marker`.
fn splice_before(document: &str, marker: &str, insertion: &str) -> String {
    match document.rfind(marker) {
        Some(pos) => format!("{}{}{}", &document[..pos], insertion, &document[pos..]),
        None => {
            debug!("Marker {:?} not found; document left unchanged", marker);
            document.to_string()
        }
    }
}

/// The access-check script block.
fn gate_script(config: &GateConfig) -> String {
    format!(
        r#"
<script>
window.onload = async function () {{
  const bot = /{bot_pattern}/i.test(navigator.userAgent);
  if (bot) return; // allow bots

  const urlParams = new URLSearchParams(window.location.search);
  const access = urlParams.get("access");
  const validHash = "{digest}";

  if (access) {{
    const encoder = new TextEncoder();
    const data = encoder.encode(access);
    const hashBuffer = await crypto.subtle.digest('SHA-256', data);
    const hashArray = Array.from(new Uint8Array(hashBuffer));
    const hashHex = hashArray.map(b => b.toString(16).padStart(2, '0')).join('');
    if (hashHex === validHash) return;
  }}

  document.body.innerHTML = "<h2 style='color:red; text-align:center;'>Access Denied</h2>";
}};
</script>
"#,
        bot_pattern = BOT_PATTERN,
        digest = config.digest
    )
}

/// The Update Map button and its trigger script.
fn trigger_button(config: &GateConfig) -> String {
    format!(
        r#"<button onclick="triggerUpdate()" style="
    position: fixed;
    bottom: 20px;
    right: 20px;
    z-index: 9999;
    padding: 12px 20px;
    background-color: #0070f3;
    color: white;
    border: none;
    border-radius: 8px;
    font-size: 14px;
    cursor: pointer;
    box-shadow: 0 2px 6px rgba(0,0,0,0.3);
">
  Update Map
</button>
<script>
  async function triggerUpdate() {{
    const res = await fetch('{trigger_path}', {{ method: 'POST' }});
    const json = await res.json();
    alert(json.message || json.error);
  }}
</script>
"#,
        trigger_path = config.trigger_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    const DOC: &str = "<html>\n<head>\n<title>t</title>\n</head>\n<body>\n<div id=\"map\"></div>\n</body>\n</html>\n";

    #[test]
    fn test_gate_inserted_after_head_open() {
        let config = GateConfig::default();
        let gated = inject_gate(DOC, &config);

        let head_pos = gated.find("<head>").unwrap();
        let script_pos = gated.find("window.onload").unwrap();
        let title_pos = gated.find("<title>").unwrap();

        assert!(head_pos < script_pos);
        assert!(script_pos < title_pos);
        assert!(gated.contains(&config.digest));
    }

    #[test]
    fn test_button_inserted_before_body_close() {
        let config = GateConfig::default();
        let gated = inject_gate(DOC, &config);

        let button_pos = gated.find("triggerUpdate").unwrap();
        let body_close_pos = gated.rfind("</body>").unwrap();

        assert!(button_pos < body_close_pos);
        assert!(gated.contains("fetch('/api/trigger', { method: 'POST' })"));
    }

    #[test]
    fn test_custom_trigger_path() {
        let config = GateConfig {
            trigger_path: "/hooks/rebuild".to_string(),
            ..GateConfig::default()
        };
        let gated = inject_gate(DOC, &config);

        assert!(gated.contains("fetch('/hooks/rebuild'"));
        assert!(!gated.contains("/api/trigger"));
    }

    #[test]
    fn test_bot_allowlist_present() {
        let gated = inject_gate(DOC, &GateConfig::default());
        assert!(gated.contains("HubSpot|HubSpot-Webhooks|HubSpot-Crawler|bot|crawl|spider"));
    }

    #[test]
    fn test_document_without_markers_unchanged() {
        let doc = "<p>no head or body tags</p>";
        assert_eq!(inject_gate(doc, &GateConfig::default()), doc);
    }

    #[test]
    fn test_default_digest_matches_known_secret() {
        // The default digest is SHA-256 of the original deployment secret.
        let digest = hex::encode(Sha256::digest(b"halos2025"));
        assert_eq!(digest, GateConfig::default().digest);
    }

    #[test]
    fn test_gate_only_injected_once() {
        let gated = inject_gate(DOC, &GateConfig::default());
        assert_eq!(gated.matches("window.onload").count(), 1);
        assert_eq!(gated.matches("triggerUpdate()").count(), 2); // onclick + definition
    }
}
