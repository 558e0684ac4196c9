//! HTML page embedding the rendering surface.

use std::time::Duration;

use serde::Serialize;

/// Embed URL of the hosted diagram editor, with the JSON message protocol
/// and autosave events enabled.
pub const DEFAULT_EMBED_URL: &str = "https://embed.diagrams.net/?embed=1&proto=json&spin=1&autosave=1&libraries=1&saveAndExit=0&noSaveBtn=1&noExitBtn=1";

/// Default client poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

const SYNC_SCRIPT: &str = include_str!("sync.js");

/// Page template parameters that do not vary per request.
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// URL loaded into the iframe.
    pub embed_url: String,
    /// Host name the browser uses to reach this server.
    pub public_host: String,
    /// How often the page polls for remote updates.
    pub poll_interval: Duration,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            embed_url: DEFAULT_EMBED_URL.to_string(),
            public_host: "localhost".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PageConfig {
    /// Absolute URL of the state endpoint on the bound port.
    pub fn state_url(&self, port: u16) -> String {
        format!("http://{}:{}/api/state", self.public_host, port)
    }

    /// Origin the surface's messages must come from.
    pub fn embed_origin(&self) -> Option<String> {
        origin_of(&self.embed_url)
    }
}

/// `scheme://authority` of an absolute URL.
pub fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.is_empty() {
        return None;
    }
    Some(format!("{}://{}", scheme.to_ascii_lowercase(), authority.to_ascii_lowercase()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig<'a> {
    session_id: &'a str,
    state_url: String,
    origin: String,
    poll_ms: u64,
}

/// Render the editor page for `session_id`, served from `port`.
pub fn render_page(config: &PageConfig, session_id: &str, port: u16) -> String {
    let client = ClientConfig {
        session_id,
        state_url: config.state_url(port),
        origin: config.embed_origin().unwrap_or_default(),
        poll_ms: u64::try_from(config.poll_interval.as_millis()).unwrap_or(u64::MAX),
    };
    let client_json = serde_json::to_string(&client).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Diagram</title>
<style>
html, body {{ margin: 0; padding: 0; height: 100%; overflow: hidden; }}
#surface {{ border: 0; width: 100%; height: 100%; }}
</style>
</head>
<body>
<iframe id="surface" src="{src}"></iframe>
<script id="sync-config" type="application/json">{config}</script>
<script>
{script}</script>
</body>
</html>
"#,
        src = escape_attr(&config.embed_url),
        config = escape_script_json(&client_json),
        script = SYNC_SCRIPT,
    )
}

/// Make serialized JSON safe to place inside a `<script>` element.
fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
