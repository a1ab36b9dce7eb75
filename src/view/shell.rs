//! Full page document.

use super::{SCROLL_ANCHOR_ID, composer, escape_html, transcript};
use crate::config::UiConfig;
use crate::widget::Snapshot;

const WIDGET_CSS: &str = r"
  body { margin: 0; font-family: system-ui, sans-serif; background: #f3f4f6; }
  .chat-widget { display: flex; flex-direction: column; height: 100vh; max-width: 40rem; margin: 0 auto; background: #fff; }
  .chat-header { padding: 1rem; font-weight: 600; font-size: 1.125rem; background: #7c3aed; color: #fff; }
  .chat-transcript { flex: 1; overflow-y: auto; padding: 1rem; display: flex; flex-direction: column; gap: 0.5rem; }
  .chat-row { display: flex; }
  .chat-row-user { justify-content: flex-end; }
  .chat-row-bot { justify-content: flex-start; }
  .chat-bubble { max-width: 75%; padding: 0.5rem 0.75rem; border-radius: 1rem; white-space: pre-wrap; word-wrap: break-word; }
  .chat-bubble-user { background: #7c3aed; color: #fff; }
  .chat-bubble-bot { background: #e5e7eb; color: #111827; }
  .chat-bubble-typing { background: #e5e7eb; color: #6b7280; font-style: italic; }
  .chat-composer { display: flex; gap: 0.5rem; padding: 0.75rem; border-top: 1px solid #e5e7eb; }
  .chat-input-wrap { flex: 1; }
  .chat-input { width: 100%; box-sizing: border-box; padding: 0.5rem 0.75rem; border: 1px solid #d1d5db; border-radius: 9999px; }
  .chat-send { padding: 0.5rem 1rem; border: 0; border-radius: 9999px; background: #7c3aed; color: #fff; cursor: pointer; }
  .chat-send[disabled] { opacity: 0.6; cursor: default; }
  .chat-spinner { display: inline-block; width: 1rem; height: 1rem; border: 2px solid #fff; border-top-color: transparent; border-radius: 50%; animation: chat-spin 0.8s linear infinite; }
  @keyframes chat-spin { to { transform: rotate(360deg); } }
";

/// Render the page for one session.
///
/// The widget root opens an SSE connection to the session's event stream;
/// `transcript` events replace the transcript pane and `send-button` events
/// replace the button. After either swap, and on first load, the scroll
/// anchor is scrolled into view.
#[must_use]
pub fn page(ui: &UiConfig, session_id: &str, snapshot: &Snapshot) -> String {
    let title = escape_html(&ui.title);
    let htmx_src = escape_html(&ui.htmx_src);
    let htmx_sse_src = escape_html(&ui.htmx_sse_src);
    let transcript = transcript(snapshot);
    let composer = composer(session_id, snapshot);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <script src="{htmx_src}"></script>
    <script src="{htmx_sse_src}"></script>
    <style>{WIDGET_CSS}</style>
</head>
<body>
    <div id="chat-widget" class="chat-widget" hx-ext="sse" sse-connect="/widget/{session_id}/events">
        <header class="chat-header">{title}</header>
        <div id="transcript" class="chat-transcript" sse-swap="transcript" hx-swap="innerHTML">{transcript}</div>
        {composer}
    </div>
    <script>
        window.clearDraft = function () {{
            var input = document.getElementById("draft-input");
            if (input && input.value.trim() !== "") {{ input.value = ""; }}
        }};
        (function () {{
            function scrollToEnd() {{
                var end = document.getElementById("{SCROLL_ANCHOR_ID}");
                if (end) {{ end.scrollIntoView({{ behavior: "smooth", block: "end" }}); }}
            }}
            ["htmx:afterSettle", "htmx:sseMessage"].forEach(function (name) {{
                document.body.addEventListener(name, function (evt) {{
                    if (evt.target && evt.target.id === "transcript") {{ scrollToEnd(); }}
                }});
            }});
            scrollToEnd();
        }})();
    </script>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{ChatEntry, Status, Transcript};

    fn ui() -> UiConfig {
        UiConfig {
            title: "🤖 Gemini AI Assistant".to_string(),
            htmx_src: "/static/htmx.min.js".to_string(),
            htmx_sse_src: "/static/sse.js".to_string(),
            static_dir: "static".to_string(),
        }
    }

    #[test]
    fn test_page_wires_session() {
        let mut transcript = Transcript::new();
        transcript.append(ChatEntry::user("Hello"));
        let snapshot = Snapshot {
            version: 1,
            transcript,
            draft: String::new(),
            revision: 1,
            loading: true,
            status: Status::Awaiting,
            outstanding: 1,
        };

        let html = page(&ui(), "s-1", &snapshot);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"sse-connect="/widget/s-1/events""#));
        assert!(html.contains("<header class=\"chat-header\">🤖 Gemini AI Assistant</header>"));
        assert!(html.contains(r#"<script src="/static/sse.js"></script>"#));
        assert!(html.contains("Typing..."));
        assert!(html.contains(r#"id="composer""#));
        assert!(html.contains(r#"getElementById("chat-end")"#));
        assert!(html.contains("window.clearDraft"));
    }
}
