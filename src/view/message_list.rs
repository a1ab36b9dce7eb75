//! Transcript pane.

use std::fmt::Write;

use super::{SCROLL_ANCHOR_ID, escape_html};
use crate::widget::{ChatEntry, Sender, Snapshot};

/// Placeholder shown after the last entry while a request is outstanding.
pub const TYPING_TEXT: &str = "Typing...";

/// Render the inner HTML of the transcript pane.
///
/// Entries come out in transcript order, one bubble each. While loading, a
/// typing bubble follows the last entry. The scroll anchor is always last so
/// scrolling it into view shows the newest element.
#[must_use]
pub fn transcript(snapshot: &Snapshot) -> String {
    let mut html = String::new();

    for entry in &snapshot.transcript {
        html.push_str(&bubble(entry));
    }

    if snapshot.loading {
        let _ = write!(
            html,
            r#"<div class="chat-row chat-row-bot"><div class="chat-bubble chat-bubble-typing" aria-live="polite">{TYPING_TEXT}</div></div>"#
        );
    }

    let _ = write!(html, r#"<div id="{SCROLL_ANCHOR_ID}"></div>"#);
    html
}

fn bubble(entry: &ChatEntry) -> String {
    let (row, bubble) = match entry.sender() {
        Sender::User => ("chat-row chat-row-user", "chat-bubble chat-bubble-user"),
        Sender::Bot if entry.is_error() => {
            ("chat-row chat-row-bot", "chat-bubble chat-bubble-bot chat-bubble-error")
        }
        Sender::Bot => ("chat-row chat-row-bot", "chat-bubble chat-bubble-bot"),
    };
    format!(
        r#"<div class="{row}"><div class="{bubble}">{}</div></div>"#,
        escape_html(entry.text())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{ChatEntry, Status, Transcript};

    fn snapshot(entries: Vec<ChatEntry>, loading: bool) -> Snapshot {
        let mut transcript = Transcript::new();
        for entry in entries {
            transcript.append(entry);
        }
        Snapshot {
            version: 1,
            transcript,
            draft: String::new(),
            revision: 0,
            loading,
            status: if loading { Status::Awaiting } else { Status::Idle },
            outstanding: usize::from(loading),
        }
    }

    #[test]
    fn test_bubbles_follow_transcript_order() {
        let html = transcript(&snapshot(
            vec![ChatEntry::user("Hello"), ChatEntry::bot("Hi there!")],
            false,
        ));

        let user = html.find("chat-bubble-user\">Hello<").unwrap();
        let bot = html.find("chat-bubble-bot\">Hi there!<").unwrap();
        assert!(user < bot);
        assert!(!html.contains(TYPING_TEXT));
        assert!(html.ends_with(r#"<div id="chat-end"></div>"#));
    }

    #[test]
    fn test_typing_indicator_only_while_loading() {
        let html = transcript(&snapshot(vec![ChatEntry::user("Hello")], true));
        let typing = html.find(TYPING_TEXT).unwrap();
        assert!(typing > html.find("Hello").unwrap());
        assert!(typing < html.find("chat-end").unwrap());
        assert_eq!(html.matches(TYPING_TEXT).count(), 1);
    }

    #[test]
    fn test_entry_text_is_escaped() {
        let html = transcript(&snapshot(vec![ChatEntry::user("<b>hi</b>")], false));
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_error_bubble_is_marked() {
        let html = transcript(&snapshot(
            vec![ChatEntry::user("Ping"), ChatEntry::bot_error()],
            false,
        ));
        assert!(html.contains("chat-bubble-error\">❌ Error contacting Gemini API<"));
    }
}
