//! Server-rendered HTML for the widget.
//!
//! The page is plain HTML driven by HTMX: the transcript pane and the send
//! button are re-rendered on the server and pushed over SSE; the input posts
//! draft edits and submissions back. Nothing here holds state: every
//! function renders from a [`Snapshot`].
//!
//! # Structure
//!
//! - [`shell`]: full page document
//! - [`message_list`]: transcript pane (bubbles, typing indicator, scroll anchor)
//! - [`input_area`]: draft input, revision field and send button
//!
//! [`Snapshot`]: crate::widget::Snapshot

pub mod input_area;
pub mod message_list;
pub mod shell;

pub use input_area::{composer, revision_field, send_button};
pub use message_list::transcript;
pub use shell::page;

/// Id of the element every re-render scrolls into view.
pub const SCROLL_ANCHOR_ID: &str = "chat-end";

/// Escape text for use in HTML content and double- or single-quoted
/// attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
