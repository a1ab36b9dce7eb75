//! Draft input and send button.
//!
//! The input stays enabled while a request is outstanding; only the button
//! is disabled. Enter and the button both post to `/send` with the current
//! input value and the composer revision. The revision lets the server drop
//! a second submission carrying a revision it already consumed.
//!
//! A submission swaps only the hidden revision field. The input is cleared
//! in the browser as the request leaves, so text typed while it is in flight
//! is kept, and the button is only ever re-rendered by the event stream.

use super::escape_html;
use crate::widget::Snapshot;

/// Placeholder text of the empty draft input.
pub const INPUT_PLACEHOLDER: &str = "Type a message...";

/// Id of the hidden field holding the composer revision.
pub const REVISION_FIELD_ID: &str = "draft-revision";

/// Render the whole composer (`#composer`) for the initial page.
#[must_use]
pub fn composer(session_id: &str, snapshot: &Snapshot) -> String {
    let draft = escape_html(&snapshot.draft);
    let revision = revision_field(snapshot.revision);
    let button = send_button(session_id, snapshot.loading);

    format!(
        r##"<div id="composer" class="chat-composer">
      {revision}
      <div class="chat-input-wrap"
           hx-post="/widget/{session_id}/send"
           hx-trigger="keydown[key=='Enter'&&!repeat]"
           hx-include="#draft-input, #{REVISION_FIELD_ID}"
           hx-vals='{{"trigger":"enter_key"}}'
           hx-target="#{REVISION_FIELD_ID}"
           hx-swap="outerHTML"
           hx-on::before-request="if (event.detail.elt === this) clearDraft()">
        <input id="draft-input" class="chat-input" type="text" name="message"
               placeholder="{INPUT_PLACEHOLDER}" value="{draft}" autocomplete="off" autofocus
               hx-post="/widget/{session_id}/draft"
               hx-trigger="input changed delay:150ms"
               hx-swap="none">
      </div>
      <span id="send-slot" sse-swap="send-button" hx-swap="innerHTML">{button}</span>
    </div>"##
    )
}

/// Render the hidden revision field, the only thing `/send` swaps.
#[must_use]
pub fn revision_field(revision: u64) -> String {
    format!(r#"<input type="hidden" id="{REVISION_FIELD_ID}" name="revision" value="{revision}">"#)
}

/// Render the send button. Disabled, with a spinner, while loading.
#[must_use]
pub fn send_button(session_id: &str, loading: bool) -> String {
    let (disabled, label) = if loading {
        (
            " disabled aria-busy=\"true\"",
            r#"<span class="chat-spinner" aria-hidden="true"></span>"#,
        )
    } else {
        ("", "Send")
    };

    format!(
        r##"<button type="button" class="chat-send"{disabled}
        hx-post="/widget/{session_id}/send"
        hx-include="#draft-input, #{REVISION_FIELD_ID}"
        hx-vals='{{"trigger":"send_button"}}'
        hx-target="#{REVISION_FIELD_ID}"
        hx-swap="outerHTML"
        hx-on::before-request="clearDraft()">{label}</button>"##
    )
}
