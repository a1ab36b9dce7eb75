//! Chat entries and the append-only transcript store.

use serde::{Deserialize, Serialize};

/// Text shown in place of a reply when the remote assistant could not be
/// reached or answered with something unusable.
pub const ERROR_REPLY: &str = "❌ Error contacting Gemini API";

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the widget.
    User,
    /// The remote assistant (or the error marker standing in for it).
    Bot,
}

/// A single message in the transcript.
///
/// Entries are immutable once created; the fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    sender: Sender,
    text: String,
}

impl ChatEntry {
    /// Create an entry authored by the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    /// Create an entry authored by the assistant.
    #[must_use]
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    /// The error marker entry appended when a request fails.
    #[must_use]
    pub fn bot_error() -> Self {
        Self::bot(ERROR_REPLY)
    }

    #[must_use]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this entry is the failure marker.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.sender == Sender::Bot && self.text == ERROR_REPLY
    }
}

/// Ordered, append-only sequence of chat entries.
///
/// Index order is send order. There is no way to remove or edit an entry
/// once it has been appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
}

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the tail.
    pub fn append(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    /// All entries in send order.
    #[must_use]
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ChatEntry;
    type IntoIter = std::slice::Iter<'a, ChatEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
