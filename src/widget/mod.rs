//! The chat widget: transcript, draft, loading flag, and request dispatch.
//!
//! # Architecture
//!
//! - [`Transcript`]: append-only list of [`ChatEntry`] values
//! - [`InputController`]: the draft and its submission rules
//! - [`WidgetState`]: both of the above plus the loading flag, updated only
//!   through [`WidgetState::reduce`]
//! - [`Dispatcher`]: runs requests against a [`ChatBackend`] and always
//!   reports back
//! - [`Widget`]: handle to the task that owns a [`WidgetState`]
//!
//! # Example
//!
//! ```rust
//! use gemini_chat_widget::widget::{Action, Effect, SubmitTrigger, WidgetState};
//!
//! let mut state = WidgetState::default();
//! state.reduce(Action::EditDraft("Hello".into()));
//! let effects = state.reduce(Action::Submit {
//!     trigger: SubmitTrigger::EnterKey,
//!     revision: None,
//!     draft: None,
//! });
//!
//! assert_eq!(state.transcript().len(), 1);
//! assert!(state.is_loading());
//! assert!(matches!(effects.as_slice(), [Effect::Dispatch { .. }]));
//! ```

mod dispatcher;
mod input;
mod runtime;
mod state;
mod transcript;

pub use dispatcher::{ChatBackend, Dispatcher, HttpChatBackend};
pub use input::{InputController, SubmitTrigger};
pub use runtime::{Snapshot, ViewKey, Widget};
pub use state::{Action, Effect, LoadingPolicy, Outcome, RequestId, Status, WidgetState};
pub use transcript::{ChatEntry, ERROR_REPLY, Sender, Transcript};
