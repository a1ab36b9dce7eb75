//! Browser sessions and their widgets.
//!
//! Each page load starts a [`Session`] holding a fresh [`Widget`]; the
//! transcript lives exactly as long as the session. Sessions are identified
//! by UUID and end when deleted or after sitting idle.
//!
//! # Architecture
//!
//! - [`Session`]: one widget plus activity timestamps
//! - [`SessionStore`]: thread-safe map of all live sessions
//!
//! [`Widget`]: crate::widget::Widget

mod store;

pub use store::{Session, SessionStore};
