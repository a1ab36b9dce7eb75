//! Error types.
//!
//! None of these reach the user as text: a failed request shows the single
//! error marker in the transcript. The variants exist for the logs.

use thiserror::Error;

/// Why a request to the remote assistant did not produce a reply.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Connection, TLS, timeout, or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The body was not a JSON object with a string `reply`.
    #[error("malformed reply: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The widget's UI task is gone, so it can no longer accept actions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("widget is closed")]
pub struct WidgetClosed;
