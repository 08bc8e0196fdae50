use std::io;

use thiserror::Error;

/// Errors produced while encoding or decoding array messages.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the connection. Reported both for a clean close at a
    /// message boundary and for a close in the middle of a message; callers
    /// distinguish a clean shutdown by the sentinel, not by this variant.
    #[error("peer closed the connection")]
    ConnectionClosed,

    /// Malformed framing. The stream cannot be resynchronised after this.
    #[error("malformed array message: {reason}")]
    Protocol { reason: String },
}

impl WireError {
    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        WireError::Protocol {
            reason: reason.into(),
        }
    }

    /// Whether this error means the peer went away rather than the stream
    /// being corrupt. Used by the server to drain a connection instead of
    /// failing the process.
    pub fn is_disconnect(&self) -> bool {
        match self {
            WireError::ConnectionClosed => true,
            WireError::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),
            WireError::Protocol { .. } => false,
        }
    }
}
