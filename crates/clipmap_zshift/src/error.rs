//! # Link Payload Errors

use thiserror::Error;

/// Errors raised while decoding an exported link payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDecodeError {
    /// Every link is two 4-byte words.
    #[error("link payload length {len} is not a multiple of 8")]
    Length {
        /// Received length.
        len: usize,
    },
}
