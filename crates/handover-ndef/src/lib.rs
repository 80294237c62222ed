//! NFC Data Exchange Format records and messages
//!
//! Decoding is built on winnow partial streams so that a message split across
//! several transport reads can be reassembled with [`NdefReader`].

pub mod error;
pub mod header;
pub mod message;
pub mod ndef_type;
pub mod parser;
pub mod record;
pub mod writer;

use tracing::{debug, warn};

pub use error::{Error, NdefError, Result};
pub use header::RecordFlags;
pub use message::NdefMessage;
pub use ndef_type::Tnf;
pub use record::NdefRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    /// A full message was parsed
    Complete(NdefMessage),

    /// Need at least `needed` more bytes to finish the current message
    Incomplete { needed: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReaderState {
    #[default]
    NotStarted,
    Reading {
        needed: usize,
    },
}

/// Accumulates bytes from successive reads until a full message is available
///
/// Only a truncated record means "keep reading", every other decode failure is
/// returned to the caller and resets the reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NdefReader {
    buffer: Vec<u8>,
    state: ReaderState,
}

impl NdefReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<ReadResult> {
        self.buffer.extend_from_slice(chunk);

        if let ReaderState::Reading { needed } = self.state {
            if chunk.len() < needed {
                let needed = needed - chunk.len();
                debug!("not enough data to parse message, need {needed} more bytes");

                self.state = ReaderState::Reading { needed };
                return Ok(ReadResult::Incomplete { needed });
            }
        }

        match parser::decode_prefix(&self.buffer) {
            Ok((message, consumed)) => {
                self.buffer.drain(..consumed);
                self.state = ReaderState::NotStarted;

                if !self.buffer.is_empty() {
                    debug!(
                        "{} bytes after message end kept for the next message: {}",
                        self.buffer.len(),
                        hex::encode(&self.buffer)
                    );
                }

                Ok(ReadResult::Complete(message))
            }

            Err(NdefError::BufferTooSmall { needed }) => {
                debug!("incomplete message, need {needed} more bytes");
                self.state = ReaderState::Reading { needed };
                Ok(ReadResult::Incomplete { needed })
            }

            Err(error) => {
                warn!("unable to parse message: {error}");
                self.reset();
                Err(error)
            }
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self.state, ReaderState::Reading { .. })
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = ReaderState::NotStarted;
    }
}
