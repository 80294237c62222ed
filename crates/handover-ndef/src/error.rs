#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NdefError {
    #[error("index {index} is out of bound for a message with {len} records")]
    OutOfBound { index: usize, len: usize },

    /// An empty record must not carry a type
    #[error("type length must be zero for an empty record, found {0}")]
    TypeLengthNotOk(u8),

    #[error("payload length must be zero for an empty record, found {0}")]
    PayloadLengthNotOk(u32),

    #[error("id length must be zero for an empty record, found {0}")]
    IdLengthNotOk(u8),

    /// The buffer ended on a record boundary but no record had the ME flag set
    #[error("buffer ended without a message end record")]
    BufEndWithoutMe,

    /// The buffer ended in the middle of a record, more bytes are needed
    #[error("buffer too small, need at least {needed} more bytes")]
    BufferTooSmall { needed: usize },

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

pub type Error = NdefError;
pub type Result<T, E = Error> = std::result::Result<T, E>;
