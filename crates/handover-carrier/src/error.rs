use thiserror::Error;

use handover_ndef::NdefError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CarrierError {
    #[error("attribute {0:#06x} is already registered at this level")]
    AlreadyRegistered(u16),

    #[error("no data found for attribute {0:#06x}")]
    NoDataFound(u16),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("attributes nested deeper than {0} levels")]
    TooDeep(usize),

    #[error(transparent)]
    Ndef(#[from] NdefError),
}

pub type Error = CarrierError;
pub type Result<T, E = Error> = std::result::Result<T, E>;
