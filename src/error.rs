use handover_carrier::{CarrierError, CarrierType};
use handover_ndef::NdefError;
use handover_tokio::Elapsed;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandoverError {
    #[error(transparent)]
    Ndef(#[from] NdefError),

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("not supported: {0}")]
    NotSupported(String),

    /// A radio operation completed with a failure
    #[error("operation failed: {0}")]
    OperationFail(String),

    #[error(transparent)]
    Radio(#[from] RadioError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Another negotiation already holds this radio
    #[error("{0} radio is busy with another negotiation")]
    Busy(CarrierType),

    #[error("radio event did not arrive: {0}")]
    Timeout(#[from] Elapsed),
}

/// Failure reported by a radio stack
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RadioError {
    #[error("radio is unavailable")]
    Unavailable,

    #[error("radio event stream closed")]
    EventsClosed,

    #[error("radio call failed: {0}")]
    Failed(String),
}

/// Failure reported by the point-to-point transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed by peer")]
    Closed,

    #[error("no handover service registered for handle {0}")]
    UnknownHandle(u32),

    #[error("transport failure: {0}")]
    Failed(String),
}

pub type Error = HandoverError;
pub type Result<T, E = Error> = std::result::Result<T, E>;
