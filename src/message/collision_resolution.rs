//! Settling which device acts as selector when both sent a handover request

use rand::Rng as _;

use super::HandoverRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Both devices drew the same number, send a new request with a fresh one
    Retry,
    Role(HandoverRole),
}

/// Random non zero collision resolution number for an outgoing request
pub fn random_number() -> u16 {
    rand::rng().random_range(1..=u16::MAX)
}

/// Decide the local role from the local and remote random numbers
///
/// When bit 0 of both numbers is equal the higher number becomes selector,
/// otherwise the lower number does.
pub fn resolve(local: u16, remote: u16) -> Resolution {
    if local == remote {
        return Resolution::Retry;
    }

    let same_bit = (local & 1) == (remote & 1);
    let local_is_selector = if same_bit { local > remote } else { local < remote };

    if local_is_selector {
        Resolution::Role(HandoverRole::Selector)
    } else {
        Resolution::Role(HandoverRole::Requester)
    }
}
