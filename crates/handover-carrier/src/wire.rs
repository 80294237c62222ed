//! Small winnow helpers shared by the carrier codecs, all inputs are complete
//! buffers so running out of bytes is a format error

use winnow::{
    ModalResult, Parser,
    binary::{be_u8, be_u16, le_u16},
    error::{ContextError, ErrMode},
    token::take,
};

use crate::CarrierError;

pub(crate) fn byte(input: &mut &[u8]) -> ModalResult<u8> {
    be_u8.parse_next(input)
}

pub(crate) fn u16_be(input: &mut &[u8]) -> ModalResult<u16> {
    be_u16.parse_next(input)
}

pub(crate) fn u16_le(input: &mut &[u8]) -> ModalResult<u16> {
    le_u16.parse_next(input)
}

pub(crate) fn bytes<'i>(input: &mut &'i [u8], length: usize) -> ModalResult<&'i [u8]> {
    take(length).parse_next(input)
}

/// Map a winnow failure to [`CarrierError::InvalidFormat`] naming the field
pub(crate) fn truncated(field: &'static str) -> impl FnOnce(ErrMode<ContextError>) -> CarrierError {
    move |_| CarrierError::InvalidFormat(format!("{field} is truncated"))
}

pub(crate) fn reversed(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}
