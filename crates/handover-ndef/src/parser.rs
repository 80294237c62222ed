pub mod stream;

use stream::{Stream, StreamExt as _};
use tracing::trace;
use winnow::{
    ModalResult, Parser,
    binary::{be_u8, be_u32},
    error::{ErrMode, Needed},
    token::take,
};

use crate::{
    Result,
    error::NdefError,
    header::RecordHeader,
    message::NdefMessage,
    ndef_type::Tnf,
    record::NdefRecord,
};

/// Parse records until one with ME set
///
/// A buffer cut in the middle of a record fails with [`NdefError::BufferTooSmall`],
/// a buffer that ends cleanly after a record without ME fails with
/// [`NdefError::BufEndWithoutMe`]. Bytes after the ME record are ignored.
pub fn decode(bytes: &[u8]) -> Result<NdefMessage> {
    decode_prefix(bytes).map(|(message, _)| message)
}

/// Like [`decode`], also returning how many bytes of `bytes` the message took
pub fn decode_prefix(bytes: &[u8]) -> Result<(NdefMessage, usize)> {
    let mut input = stream::new(bytes);
    let mut records = Vec::new();

    loop {
        if input.is_empty() {
            return Err(NdefError::BufEndWithoutMe);
        }

        let header = parse_header.parse_next(&mut input).map_err(map_err)?;
        validate_header(&header)?;

        let record = parse_body(&mut input, header).map_err(map_err)?;
        let message_end = record.message_end();
        records.push(record);

        if message_end {
            break;
        }
    }

    let consumed = bytes.len() - input.len();
    trace!(
        "decoded {} records from {consumed} bytes, {} trailing bytes",
        records.len(),
        input.len()
    );

    Ok((NdefMessage::from_records(records), consumed))
}

pub fn parse_header(input: &mut Stream<'_>) -> ModalResult<RecordHeader> {
    let (flags, tnf) = RecordHeader::from_flag_byte(byte(input)?);

    let type_length = byte(input)?;
    let type_length = if tnf.has_type() || tnf == Tnf::Empty {
        type_length
    } else {
        0
    };

    let mut header = RecordHeader {
        flags,
        tnf,
        type_length,
        payload_length: 0,
        id_length: 0,
    };

    header.payload_length = if header.short_record() {
        byte(input).map(u32::from)?
    } else {
        long_length(input)?
    };

    if header.has_id_length() {
        header.id_length = byte(input)?;
    }

    Ok(header)
}

fn parse_body(input: &mut Stream<'_>, header: RecordHeader) -> ModalResult<NdefRecord> {
    let type_ = take_vec(input, header.type_length as usize)?;
    let id = take_vec(input, header.id_length as usize)?;
    let payload = take_vec(input, header.payload_length as usize)?;

    Ok(NdefRecord::from_parts(header, type_, id, payload))
}

fn byte(input: &mut Stream<'_>) -> ModalResult<u8> {
    be_u8.parse_next(input)
}

fn long_length(input: &mut Stream<'_>) -> ModalResult<u32> {
    be_u32.parse_next(input)
}

fn take_vec(input: &mut Stream<'_>, length: usize) -> ModalResult<Vec<u8>> {
    take(length).map(|s: &[u8]| s.to_vec()).parse_next(input)
}

fn validate_header(header: &RecordHeader) -> Result<()> {
    if header.tnf != Tnf::Empty {
        return Ok(());
    }

    if header.type_length != 0 {
        return Err(NdefError::TypeLengthNotOk(header.type_length));
    }

    if header.payload_length != 0 {
        return Err(NdefError::PayloadLengthNotOk(header.payload_length));
    }

    if header.id_length != 0 {
        return Err(NdefError::IdLengthNotOk(header.id_length));
    }

    Ok(())
}

fn map_err(error: ErrMode<winnow::error::ContextError>) -> NdefError {
    match error {
        ErrMode::Incomplete(Needed::Size(needed)) => NdefError::BufferTooSmall {
            needed: needed.get(),
        },
        ErrMode::Incomplete(Needed::Unknown) => NdefError::BufferTooSmall { needed: 1 },
        error => NdefError::InvalidFormat(format!("malformed record: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::header::RecordFlags;

    #[test]
    fn known_header_parse() {
        let mut header_bytes = stream::new(&[0xD1, 0x01, 0x0D, 0x55, 0x02]);
        let header = parse_header(&mut header_bytes).unwrap();

        assert!(header.message_begin());
        assert!(header.message_end());
        assert!(!header.flags.contains(RecordFlags::CHUNKED));
        assert!(header.short_record());
        assert!(!header.has_id_length());
        assert_eq!(header.tnf, Tnf::WellKnown);
        assert_eq!(header.type_length, 1);
        assert_eq!(header.payload_length, 13);
    }

    #[test]
    fn long_record_with_id() {
        // MB|ME|IL, media type, 4 byte payload length
        let mut bytes = vec![0xCA, 0x03, 0x00, 0x00, 0x01, 0x00, 0x01];
        bytes.extend_from_slice(b"a/b");
        bytes.push(b'A');
        bytes.extend(std::iter::repeat_n(0x5A, 256));

        let message = decode(&bytes).unwrap();
        assert_eq!(message.len(), 1);

        let record = &message[0];
        assert_eq!(record.tnf, Tnf::MediaType);
        assert_eq!(record.type_, b"a/b");
        assert_eq!(record.id, b"A");
        assert_eq!(record.payload.len(), 256);
        assert!(!record.is_short());
    }

    #[test]
    fn decode_two_records() {
        let bytes = [
            0x91, 0x01, 0x01, b'T', 0xAA, // MB, well known T
            0x51, 0x01, 0x02, b'U', 0xBB, 0xCC, // ME, well known U
        ];

        let message = decode(&bytes).unwrap();
        assert_eq!(message.len(), 2);
        assert_eq!(message[0].payload, vec![0xAA]);
        assert_eq!(message[1].type_, b"U");
        assert_eq!(message[1].payload, vec![0xBB, 0xCC]);
    }

    #[test]
    fn missing_message_end() {
        let bytes = [0x91, 0x01, 0x01, b'T', 0xAA];
        assert_eq!(decode(&bytes), Err(NdefError::BufEndWithoutMe));
    }

    #[test]
    fn truncated_record_needs_more() {
        let bytes = [0xD1, 0x01, 0x05, b'T', 0xAA];
        assert_eq!(decode(&bytes), Err(NdefError::BufferTooSmall { needed: 4 }));

        let bytes = [0xD1];
        assert!(matches!(
            decode(&bytes),
            Err(NdefError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn empty_record_must_be_empty() {
        assert_eq!(
            decode(&[0xD0, 0x01, 0x00, b'T']),
            Err(NdefError::TypeLengthNotOk(1))
        );
        assert_eq!(
            decode(&[0xD0, 0x00, 0x01, 0xAA]),
            Err(NdefError::PayloadLengthNotOk(1))
        );
        assert_eq!(
            decode(&[0xD8, 0x00, 0x00, 0x01, b'A']),
            Err(NdefError::IdLengthNotOk(1))
        );

        let message = decode(&[0xD0, 0x00, 0x00]).unwrap();
        assert_eq!(message[0].tnf, Tnf::Empty);
    }

    #[test]
    fn unchanged_record_has_no_type() {
        let message = decode(&[0xD6, 0x07, 0x01, 0xAA]).unwrap();
        assert!(message[0].type_.is_empty());
        assert_eq!(message[0].payload, vec![0xAA]);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let message = decode(&[0xD1, 0x01, 0x00, b'T', 0xFE, 0x00]).unwrap();
        assert_eq!(message.len(), 1);
    }

    #[test]
    fn consumed_counts_wire_bytes() {
        // IL set with a zero length id still has its id length byte on the wire
        let bytes = [0xD9, 0x01, 0x00, 0x00, b'T', 0xD1];
        let (message, consumed) = decode_prefix(&bytes).unwrap();

        assert_eq!(consumed, 5);
        assert!(message[0].id.is_empty());

        // a type length on an unchanged record is skipped over but still read
        let (_, consumed) = decode_prefix(&[0xD6, 0x07, 0x01, 0xAA]).unwrap();
        assert_eq!(consumed, 4);
    }
}
