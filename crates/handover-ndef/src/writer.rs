use crate::{
    Result,
    error::NdefError,
    header::{RecordFlags, RecordHeader},
    message::NdefMessage,
    ndef_type::Tnf,
    record::NdefRecord,
};

/// Serialize `message` into `buffer`, returning the number of bytes written
///
/// The short form of the payload length is used only when the record asks for it
/// and the payload actually fits, so a stale SR flag never truncates the length.
/// Every record is checked before anything is written, `buffer` is left untouched
/// on failure.
pub fn encode(message: &NdefMessage, buffer: &mut [u8]) -> Result<usize> {
    let lengths = message
        .iter()
        .map(check_record)
        .collect::<Result<Vec<_>>>()?;

    let required = message.encoded_len();
    if required > buffer.len() {
        return Err(NdefError::InvalidFormat(format!(
            "destination holds {} bytes, message needs {required}",
            buffer.len()
        )));
    }

    let mut cursor = Cursor { buffer, position: 0 };
    for (record, lengths) in message.iter().zip(lengths) {
        write_record(&mut cursor, record, lengths);
    }

    Ok(cursor.position)
}

pub fn to_bytes(message: &NdefMessage) -> Result<Vec<u8>> {
    let mut buffer = vec![0; message.encoded_len()];
    let written = encode(message, &mut buffer)?;
    buffer.truncate(written);
    Ok(buffer)
}

/// Length fields of one record as they go on the wire
#[derive(Debug, Clone, Copy)]
struct WireLengths {
    type_length: u8,
    id_length: Option<u8>,
    payload_length: u32,
}

fn check_record(record: &NdefRecord) -> Result<WireLengths> {
    if record.tnf == Tnf::Empty {
        if !record.type_.is_empty() {
            return Err(NdefError::TypeLengthNotOk(saturate(record.type_.len())));
        }

        if !record.payload.is_empty() {
            let length = u32::try_from(record.payload.len()).unwrap_or(u32::MAX);
            return Err(NdefError::PayloadLengthNotOk(length));
        }

        if !record.id.is_empty() {
            return Err(NdefError::IdLengthNotOk(saturate(record.id.len())));
        }
    }

    let type_length = if record.tnf.has_type() {
        u8::try_from(record.type_.len()).map_err(|_| {
            NdefError::InvalidFormat(format!(
                "record type is {} bytes, at most 255 fit",
                record.type_.len()
            ))
        })?
    } else {
        0
    };

    let id_length = match record.id.len() {
        0 => None,
        length => Some(u8::try_from(length).map_err(|_| {
            NdefError::InvalidFormat(format!("record id is {length} bytes, at most 255 fit"))
        })?),
    };

    let payload_length = u32::try_from(record.payload.len()).map_err(|_| {
        NdefError::InvalidFormat(format!(
            "record payload is {} bytes, too long for a record",
            record.payload.len()
        ))
    })?;

    Ok(WireLengths {
        type_length,
        id_length,
        payload_length,
    })
}

fn saturate(length: usize) -> u8 {
    u8::try_from(length).unwrap_or(u8::MAX)
}

struct Cursor<'a> {
    buffer: &'a mut [u8],
    position: usize,
}

impl Cursor<'_> {
    fn put(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        self.buffer[self.position..end].copy_from_slice(bytes);
        self.position = end;
    }
}

fn write_record(cursor: &mut Cursor<'_>, record: &NdefRecord, lengths: WireLengths) {
    let short = record.is_short();

    let mut flags = record.flags;
    flags.set(RecordFlags::SHORT_RECORD, short);
    flags.set(RecordFlags::ID_LENGTH, lengths.id_length.is_some());

    cursor.put(&[RecordHeader::flag_byte(flags, record.tnf)]);
    cursor.put(&[lengths.type_length]);

    if short {
        // is_short guarantees the payload fits one byte
        cursor.put(&[lengths.payload_length as u8]);
    } else {
        cursor.put(&lengths.payload_length.to_be_bytes());
    }

    if let Some(id_length) = lengths.id_length {
        cursor.put(&[id_length]);
    }

    if record.tnf.has_type() {
        cursor.put(&record.type_);
    }

    cursor.put(&record.id);
    cursor.put(&record.payload);
}
