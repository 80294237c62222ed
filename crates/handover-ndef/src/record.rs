use crate::{
    header::{RecordFlags, RecordHeader},
    ndef_type::Tnf,
};

/// Largest payload that fits the one byte length of a short record
pub const SHORT_RECORD_MAX_PAYLOAD: usize = u8::MAX as usize;

/// A single NDEF record
///
/// The MB and ME flags are owned by the enclosing [`crate::NdefMessage`], they are
/// rewritten whenever the message's record list changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdefRecord {
    pub flags: RecordFlags,
    pub tnf: Tnf,
    pub type_: Vec<u8>,
    pub id: Vec<u8>,
    pub payload: Vec<u8>,
}

impl NdefRecord {
    /// Create a record, the SR and IL flags are derived from the payload and id
    pub fn new(
        tnf: Tnf,
        type_: impl Into<Vec<u8>>,
        id: impl Into<Vec<u8>>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        let mut record = Self {
            flags: RecordFlags::empty(),
            tnf,
            type_: type_.into(),
            id: id.into(),
            payload: payload.into(),
        };

        record.sync_length_flags();
        record
    }

    pub fn empty() -> Self {
        Self::new(Tnf::Empty, Vec::new(), Vec::new(), Vec::new())
    }

    /// NFC Forum well known type record, `type_` is the short name e.g. `Hr`
    pub fn well_known(type_: &[u8], payload: impl Into<Vec<u8>>) -> Self {
        Self::new(Tnf::WellKnown, type_, Vec::new(), payload)
    }

    /// RFC 2046 media type record, e.g. `application/vnd.bluetooth.ep.oob`
    pub fn mime(mime_type: &str, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(Tnf::MediaType, mime_type.as_bytes(), Vec::new(), payload)
    }

    pub(crate) fn from_parts(
        header: RecordHeader,
        type_: Vec<u8>,
        id: Vec<u8>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            flags: header.flags,
            tnf: header.tnf,
            type_,
            id,
            payload,
        }
    }

    pub fn set_id(&mut self, id: impl Into<Vec<u8>>) {
        self.id = id.into();
        self.sync_length_flags();
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
        self.payload = payload.into();
        self.sync_length_flags();
    }

    pub fn type_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.type_).ok()
    }

    pub fn message_begin(&self) -> bool {
        self.flags.contains(RecordFlags::MESSAGE_BEGIN)
    }

    pub fn message_end(&self) -> bool {
        self.flags.contains(RecordFlags::MESSAGE_END)
    }

    /// Whether the record will be written with a one byte payload length
    pub fn is_short(&self) -> bool {
        self.flags.contains(RecordFlags::SHORT_RECORD)
            && self.payload.len() <= SHORT_RECORD_MAX_PAYLOAD
    }

    /// Number of bytes this record takes on the wire
    pub fn encoded_len(&self) -> usize {
        let payload_length_size = if self.is_short() { 1 } else { 4 };
        let id_length_size = if self.id.is_empty() { 0 } else { 1 };
        let type_len = if self.tnf.has_type() { self.type_.len() } else { 0 };

        2 + payload_length_size + id_length_size + type_len + self.id.len() + self.payload.len()
    }

    fn sync_length_flags(&mut self) {
        self.flags.set(
            RecordFlags::SHORT_RECORD,
            self.payload.len() <= SHORT_RECORD_MAX_PAYLOAD,
        );

        self.flags.set(RecordFlags::ID_LENGTH, !self.id.is_empty());
    }
}
