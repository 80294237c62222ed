use bitflags::bitflags;

use crate::ndef_type::Tnf;

bitflags! {
    /// Flag bits in the first byte of every record, the TNF sits in the low 3 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RecordFlags: u8 {
        const MESSAGE_BEGIN = 0x80;
        const MESSAGE_END = 0x40;
        const CHUNKED = 0x20;
        const SHORT_RECORD = 0x10;
        const ID_LENGTH = 0x08;
    }
}

/// Decoded fixed part of a record, before the type, id and payload bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub flags: RecordFlags,
    pub tnf: Tnf,
    pub type_length: u8,
    pub payload_length: u32,
    pub id_length: u8,
}

impl RecordHeader {
    pub fn from_flag_byte(byte: u8) -> (RecordFlags, Tnf) {
        (RecordFlags::from_bits_truncate(byte), Tnf::from_bits(byte))
    }

    pub fn flag_byte(flags: RecordFlags, tnf: Tnf) -> u8 {
        flags.bits() | tnf.bits()
    }

    pub fn message_begin(&self) -> bool {
        self.flags.contains(RecordFlags::MESSAGE_BEGIN)
    }

    pub fn message_end(&self) -> bool {
        self.flags.contains(RecordFlags::MESSAGE_END)
    }

    pub fn short_record(&self) -> bool {
        self.flags.contains(RecordFlags::SHORT_RECORD)
    }

    pub fn has_id_length(&self) -> bool {
        self.flags.contains(RecordFlags::ID_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_flag_byte() {
        let (flags, tnf) = RecordHeader::from_flag_byte(0xD1);
        assert!(flags.contains(RecordFlags::MESSAGE_BEGIN));
        assert!(flags.contains(RecordFlags::MESSAGE_END));
        assert!(!flags.contains(RecordFlags::CHUNKED));
        assert!(flags.contains(RecordFlags::SHORT_RECORD));
        assert!(!flags.contains(RecordFlags::ID_LENGTH));
        assert_eq!(tnf, Tnf::WellKnown);

        assert_eq!(RecordHeader::flag_byte(flags, tnf), 0xD1);
    }
}
