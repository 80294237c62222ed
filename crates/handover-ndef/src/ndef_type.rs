/// Type Name Format, the 3-bit classifier in the low bits of a record header
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Tnf {
    #[default]
    Empty = 0x00,
    WellKnown = 0x01,
    MediaType = 0x02,
    AbsoluteUri = 0x03,
    External = 0x04,
    Unknown = 0x05,
    Unchanged = 0x06,
    Reserved = 0x07,
}

impl Tnf {
    pub const MASK: u8 = 0x07;

    /// Only the low 3 bits are looked at, so every byte maps to a value
    pub const fn from_bits(bits: u8) -> Self {
        match bits & Self::MASK {
            0x00 => Self::Empty,
            0x01 => Self::WellKnown,
            0x02 => Self::MediaType,
            0x03 => Self::AbsoluteUri,
            0x04 => Self::External,
            0x05 => Self::Unknown,
            0x06 => Self::Unchanged,
            _ => Self::Reserved,
        }
    }

    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Records of these formats carry no type field on the wire
    pub const fn has_type(self) -> bool {
        !matches!(self, Self::Empty | Self::Unknown | Self::Unchanged)
    }
}
