use derive_more::{Deref, IntoIterator};

use crate::{
    Result,
    error::NdefError,
    header::RecordFlags,
    parser, writer,
    record::NdefRecord,
};

/// Namespace prefixes a caller may put in front of a type when searching
const TYPE_NAMESPACE_PREFIXES: [&[u8]; 2] = [b"urn:nfc:ext:", b"urn:nfc:wkt:"];

/// An ordered list of records
///
/// The list is only mutated through the methods below, all of which restore the
/// invariant that the first record alone has MB set and the last record alone has ME set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deref, IntoIterator)]
pub struct NdefMessage {
    #[into_iterator(owned, ref)]
    records: Vec<NdefRecord>,
}

impl NdefMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<NdefRecord>) -> Self {
        let mut message = Self { records };
        message.repair_flags();
        message
    }

    /// Parse a complete message from raw bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        parser::decode(bytes)
    }

    /// Serialize into `buffer`, returning the number of bytes written
    pub fn encode_into(&self, buffer: &mut [u8]) -> Result<usize> {
        writer::encode(self, buffer)
    }

    /// Serialize into a new buffer, fails if a record cannot be represented on the wire
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        writer::to_bytes(self)
    }

    /// Exact number of bytes [`Self::encode_into`] needs
    pub fn encoded_len(&self) -> usize {
        self.records.iter().map(NdefRecord::encoded_len).sum()
    }

    pub fn records(&self) -> &[NdefRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<NdefRecord> {
        self.records
    }

    pub fn record(&self, index: usize) -> Result<&NdefRecord> {
        self.records.get(index).ok_or(NdefError::OutOfBound {
            index,
            len: self.records.len(),
        })
    }

    pub fn append(&mut self, record: NdefRecord) {
        self.records.push(record);
        self.repair_flags();
    }

    /// Insert at `index`, an index equal to the length appends
    pub fn insert(&mut self, index: usize, record: NdefRecord) -> Result<()> {
        if index > self.records.len() {
            return Err(NdefError::OutOfBound {
                index,
                len: self.records.len(),
            });
        }

        self.records.insert(index, record);
        self.repair_flags();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<NdefRecord> {
        if index >= self.records.len() {
            return Err(NdefError::OutOfBound {
                index,
                len: self.records.len(),
            });
        }

        let record = self.records.remove(index);
        self.repair_flags();
        Ok(record)
    }

    /// Find the first record with the given type, a leading `urn:nfc:ext:` or
    /// `urn:nfc:wkt:` is ignored
    pub fn search_by_type(&self, type_: &[u8]) -> Option<&NdefRecord> {
        let type_ = strip_type_namespace(type_);
        self.records.iter().find(|record| record.type_ == type_)
    }

    pub fn search_by_id(&self, id: &[u8]) -> Option<&NdefRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    fn repair_flags(&mut self) {
        let last = self.records.len().saturating_sub(1);

        for (index, record) in self.records.iter_mut().enumerate() {
            record.flags.set(RecordFlags::MESSAGE_BEGIN, index == 0);
            record.flags.set(RecordFlags::MESSAGE_END, index == last);
        }
    }
}

fn strip_type_namespace(type_: &[u8]) -> &[u8] {
    TYPE_NAMESPACE_PREFIXES
        .iter()
        .find_map(|prefix| type_.strip_prefix(*prefix))
        .unwrap_or(type_)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(type_: &[u8]) -> NdefRecord {
        NdefRecord::well_known(type_, vec![0x01])
    }

    fn assert_begin_end(message: &NdefMessage) {
        let begins = message.iter().filter(|r| r.message_begin()).count();
        let ends = message.iter().filter(|r| r.message_end()).count();
        assert_eq!(begins, 1);
        assert_eq!(ends, 1);
        assert!(message.first().unwrap().message_begin());
        assert!(message.last().unwrap().message_end());
    }

    #[test]
    fn single_record_has_both_flags() {
        let mut message = NdefMessage::new();
        message.append(record(b"T"));

        let only = &message[0];
        assert!(only.message_begin());
        assert!(only.message_end());
    }

    #[test]
    fn append_insert_remove_keep_flags() {
        let mut message = NdefMessage::new();
        message.append(record(b"a"));
        message.append(record(b"b"));
        message.append(record(b"c"));
        assert_begin_end(&message);

        message.insert(0, record(b"z")).unwrap();
        assert_begin_end(&message);
        assert_eq!(message[0].type_, b"z");

        message.insert(4, record(b"y")).unwrap();
        assert_begin_end(&message);
        assert_eq!(message.last().unwrap().type_, b"y");

        let removed = message.remove(0).unwrap();
        assert_eq!(removed.type_, b"z");
        assert_begin_end(&message);

        message.remove(message.len() - 1).unwrap();
        assert_begin_end(&message);
        assert_eq!(message.len(), 3);
    }

    #[test]
    fn out_of_bound_indices() {
        let mut message = NdefMessage::new();
        assert_eq!(
            message.remove(0),
            Err(NdefError::OutOfBound { index: 0, len: 0 })
        );

        message.append(record(b"a"));
        assert!(matches!(
            message.insert(2, record(b"b")),
            Err(NdefError::OutOfBound { index: 2, len: 1 })
        ));
        assert!(message.remove(1).is_err());
        assert!(message.record(1).is_err());
        assert_eq!(message.len(), 1);
    }

    #[test]
    fn search_strips_namespace_prefix() {
        let mut message = NdefMessage::new();
        message.append(record(b"Hs"));
        message.append(NdefRecord::new(
            crate::Tnf::External,
            b"android.com:pkg".to_vec(),
            b"B".to_vec(),
            vec![],
        ));

        assert!(message.search_by_type(b"urn:nfc:wkt:Hs").is_some());
        assert!(message.search_by_type(b"urn:nfc:ext:android.com:pkg").is_some());
        assert!(message.search_by_type(b"Hr").is_none());

        assert_eq!(message.search_by_id(b"B").unwrap().type_, b"android.com:pkg");
        assert!(message.search_by_id(b"BB").is_none());
    }
}
