use handover_ndef::{NdefMessage, NdefRecord, RecordFlags, Tnf};
use tracing::{debug, warn};
use winnow::{
    ModalResult, Parser as _,
    binary::{be_u8, be_u16, length_repeat, length_take},
};

use super::{HandoverMessage, HandoverType};
use crate::{
    HandoverError, Result,
    carrier::{CarrierPowerState, HandoverCarrier},
};

pub const ALTERNATIVE_CARRIER_TYPE: &[u8] = b"ac";
pub const COLLISION_RESOLUTION_TYPE: &[u8] = b"cr";

const FIRST_REFERENCE: u8 = b'A';
const LAST_REFERENCE: u8 = b'Z';

/// Hands out the single letter ids that link `ac` records to carrier records
#[derive(Debug)]
struct References {
    next: u8,
}

impl References {
    fn new() -> Self {
        Self {
            next: FIRST_REFERENCE,
        }
    }

    fn next(&mut self) -> Result<u8> {
        if self.next > LAST_REFERENCE {
            return Err(HandoverError::InvalidParam(
                "too many carrier records for single letter references".to_string(),
            ));
        }

        let reference = self.next;
        self.next += 1;
        Ok(reference)
    }
}

impl HandoverMessage {
    /// Build the outer NDEF message, handover record first
    pub fn export(&self) -> Result<NdefMessage> {
        let mut inner = NdefMessage::new();
        let mut records = Vec::new();
        let mut references = References::new();

        if self.message_type == HandoverType::Request {
            if let Some(cr) = self.cr {
                inner.append(NdefRecord::well_known(
                    COLLISION_RESOLUTION_TYPE,
                    cr.to_be_bytes(),
                ));
            }
        }

        for carrier in &self.carriers {
            let carrier_ref = references.next()?;
            let aux_count = u8::try_from(carrier.aux_records.len()).map_err(|_| {
                HandoverError::InvalidParam("too many auxiliary records".to_string())
            })?;

            let mut ac = vec![carrier.cps.bits() & CarrierPowerState::MASK, 1, carrier_ref, aux_count];

            records.push(referenced(&carrier.carrier_record, carrier_ref));

            for aux in &carrier.aux_records {
                let aux_ref = references.next()?;
                ac.extend_from_slice(&[1, aux_ref]);
                records.push(referenced(aux, aux_ref));
            }

            inner.append(NdefRecord::well_known(ALTERNATIVE_CARRIER_TYPE, ac));
        }

        let inner = inner.to_bytes()?;
        let mut payload = Vec::with_capacity(1 + inner.len());
        payload.push(self.version);
        payload.extend(inner);

        records.insert(
            0,
            NdefRecord::well_known(self.message_type.record_type(), payload),
        );

        Ok(NdefMessage::from_records(records))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.export()?.to_bytes()?)
    }

    /// Rebuild a handover message from its outer NDEF message
    pub fn import(message: &NdefMessage) -> Result<Self> {
        let (handover_record, rest) = message
            .records()
            .split_first()
            .ok_or_else(|| HandoverError::InvalidFormat("message has no records".to_string()))?;

        if handover_record.tnf != Tnf::WellKnown {
            return Err(HandoverError::InvalidFormat(format!(
                "first record has tnf {:?}, expected well known",
                handover_record.tnf
            )));
        }

        let message_type =
            HandoverType::from_record_type(&handover_record.type_).ok_or_else(|| {
                HandoverError::InvalidFormat(format!(
                    "unknown handover record type {}",
                    String::from_utf8_lossy(&handover_record.type_)
                ))
            })?;

        let (version, inner) = handover_record.payload.split_first().ok_or_else(|| {
            HandoverError::InvalidFormat("handover record has no version".to_string())
        })?;

        let mut handover = Self::new(message_type, *version);

        // a select without carriers has an empty inner message
        if inner.is_empty() {
            return Ok(handover);
        }

        let inner = NdefMessage::decode(inner)?;
        for record in &inner {
            match (record.tnf, record.type_.as_slice()) {
                (Tnf::WellKnown, COLLISION_RESOLUTION_TYPE) => {
                    if message_type != HandoverType::Request {
                        warn!("ignoring collision resolution record in a handover {message_type}");
                        continue;
                    }

                    let cr = be_u16
                        .parse_next(&mut record.payload.as_slice())
                        .map_err(|_: winnow::error::ErrMode<winnow::error::ContextError>| {
                            HandoverError::InvalidFormat(
                                "collision resolution record is truncated".to_string(),
                            )
                        })?;

                    handover.cr = Some(cr);
                }

                (Tnf::WellKnown, ALTERNATIVE_CARRIER_TYPE) => {
                    let carrier = resolve_carrier(&record.payload, rest)?;
                    debug!("imported {} carrier, cps {}", carrier.carrier_type, carrier.cps);
                    handover.carriers.push(carrier);
                }

                (tnf, type_) => {
                    debug!(
                        "skipping inner record {tnf:?} {}",
                        String::from_utf8_lossy(type_)
                    );
                }
            }
        }

        Ok(handover)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let message = NdefMessage::decode(bytes)?;
        Self::import(&message)
    }
}

struct AlternativeCarrier<'i> {
    cps: u8,
    carrier_ref: &'i [u8],
    aux_refs: Vec<&'i [u8]>,
}

fn alternative_carrier<'i>(input: &mut &'i [u8]) -> ModalResult<AlternativeCarrier<'i>> {
    (
        be_u8,
        length_take(be_u8),
        length_repeat(be_u8, length_take(be_u8)),
    )
        .map(|(cps, carrier_ref, aux_refs)| AlternativeCarrier {
            cps,
            carrier_ref,
            aux_refs,
        })
        .parse_next(input)
}

fn resolve_carrier(ac_payload: &[u8], records: &[NdefRecord]) -> Result<HandoverCarrier> {
    let ac = alternative_carrier(&mut &ac_payload[..]).map_err(|_| {
        HandoverError::InvalidFormat("alternative carrier record is truncated".to_string())
    })?;

    let find = |reference: &[u8]| {
        records
            .iter()
            .find(|record| record.id == reference)
            .map(detached)
            .ok_or_else(|| {
                HandoverError::InvalidFormat(format!(
                    "no record with reference {}",
                    String::from_utf8_lossy(reference)
                ))
            })
    };

    let carrier_record = find(ac.carrier_ref)?;
    let aux_records = ac
        .aux_refs
        .iter()
        .map(|reference| find(*reference))
        .collect::<Result<Vec<_>>>()?;

    let carrier = HandoverCarrier::new(CarrierPowerState::from_bits(ac.cps), carrier_record)
        .with_aux_records(aux_records);

    Ok(carrier)
}

/// Copy of `record` carrying `reference` as its id
fn referenced(record: &NdefRecord, reference: u8) -> NdefRecord {
    let mut record = record.clone();
    record.set_id(vec![reference]);
    record
}

/// Copy of a record taken out of a message, without its position flags and reference
fn detached(record: &NdefRecord) -> NdefRecord {
    let mut record = record.clone();
    record
        .flags
        .remove(RecordFlags::MESSAGE_BEGIN | RecordFlags::MESSAGE_END);
    record.set_id(Vec::new());
    record
}
