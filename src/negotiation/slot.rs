use handover_carrier::CarrierType;
use parking_lot::Mutex;

use crate::{HandoverError, Result};

/// Allows one negotiation at a time on a radio
#[derive(Debug)]
pub struct RadioSlot {
    carrier_type: CarrierType,
    busy: Mutex<bool>,
}

impl RadioSlot {
    pub fn new(carrier_type: CarrierType) -> Self {
        Self {
            carrier_type,
            busy: Mutex::new(false),
        }
    }

    /// Claim the radio, fails with [`HandoverError::Busy`] while another guard is alive
    pub fn try_acquire(&self) -> Result<SlotGuard<'_>> {
        let mut busy = self.busy.lock();
        if *busy {
            return Err(HandoverError::Busy(self.carrier_type));
        }

        *busy = true;
        Ok(SlotGuard { slot: self })
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.lock()
    }
}

#[derive(Debug)]
pub struct SlotGuard<'a> {
    slot: &'a RadioSlot,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        *self.slot.busy.lock() = false;
    }
}
