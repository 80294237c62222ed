use std::fmt::Debug;

use handover_carrier::CarrierType;
use tracing::warn;

/// Presents user visible pairing failures
pub trait Notifier: Debug + Send + Sync + 'static {
    fn pairing_failed(&self, carrier_type: CarrierType, device_name: &str);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn pairing_failed(&self, carrier_type: CarrierType, device_name: &str) {
        warn!("{carrier_type} pairing with {device_name} failed");
    }
}
