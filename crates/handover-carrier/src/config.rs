use derive_more::{Deref, DerefMut};

use crate::{carrier_type::CarrierType, property::PropertyGroup};

/// Parameters of one carrier, a typed attribute tree
#[derive(Debug, Clone, PartialEq, Eq, Deref, DerefMut)]
pub struct CarrierConfig {
    pub carrier_type: CarrierType,

    #[deref]
    #[deref_mut]
    properties: PropertyGroup,
}

impl CarrierConfig {
    pub fn new(carrier_type: CarrierType) -> Self {
        Self {
            carrier_type,
            properties: PropertyGroup::new(),
        }
    }

    pub fn with_properties(carrier_type: CarrierType, properties: PropertyGroup) -> Self {
        Self {
            carrier_type,
            properties,
        }
    }

    pub fn properties(&self) -> &PropertyGroup {
        &self.properties
    }

    pub fn into_properties(self) -> PropertyGroup {
        self.properties
    }
}
