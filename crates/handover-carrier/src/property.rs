use crate::{CarrierError, Result};

/// One node of a carrier configuration tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub attribute: u16,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Leaf(Vec<u8>),
    Group(PropertyGroup),
}

impl Property {
    pub fn leaf(attribute: u16, value: impl Into<Vec<u8>>) -> Self {
        Self {
            attribute,
            value: PropertyValue::Leaf(value.into()),
        }
    }

    pub fn group(attribute: u16, group: PropertyGroup) -> Self {
        Self {
            attribute,
            value: PropertyValue::Group(group),
        }
    }

    pub fn as_leaf(&self) -> Option<&[u8]> {
        match &self.value {
            PropertyValue::Leaf(bytes) => Some(bytes),
            PropertyValue::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&PropertyGroup> {
        match &self.value {
            PropertyValue::Group(group) => Some(group),
            PropertyValue::Leaf(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.value, PropertyValue::Group(_))
    }
}

/// Ordered set of sibling properties, attributes are unique within one group
///
/// Lookups only consider direct children, nested groups are reached through
/// [`PropertyGroup::group`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyGroup {
    properties: Vec<Property>,
}

impl PropertyGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    pub fn contains(&self, attribute: u16) -> bool {
        self.position(attribute).is_some()
    }

    pub fn add(&mut self, attribute: u16, value: impl Into<Vec<u8>>) -> Result<()> {
        self.push(Property::leaf(attribute, value))
    }

    pub fn get(&self, attribute: u16) -> Result<&[u8]> {
        self.find(attribute)
            .and_then(Property::as_leaf)
            .ok_or(CarrierError::NoDataFound(attribute))
    }

    /// Remove a leaf or a whole group
    pub fn remove(&mut self, attribute: u16) -> Result<Property> {
        let index = self
            .position(attribute)
            .ok_or(CarrierError::NoDataFound(attribute))?;

        Ok(self.properties.remove(index))
    }

    /// Attach `group` under `attribute`
    pub fn add_group(&mut self, attribute: u16, group: PropertyGroup) -> Result<()> {
        self.push(Property::group(attribute, group))
    }

    pub fn group(&self, attribute: u16) -> Result<&PropertyGroup> {
        self.find(attribute)
            .and_then(Property::as_group)
            .ok_or(CarrierError::NoDataFound(attribute))
    }

    pub fn group_mut(&mut self, attribute: u16) -> Result<&mut PropertyGroup> {
        self.properties
            .iter_mut()
            .find(|property| property.attribute == attribute)
            .and_then(|property| match &mut property.value {
                PropertyValue::Group(group) => Some(group),
                PropertyValue::Leaf(_) => None,
            })
            .ok_or(CarrierError::NoDataFound(attribute))
    }

    /// Detach the group stored under `attribute` and hand it back to the caller
    pub fn remove_group(&mut self, attribute: u16) -> Result<PropertyGroup> {
        let index = self
            .properties
            .iter()
            .position(|property| property.attribute == attribute && property.is_group())
            .ok_or(CarrierError::NoDataFound(attribute))?;

        match self.properties.remove(index).value {
            PropertyValue::Group(group) => Ok(group),
            PropertyValue::Leaf(_) => Err(CarrierError::NoDataFound(attribute)),
        }
    }

    pub fn push(&mut self, property: Property) -> Result<()> {
        if self.contains(property.attribute) {
            return Err(CarrierError::AlreadyRegistered(property.attribute));
        }

        self.properties.push(property);
        Ok(())
    }

    /// Depth of the deepest nested group, a group with only leaves has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .properties
            .iter()
            .filter_map(Property::as_group)
            .map(PropertyGroup::depth)
            .max()
            .unwrap_or(0)
    }

    fn find(&self, attribute: u16) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.attribute == attribute)
    }

    fn position(&self, attribute: u16) -> Option<usize> {
        self.properties
            .iter()
            .position(|property| property.attribute == attribute)
    }
}

impl<'a> IntoIterator for &'a PropertyGroup {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
