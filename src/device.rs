//! Configured device identities.

use serde::{Deserialize, Serialize};

use crate::constraint::ConstraintList;
use crate::matcher::Backend;

/// Identifying properties of one configured storage device.
///
/// Any field may be left out; a missing field places no constraint on the
/// attached device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Filesystem UUID of the volume used for one-time pads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_uuid: Option<String>,
}

impl DeviceDefinition {
    /// Drive constraints in the property names `backend` uses.
    pub fn constraints(&self, backend: Backend) -> ConstraintList {
        let (serial, vendor, model) = match backend {
            Backend::Udisks1 => ("DriveSerial", "DriveVendor", "DriveModel"),
            Backend::Udisks2 => ("Serial", "Vendor", "Model"),
        };
        ConstraintList::new()
            .with_optional(serial, self.serial.as_deref())
            .with_optional(vendor, self.vendor.as_deref())
            .with_optional(model, self.model.as_deref())
    }

    /// Overlay the fields set in `other` onto this definition.
    pub fn merged_with(mut self, other: DeviceDefinition) -> Self {
        if other.vendor.is_some() {
            self.vendor = other.vendor;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.serial.is_some() {
            self.serial = other.serial;
        }
        if other.volume_uuid.is_some() {
            self.volume_uuid = other.volume_uuid;
        }
        self
    }
}
