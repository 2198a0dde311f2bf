//! Volume lookup by filesystem UUID (UDisks1).

use crate::bus::LegacyTransport;
use crate::constraint::ConstraintList;
use crate::error::Result;
use crate::legacy::find_item;
use crate::property::{get_bool_property, get_string_array_property};

/// Mount state of a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    pub udi: String,
    pub is_mounted: bool,
    pub mount_paths: Vec<String>,
}

impl VolumeInfo {
    /// First mount point, if the volume is mounted anywhere.
    pub fn mount_point(&self) -> Option<&str> {
        self.mount_paths.first().map(String::as_str)
    }
}

/// Find the volume whose `IdUuid` is `uuid` and read its mount state.
///
/// An empty `uuid` names no volume and is answered without a bus call.
pub fn probe_volume<T>(bus: &T, uuid: &str) -> Result<Option<VolumeInfo>>
where
    T: LegacyTransport + ?Sized,
{
    if uuid.is_empty() {
        return Ok(None);
    }
    let constraints = ConstraintList::new().with("IdUuid", uuid);
    let Some(udi) = find_item(bus, &constraints)? else {
        return Ok(None);
    };

    let is_mounted = get_bool_property(bus, &udi, "DeviceIsMounted")?.unwrap_or(false);
    let mount_paths = get_string_array_property(bus, &udi, "DeviceMountPaths")?
        .map(|paths| paths.into_vec())
        .unwrap_or_default();

    Ok(Some(VolumeInfo {
        udi,
        is_mounted,
        mount_paths,
    }))
}
