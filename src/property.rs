//! Device property fetches against the legacy daemon.
//!
//! UDisks1 exposes each device property through
//! `org.freedesktop.DBus.Properties.Get`, which replies with a single variant.
//! A reply of any other shape, or an error reply from the daemon, means the
//! property is not present.

use tracing::debug;

use crate::bus::{
    LegacyTransport, MethodCall, PROPERTIES_INTERFACE, Reply, UDISKS1_DEVICE_INTERFACE,
    UDISKS1_SERVICE,
};
use crate::error::Result;
use crate::strings::{StringArray, read_string_array};
use crate::wire::{ArgCursor, ArgType};

/// Expected type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    StringArray,
    Bool,
}

/// A property value as extracted from a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Absent,
    Str(String),
    StringArray(StringArray),
    Bool(bool),
}

/// Send `Get(org.freedesktop.UDisks.Device, name)` to the device at `udi`.
pub fn get_raw_property<T>(bus: &T, udi: &str, name: &str) -> Result<Reply>
where
    T: LegacyTransport + ?Sized,
{
    let call = MethodCall::new(UDISKS1_SERVICE, udi, PROPERTIES_INTERFACE, "Get")
        .arg(UDISKS1_DEVICE_INTERFACE)
        .arg(name);
    bus.call(&call)
}

/// Extract a value of `kind` from a `Get` reply.
pub fn unmarshal(reply: &Reply, kind: PropertyKind) -> PropertyValue {
    let Reply::Return(args) = reply else {
        return PropertyValue::Absent;
    };

    let cursor = ArgCursor::new(args);
    if cursor.arg_type() != ArgType::Variant {
        return PropertyValue::Absent;
    }
    let inner = cursor.recurse();

    let value = match kind {
        PropertyKind::String => inner.get_str().map(|s| PropertyValue::Str(s.to_owned())),
        PropertyKind::Bool => inner.get_bool().map(PropertyValue::Bool),
        PropertyKind::StringArray => {
            let mut items = inner.recurse();
            read_string_array(&mut items)
                .non_empty()
                .map(PropertyValue::StringArray)
        }
    };
    value.unwrap_or(PropertyValue::Absent)
}

/// Fetch one property of one device.
pub fn get_property<T>(bus: &T, udi: &str, name: &str, kind: PropertyKind) -> Result<PropertyValue>
where
    T: LegacyTransport + ?Sized,
{
    let reply = get_raw_property(bus, udi, name)?;
    if let Reply::Error { name: error, message } = &reply {
        debug!(udi, property = name, %error, ?message, "Property not available");
    }
    Ok(unmarshal(&reply, kind))
}

pub fn get_string_property<T>(bus: &T, udi: &str, name: &str) -> Result<Option<String>>
where
    T: LegacyTransport + ?Sized,
{
    Ok(match get_property(bus, udi, name, PropertyKind::String)? {
        PropertyValue::Str(value) => Some(value),
        PropertyValue::Absent | PropertyValue::StringArray(_) | PropertyValue::Bool(_) => None,
    })
}

/// Fetch a string-array property. An empty array is reported as `None`.
pub fn get_string_array_property<T>(bus: &T, udi: &str, name: &str) -> Result<Option<StringArray>>
where
    T: LegacyTransport + ?Sized,
{
    Ok(match get_property(bus, udi, name, PropertyKind::StringArray)? {
        PropertyValue::StringArray(items) => Some(items),
        PropertyValue::Absent | PropertyValue::Str(_) | PropertyValue::Bool(_) => None,
    })
}

pub fn get_bool_property<T>(bus: &T, udi: &str, name: &str) -> Result<Option<bool>>
where
    T: LegacyTransport + ?Sized,
{
    Ok(match get_property(bus, udi, name, PropertyKind::Bool)? {
        PropertyValue::Bool(value) => Some(value),
        PropertyValue::Absent | PropertyValue::Str(_) | PropertyValue::StringArray(_) => None,
    })
}

/// Whether the string property `name` of `udi` equals `expected` exactly.
pub fn check_property<T>(bus: &T, udi: &str, name: &str, expected: &str) -> Result<bool>
where
    T: LegacyTransport + ?Sized,
{
    let matched = get_string_property(bus, udi, name)?.is_some_and(|value| value == expected);
    debug!(udi, property = name, expected, matched, "Checked property");
    Ok(matched)
}
