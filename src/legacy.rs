//! Device enumeration and lookup against UDisks1.

use tracing::{debug, warn};

use crate::bus::{
    LegacyTransport, MethodCall, Reply, UDISKS1_INTERFACE, UDISKS1_PATH, UDISKS1_SERVICE,
};
use crate::constraint::ConstraintList;
use crate::error::{HalError, Result};
use crate::property::check_property;
use crate::strings::{StringArray, read_string_array};
use crate::wire::{ArgCursor, ArgType};

/// Object paths of every device the daemon knows about.
///
/// Returns `None` when the daemon reports no devices or when the reply is
/// not an array.
pub fn find_all_items<T>(bus: &T) -> Result<Option<StringArray>>
where
    T: LegacyTransport + ?Sized,
{
    let call = MethodCall::new(
        UDISKS1_SERVICE,
        UDISKS1_PATH,
        UDISKS1_INTERFACE,
        "EnumerateDevices",
    );
    let args = match bus.call(&call)? {
        Reply::Return(args) => args,
        Reply::Error { name, message } => {
            return Err(HalError::CommunicationError {
                message: match message {
                    Some(message) => format!("{name}: {message}"),
                    None => name,
                },
            });
        }
    };

    let cursor = ArgCursor::new(&args);
    if cursor.arg_type() != ArgType::Array {
        let error = HalError::MalformedReply {
            context: format!("EnumerateDevices returned {:?}", cursor.arg_type()),
        };
        warn!("{}", error);
        return Ok(None);
    }

    let devices = read_string_array(&mut cursor.recurse());
    debug!(count = devices.len(), "Enumerated devices");
    Ok(devices.non_empty())
}

/// First device satisfying every constraint, by object path.
pub fn find_item<T>(bus: &T, constraints: &ConstraintList) -> Result<Option<String>>
where
    T: LegacyTransport + ?Sized,
{
    let Some(devices) = find_all_items(bus)? else {
        return Ok(None);
    };

    for udi in devices.iter() {
        let matched =
            constraints.all_satisfied(|name, value| check_property(bus, udi, name, value))?;
        if matched {
            debug!(udi, %constraints, "Device matched");
            return Ok(Some(udi.to_owned()));
        }
    }

    debug!(%constraints, "No device matched");
    Ok(None)
}
