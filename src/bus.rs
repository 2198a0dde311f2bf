//! System bus connection and the request/reply transport.
//!
//! ## D-Bus Interface
//!
//! - **Bus**: System bus
//! - **UDisks1**: `org.freedesktop.UDisks` at `/org/freedesktop/UDisks`
//! - **UDisks2**: `org.freedesktop.UDisks2` at `/org/freedesktop/UDisks2`
//!
//! ## Setuid workaround
//!
//! libdbus-era bus daemons refuse connections from processes whose real and
//! effective uids differ (freedesktop bug 11876). When the first connection
//! attempt fails in a setuid-root process run by another user, root is
//! assumed for both uids for exactly one more attempt and the original pair
//! is restored afterwards. Only root can restore a real uid it gave up, so
//! no other identity pair is ever switched.

use std::fmt::Display;

use nix::errno::Errno;
use nix::unistd::{Uid, geteuid, getuid};
use tracing::{debug, error, warn};
use zbus::blocking::Connection;
use zbus::Message;
use zbus::names::{BusName, InterfaceName, MemberName};
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue};

use crate::error::{HalError, Result};
use crate::wire::Arg;

pub const UDISKS1_SERVICE: &str = "org.freedesktop.UDisks";
pub const UDISKS1_PATH: &str = "/org/freedesktop/UDisks";
pub const UDISKS1_INTERFACE: &str = "org.freedesktop.UDisks";
pub const UDISKS1_DEVICE_INTERFACE: &str = "org.freedesktop.UDisks.Device";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

pub const UDISKS2_SERVICE: &str = "org.freedesktop.UDisks2";
pub const UDISKS2_PATH: &str = "/org/freedesktop/UDisks2";

// ─────────────────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────────────────

/// Process identity operations used by the connection workaround.
pub trait Credentials {
    fn real_uid(&self) -> Uid;
    fn effective_uid(&self) -> Uid;
    fn set_reuid(&self, ruid: Uid, euid: Uid) -> nix::Result<()>;
}

/// The calling process's own credentials.
pub struct ProcessCredentials;

impl Credentials for ProcessCredentials {
    fn real_uid(&self) -> Uid {
        getuid()
    }

    fn effective_uid(&self) -> Uid {
        geteuid()
    }

    fn set_reuid(&self, ruid: Uid, euid: Uid) -> nix::Result<()> {
        let rc = unsafe { libc::setreuid(ruid.as_raw(), euid.as_raw()) };
        Errno::result(rc).map(drop)
    }
}

/// Elevated identity held for the lifetime of the guard.
///
/// Acquiring sets both real and effective uid to the effective uid. Dropping
/// restores the original pair, on every exit path.
pub struct ElevatedIdentity<'c, C: Credentials + ?Sized> {
    credentials: &'c C,
    ruid: Uid,
    euid: Uid,
}

impl<'c, C: Credentials + ?Sized> ElevatedIdentity<'c, C> {
    pub fn acquire(credentials: &'c C) -> nix::Result<Self> {
        let ruid = credentials.real_uid();
        let euid = credentials.effective_uid();
        credentials.set_reuid(euid, euid)?;
        debug!(%ruid, %euid, "Assumed effective identity for bus connection");
        Ok(Self {
            credentials,
            ruid,
            euid,
        })
    }
}

impl<C: Credentials + ?Sized> Drop for ElevatedIdentity<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.credentials.set_reuid(self.ruid, self.euid) {
            error!(ruid = %self.ruid, euid = %self.euid, "Failed to restore real uid: {}", e);
        }
    }
}

/// Run a connection attempt, retrying once under the effective identity.
///
/// The retry only happens when the first attempt fails, the effective uid is
/// root and the real uid is not. Both failures report [`HalError::BusUnavailable`]
/// with the text of the last error seen.
pub fn connect_with<C, T, E>(
    credentials: &C,
    mut attempt: impl FnMut() -> std::result::Result<T, E>,
) -> Result<T>
where
    C: Credentials + ?Sized,
    E: Display,
{
    let first = match attempt() {
        Ok(connection) => return Ok(connection),
        Err(e) => e.to_string(),
    };

    if !credentials.effective_uid().is_root() || credentials.real_uid().is_root() {
        error!("Cannot connect to system bus: {}", first);
        return Err(HalError::BusUnavailable { message: first });
    }

    let retried = match ElevatedIdentity::acquire(credentials) {
        Ok(_identity) => attempt().map_err(|e| e.to_string()),
        Err(e) => {
            warn!("Could not assume effective identity: {}", e);
            Err(first)
        }
    };

    retried.map_err(|message| {
        error!("Cannot connect to system bus: {}", message);
        HalError::BusUnavailable { message }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// A remote method call with string arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub destination: String,
    pub path: String,
    pub interface: String,
    pub member: String,
    pub args: Vec<String>,
}

impl MethodCall {
    pub fn new(destination: &str, path: &str, interface: &str, member: &str) -> Self {
        Self {
            destination: destination.to_string(),
            path: path.to_string(),
            interface: interface.to_string(),
            member: member.to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Outcome of a call the daemon answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A method return carrying its arguments in order.
    Return(Vec<Arg>),
    /// An error reply sent by the remote side.
    Error {
        name: String,
        message: Option<String>,
    },
}

/// Blocking request/reply access to the legacy daemon.
///
/// `Err` means the call itself could not be made or completed. A reply the
/// daemon sent, including an error reply, is `Ok`.
pub trait LegacyTransport {
    fn call(&self, call: &MethodCall) -> Result<Reply>;
}

/// Process-owned connection to the system bus.
pub struct SystemBus {
    connection: Connection,
}

/// Connect to the system bus, applying the setuid workaround.
pub fn connect() -> Result<SystemBus> {
    let connection = connect_with(&ProcessCredentials, Connection::system)?;
    debug!("Connected to system bus");
    Ok(SystemBus { connection })
}

/// Release a connection obtained from [`connect`].
pub fn disconnect(bus: SystemBus) {
    drop(bus);
    debug!("Disconnected from system bus");
}

impl SystemBus {
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    fn send(&self, call: &MethodCall) -> zbus::Result<Message> {
        let destination = BusName::try_from(call.destination.as_str())?;
        let path = ObjectPath::try_from(call.path.as_str())?;
        let interface = InterfaceName::try_from(call.interface.as_str())?;
        let member = MemberName::try_from(call.member.as_str())?;

        let conn = &self.connection;
        match call.args.as_slice() {
            [] => conn.call_method(Some(destination), path, Some(interface), member, &()),
            [a] => conn.call_method(Some(destination), path, Some(interface), member, &(a,)),
            [a, b] => conn.call_method(Some(destination), path, Some(interface), member, &(a, b)),
            _ => Err(zbus::Error::Unsupported),
        }
    }
}

impl LegacyTransport for SystemBus {
    fn call(&self, call: &MethodCall) -> Result<Reply> {
        match self.send(call) {
            Ok(message) => decode_reply(&message).map(Reply::Return),
            Err(zbus::Error::MethodError(name, message, _)) => Ok(Reply::Error {
                name: name.to_string(),
                message,
            }),
            Err(
                e @ (zbus::Error::Names(_)
                | zbus::Error::Variant(_)
                | zbus::Error::Unsupported),
            ) => {
                error!(member = %call.member, "Could not allocate D-Bus message: {}", e);
                Err(HalError::AllocationFailed {
                    context: format!("{}.{} on {}: {}", call.interface, call.member, call.path, e),
                })
            }
            Err(e) => {
                error!(member = %call.member, "Error communicating with D-Bus: {}", e);
                Err(HalError::CommunicationError {
                    message: e.to_string(),
                })
            }
        }
    }
}

/// Convert a method return into [`Arg`]s by its body signature.
fn decode_reply(message: &Message) -> Result<Vec<Arg>> {
    let body = message.body();
    let signature = body.signature().to_string();
    let malformed = |e: zbus::Error| malformed_reply(&signature, e);

    let args = match signature.as_str() {
        "" => Vec::new(),
        "v" => {
            let value: OwnedValue = body.deserialize().map_err(malformed)?;
            vec![Arg::variant(Arg::from(&*value))]
        }
        "ao" => {
            let paths: Vec<OwnedObjectPath> = body.deserialize().map_err(malformed)?;
            vec![Arg::Array(
                paths.iter().map(|p| Arg::object_path(p.as_str())).collect(),
            )]
        }
        "as" => {
            let items: Vec<String> = body.deserialize().map_err(malformed)?;
            vec![Arg::Array(items.into_iter().map(Arg::Str).collect())]
        }
        other => vec![Arg::Other(other.to_string())],
    };
    Ok(args)
}

fn malformed_reply(signature: &str, error: zbus::Error) -> HalError {
    HalError::MalformedReply {
        context: format!("body '{}': {}", signature, error),
    }
}
