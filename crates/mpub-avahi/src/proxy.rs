//! D-Bus proxies for the parts of the Avahi API the publisher uses.
//!
//! Names and constants come from `avahi-common/defs.h` and the
//! `org.freedesktop.Avahi.*` introspection data.

use zbus::zvariant::OwnedObjectPath;

/// Well-known bus name of the Avahi daemon.
pub const AVAHI_SERVICE: &str = "org.freedesktop.Avahi";

/// Any network interface.
pub const IF_UNSPEC: i32 = -1;

/// Any protocol (IPv4 or IPv6).
pub const PROTO_UNSPEC: i32 = -1;

/// Bus error returned when the daemon is not (or no longer) on the bus.
pub const SERVICE_UNKNOWN: &str = "org.freedesktop.DBus.Error.ServiceUnknown";

#[zbus::proxy(
    interface = "org.freedesktop.Avahi.Server",
    default_service = "org.freedesktop.Avahi",
    default_path = "/",
    gen_blocking = false
)]
pub trait Server {
    fn get_version_string(&self) -> zbus::Result<String>;

    fn get_host_name_fqdn(&self) -> zbus::Result<String>;

    fn entry_group_new(&self) -> zbus::Result<OwnedObjectPath>;

    /// Returns `(interface, protocol, name, aprotocol, address, flags)`.
    fn resolve_host_name(
        &self,
        interface: i32,
        protocol: i32,
        name: &str,
        aprotocol: i32,
        flags: u32,
    ) -> zbus::Result<(i32, i32, String, i32, String, u32)>;
}

#[zbus::proxy(
    interface = "org.freedesktop.Avahi.EntryGroup",
    default_service = "org.freedesktop.Avahi",
    gen_blocking = false
)]
pub trait EntryGroup {
    #[allow(clippy::too_many_arguments)]
    fn add_record(
        &self,
        interface: i32,
        protocol: i32,
        flags: u32,
        name: &str,
        clazz: u16,
        rtype: u16,
        ttl: u32,
        rdata: &[u8],
    ) -> zbus::Result<()>;

    fn commit(&self) -> zbus::Result<()>;

    fn reset(&self) -> zbus::Result<()>;

    fn free(&self) -> zbus::Result<()>;
}

/// True when `err` means the daemon has left the bus.
pub fn is_service_unknown(err: &zbus::Error) -> bool {
    match err {
        zbus::Error::MethodError(name, _, _) => name.as_str() == SERVICE_UNKNOWN,
        zbus::Error::FDO(fdo) => matches!(**fdo, zbus::fdo::Error::ServiceUnknown(_)),
        _ => false,
    }
}
