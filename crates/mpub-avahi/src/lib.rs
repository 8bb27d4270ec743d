//! Avahi control interface for the mDNS CNAME publisher.
//!
//! Talks to `avahi-daemon` over the D-Bus system bus. Record publication,
//! conflict handling and the multicast I/O all stay inside Avahi; this crate
//! only adds, commits and withdraws entry groups.
//!
//! ```text
//! AvahiConnector ──connect()──▶ AvahiSession ──register()──▶ EntryGroupHandle
//!                                  │                              │
//!                     org.freedesktop.Avahi.Server   org.freedesktop.Avahi.EntryGroup
//! ```

pub mod proxy;
pub mod session;

pub use session::{AvahiConnector, AvahiSession, EntryGroupHandle};
