//! Seams between the publisher and the mDNS daemon's control interface.
//!
//! The publisher never talks to a bus directly. It asks a [`Connector`] for a
//! [`ControlSession`] and publishes through that session, which keeps the
//! daemon connection an explicitly passed value rather than ambient state.

use async_trait::async_trait;

use crate::error::PublishResult;
use crate::name::AliasName;

/// Opens sessions to the daemon's control interface.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: ControlSession;

    /// Establishes a session, failing with [`PublishError::Connection`] when
    /// the daemon is absent or inaccessible.
    ///
    /// [`PublishError::Connection`]: crate::PublishError::Connection
    async fn connect(&self) -> PublishResult<Self::Session>;
}

/// One live connection to the daemon.
#[async_trait]
pub trait ControlSession: Send + Sync {
    /// Opaque handle for a published alias. Dropping it without
    /// [`ControlSession::release`] leaves the record to the daemon.
    type Handle: Send + Sync;

    /// The host's own advertised name, used as the CNAME target.
    fn host_name(&self) -> &str;

    /// Current owner of `alias` on the local segment, if anyone answers.
    async fn lookup_owner(&self, alias: &AliasName) -> Option<String>;

    /// Publishes `alias` as a CNAME for [`ControlSession::host_name`].
    async fn register(&self, alias: &AliasName, ttl: u32) -> PublishResult<Self::Handle>;

    /// Withdraws a previously published alias.
    async fn release(&self, handle: Self::Handle) -> PublishResult<()>;

    /// Whether the daemon still answers on this session.
    async fn is_alive(&self) -> bool;
}
