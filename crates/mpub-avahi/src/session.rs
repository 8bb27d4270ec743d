//! Avahi-backed implementation of the control-interface traits.
//!
//! Each alias gets its own entry group so it can be withdrawn on its own.
//!
//! **Panic-Free Policy:** no `.unwrap()`, `.expect()`, `panic!()`,
//! `unreachable!()`, or `todo!()` in this module.

use async_trait::async_trait;
use tracing::{debug, warn};
use zbus::zvariant::ObjectPath;
use zbus::Connection;

use mpub_core::{
    encode_cname_target, AliasName, Connector, ControlSession, PublishError, PublishResult,
    DNS_CLASS_IN, DNS_TYPE_CNAME,
};

use crate::proxy::{is_service_unknown, EntryGroupProxy, ServerProxy, IF_UNSPEC, PROTO_UNSPEC};

// ============================================================================
// Connector
// ============================================================================

/// Opens sessions to the Avahi daemon on the system bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvahiConnector;

impl AvahiConnector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for AvahiConnector {
    type Session = AvahiSession;

    async fn connect(&self) -> PublishResult<AvahiSession> {
        let connection = Connection::system()
            .await
            .map_err(|e| PublishError::Connection(format!("system bus unavailable: {e}")))?;

        let server = ServerProxy::new(&connection)
            .await
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        // Proxies are lazy, so this is the first call that reaches the daemon.
        let host_name = server.get_host_name_fqdn().await.map_err(|e| {
            if is_service_unknown(&e) {
                PublishError::Connection("Avahi is not running".to_string())
            } else {
                PublishError::Connection(e.to_string())
            }
        })?;

        let rdata = encode_cname_target(&host_name)?;

        debug!(host = %host_name, "Avahi mDNS publisher session ready");

        Ok(AvahiSession {
            connection,
            server,
            host_name,
            rdata,
        })
    }
}

// ============================================================================
// Session
// ============================================================================

/// A live connection to Avahi.
pub struct AvahiSession {
    connection: Connection,
    server: ServerProxy<'static>,
    host_name: String,
    /// Wire-format `host_name`, shared by every CNAME this session publishes.
    rdata: Vec<u8>,
}

/// An alias published through its own Avahi entry group.
pub struct EntryGroupHandle {
    alias: AliasName,
    group: EntryGroupProxy<'static>,
}

impl EntryGroupHandle {
    pub fn alias(&self) -> &AliasName {
        &self.alias
    }

    pub fn path(&self) -> &ObjectPath<'_> {
        self.group.inner().path()
    }
}

impl std::fmt::Debug for EntryGroupHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryGroupHandle")
            .field("alias", &self.alias)
            .field("path", &self.path().as_str())
            .finish()
    }
}

impl AvahiSession {
    /// Avahi's version string, e.g. `avahi 0.8`.
    pub async fn version(&self) -> zbus::Result<String> {
        self.server.get_version_string().await
    }
}

#[async_trait]
impl ControlSession for AvahiSession {
    type Handle = EntryGroupHandle;

    fn host_name(&self) -> &str {
        &self.host_name
    }

    async fn lookup_owner(&self, alias: &AliasName) -> Option<String> {
        // Blocks for the daemon's resolver timeout when nobody answers.
        match self
            .server
            .resolve_host_name(IF_UNSPEC, PROTO_UNSPEC, alias.as_str(), PROTO_UNSPEC, 0)
            .await
        {
            Ok((_, _, owner, _, address, _)) => {
                debug!(alias = %alias, owner = %owner, address = %address, "Alias resolved");
                Some(owner)
            }
            Err(e) => {
                debug!(alias = %alias, error = %e, "Alias did not resolve");
                None
            }
        }
    }

    async fn register(&self, alias: &AliasName, ttl: u32) -> PublishResult<EntryGroupHandle> {
        let path = self
            .server
            .entry_group_new()
            .await
            .map_err(|e| PublishError::registration(alias.as_str(), e))?;

        let group = EntryGroupProxy::builder(&self.connection)
            .path(path.into_inner())
            .map_err(|e| PublishError::registration(alias.as_str(), e))?
            .build()
            .await
            .map_err(|e| PublishError::registration(alias.as_str(), e))?;

        let added = group
            .add_record(
                IF_UNSPEC,
                PROTO_UNSPEC,
                0,
                alias.as_str(),
                DNS_CLASS_IN,
                DNS_TYPE_CNAME,
                ttl,
                &self.rdata,
            )
            .await;

        let committed = match added {
            Ok(()) => group.commit().await,
            Err(e) => Err(e),
        };

        if let Err(e) = committed {
            if let Err(free_err) = group.free().await {
                debug!(alias = %alias, error = %free_err, "Failed to free rejected entry group");
            }
            return Err(PublishError::registration(alias.as_str(), e));
        }

        debug!(
            alias = %alias,
            target = %self.host_name,
            ttl,
            group = %group.inner().path(),
            "CNAME committed"
        );

        Ok(EntryGroupHandle {
            alias: alias.clone(),
            group,
        })
    }

    async fn release(&self, handle: EntryGroupHandle) -> PublishResult<()> {
        let EntryGroupHandle { alias, group } = handle;

        let result = match group.reset().await {
            Ok(()) => group.free().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                debug!(alias = %alias, "CNAME withdrawn");
                Ok(())
            }
            // The daemon took the records with it.
            Err(e) if is_service_unknown(&e) => {
                debug!(alias = %alias, "Avahi already gone, nothing to withdraw");
                Ok(())
            }
            Err(e) => Err(PublishError::Release {
                name: alias.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn is_alive(&self) -> bool {
        match self.version().await {
            Ok(_) => true,
            Err(e) if is_service_unknown(&e) => false,
            Err(e) => {
                warn!(error = %e, "Avahi liveness probe failed");
                false
            }
        }
    }
}
