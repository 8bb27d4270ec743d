//! The alias publisher.
//!
//! Validates every requested name, opens one session to the daemon, publishes
//! one CNAME per name and then idles until cancelled, withdrawing everything
//! in reverse order on the way out.
//!
//! # Lifecycle
//!
//! ```text
//! Unstarted ──connect──▶ Connected ──▶ Publishing ──▶ Blocked ──cancel──▶ Terminating
//!                                                      │    ▲
//!                                                      └────┘ daemon lost: reconnect + republish,
//!                                                             failed aliases retried each probe
//! ```
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::fmt;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use mpub_core::{AliasName, Connector, ControlSession, PublishError, PublishResult};

use crate::config::PublisherConfig;

/// Handle type produced by a connector's sessions.
pub type HandleOf<C> = <<C as Connector>::Session as ControlSession>::Handle;

// ============================================================================
// Validation
// ============================================================================

/// Validates a single user-supplied name.
pub fn validate(name: &str) -> PublishResult<AliasName> {
    Ok(AliasName::parse(name)?)
}

/// Validates all names, stopping at the first invalid one.
pub fn validate_all<S: AsRef<str>>(names: &[S]) -> PublishResult<Vec<AliasName>> {
    names.iter().map(|name| validate(name.as_ref())).collect()
}

// ============================================================================
// State
// ============================================================================

/// Where the publisher is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    Unstarted,
    Connected,
    Publishing,
    Blocked,
    Terminating,
}

impl fmt::Display for PublisherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unstarted => "unstarted",
            Self::Connected => "connected",
            Self::Publishing => "publishing",
            Self::Blocked => "blocked",
            Self::Terminating => "terminating",
        };
        f.write_str(name)
    }
}

/// What a completed [`AliasPublisher::run`] did.
///
/// `registered == released + abandoned` always holds: every successful
/// registration is either withdrawn on shutdown or dropped with a lost daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Successful registrations, republished ones included.
    pub registered: usize,
    /// Release calls made during shutdown.
    pub released: usize,
    /// Handles dropped because the daemon that issued them went away.
    pub abandoned: usize,
    /// Sessions re-established after a daemon loss.
    pub reconnects: usize,
}

struct Registration<H> {
    alias: AliasName,
    handle: H,
}

// ============================================================================
// Publisher
// ============================================================================

/// Publishes CNAME aliases through a daemon control interface.
///
/// # Example
///
/// ```rust,ignore
/// use mpub_avahi::AvahiConnector;
/// use mpubd::{AliasPublisher, PublisherConfig};
/// use tokio_util::sync::CancellationToken;
///
/// let mut publisher = AliasPublisher::new(AvahiConnector::new(), PublisherConfig::default());
/// let summary = publisher.run(&["web.local"], CancellationToken::new()).await?;
/// ```
pub struct AliasPublisher<C: Connector> {
    connector: C,
    config: PublisherConfig,
    state: PublisherState,
}

impl<C: Connector> AliasPublisher<C> {
    #[must_use]
    pub fn new(connector: C, config: PublisherConfig) -> Self {
        Self {
            connector,
            config,
            state: PublisherState::Unstarted,
        }
    }

    pub fn state(&self) -> PublisherState {
        self.state
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    fn set_state(&mut self, state: PublisherState) {
        debug!(from = %self.state, to = %state, "Publisher state changed");
        self.state = state;
    }

    /// Opens the daemon session.
    pub async fn connect(&mut self) -> PublishResult<C::Session> {
        let session = self.connector.connect().await?;
        info!(host = %session.host_name(), "Connected to the mDNS daemon");
        self.set_state(PublisherState::Connected);
        Ok(session)
    }

    /// Publishes `alias` as a CNAME for the session's host name.
    ///
    /// Unless `force` is set, the alias is resolved first and the request is
    /// refused when another host already answers for it.
    pub async fn publish(
        &self,
        session: &C::Session,
        alias: &AliasName,
    ) -> PublishResult<HandleOf<C>> {
        if !self.config.force {
            info!(alias = %alias, "Checking for availability");

            if let Some(owner) = session.lookup_owner(alias).await {
                if !same_host(&owner, session.host_name()) {
                    return Err(PublishError::NameTaken {
                        name: alias.to_string(),
                        owner,
                    });
                }
                warn!(alias = %alias, "Alias is already being published by this machine");
            }
        }

        let handle = session.register(alias, self.config.ttl).await?;
        info!(
            alias = %alias,
            target = %session.host_name(),
            ttl = self.config.ttl,
            "Published CNAME"
        );
        Ok(handle)
    }

    /// Validates `names`, publishes them and holds them until `cancel` fires.
    ///
    /// Nothing touches the daemon until every name has passed validation.
    /// On any startup failure the aliases published so far are withdrawn
    /// before the error is returned.
    pub async fn run<S: AsRef<str>>(
        &mut self,
        names: &[S],
        cancel: CancellationToken,
    ) -> PublishResult<RunSummary> {
        let aliases = validate_all(names)?;

        if self.config.force {
            info!("Forcing CNAME publishing without collision checks");
        }

        let session = self.connect().await?;
        let mut summary = RunSummary::default();

        self.set_state(PublisherState::Publishing);
        let mut live = Vec::with_capacity(aliases.len());
        for alias in &aliases {
            let Some(result) = self.publish_unless_cancelled(&session, alias, &cancel).await
            else {
                info!(alias = %alias, "Cancelled while publishing");
                break;
            };
            match result {
                Ok(handle) => live.push(Registration {
                    alias: alias.clone(),
                    handle,
                }),
                Err(e) => {
                    error!(alias = %alias, error = %e, "Failed to publish");
                    self.set_state(PublisherState::Terminating);
                    self.release_all(&session, &mut live).await;
                    return Err(e);
                }
            }
        }
        summary.registered = live.len();
        if live.len() == aliases.len() {
            info!(count = live.len(), "All CNAMEs published");
        }

        self.set_state(PublisherState::Blocked);
        let session = self
            .hold(session, &mut live, &aliases, &cancel, &mut summary)
            .await;

        self.set_state(PublisherState::Terminating);
        summary.released = self.release_all(&session, &mut live).await;
        if summary.released > 0 && !self.config.release_grace.is_zero() {
            // Give the daemon time to send the goodbye packets.
            sleep(self.config.release_grace).await;
        }
        drop(session);

        info!(
            released = summary.released,
            abandoned = summary.abandoned,
            "Publisher stopped"
        );
        Ok(summary)
    }

    /// Publishes `alias` unless `cancel` fires first, in which case the
    /// request is dropped and `None` is returned.
    async fn publish_unless_cancelled(
        &self,
        session: &C::Session,
        alias: &AliasName,
        cancel: &CancellationToken,
    ) -> Option<PublishResult<HandleOf<C>>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.publish(session, alias) => Some(result),
        }
    }

    /// Idles until cancelled, re-establishing the session if the daemon goes
    /// away. Aliases that fail to republish are retried on every probe.
    async fn hold(
        &self,
        mut session: C::Session,
        live: &mut Vec<Registration<HandleOf<C>>>,
        aliases: &[AliasName],
        cancel: &CancellationToken,
        summary: &mut RunSummary,
    ) -> C::Session {
        let mut pending: Vec<AliasName> = Vec::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Cancellation requested");
                    return session;
                }
                _ = sleep(self.config.probe_interval) => {}
            }

            if !session.is_alive().await {
                if !live.is_empty() {
                    warn!("Lost connection with the mDNS daemon. Reconnecting...");
                    summary.abandoned += live.len();
                    live.clear();
                }

                match self.connector.connect().await {
                    Ok(fresh) => {
                        session = fresh;
                        summary.reconnects += 1;
                        info!(host = %session.host_name(), "Reconnected to the mDNS daemon");
                    }
                    Err(e) => {
                        debug!(error = %e, "Daemon still unavailable");
                        continue;
                    }
                }
                pending = aliases.to_vec();
            } else if pending.is_empty() {
                continue;
            } else {
                debug!(count = pending.len(), "Retrying CNAMEs that failed to publish");
            }

            pending = self
                .republish(&session, pending, live, cancel, summary)
                .await;

            if cancel.is_cancelled() {
                continue;
            }
            if pending.is_empty() {
                info!(count = live.len(), "All CNAMEs published");
            } else {
                warn!(
                    published = live.len(),
                    requested = aliases.len(),
                    "Only some CNAMEs were published"
                );
            }
        }
    }

    /// Publishes each of `pending` on `session`. Returns the aliases that
    /// still need publishing.
    async fn republish(
        &self,
        session: &C::Session,
        pending: Vec<AliasName>,
        live: &mut Vec<Registration<HandleOf<C>>>,
        cancel: &CancellationToken,
        summary: &mut RunSummary,
    ) -> Vec<AliasName> {
        let mut failed = Vec::new();
        let mut remaining = pending.into_iter();

        for alias in remaining.by_ref() {
            let outcome = self.publish_unless_cancelled(session, &alias, cancel).await;
            match outcome {
                None => {
                    failed.push(alias);
                    break;
                }
                Some(Ok(handle)) => {
                    summary.registered += 1;
                    live.push(Registration { alias, handle });
                }
                Some(Err(e)) => {
                    warn!(alias = %alias, error = %e, "Failed to republish, will retry");
                    failed.push(alias);
                }
            }
        }

        failed.extend(remaining);
        failed
    }

    /// Withdraws every live registration, newest first. Returns the number
    /// of release calls made.
    async fn release_all(
        &self,
        session: &C::Session,
        live: &mut Vec<Registration<HandleOf<C>>>,
    ) -> usize {
        let mut calls = 0;
        while let Some(Registration { alias, handle }) = live.pop() {
            calls += 1;
            match session.release(handle).await {
                Ok(()) => debug!(alias = %alias, "Withdrew CNAME"),
                Err(e) => warn!(alias = %alias, error = %e, "Failed to withdraw CNAME"),
            }
        }
        calls
    }
}

/// Compares host names ignoring case and a trailing root dot.
fn same_host(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_all_keeps_order() {
        let aliases = validate_all(&["b.local", "A.local"]).unwrap();
        let names: Vec<_> = aliases.iter().map(AliasName::as_str).collect();
        assert_eq!(names, vec!["b.local", "a.local"]);
    }

    #[test]
    fn test_validate_all_stops_at_first_invalid() {
        let err = validate_all(&["a.local", "b.com", "c.org"]).unwrap_err();
        match err {
            PublishError::InvalidName(name_err) => assert_eq!(name_err.name(), "b.com"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_all_empty() {
        let names: [&str; 0] = [];
        assert!(validate_all(&names).unwrap().is_empty());
    }

    #[test]
    fn test_same_host() {
        assert!(same_host("host.local", "host.local"));
        assert!(same_host("Host.Local.", "host.local"));
        assert!(!same_host("other.local", "host.local"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PublisherState::Blocked.to_string(), "blocked");
        assert_eq!(PublisherState::Terminating.to_string(), "terminating");
    }
}
