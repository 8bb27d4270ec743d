//! Publisher configuration.

use std::time::Duration;

/// Default time-to-live for published records, in seconds.
pub const DEFAULT_TTL_SECS: u32 = 60;

/// Configuration for the alias publisher.
///
/// # Example
///
/// ```rust
/// use mpubd::config::PublisherConfig;
/// use std::time::Duration;
///
/// let config = PublisherConfig {
///     ttl: 120,
///     force: true,
///     ..Default::default()
/// };
/// assert_eq!(config.probe_interval, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// TTL for published records, in seconds. Must be greater than zero.
    pub ttl: u32,

    /// Publish without asking the daemon whether the name is already taken.
    pub force: bool,

    /// How often the daemon is probed while the publisher is idle.
    pub probe_interval: Duration,

    /// Pause after withdrawing records so the daemon can announce the removal.
    pub release_grace: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL_SECS,
            force: false,
            probe_interval: Duration::from_secs(1),
            release_grace: Duration::from_secs(1),
        }
    }
}
