//! Background mode.

use anyhow::{Context, Result};
use daemonize::Daemonize;

/// Detaches from the terminal: forks, starts a new session, changes to `/`,
/// sets umask 022 and points the standard streams at `/dev/null`.
///
/// Must be called before any runtime or thread is started, since only the
/// calling thread survives the fork. A log file opened earlier stays valid.
pub fn daemonize() -> Result<()> {
    Daemonize::new()
        .working_directory("/")
        .umask(0o022u32)
        .start()
        .context("Failed to daemonize")?;

    Ok(())
}
