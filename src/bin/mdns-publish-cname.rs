//! mdns-publish-cname - Publish CNAMEs pointing to the local host over Avahi/mDNS
//!
//! Registers each name given on the command line as a CNAME for this
//! machine's own mDNS host name and keeps them published until interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Publish two aliases (foreground, logs to stderr)
//! mdns-publish-cname web.local files.myhost.local
//!
//! # Run in the background, logging to syslog
//! mdns-publish-cname -d -l syslog web.local
//!
//! # Skip the availability check and use a 5 minute TTL
//! mdns-publish-cname -f -t 300 web.local
//!
//! # Extra debug output for the publisher only
//! RUST_LOG=mpubd=trace mdns-publish-cname web.local
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT/SIGQUIT: withdraw every published CNAME, then exit

use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mpub_avahi::AvahiConnector;
use mpubd::config::DEFAULT_TTL_SECS;
use mpubd::logging::{self, LogTarget};
use mpubd::shutdown::{join_signal_handler, spawn_signal_handler};
use mpubd::{daemon, validate_all, AliasPublisher, PublisherConfig};

/// Publish CNAMEs pointing to the local host over Avahi/mDNS.
#[derive(Parser, Debug)]
#[command(name = "mdns-publish-cname", version, about)]
struct Args {
    /// Fully-qualified CNAME(s) to publish. Subdomains are allowed, but names
    /// must end with the '.local' domain.
    #[arg(value_name = "hostname", required = true)]
    cnames: Vec<String>,

    /// Produce extra output for debugging purposes.
    #[arg(short, long)]
    verbose: bool,

    /// Run the publishing service in the background.
    #[arg(short, long)]
    daemon: bool,

    /// Do not check for availability before publishing.
    #[arg(short, long)]
    force: bool,

    /// Log messages into 'syslog' or the specified log file.
    #[arg(short, long, value_name = "log")]
    log: Option<String>,

    /// TTL for published records, in seconds.
    #[arg(
        short,
        long,
        value_name = "ttl",
        default_value_t = DEFAULT_TTL_SECS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    ttl: u32,
}

/// Program name as invoked, for syslog.
fn program_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "mdns-publish-cname".to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Reject bad names while the user can still see the error.
    validate_all(args.cnames.as_slice())?;

    let log_target =
        LogTarget::from_arg(args.log.as_deref()).context("Failed to resolve log file path")?;

    // The log file has to be opened before daemonizing, so relative paths
    // start from the directory the user ran us in.
    logging::init_logging(&log_target, args.verbose, &program_name(), args.daemon)?;

    if args.daemon {
        daemon::daemonize()?;
    }

    let config = PublisherConfig {
        ttl: args.ttl,
        force: args.force,
        ..Default::default()
    };

    run_publisher(args.cnames, config)
}

#[tokio::main(flavor = "current_thread")]
async fn run_publisher(names: Vec<String>, config: PublisherConfig) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Avahi/mDNS publisher starting"
    );

    let cancel_token = CancellationToken::new();
    let signal_handle = spawn_signal_handler(cancel_token.clone());

    let mut publisher = AliasPublisher::new(AvahiConnector::new(), config);
    let result = publisher.run(names.as_slice(), cancel_token.clone()).await;

    cancel_token.cancel();
    join_signal_handler(signal_handle).await;

    match result {
        Ok(summary) => {
            info!(
                registered = summary.registered,
                released = summary.released,
                reconnects = summary.reconnects,
                "Avahi/mDNS publisher stopped"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Publisher failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_zero_names_is_a_usage_error() {
        let err = Args::try_parse_from(["mdns-publish-cname"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["mdns-publish-cname", "a.local", "b.local"]).unwrap();
        assert_eq!(args.cnames, vec!["a.local", "b.local"]);
        assert_eq!(args.ttl, DEFAULT_TTL_SECS);
        assert!(!args.verbose && !args.daemon && !args.force);
        assert!(args.log.is_none());
    }

    #[test]
    fn test_all_options() {
        let args = Args::try_parse_from([
            "mdns-publish-cname",
            "-v",
            "-d",
            "-f",
            "-l",
            "syslog",
            "-t",
            "300",
            "web.local",
        ])
        .unwrap();
        assert!(args.verbose && args.daemon && args.force);
        assert_eq!(args.log.as_deref(), Some("syslog"));
        assert_eq!(args.ttl, 300);
        assert_eq!(args.cnames, vec!["web.local"]);
    }

    #[test]
    fn test_ttl_must_be_positive() {
        assert!(Args::try_parse_from(["mdns-publish-cname", "-t", "0", "a.local"]).is_err());
        assert!(Args::try_parse_from(["mdns-publish-cname", "-t", "-5", "a.local"]).is_err());
        assert!(Args::try_parse_from(["mdns-publish-cname", "-t", "abc", "a.local"]).is_err());
    }

    #[test]
    fn test_args_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
