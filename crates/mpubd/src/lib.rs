//! mDNS CNAME publisher - the publishing service
//!
//! This crate provides the pieces the `mdns-publish-cname` binary is built from:
//! - `publisher` - validates aliases, publishes them and holds them until cancelled
//! - `config` - publisher settings (TTL, collision checks, probe timing)
//! - `shutdown` - maps SIGINT/SIGTERM/SIGQUIT onto a cancellation token
//! - `logging` - stderr, file and syslog output for `tracing`
//! - `daemon` - detaching into the background
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  connect()  ┌────────────────┐  register()  ┌─────────────┐
//! │AliasPublisher│────────────▶│ ControlSession │─────────────▶│ mDNS daemon │
//! └──────┬───────┘             └────────────────┘   release()  └─────────────┘
//!        │ cancelled()
//! ┌──────┴────────────┐
//! │ CancellationToken │◀── signal handler
//! └───────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`

pub mod config;
pub mod daemon;
pub mod logging;
pub mod publisher;
pub mod shutdown;

pub use config::PublisherConfig;
pub use publisher::{validate, validate_all, AliasPublisher, PublisherState, RunSummary};
