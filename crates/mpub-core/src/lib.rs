//! mDNS publisher core - shared types for CNAME publishing
//!
//! This crate provides the domain types shared between the daemon adapter
//! (`mpub-avahi`) and the publisher service (`mpubd`).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod control;
pub mod error;
pub mod name;
pub mod rdata;

// Re-exports for convenience
pub use control::{Connector, ControlSession};
pub use error::{PublishError, PublishResult};
pub use name::{AliasName, NameError, LOCAL_SUFFIX};
pub use rdata::{encode_cname_target, DNS_CLASS_IN, DNS_TYPE_CNAME};
