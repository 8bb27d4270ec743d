//! CNAME record data in DNS wire format.

use crate::error::{PublishError, PublishResult};
use crate::name::MAX_LABEL_LEN;

/// DNS class IN.
pub const DNS_CLASS_IN: u16 = 0x01;

/// DNS record type CNAME.
pub const DNS_TYPE_CNAME: u16 = 0x05;

/// Encodes `fqdn` as length-prefixed labels followed by the root label.
///
/// Empty labels are skipped, so a trailing dot is accepted. The target comes
/// from the daemon rather than the user, so it is only checked for what the
/// wire format cannot carry.
pub fn encode_cname_target(fqdn: &str) -> PublishResult<Vec<u8>> {
    if !fqdn.is_ascii() {
        return Err(PublishError::InvalidTarget {
            target: fqdn.to_string(),
            reason: "not ASCII".to_string(),
        });
    }

    let mut data = Vec::with_capacity(fqdn.len() + 2);
    for label in fqdn.split('.').filter(|l| !l.is_empty()) {
        let len = u8::try_from(label.len())
            .ok()
            .filter(|&len| usize::from(len) <= MAX_LABEL_LEN)
            .ok_or_else(|| PublishError::InvalidTarget {
                target: fqdn.to_string(),
                reason: format!("label '{label}' is too long"),
            })?;
        data.push(len);
        data.extend_from_slice(label.as_bytes());
    }

    if data.is_empty() {
        return Err(PublishError::InvalidTarget {
            target: fqdn.to_string(),
            reason: "empty name".to_string(),
        });
    }

    data.push(0);
    Ok(data)
}
