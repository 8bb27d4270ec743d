//! Alias names published under the `.local` domain.
//!
//! An [`AliasName`] can only be built through [`AliasName::parse`], so holding
//! one means the name has already been checked and lowercased.

use std::fmt;

use thiserror::Error;

/// The mDNS domain every alias must live in.
pub const LOCAL_SUFFIX: &str = ".local";

/// Longest label the DNS wire format can carry.
pub const MAX_LABEL_LEN: usize = 63;

/// Longest name (in presentation form, without a trailing dot).
pub const MAX_NAME_LEN: usize = 253;

/// Reasons a name is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("invalid alias '{name}': must end with '.local'")]
    NotLocal { name: String },

    #[error("invalid alias '{name}': no host label before '.local'")]
    MissingLabel { name: String },

    #[error("invalid alias '{name}': malformed label '{label}'")]
    MalformedLabel { name: String, label: String },

    #[error("invalid alias '{name}': label '{label}' exceeds 63 bytes")]
    LabelTooLong { name: String, label: String },

    #[error("invalid alias '{name}': name exceeds 253 bytes")]
    NameTooLong { name: String },
}

impl NameError {
    /// The name as supplied by the user.
    pub fn name(&self) -> &str {
        match self {
            Self::NotLocal { name }
            | Self::MissingLabel { name }
            | Self::MalformedLabel { name, .. }
            | Self::LabelTooLong { name, .. }
            | Self::NameTooLong { name } => name,
        }
    }
}

/// A validated, lowercased name ending in `.local`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AliasName(String);

impl AliasName {
    /// Validates `raw` and returns the normalized alias.
    ///
    /// The suffix comparison is case-insensitive. Every label in front of it
    /// must start with an ASCII letter or digit and may continue with letters,
    /// digits, `_` or `-`.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let lower = raw.to_ascii_lowercase();

        let Some(host_part) = lower.strip_suffix(LOCAL_SUFFIX) else {
            return Err(NameError::NotLocal {
                name: raw.to_string(),
            });
        };

        if host_part.is_empty() {
            return Err(NameError::MissingLabel {
                name: raw.to_string(),
            });
        }

        if lower.len() > MAX_NAME_LEN {
            return Err(NameError::NameTooLong {
                name: raw.to_string(),
            });
        }

        for label in host_part.split('.') {
            if !is_valid_label(label) {
                return Err(NameError::MalformedLabel {
                    name: raw.to_string(),
                    label: label.to_string(),
                });
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(NameError::LabelTooLong {
                    name: raw.to_string(),
                    label: label.to_string(),
                });
            }
        }

        Ok(Self(lower))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Labels of the name, `.local` included.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

fn is_valid_label(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for AliasName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AliasName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for AliasName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_names_under_local() {
        for raw in [
            "a.local",
            "printer.local",
            "web.myhost.local",
            "a.b.c.d.local",
            "under_score.local",
            "dash-ed.local",
            "0numeric.local",
        ] {
            let alias = AliasName::parse(raw).unwrap();
            assert_eq!(alias.as_str(), raw);
        }
    }

    #[test]
    fn test_suffix_is_case_insensitive_and_normalized() {
        let alias = AliasName::parse("Web.MyHost.LOCAL").unwrap();
        assert_eq!(alias.as_str(), "web.myhost.local");

        let alias = AliasName::parse("x.Local").unwrap();
        assert_eq!(alias.to_string(), "x.local");
    }

    #[test]
    fn test_rejects_names_outside_local() {
        for raw in [
            "",
            "local",
            "example.com",
            "host.localdomain",
            "host.local.",
            "host.local.com",
            "hostlocal",
            "host.lan",
        ] {
            let err = AliasName::parse(raw).unwrap_err();
            assert_eq!(err.name(), raw);
        }

        assert!(matches!(
            AliasName::parse("example.com"),
            Err(NameError::NotLocal { .. })
        ));
    }

    #[test]
    fn test_rejects_bare_suffix() {
        assert!(matches!(
            AliasName::parse(".local"),
            Err(NameError::MissingLabel { .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_labels() {
        for raw in ["-lead.local", "_lead.local", "a..b.local", "sp ace.local", "caf\u{e9}.local"] {
            assert!(
                matches!(AliasName::parse(raw), Err(NameError::MalformedLabel { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_label_length_limit() {
        let ok = format!("{}.local", "a".repeat(MAX_LABEL_LEN));
        assert!(AliasName::parse(&ok).is_ok());

        let too_long = format!("{}.local", "a".repeat(MAX_LABEL_LEN + 1));
        assert!(matches!(
            AliasName::parse(&too_long),
            Err(NameError::LabelTooLong { .. })
        ));
    }

    #[test]
    fn test_name_length_limit() {
        let label = "a".repeat(50);
        let too_long = format!("{label}.{label}.{label}.{label}.{label}.local");
        assert!(matches!(
            AliasName::parse(&too_long),
            Err(NameError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_error_message_names_the_entry() {
        let err = AliasName::parse("printer.lan").unwrap_err();
        let display = format!("{err}");
        assert!(display.contains("printer.lan"));
        assert!(display.contains(".local"));
    }

    #[test]
    fn test_labels() {
        let alias = AliasName::parse("web.host.local").unwrap();
        let labels: Vec<_> = alias.labels().collect();
        assert_eq!(labels, vec!["web", "host", "local"]);
    }

    #[test]
    fn test_from_str() {
        let alias: AliasName = "a.local".parse().unwrap();
        assert_eq!(alias.as_ref(), "a.local");
    }
}
