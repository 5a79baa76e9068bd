//! Filter rule configuration
//!
//! The declarative rule set consumed by the engine: allow/deny country
//! lists, allow/deny address lists, and the default policy. A config can be
//! built three ways — deserialized from TOML/JSON, parsed from a directive
//! block, or constructed directly — then validated and compiled.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by rule validation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleError {
    #[error("cannot specify both allow_countries and deny_countries")]
    ConflictingCountryRules,
}

/// Filter rule set, unvalidated and uncompiled.
///
/// Every field is optional so a serialized config only carries what was
/// actually written; an absent list and an explicitly empty list stay
/// distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Countries the filter will allow. The special value `UNK` matches
    /// requests whose country could not be resolved. Do not combine with
    /// `deny_countries`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_countries: Option<Vec<String>>,

    /// Countries the filter will deny. The special value `UNK` matches
    /// requests whose country could not be resolved. Do not combine with
    /// `allow_countries`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny_countries: Option<Vec<String>>,

    /// IP addresses or CIDR blocks to allow, e.g. `192.168.1.1`,
    /// `10.0.0.0/8`, `2001:db8::/32`. Takes precedence over country rules
    /// and over `deny_ips`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_ips: Option<Vec<String>>,

    /// IP addresses or CIDR blocks to deny. Takes precedence over country
    /// rules but not over `allow_ips`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny_ips: Option<Vec<String>>,

    /// Default policy when no rule matches: `true` denies, `false` (or
    /// absent) allows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_by_default: Option<bool>,
}

impl FilterConfig {
    /// Load a rule set from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read rule file: {}", path.as_ref().display()))?;

        let config: FilterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse rule file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Reject logically conflicting rule sets.
    ///
    /// Allow and deny country lists are mutually exclusive by construction:
    /// an allow list denies every country outside it, so a deny list on top
    /// can never take effect. Address allow/deny lists may coexist — their
    /// overlap is resolved by precedence at decision time. An empty config
    /// is valid and allows everything.
    pub fn validate(&self) -> Result<(), RuleError> {
        if !slice_empty(&self.allow_countries) && !slice_empty(&self.deny_countries) {
            return Err(RuleError::ConflictingCountryRules);
        }
        Ok(())
    }

    /// Effective default-deny flag (absent means allow by default)
    pub fn block_by_default(&self) -> bool {
        self.block_by_default.unwrap_or(false)
    }

    pub(crate) fn allow_countries(&self) -> &[String] {
        self.allow_countries.as_deref().unwrap_or(&[])
    }

    pub(crate) fn deny_countries(&self) -> &[String] {
        self.deny_countries.as_deref().unwrap_or(&[])
    }

    pub(crate) fn allow_ips(&self) -> &[String] {
        self.allow_ips.as_deref().unwrap_or(&[])
    }

    pub(crate) fn deny_ips(&self) -> &[String] {
        self.deny_ips.as_deref().unwrap_or(&[])
    }
}

fn slice_empty(list: &Option<Vec<String>>) -> bool {
    list.as_ref().map_or(true, |l| l.is_empty())
}
