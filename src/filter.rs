//! Compiled filter and decision engine
//!
//! [`Filter::compile`] turns a validated [`FilterConfig`] into matcher and
//! country sets; [`Filter::decide`] evaluates one client address against
//! them. A compiled filter is immutable, so a single instance is shared
//! across concurrent requests without locking; configuration reload means
//! compiling a new filter and swapping it in.

use std::collections::HashSet;
use std::net::IpAddr;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::geo::{CountryResolver, UNKNOWN_COUNTRY};
use crate::rules::FilterConfig;

/// Errors raised while compiling a rule set
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompileError {
    #[error("invalid IP or CIDR rule: {rule}")]
    InvalidAddressRule { rule: String },
}

/// A single compiled address rule: one address or one CIDR block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddrMatcher {
    Addr(IpAddr),
    Net(IpNetwork),
}

impl AddrMatcher {
    fn parse(rule: &str) -> Result<Self, CompileError> {
        if let Ok(addr) = rule.parse::<IpAddr>() {
            return Ok(Self::Addr(addr));
        }
        rule.parse::<IpNetwork>()
            .map(Self::Net)
            .map_err(|_| CompileError::InvalidAddressRule {
                rule: rule.to_string(),
            })
    }

    fn contains(&self, ip: IpAddr) -> bool {
        match self {
            Self::Addr(addr) => *addr == ip,
            Self::Net(net) => net.contains(ip),
        }
    }
}

/// Outcome of one admission decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Country code the address resolved to, possibly `UNK`. Reported for
    /// observability even when an address rule decided the verdict.
    pub country: String,
}

/// Compiled admission filter, shared read-only across requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    allow_matchers: Vec<AddrMatcher>,
    deny_matchers: Vec<AddrMatcher>,
    allow_countries: HashSet<String>,
    deny_countries: HashSet<String>,
    block_by_default: bool,
}

impl Filter {
    /// Compile a validated rule set.
    ///
    /// Any address rule that parses as neither an IP address nor a CIDR
    /// block fails the whole compile, naming the offending rule; bad
    /// entries are never silently dropped. Country codes are taken
    /// verbatim — no case normalization, and the `UNK` sentinel is an
    /// ordinary code here.
    pub fn compile(config: &FilterConfig) -> Result<Self, CompileError> {
        Ok(Self {
            allow_matchers: compile_matchers(config.allow_ips())?,
            deny_matchers: compile_matchers(config.deny_ips())?,
            allow_countries: config.allow_countries().iter().cloned().collect(),
            deny_countries: config.deny_countries().iter().cloned().collect(),
            block_by_default: config.block_by_default(),
        })
    }

    /// Decide whether to admit a request from `ip`.
    ///
    /// Precedence, first match wins: allow-address, deny-address,
    /// allow-country, deny-country, default policy. Address rules outrank
    /// country rules because geolocation is approximate; within each tier
    /// allow is checked before deny. Tiers match on category, never on
    /// prefix length — a /32 deny does not override a /8 allow.
    ///
    /// Never fails: an unresolvable country is the `UNK` sentinel, which
    /// simply falls through the country tier unless explicitly listed.
    pub fn decide<R: CountryResolver + ?Sized>(&self, ip: IpAddr, resolver: &R) -> Verdict {
        let country = resolver.resolve(ip);

        let allowed = if self.allow_matchers.iter().any(|m| m.contains(ip)) {
            true
        } else if self.deny_matchers.iter().any(|m| m.contains(ip)) {
            false
        } else if self.allow_countries.contains(&country) {
            true
        } else if self.deny_countries.contains(&country) {
            false
        } else {
            !self.block_by_default
        };

        debug!(%ip, %country, allowed, "admission check");

        Verdict { allowed, country }
    }

    /// Decide for a client address given as a string.
    ///
    /// An address that does not parse is denied with country `UNK` — the
    /// request path fails closed rather than erroring.
    pub fn decide_str<R: CountryResolver + ?Sized>(&self, addr: &str, resolver: &R) -> Verdict {
        match addr.parse::<IpAddr>() {
            Ok(ip) => self.decide(ip, resolver),
            Err(_) => {
                debug!(addr, "unparseable client address, denying");
                Verdict {
                    allowed: false,
                    country: UNKNOWN_COUNTRY.to_string(),
                }
            }
        }
    }

    /// Whether unmatched requests are denied
    pub fn block_by_default(&self) -> bool {
        self.block_by_default
    }
}

fn compile_matchers(rules: &[String]) -> Result<Vec<AddrMatcher>, CompileError> {
    rules.iter().map(|r| AddrMatcher::parse(r)).collect()
}
