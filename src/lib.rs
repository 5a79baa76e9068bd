//! Request-admission filtering by client address and geolocated country.
//!
//! Given a client IP, decides whether to admit the request based on four
//! rule sets (allow/deny addresses, allow/deny countries) and a default
//! policy. Address rules outrank country rules; within each tier allow is
//! checked before deny.
//!
//! ```rust
//! use std::net::{IpAddr, Ipv4Addr};
//! use geogate::{Filter, FilterConfig, StaticResolver};
//!
//! let config = FilterConfig::from_block(
//!     "allow_countries AU US\nblock_by_default true",
//! )?;
//! config.validate()?;
//! let filter = Filter::compile(&config)?;
//!
//! let mut resolver = StaticResolver::new();
//! resolver.insert(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), "AU");
//!
//! let verdict = filter.decide(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), &resolver);
//! assert!(verdict.allowed);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! The compiled [`Filter`] is immutable; share one instance across
//! concurrent requests and compile a fresh one on configuration reload.

pub mod directive;
pub mod filter;
pub mod geo;
pub mod rules;

pub use directive::DirectiveError;
pub use filter::{CompileError, Filter, Verdict};
pub use geo::{CountryResolver, GeoError, MaxmindResolver, StaticResolver, UNKNOWN_COUNTRY};
pub use rules::{FilterConfig, RuleError};
