//! Country resolution
//!
//! Maps client IP addresses to ISO country codes. The filter engine only
//! consumes the [`CountryResolver`] trait; the MaxMind-backed implementation
//! is the one a production host would wire in, the table-backed one serves
//! tests and embeddings that carry no database.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use maxminddb::{geoip2, Reader};
use thiserror::Error;

/// Sentinel country code for addresses geolocation cannot resolve.
///
/// It is an ordinary code as far as the filter engine is concerned: listing
/// it under `allow_countries` or `deny_countries` matches exactly the
/// requests whose country could not be determined.
pub const UNKNOWN_COUNTRY: &str = "UNK";

/// Errors that can occur while opening a GeoIP database
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("failed to open GeoIP database: {0}")]
    DatabaseOpen(#[from] maxminddb::MaxMindDBError),

    #[error("database file not found: {0}")]
    NotFound(String),
}

/// Resolves an IP address to a country code.
///
/// Implementations must not fail: any lookup problem degrades to
/// [`UNKNOWN_COUNTRY`] so the per-request decision path never errors.
pub trait CountryResolver {
    /// Return the ISO country code for `ip`, or [`UNKNOWN_COUNTRY`].
    fn resolve(&self, ip: IpAddr) -> String;
}

/// Country resolver backed by a MaxMind GeoIP2 database
#[derive(Debug, Clone)]
pub struct MaxmindResolver {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxmindResolver {
    /// Open a GeoIP2 database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GeoError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GeoError::NotFound(path.display().to_string()));
        }

        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    /// Load a database from bytes (useful for embedded databases)
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, GeoError> {
        let reader = Reader::from_source(data)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

impl CountryResolver for MaxmindResolver {
    fn resolve(&self, ip: IpAddr) -> String {
        let country: Result<geoip2::Country, _> = self.reader.lookup(ip);
        country
            .ok()
            .and_then(|c| c.country)
            .and_then(|c| c.iso_code)
            .map(String::from)
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }
}

/// Country resolver backed by an in-memory table
///
/// Addresses absent from the table resolve to [`UNKNOWN_COUNTRY`].
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<IpAddr, String>,
}

impl StaticResolver {
    /// Create an empty resolver (everything resolves to `UNK`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an address to a country code
    pub fn insert(&mut self, ip: IpAddr, country: &str) {
        self.table.insert(ip, country.to_string());
    }

    /// Build a resolver from `(address, country)` pairs
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (IpAddr, String)>,
    {
        Self {
            table: entries.into_iter().collect(),
        }
    }
}

impl CountryResolver for StaticResolver {
    fn resolve(&self, ip: IpAddr) -> String {
        self.table
            .get(&ip)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_static_resolver_hit() {
        let mut resolver = StaticResolver::new();
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5));
        resolver.insert(ip, "AU");

        assert_eq!(resolver.resolve(ip), "AU");
    }

    #[test]
    fn test_static_resolver_miss_is_sentinel() {
        let resolver = StaticResolver::new();
        let ip = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));

        assert_eq!(resolver.resolve(ip), UNKNOWN_COUNTRY);
    }

    #[test]
    fn test_missing_database_file() {
        let result = MaxmindResolver::open("/nonexistent/GeoLite2-Country.mmdb");
        assert!(matches!(result, Err(GeoError::NotFound(_))));
    }
}
