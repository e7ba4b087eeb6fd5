//! Offline address resolution with memoized lookups

use anyhow::{Context, Result};
use config::ResolveSettings;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, warn};

/// Maps a hop address to a display value (hostname, AS number, ...)
pub trait Resolver {
    fn resolve(&mut self, addr: Ipv4Addr) -> Option<String>;
}

/// Resolver backed by a `<ipv4> <value>` text table
#[derive(Debug, Default)]
pub struct TableResolver {
    entries: HashMap<Ipv4Addr, String>,
}

impl TableResolver {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resolution table {}", path.display()))?;
        let table = Self::parse(&text)
            .with_context(|| format!("Invalid resolution table {}", path.display()))?;

        if table.is_empty() {
            warn!(path = %path.display(), "resolution table has no entries");
        } else {
            debug!(path = %path.display(), entries = table.len(), "loaded resolution table");
        }
        Ok(table)
    }

    /// Parses one mapping per line; `#` starts a comment
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = HashMap::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let (addr, value) = line
                .split_once(char::is_whitespace)
                .with_context(|| format!("line {}: expected `<ipv4> <value>`", index + 1))?;
            let addr: Ipv4Addr = addr
                .parse()
                .with_context(|| format!("line {}: invalid IPv4 address {:?}", index + 1, addr))?;

            entries.insert(addr, value.trim().to_string());
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Resolver for TableResolver {
    fn resolve(&mut self, addr: Ipv4Addr) -> Option<String> {
        self.entries.get(&addr).cloned()
    }
}

/// Memoizes another resolver. Unresolvable addresses display as themselves.
pub struct CachedResolver<R> {
    inner: R,
    cache: HashMap<Ipv4Addr, Option<String>>,
    hits: u64,
    misses: u64,
}

impl<R: Resolver> CachedResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn lookup(&mut self, addr: Ipv4Addr) -> String {
        let resolved = match self.cache.get(&addr) {
            Some(resolved) => {
                self.hits += 1;
                resolved.clone()
            }
            None => {
                self.misses += 1;
                let resolved = self.inner.resolve(addr);
                self.cache.insert(addr, resolved.clone());
                resolved
            }
        };

        resolved.unwrap_or_else(|| addr.to_string())
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// Hostname and AS lookups used by the presentation layer
#[derive(Default)]
pub struct Resolution {
    hosts: Option<CachedResolver<TableResolver>>,
    asn: Option<CachedResolver<TableResolver>>,
}

impl Resolution {
    pub fn from_settings(settings: &ResolveSettings) -> Result<Self> {
        let hosts = settings
            .hosts_file
            .as_deref()
            .map(TableResolver::load)
            .transpose()?;
        let asn = settings
            .asn_file
            .as_deref()
            .map(TableResolver::load)
            .transpose()?;

        Ok(Self::with_tables(hosts, asn))
    }

    pub fn with_tables(hosts: Option<TableResolver>, asn: Option<TableResolver>) -> Self {
        Self {
            hosts: hosts.map(CachedResolver::new),
            asn: asn.map(CachedResolver::new),
        }
    }

    /// Hostname of `addr`, or the address itself
    pub fn hostname(&mut self, addr: Ipv4Addr) -> String {
        match self.hosts.as_mut() {
            Some(hosts) => hosts.lookup(addr),
            None => addr.to_string(),
        }
    }

    /// AS number of `addr`; `None` when no AS table is configured
    pub fn asn(&mut self, addr: Ipv4Addr) -> Option<String> {
        self.asn.as_mut().map(|asn| asn.lookup(addr))
    }

    pub fn has_asn(&self) -> bool {
        self.asn.is_some()
    }

    pub fn log_cache_stats(&self) {
        if let Some(hosts) = &self.hosts {
            debug!(hits = hosts.hits(), misses = hosts.misses(), "hostname cache");
        }
        if let Some(asn) = &self.asn {
            debug!(hits = asn.hits(), misses = asn.misses(), "AS cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingResolver {
        calls: usize,
    }

    impl Resolver for CountingResolver {
        fn resolve(&mut self, addr: Ipv4Addr) -> Option<String> {
            self.calls += 1;
            (addr.octets()[0] == 10).then(|| format!("host-{}", addr.octets()[3]))
        }
    }

    #[test]
    fn test_parse_table() {
        let mut table = TableResolver::parse(
            "# hostnames\n\n10.0.0.1 gw.example.net\n192.0.2.7\tprobe-7.example.org  # vantage\n",
        )
        .expect("Failed to parse table");

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.resolve(Ipv4Addr::new(10, 0, 0, 1)).as_deref(),
            Some("gw.example.net")
        );
        assert_eq!(
            table.resolve(Ipv4Addr::new(192, 0, 2, 7)).as_deref(),
            Some("probe-7.example.org")
        );
    }

    #[test]
    fn test_comment_only_table_is_empty() {
        let table = TableResolver::parse("# nothing here\n\n   # still nothing\n")
            .expect("Failed to parse table");
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        let err = TableResolver::parse("10.0.0.1 ok\nnot-an-ip value\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = TableResolver::parse("10.0.0.1\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_cache_memoizes_lookups() {
        let mut cached = CachedResolver::new(CountingResolver { calls: 0 });

        assert_eq!(cached.lookup(Ipv4Addr::new(10, 0, 0, 5)), "host-5");
        assert_eq!(cached.lookup(Ipv4Addr::new(10, 0, 0, 5)), "host-5");
        assert_eq!(cached.lookup(Ipv4Addr::new(172, 16, 0, 1)), "172.16.0.1");
        assert_eq!(cached.lookup(Ipv4Addr::new(172, 16, 0, 1)), "172.16.0.1");

        assert_eq!(cached.inner.calls, 2);
        assert_eq!(cached.hits(), 2);
        assert_eq!(cached.misses(), 2);
    }

    #[test]
    fn test_resolution_without_tables() {
        let mut resolution = Resolution::default();
        let addr = Ipv4Addr::new(198, 51, 100, 1);

        assert_eq!(resolution.hostname(addr), "198.51.100.1");
        assert_eq!(resolution.asn(addr), None);
        assert!(!resolution.has_asn());
    }

    #[test]
    fn test_resolution_from_missing_file() {
        let settings = ResolveSettings {
            hosts_file: Some("/nonexistent/iplane/hosts.txt".to_string()),
            asn_file: None,
        };
        assert!(Resolution::from_settings(&settings).is_err());
    }
}
