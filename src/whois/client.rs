//! WHOIS over TCP port 43

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::{WhoisRecord, WhoisResolver};
use crate::error::{DomainSmithError, Result};

const WHOIS_PORT: u16 = 43;
const IANA_SERVER: &str = "whois.iana.org";

/// `Key: value` lines of a WHOIS response
const FIELD_PATTERN: &str = r"(?m)^\s*([A-Za-z][A-Za-z0-9 /._-]*?)\s*:\s*(\S.*?)\s*$";

const NOT_REGISTERED_PATTERNS: &[&str] = &[
    "no match",
    "not found",
    "no entries found",
    "no data found",
    "domain not found",
    "not registered",
    "available for registration",
    "status: free",
    "status: available",
];

const REGISTRAR_KEYS: &[&str] = &["registrar", "registrar name", "sponsoring registrar"];
const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "registered",
    "registration time",
    "domain registration date",
];
const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiration time",
    "expiry date",
    "expires",
    "expires on",
    "paid-till",
];
const STATUS_KEYS: &[&str] = &["domain status", "status"];

/// Resolver speaking the WHOIS protocol directly (no external `whois` binary)
#[derive(Debug, Default)]
pub struct TcpWhoisResolver {
    /// Servers discovered through IANA, keyed by TLD
    discovered: RwLock<HashMap<String, String>>,
}

impl TcpWhoisResolver {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, domain: &str) -> Result<WhoisRecord> {
        let tld = domain
            .rsplit('.')
            .next()
            .filter(|t| !t.is_empty() && domain.contains('.'))
            .ok_or_else(|| DomainSmithError::validation(format!("No TLD in '{}'", domain)))?
            .to_lowercase();

        let server = match Self::whois_server_for_tld(&tld) {
            Some(server) => server.to_string(),
            None => self.discover_server(domain, &tld).await?,
        };

        let raw = Self::query_whois(&server, domain).await?;
        Self::parse_whois_response(&raw, domain)
    }

    /// Ask IANA for the authoritative server of an unmapped TLD
    async fn discover_server(&self, domain: &str, tld: &str) -> Result<String> {
        if let Some(server) = self.discovered.read().get(tld) {
            return Ok(server.clone());
        }

        let iana = Self::query_whois(IANA_SERVER, tld).await?;
        let server = Self::parse_iana_field(&iana, "whois:")
            .or_else(|| Self::parse_iana_field(&iana, "refer:"))
            .ok_or_else(|| {
                DomainSmithError::query_failed(
                    domain,
                    format!("No WHOIS server found for TLD: {}", tld),
                )
            })?;

        tracing::debug!(tld = %tld, server = %server, "Discovered WHOIS server");
        self.discovered.write().insert(tld.to_string(), server.clone());
        Ok(server)
    }

    fn whois_server_for_tld(tld: &str) -> Option<&'static str> {
        match tld {
            "com" | "net" => Some("whois.verisign-grs.com"),
            "org" => Some("whois.pir.org"),
            "io" => Some("whois.nic.io"),
            "ai" => Some("whois.nic.ai"),
            "co" => Some("whois.nic.co"),
            "me" => Some("whois.nic.me"),
            "xyz" => Some("whois.nic.xyz"),
            "app" | "dev" => Some("whois.nic.google"),
            "cn" => Some("whois.cnnic.cn"),
            "info" => Some("whois.nic.info"),
            _ => None,
        }
    }

    async fn query_whois(server: &str, query: &str) -> Result<String> {
        let addr = format!("{}:{}", server, WHOIS_PORT);
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| Self::io_error(query, "connect", e, &addr))?;

        stream
            .write_all(format!("{}\r\n", query).as_bytes())
            .await
            .map_err(|e| Self::io_error(query, "write", e, &addr))?;

        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .await
            .map_err(|e| Self::io_error(query, "read", e, &addr))?;

        Ok(String::from_utf8_lossy(&buf).to_string())
    }

    fn io_error(query: &str, stage: &str, err: std::io::Error, addr: &str) -> DomainSmithError {
        if err.kind() == std::io::ErrorKind::TimedOut {
            DomainSmithError::query_timeout(query, 0)
        } else {
            DomainSmithError::network(
                format!("WHOIS {} failed: {}", stage, err),
                Some(addr.to_string()),
            )
        }
    }

    fn parse_iana_field(iana: &str, prefix: &str) -> Option<String> {
        iana.lines()
            .map(str::trim)
            .find_map(|line| {
                if line.to_lowercase().starts_with(prefix) {
                    Some(line.splitn(2, ':').nth(1)?.trim().to_string())
                } else {
                    None
                }
            })
            .filter(|s| !s.is_empty())
    }

    /// Turn a raw response into a record, or `NotRegistered` for "no match" replies
    pub fn parse_whois_response(raw: &str, domain: &str) -> Result<WhoisRecord> {
        if raw.trim().is_empty() {
            return Err(DomainSmithError::query_failed(domain, "Empty WHOIS response"));
        }

        let field_re =
            Regex::new(FIELD_PATTERN).map_err(|e| DomainSmithError::internal(e.to_string()))?;

        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for caps in field_re.captures_iter(raw) {
            let key = caps[1].trim().to_lowercase();
            let value = caps[2].trim().to_string();
            fields.entry(key).or_default().push(value);
        }

        let collect = |keys: &[&str]| -> Vec<String> {
            keys.iter()
                .filter_map(|k| fields.get(*k))
                .flatten()
                .cloned()
                .collect()
        };

        let registrar = collect(REGISTRAR_KEYS).into_iter().next();
        let creation_date = collect(CREATION_KEYS);
        let expiration_date = collect(EXPIRATION_KEYS);
        let status = collect(STATUS_KEYS);

        let has_registration_data = registrar.is_some() || !creation_date.is_empty();
        let lower = raw.to_lowercase();
        if !has_registration_data && NOT_REGISTERED_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Err(DomainSmithError::not_registered(domain));
        }

        Ok(WhoisRecord {
            registrar,
            creation_date,
            expiration_date,
            status,
            text: raw.to_string(),
        })
    }
}

#[async_trait]
impl WhoisResolver for TcpWhoisResolver {
    async fn resolve(&self, domain: &str, timeout: Duration) -> Result<WhoisRecord> {
        tokio::time::timeout(timeout, self.lookup(domain))
            .await
            .map_err(|_| DomainSmithError::query_timeout(domain, timeout.as_millis() as u64))?
    }

    fn name(&self) -> &'static str {
        "tcp-whois"
    }
}
