use std::net::Ipv4Addr;
use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Raw JSON shape of the peer-daemon config file (spec.md §6's table),
/// grounded in `original_source/peer/config.go`'s `Configurator`/
/// `ConfigValidator` split: decode first, validate second, so tests can
/// supply a config bypassing the validator.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub id: String,
    #[serde(rename = "publicIP")]
    pub public_ip: Option<Ipv4Addr>,
    #[serde(rename = "publicPort")]
    pub public_port: Option<u16>,
    #[serde(rename = "socketPath")]
    pub socket_path: String,
    #[serde(rename = "dbPath")]
    pub db_path: PathBuf,
    #[serde(rename = "tmpPath")]
    pub tmp_path: Option<PathBuf>,
    #[serde(rename = "announceDelay")]
    pub announce_delay_ms: Option<u64>,
    #[serde(rename = "trackerProtocol")]
    pub tracker_protocol: Option<String>,
}

/// Validated config, ready for use by the daemon entry point.
///
/// `socket_path` is parsed and validated because the config schema requires
/// the key, but nothing binds a listener to it: the local management
/// surface that would serve it (add/list/remove) is an external
/// collaborator, out of scope for this daemon (entries are inserted into
/// the store by that external interface, not by `peerd` itself).
#[derive(Debug, Clone)]
pub struct Config {
    pub peer_id: String,
    pub public_addr: std::net::SocketAddrV4,
    pub socket_path: String,
    pub db_path: PathBuf,
    pub tmp_path: PathBuf,
    pub announce_delay: std::time::Duration,
}

pub trait ConfigValidator {
    fn validate(&self, raw: &RawConfig) -> anyhow::Result<Config>;
}

pub struct DefaultValidator;

impl ConfigValidator for DefaultValidator {
    fn validate(&self, raw: &RawConfig) -> anyhow::Result<Config> {
        if raw.id.is_empty() {
            bail!("config: \"id\" is required");
        }
        if raw.id.as_bytes().len() > 20 {
            bail!("config: \"id\" must be at most 20 bytes, got {}", raw.id.len());
        }
        if raw.socket_path.is_empty() {
            bail!("config: \"socketPath\" is required");
        }

        let public_ip = raw.public_ip.unwrap_or(Ipv4Addr::UNSPECIFIED);
        let public_port = raw.public_port.unwrap_or(0);

        Ok(Config {
            peer_id: raw.id.clone(),
            public_addr: std::net::SocketAddrV4::new(public_ip, public_port),
            socket_path: raw.socket_path.clone(),
            db_path: raw.db_path.clone(),
            tmp_path: raw.tmp_path.clone().unwrap_or_else(|| PathBuf::from("/tmp/swarmd")),
            announce_delay: std::time::Duration::from_millis(raw.announce_delay_ms.unwrap_or(1000)),
        })
    }
}

/// Loads and validates a peer-daemon config file from disk.
pub fn load(path: &std::path::Path, validator: &dyn ConfigValidator) -> anyhow::Result<Config> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let raw: RawConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    validator.validate(&raw)
}
