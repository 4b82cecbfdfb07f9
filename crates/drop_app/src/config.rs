//! Run configuration: built-in defaults, optional `mydrop.toml`, CLI flags on top.

use std::net::{Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use drop_mesh::discovery::DEFAULT_DISCOVERY_WINDOW;
use drop_mesh::{LocalIdentity, TargetName};

use crate::race::DEFAULT_RUN_TIMEOUT;

pub const DEFAULT_CONFIG_FILE: &str = "mydrop.toml";

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct DropConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reserved; not used for routing.
    #[serde(default = "default_ip")]
    pub ip: String,
    /// Reserved; not used for routing.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_uid")]
    pub uid: String,
    #[serde(default)]
    pub remote: String,
    #[serde(default = "default_discovery_window_secs")]
    pub discovery_window_secs: u64,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

fn default_port() -> u16 {
    4000
}
fn default_ip() -> String {
    "127.0.0.1".into()
}
fn default_host() -> String {
    "godrop.local".into()
}
fn default_uid() -> String {
    "instance".into()
}
fn default_discovery_window_secs() -> u64 {
    DEFAULT_DISCOVERY_WINDOW.as_secs()
}
fn default_run_timeout_secs() -> u64 {
    DEFAULT_RUN_TIMEOUT.as_secs()
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            ip: default_ip(),
            host: default_host(),
            uid: default_uid(),
            remote: String::new(),
            discovery_window_secs: default_discovery_window_secs(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

impl DropConfig {
    pub fn identity(&self) -> LocalIdentity {
        LocalIdentity::new(&self.uid, self.port)
    }

    pub fn target(&self) -> TargetName {
        TargetName::new(&self.remote)
    }

    /// Listen on every interface, like a bare `:port`. The `[::]` socket is
    /// dual-stack, so IPv4 and IPv6 dials both land here.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), self.port)
    }

    pub fn discovery_window(&self) -> Duration {
        Duration::from_secs(self.discovery_window_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Read the config file at `path`, or `mydrop.toml` in the working directory
/// if it exists, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<DropConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(DropConfig::default());
            }
            default
        }
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("read {}", path.display()))?;
    let config: DropConfig =
        toml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    Ok(config)
}

#[derive(Debug, Parser)]
#[command(name = "mydrop")]
#[command(version)]
#[command(about = "Pipe stdin to a named peer on the LAN, or receive one stream to stdout")]
pub struct Cli {
    /// Port to listen on and advertise [default: 4000]
    #[arg(long)]
    pub port: Option<u16>,

    /// IP for this process (reserved) [default: 127.0.0.1]
    #[arg(long)]
    pub ip: Option<String>,

    /// Host of the service (reserved) [default: godrop.local]
    #[arg(long)]
    pub host: Option<String>,

    /// Your instance name [default: instance]
    #[arg(long)]
    pub uid: Option<String>,

    /// The remote instance name to send stdin to
    #[arg(long)]
    pub remote: Option<String>,

    /// Path to a TOML config file (defaults to ./mydrop.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve the final configuration. Flags win over the file.
    pub fn into_config(self) -> Result<DropConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ip) = self.ip {
            config.ip = ip;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(uid) = self.uid {
            config.uid = uid;
        }
        if let Some(remote) = self.remote {
            config.remote = remote;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_contract() {
        let config = DropConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.ip, "127.0.0.1");
        assert_eq!(config.host, "godrop.local");
        assert_eq!(config.uid, "instance");
        assert_eq!(config.remote, "");
        assert_eq!(config.discovery_window(), Duration::from_secs(15));
        assert_eq!(config.run_timeout(), Duration::from_secs(120));
        assert_eq!(config.listen_addr(), "[::]:4000".parse().unwrap());
    }

    #[test]
    fn derived_names_are_prefixed() {
        let config = DropConfig {
            uid: "alice".into(),
            remote: "bob".into(),
            ..Default::default()
        };
        assert_eq!(config.identity().instance_name, "mydrop-alice");
        assert_eq!(config.target().as_str(), "mydrop-bob");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mydrop.toml");
        std::fs::write(&path, "uid = \"alice\"\nrun_timeout_secs = 30\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.uid, "alice");
        assert_eq!(config.run_timeout_secs, 30);
        assert_eq!(config.port, 4000);
        assert_eq!(config.discovery_window_secs, 15);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("nope.toml"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mydrop.toml");
        std::fs::write(&path, "port = 5000\nuid = \"alice\"\nremote = \"bob\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "mydrop",
            "--port",
            "6000",
            "--remote",
            "carol",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.uid, "alice");
        assert_eq!(config.remote, "carol");
    }

    async fn dial_default_listener(ip: std::net::IpAddr) -> SocketAddr {
        use drop_mesh::{connector, PeerDescriptor, SingleShotListener};

        let config = DropConfig {
            port: 0,
            ..Default::default()
        };
        let listener = SingleShotListener::bind(config.listen_addr()).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(listener.accept_one());

        let (addresses_v4, addresses_v6) = match ip {
            std::net::IpAddr::V4(v4) => (vec![v4], vec![]),
            std::net::IpAddr::V6(v6) => (vec![], vec![v6]),
        };
        let peer = PeerDescriptor {
            instance_name: "mydrop-receiver".into(),
            addresses_v4,
            addresses_v6,
            port,
        };
        let stream = connector::connect(&peer).await.unwrap();
        let (_conn, from) = accept.await.unwrap().unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
        from
    }

    #[tokio::test]
    async fn default_listener_accepts_ipv6_dial() {
        let from = dial_default_listener(Ipv6Addr::LOCALHOST.into()).await;
        assert!(from.ip().is_loopback());
    }

    #[tokio::test]
    async fn default_listener_accepts_ipv4_dial() {
        let from = dial_default_listener(std::net::Ipv4Addr::LOCALHOST.into()).await;
        // arrives as an IPv4-mapped address on the dual-stack socket
        assert_eq!(
            from.ip().to_canonical(),
            std::net::IpAddr::from(std::net::Ipv4Addr::LOCALHOST)
        );
    }

    #[test]
    fn rejects_out_of_range_port() {
        assert!(Cli::try_parse_from(["mydrop", "--port", "70000"]).is_err());
    }
}
