//! mDNS-based LAN discovery using mdns-sd.
//!
//! Each process registers `mydrop-<uid>` under `_drop._tcp.local.` with its
//! listen port. A sender opens a short-lived browse session and reports every
//! resolved peer until the discovery window closes or the session is cancelled.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use mdns_sd::{Receiver, ServiceDaemon, ServiceEvent, ServiceInfo};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{DropError, Result};
use crate::identity::{service_type_fqdn, LocalIdentity, METADATA};
use crate::selector::PeerSource;

pub const DEFAULT_DISCOVERY_WINDOW: Duration = Duration::from_secs(15);
const UNREGISTER_WAIT: Duration = Duration::from_secs(1);
const FALLBACK_HOST: &str = "mydrop-node";

/// A peer as seen on the network during one browse session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    pub instance_name: String,
    pub addresses_v4: Vec<Ipv4Addr>,
    pub addresses_v6: Vec<Ipv6Addr>,
    pub port: u16,
}

impl PeerDescriptor {
    /// Build a descriptor from a resolved record. Returns `None` when the
    /// full name does not belong to the record's service type.
    pub fn from_info(info: &ServiceInfo) -> Option<Self> {
        let instance_name = instance_name(info.get_fullname(), info.get_type())?;

        let mut addresses_v4 = Vec::new();
        let mut addresses_v6 = Vec::new();
        for addr in info.get_addresses() {
            match addr {
                IpAddr::V4(v4) => addresses_v4.push(*v4),
                IpAddr::V6(v6) => addresses_v6.push(*v6),
            }
        }
        // the record carries a set; sort so dial order is stable across runs
        addresses_v4.sort();
        addresses_v6.sort();

        Some(Self {
            instance_name: instance_name.to_string(),
            addresses_v4,
            addresses_v6,
            port: info.get_port(),
        })
    }

    pub fn has_addresses(&self) -> bool {
        !self.addresses_v4.is_empty() || !self.addresses_v6.is_empty()
    }
}

/// Strip `.<service type>` from a full service name.
fn instance_name<'a>(fullname: &'a str, service_type: &str) -> Option<&'a str> {
    fullname
        .strip_suffix(service_type)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|name| !name.is_empty())
}

fn local_host_name() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| FALLBACK_HOST.into());
    format!("{host}.local.")
}

/// Live advertisement. Withdrawn by `shutdown().await` or, failing that, on drop.
pub struct AdvertiseHandle {
    daemon: Option<ServiceDaemon>,
    fullname: String,
}

impl AdvertiseHandle {
    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    /// Unregister and wait briefly for the goodbye to go out, then stop the
    /// responder.
    pub async fn shutdown(mut self) {
        let Some(daemon) = self.daemon.take() else {
            return;
        };

        match daemon.unregister(&self.fullname) {
            Ok(status) => {
                let confirmed =
                    tokio::time::timeout(UNREGISTER_WAIT, status.recv_async()).await;
                if !matches!(confirmed, Ok(Ok(_))) {
                    debug!("mDNS: no unregister confirmation for {}", self.fullname);
                }
            }
            Err(e) => warn!("mDNS: failed to unregister {}: {e}", self.fullname),
        }
        stop_responder(daemon, &self.fullname);
    }
}

fn stop_responder(daemon: ServiceDaemon, fullname: &str) {
    if let Err(e) = daemon.shutdown() {
        debug!("mDNS: responder shutdown failed: {e}");
    }
    info!("mDNS: withdrew {fullname}");
}

impl Drop for AdvertiseHandle {
    fn drop(&mut self) {
        // no waiting here; the unregister is queued ahead of the shutdown
        if let Some(daemon) = self.daemon.take() {
            if let Err(e) = daemon.unregister(&self.fullname) {
                warn!("mDNS: failed to unregister {}: {e}", self.fullname);
            }
            stop_responder(daemon, &self.fullname);
        }
    }
}

/// Register this process on mDNS so other LAN peers can discover it.
pub fn advertise(identity: &LocalIdentity) -> Result<AdvertiseHandle> {
    let fail = |source| DropError::Advertise {
        instance: identity.instance_name.clone(),
        source,
    };

    let daemon = ServiceDaemon::new().map_err(fail)?;
    let service = ServiceInfo::new(
        &service_type_fqdn(),
        &identity.instance_name,
        &local_host_name(),
        "",
        identity.port,
        &METADATA[..],
    )
    .map_err(fail)?
    .enable_addr_auto();

    let fullname = service.get_fullname().to_string();
    daemon.register(service).map_err(fail)?;

    info!(
        "mDNS: registered {} on port {}",
        identity.instance_name, identity.port
    );
    debug!("mDNS: txt {}", identity.metadata().join(" "));
    Ok(AdvertiseHandle {
        daemon: Some(daemon),
        fullname,
    })
}

/// Open a fresh browse session that ends `window` from now.
pub fn discover(window: Duration) -> Result<Browse> {
    let service = service_type_fqdn();
    let daemon = ServiceDaemon::new().map_err(DropError::ResolverInit)?;
    let events = daemon
        .browse(&service)
        .map_err(|source| DropError::Browse {
            service: service.clone(),
            source,
        })?;

    debug!("mDNS: browsing {service} for {window:?}");
    Ok(Browse {
        daemon,
        service,
        events,
        deadline: Instant::now() + window,
        done: false,
    })
}

/// One browse session, consumed lazily through [`PeerSource`].
pub struct Browse {
    daemon: ServiceDaemon,
    service: String,
    events: Receiver<ServiceEvent>,
    deadline: Instant,
    done: bool,
}

impl Browse {
    fn finish(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Err(e) = self.daemon.stop_browse(&self.service) {
            debug!("mDNS: stop_browse failed: {e}");
        }
    }
}

#[async_trait::async_trait]
impl PeerSource for Browse {
    async fn next_peer(&mut self) -> Option<PeerDescriptor> {
        while !self.done {
            let event = match tokio::time::timeout_at(self.deadline, self.events.recv_async()).await
            {
                Ok(Ok(event)) => event,
                Ok(Err(_)) => {
                    debug!("mDNS browse channel closed");
                    self.done = true;
                    break;
                }
                Err(_) => {
                    debug!("mDNS: discovery window elapsed");
                    self.finish();
                    break;
                }
            };

            match event {
                ServiceEvent::ServiceResolved(info) => match PeerDescriptor::from_info(&info) {
                    Some(peer) => {
                        debug!(
                            "mDNS: resolved {} ({} v4, {} v6) port {}",
                            peer.instance_name,
                            peer.addresses_v4.len(),
                            peer.addresses_v6.len(),
                            peer.port
                        );
                        return Some(peer);
                    }
                    None => debug!("mDNS: skipping foreign record {}", info.get_fullname()),
                },
                ServiceEvent::SearchStarted(_) => debug!("mDNS: browse started"),
                other => debug!("mDNS: ignoring {other:?}"),
            }
        }
        None
    }

    fn cancel(&mut self) {
        self.finish();
    }
}

impl Drop for Browse {
    fn drop(&mut self) {
        self.finish();
        self.daemon.shutdown().ok();
    }
}
