//! Dials a discovered peer: every IPv4 candidate first, then IPv6.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::discovery::PeerDescriptor;
use crate::error::{DropError, Result};

/// Ordered dial candidates for `peer`, all on its single advertised port.
pub fn candidates(peer: &PeerDescriptor) -> Vec<SocketAddr> {
    let v4 = peer.addresses_v4.iter().map(|ip| IpAddr::V4(*ip));
    let v6 = peer.addresses_v6.iter().map(|ip| IpAddr::V6(*ip));
    v4.chain(v6)
        .map(|ip| SocketAddr::new(ip, peer.port))
        .collect()
}

/// Open a TCP connection to the first reachable candidate of `peer`.
pub async fn connect(peer: &PeerDescriptor) -> Result<TcpStream> {
    let (stream, addr) = dial_first(peer, TcpStream::connect).await?;
    info!("connected to {} at {addr}", peer.instance_name);
    Ok(stream)
}

/// Try `dial` on each candidate in order; the first success wins and the
/// remaining candidates are never tried.
pub async fn dial_first<C, F, Fut>(peer: &PeerDescriptor, mut dial: F) -> Result<(C, SocketAddr)>
where
    F: FnMut(SocketAddr) -> Fut,
    Fut: Future<Output = std::io::Result<C>>,
{
    let addrs = candidates(peer);
    if addrs.is_empty() {
        return Err(DropError::NoAddresses(peer.instance_name.clone()));
    }

    for addr in &addrs {
        match dial(*addr).await {
            Ok(conn) => return Ok((conn, *addr)),
            Err(e) => debug!("dial {addr} failed: {e}"),
        }
    }

    Err(DropError::Unreachable {
        peer: peer.instance_name.clone(),
        attempts: addrs.len(),
    })
}
