use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DropError {
    #[error("failed to advertise {instance} on mDNS: {source}")]
    Advertise {
        instance: String,
        #[source]
        source: mdns_sd::Error,
    },
    #[error("failed to initialize resolver: {0}")]
    ResolverInit(#[source] mdns_sd::Error),
    #[error("failed to browse for {service}: {source}")]
    Browse {
        service: String,
        #[source]
        source: mdns_sd::Error,
    },
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("peer {0} not found on the local network")]
    PeerNotFound(String),
    #[error("peer {0} advertised no addresses")]
    NoAddresses(String),
    #[error("was not able to connect to {peer} ({attempts} address(es) tried)")]
    Unreachable { peer: String, attempts: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DropError>;
