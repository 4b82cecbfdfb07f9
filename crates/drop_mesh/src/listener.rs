//! A TCP listener that serves exactly one peer.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::error::{DropError, Result};

pub struct SingleShotListener {
    listener: TcpListener,
}

impl SingleShotListener {
    /// Bind immediately; the port is held from here on.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| DropError::Bind { addr, source })?;
        debug!("listening on {addr}");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for one inbound connection. The listening socket is closed before
    /// this returns, so later connection attempts are refused.
    pub async fn accept_one(self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer_addr) = self.listener.accept().await?;
        drop(self.listener);
        info!("accepted connection from {peer_addr}");
        Ok((stream, peer_addr))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn accepts_one_connection() {
        let listener = SingleShotListener::bind(loopback()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(listener.accept_one());
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"hi").await.unwrap();
        client.shutdown().await.unwrap();

        let (mut conn, peer) = accept.await.unwrap().unwrap();
        assert_eq!(peer, client.local_addr().unwrap());

        let mut buf = Vec::new();
        conn.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hi");
    }

    #[tokio::test]
    async fn second_connection_is_refused() {
        let listener = SingleShotListener::bind(loopback()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(listener.accept_one());
        let _first = TcpStream::connect(addr).await.unwrap();
        let _conn = accept.await.unwrap().unwrap();

        let second = tokio::time::timeout(Duration::from_secs(2), TcpStream::connect(addr))
            .await
            .expect("connect should fail fast");
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let listener = SingleShotListener::bind(loopback()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let err = SingleShotListener::bind(addr).await.err().unwrap();
        assert!(matches!(err, DropError::Bind { addr: a, .. } if a == addr));
    }
}
