//! The send path: find the named peer, dial it, push the payload.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::connector;
use crate::discovery;
use crate::error::{DropError, Result};
use crate::identity::TargetName;
use crate::selector::select_first;
use crate::transfer::pump;

/// Delivers a fully captured payload to some peer.
#[async_trait::async_trait]
pub trait Courier: Send + Sync {
    /// Returns the number of bytes written to the peer.
    async fn deliver(&self, payload: Vec<u8>) -> Result<u64>;
}

/// Courier that locates its peer through an mDNS browse.
pub struct MdnsCourier {
    target: TargetName,
    window: Duration,
}

impl MdnsCourier {
    pub fn new(target: TargetName, window: Duration) -> Self {
        Self { target, window }
    }

    pub fn target(&self) -> &TargetName {
        &self.target
    }
}

#[async_trait::async_trait]
impl Courier for MdnsCourier {
    async fn deliver(&self, payload: Vec<u8>) -> Result<u64> {
        let peer = {
            let mut browse = discovery::discover(self.window)?;
            select_first(&mut browse, &self.target).await
        }
        .ok_or_else(|| DropError::PeerNotFound(self.target.to_string()))?;

        let mut stream = connector::connect(&peer).await?;
        let sent = pump(&mut payload.as_slice(), &mut stream).await?;
        stream.shutdown().await.ok();

        info!("sent {sent} bytes to {}", peer.instance_name);
        Ok(sent)
    }
}
