//! Picks the named peer out of a discovery stream.

use tracing::{debug, info};

use crate::discovery::PeerDescriptor;
use crate::identity::TargetName;

/// A lazy, finite stream of discovered peers.
#[async_trait::async_trait]
pub trait PeerSource: Send {
    /// Next peer, or `None` once the source is exhausted or cancelled.
    async fn next_peer(&mut self) -> Option<PeerDescriptor>;

    /// Stop producing peers early.
    fn cancel(&mut self);
}

/// Return the first peer whose instance name equals `target`, cancelling the
/// source as soon as it is seen.
pub async fn select_first<S>(source: &mut S, target: &TargetName) -> Option<PeerDescriptor>
where
    S: PeerSource + ?Sized,
{
    while let Some(peer) = source.next_peer().await {
        if target.matches(&peer.instance_name) {
            info!("found peer {target}");
            source.cancel();
            return Some(peer);
        }
        debug!("ignoring peer {}", peer.instance_name);
    }
    None
}
