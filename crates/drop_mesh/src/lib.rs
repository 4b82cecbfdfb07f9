//! LAN discovery, peer selection, dialing and raw byte transfer.
//!
//! Everything a single mydrop run needs below the race itself: advertise
//! ourselves, find one named peer, connect to it or accept one connection,
//! and move bytes.

pub mod connector;
pub mod courier;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod listener;
pub mod selector;
pub mod transfer;

pub use courier::{Courier, MdnsCourier};
pub use discovery::{advertise, discover, AdvertiseHandle, Browse, PeerDescriptor};
pub use error::{DropError, Result};
pub use identity::{LocalIdentity, TargetName};
pub use listener::SingleShotListener;
pub use selector::{select_first, PeerSource};
