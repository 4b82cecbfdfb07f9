//! The race that decides what a run does.
//!
//! Two producers start together: one drains local input, the other waits for
//! a single inbound connection. Whichever resolves first picks the data branch
//! (send or receive). That branch in turn races an interrupt and the overall
//! timeout. Exactly one [`Outcome`] comes out; losing producer tasks are left
//! to die with the runtime.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use drop_mesh::transfer::{drain, pump};
use drop_mesh::{Courier, SingleShotListener};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tracing::info;

pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Local input was delivered to the named peer.
    Sent,
    /// An inbound stream was written to local output.
    Received,
    Interrupted,
    TimedOut,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => write!(f, "Sent"),
            Self::Received => write!(f, "Received"),
            Self::Interrupted => write!(f, "Interrupted"),
            Self::TimedOut => write!(f, "TimedOut"),
        }
    }
}

pub struct RaceCoordinator<C> {
    courier: C,
    listener: SingleShotListener,
    timeout: Duration,
}

impl<C: Courier> RaceCoordinator<C> {
    pub fn new(courier: C, listener: SingleShotListener, timeout: Duration) -> Self {
        Self {
            courier,
            listener,
            timeout,
        }
    }

    /// Run the race to exactly one outcome.
    ///
    /// `input` is drained on its own task; `output` receives the inbound
    /// stream if a peer connects first. `interrupt` resolving ends the run
    /// as [`Outcome::Interrupted`].
    pub async fn run<R, W, I>(self, input: R, output: &mut W, interrupt: I) -> Result<Outcome>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + ?Sized,
        I: Future<Output = ()>,
    {
        let Self {
            courier,
            listener,
            timeout,
        } = self;

        let (input_tx, input_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = input_tx.send(drain(input).await);
        });

        let (conn_tx, conn_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = conn_tx.send(listener.accept_one().await);
        });

        let data = exchange(&courier, input_rx, conn_rx, output);

        tokio::select! {
            result = data => result,
            _ = interrupt => {
                info!("interrupted before a transfer completed");
                Ok(Outcome::Interrupted)
            }
            _ = tokio::time::sleep(timeout) => {
                info!("no transfer within {timeout:?}, giving up");
                Ok(Outcome::TimedOut)
            }
        }
    }
}

/// The data branch: whichever producer resolves first decides the direction.
async fn exchange<C, W>(
    courier: &C,
    input_rx: oneshot::Receiver<io::Result<Vec<u8>>>,
    conn_rx: oneshot::Receiver<drop_mesh::Result<(TcpStream, SocketAddr)>>,
    output: &mut W,
) -> Result<Outcome>
where
    C: Courier,
    W: AsyncWrite + Unpin + ?Sized,
{
    tokio::select! {
        captured = input_rx => {
            let payload = captured
                .context("input task ended early")?
                .context("read local input")?;
            info!("captured {} bytes of local input", payload.len());
            courier.deliver(payload).await.context("send to peer")?;
            Ok(Outcome::Sent)
        }
        accepted = conn_rx => {
            let (mut conn, peer) = accepted
                .context("listener task ended early")?
                .context("accept inbound connection")?;
            let n = pump(&mut conn, output)
                .await
                .with_context(|| format!("receive from {peer}"))?;
            info!("received {n} bytes from {peer}");
            Ok(Outcome::Received)
        }
    }
}
