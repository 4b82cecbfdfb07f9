//! Raw byte movement. No framing, no checksums: bytes in, same bytes out.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Copy everything from `source` into `sink` until EOF, then flush.
/// Neither endpoint is closed here.
pub async fn pump<R, W>(source: &mut R, sink: &mut W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let n = tokio::io::copy(source, sink).await?;
    sink.flush().await?;
    Ok(n)
}

/// Read `source` to end-of-stream.
pub async fn drain<R>(mut source: R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    source.read_to_end(&mut buf).await?;
    Ok(buf)
}
