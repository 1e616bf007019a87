use super::codec::FrameDecoder;
use super::transport_trait::DbgpTransportTrait;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

/// DBGp transport over a byte stream, pairing the frame codec with the
/// socket. Generic over the stream so tests can drive it with an in-memory
/// duplex pipe; production uses [`TcpTransport`].
pub struct StreamTransport<S> {
    stream: S,
    buffer: BytesMut,
    decoder: FrameDecoder,
    // Frames decoded ahead of the caller. One read can complete several.
    ready: VecDeque<String>,
}

pub type TcpTransport = StreamTransport<TcpStream>;

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(8 * 1024),
            decoder: FrameDecoder::new(),
            ready: VecDeque::new(),
        }
    }

    pub async fn read_frame(&mut self) -> Result<String> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                trace!("DBGp received: {}", frame);
                return Ok(frame);
            }
            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            self.ready.extend(self.decoder.decode(&mut self.buffer));
        }
    }

    pub async fn write_command(&mut self, bytes: &[u8]) -> Result<()> {
        trace!("DBGp sending: {}", String::from_utf8_lossy(&bytes[..bytes.len().saturating_sub(1)]));
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<S> DbgpTransportTrait for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_frame(&mut self) -> Result<String> {
        self.read_frame().await
    }

    async fn write_command(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_command(bytes).await
    }
}
