use crate::Result;
use async_trait::async_trait;

/// One DBGp peer: length-prefixed XML frames in, NUL-terminated command
/// lines out. Abstracted so the connection can be driven by a mock in
/// tests.
#[async_trait]
pub trait DbgpTransportTrait: Send {
    /// Next complete XML payload from the engine. Blocks until a frame is
    /// available; fails with `ConnectionClosed` on EOF.
    async fn read_frame(&mut self) -> Result<String>;

    /// Write one already-encoded command (trailing NUL included).
    async fn write_command(&mut self, bytes: &[u8]) -> Result<()>;
}
