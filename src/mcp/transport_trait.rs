use super::protocol::JsonRpcMessage;
use crate::Result;
use async_trait::async_trait;

/// Client-facing message transport, abstracted for testing.
#[async_trait]
pub trait McpTransportTrait: Send {
    /// Next message from the client, or `None` once the stream is closed.
    async fn read_message(&mut self) -> Result<Option<JsonRpcMessage>>;

    async fn write_message(&mut self, msg: &JsonRpcMessage) -> Result<()>;
}
