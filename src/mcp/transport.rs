use super::protocol::JsonRpcMessage;
use super::transport_trait::McpTransportTrait;
use crate::{Error, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

/// Line-delimited JSON-RPC over the standard streams. Each message is one
/// line terminated by `\n`; logs must go to stderr because stdout carries
/// the protocol.
pub struct StdioTransport {
    stdin: BufReader<tokio::io::Stdin>,
    stdout: tokio::io::Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            stdin: BufReader::new(tokio::io::stdin()),
            stdout: tokio::io::stdout(),
        }
    }

    pub async fn read_message(&mut self) -> Result<Option<JsonRpcMessage>> {
        loop {
            let mut line = String::new();
            let bytes_read = self.stdin.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Ok(None);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!("client message: {}", trimmed);
            let msg: JsonRpcMessage = serde_json::from_str(trimmed)
                .map_err(|e| Error::InvalidRequest(format!("malformed JSON-RPC message: {e}")))?;
            return Ok(Some(msg));
        }
    }

    pub async fn write_message(&mut self, msg: &JsonRpcMessage) -> Result<()> {
        let content = serde_json::to_string(msg)?;
        debug!("server message: {}", content);

        self.stdout.write_all(content.as_bytes()).await?;
        self.stdout.write_all(b"\n").await?;
        self.stdout.flush().await?;
        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl McpTransportTrait for StdioTransport {
    async fn read_message(&mut self) -> Result<Option<JsonRpcMessage>> {
        self.read_message().await
    }

    async fn write_message(&mut self, msg: &JsonRpcMessage) -> Result<()> {
        self.write_message(msg).await
    }
}
