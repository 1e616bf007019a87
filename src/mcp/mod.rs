pub mod protocol;
pub mod tools;
pub mod transport;
pub mod transport_trait;

use crate::session::SessionManager;
use crate::Result;
use protocol::ProtocolHandler;
use std::sync::Arc;
use tools::ToolsHandler;
use tracing::{error, info};
use transport::StdioTransport;

/// The client-facing server: line-delimited JSON-RPC on the standard
/// streams, dispatching tool calls into the session manager.
pub struct McpServer {
    transport: StdioTransport,
    handler: ProtocolHandler,
}

impl McpServer {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        let tools_handler = Arc::new(ToolsHandler::new(manager));
        Self {
            transport: StdioTransport::new(),
            handler: ProtocolHandler::new(tools_handler),
        }
    }

    /// Serve until the client closes its end of the stream.
    pub async fn run(mut self) -> Result<()> {
        info!("MCP server ready on stdio");

        loop {
            match self.transport.read_message().await {
                Ok(Some(msg)) => {
                    if let Some(reply) = self.handler.handle_message(msg).await {
                        if let Err(e) = self.transport.write_message(&reply).await {
                            error!("failed to write response: {}", e);
                            return Err(e);
                        }
                    }
                }
                Ok(None) => {
                    info!("client disconnected, shutting down");
                    return Ok(());
                }
                Err(e) => {
                    error!("failed to read client message: {}", e);
                    return Err(e);
                }
            }
        }
    }
}
