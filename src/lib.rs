pub mod config;
pub mod dbgp;
pub mod error;
pub mod mcp;
pub mod session;
pub mod util;

pub use config::ServerConfig;
pub use error::Error;
pub use mcp::McpServer;
pub use session::SessionManager;

use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

/// Bind the DBGp listener, then serve the tool surface over stdio until the
/// client disconnects. Failing to bind is the only fatal startup error.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let manager = Arc::new(SessionManager::new(config));
    let listener = manager.bind().await?;
    let accept_loop = tokio::spawn(manager.clone().run(listener));

    let server = McpServer::new(manager.clone());
    let result = server.run().await;

    manager.close_all().await;
    accept_loop.abort();
    result
}
