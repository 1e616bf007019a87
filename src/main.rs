use clap::{Parser, Subcommand};
use dbgp_mcp::{Result, ServerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbgp_mcp")]
#[command(about = "DBGp-based MCP debugging bridge", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept DBGp engine connections and serve debugger tools on STDIO
    Serve {
        /// Address the DBGp listener binds to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port the DBGp listener binds to
        #[arg(long, default_value_t = 9003)]
        port: u16,

        /// Per-command response timeout in milliseconds
        #[arg(long, default_value_t = 30_000)]
        command_timeout_ms: u64,

        /// Property tree depth negotiated with the engine
        #[arg(long, default_value_t = 3)]
        max_depth: u32,

        /// Children per property page negotiated with the engine
        #[arg(long, default_value_t = 128)]
        max_children: u32,

        /// Bytes of value data per property negotiated with the engine
        #[arg(long, default_value_t = 2048)]
        max_data: u32,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,

        /// Set log level (trace, debug, info, warn, error)
        #[arg(long, default_value = "info")]
        log_level: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            command_timeout_ms,
            max_depth,
            max_children,
            max_data,
            verbose,
            log_level,
        } => {
            // Logs go to stderr; stdout belongs to the RPC stream.
            let level = if verbose { "debug" } else { &log_level };
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();

            let config = ServerConfig {
                listen_host: host,
                listen_port: port,
                command_timeout_ms,
                max_depth,
                max_children,
                max_data,
                log_level: level.to_string(),
            };

            dbgp_mcp::serve(config).await?;
        }
    }

    Ok(())
}
