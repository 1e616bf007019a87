pub mod codec;
pub mod command;
pub mod connection;
pub mod transport;
pub mod transport_trait;
pub mod types;
pub mod xml;

pub use connection::{Connection, ConnectionEvent};
pub use transport::{StreamTransport, TcpTransport};
pub use transport_trait::DbgpTransportTrait;
