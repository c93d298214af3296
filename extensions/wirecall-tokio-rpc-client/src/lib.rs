mod connection;
mod connection_pool;
mod pending_requests;
mod transport_client;

pub use connection::{Connection, WRITE_QUEUE_CAPACITY};
pub use connection_pool::{ConnectionLease, ConnectionPool, PoolStats};
pub use pending_requests::{PendingRequests, PendingResult};
pub use transport_client::TransportClient;
