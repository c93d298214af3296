use dashmap::DashMap;
use tokio::sync::oneshot;
use wirecall::error::RpcError;
use wirecall::rpc::ProtocolMessage;

pub type PendingResult = Result<ProtocolMessage, RpcError>;

struct PendingEntry {
    connection_id: u64,
    tx: oneshot::Sender<PendingResult>,
}

/// Calls written to a socket and still waiting for their response, keyed by
/// request id.
///
/// Every way out of the table removes the entry: resolving it, cancelling it
/// on timeout, or failing it with its connection.
#[derive(Default)]
pub struct PendingRequests {
    entries: DashMap<u64, PendingEntry>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `request_id` as in flight on `connection_id`.
    ///
    /// At most one entry exists per id; a stale one is dropped, which closes
    /// its receiver.
    pub fn register(&self, request_id: u64, connection_id: u64) -> oneshot::Receiver<PendingResult> {
        let (tx, rx) = oneshot::channel();
        if self
            .entries
            .insert(request_id, PendingEntry { connection_id, tx })
            .is_some()
        {
            tracing::warn!(request_id, "replaced a pending request with a reused id");
        }
        rx
    }

    /// Hands `result` to whoever waits on `request_id`. Returns `false` when
    /// nobody does, e.g. because the call already timed out.
    pub fn resolve(&self, request_id: u64, result: PendingResult) -> bool {
        match self.entries.remove(&request_id) {
            Some((_, entry)) => {
                let _ = entry.tx.send(result);
                true
            }
            None => false,
        }
    }

    pub fn cancel(&self, request_id: u64) -> bool {
        self.entries.remove(&request_id).is_some()
    }

    /// Fails every call written on `connection_id`. Returns how many there were.
    pub fn fail_connection(&self, connection_id: u64, error: &RpcError) -> usize {
        let doomed: Vec<u64> = self
            .entries
            .iter()
            .filter(|entry| entry.connection_id == connection_id)
            .map(|entry| *entry.key())
            .collect();

        doomed
            .into_iter()
            .filter(|request_id| self.resolve(*request_id, Err(error.clone())))
            .count()
    }

    pub fn fail_all(&self, error: &RpcError) -> usize {
        let ids: Vec<u64> = self.entries.iter().map(|entry| *entry.key()).collect();
        ids.into_iter()
            .filter(|request_id| self.resolve(*request_id, Err(error.clone())))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
