use crate::PendingRequests;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use wirecall::error::{RpcError, TransportError};
use wirecall::frame::FrameStreamDecoder;
use wirecall::rpc::ProtocolCodec;

/// Frames a connection may have queued before it counts as backlogged.
pub const WRITE_QUEUE_CAPACITY: usize = 256;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Live-socket accounting for one address, shared by the pool and its
/// connections.
#[derive(Debug)]
pub(crate) struct PoolSlots {
    live: AtomicUsize,
    max: usize,
    pub(crate) changed: Notify,
}

impl PoolSlots {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            live: AtomicUsize::new(0),
            max: max.max(1),
            changed: Notify::new(),
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Claims room for one more socket, failing once `max` are live.
    pub(crate) fn try_reserve(&self) -> bool {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                (live < self.max).then_some(live + 1)
            })
            .is_ok()
    }

    pub(crate) fn unreserve(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.changed.notify_one();
    }
}

/// State the reader and writer tasks share with the owning [`Connection`].
struct ConnectionShared {
    id: u64,
    addr: String,
    closed: AtomicBool,
    slots: Arc<PoolSlots>,
    pending: Arc<PendingRequests>,
}

impl ConnectionShared {
    /// Runs at most once per connection: frees the pool slot and fails every
    /// call still waiting on this socket.
    fn close(&self, reason: RpcError) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }

        self.slots.unreserve();
        let failed = self.pending.fail_connection(self.id, &reason);
        tracing::debug!(addr = %self.addr, connection_id = self.id, failed, %reason, "connection closed");
        true
    }
}

/// One TCP socket to a provider, shared by every call multiplexed onto it.
///
/// Writes go through a bounded queue drained by a writer task; a reader task
/// decodes frames and resolves the matching pending calls.
pub struct Connection {
    shared: Arc<ConnectionShared>,
    writer: mpsc::Sender<Vec<u8>>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl Connection {
    /// Connects to `addr`. The caller must already hold a slot in `slots`;
    /// the connection gives it back when it closes.
    pub(crate) async fn open(
        id: u64,
        addr: &str,
        connect_timeout: Duration,
        max_body_length: usize,
        slots: Arc<PoolSlots>,
        pending: Arc<PendingRequests>,
    ) -> Result<Self, TransportError> {
        let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(TransportError::Connect {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(TransportError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout_ms: connect_timeout.as_millis() as u64,
                });
            }
        };
        let _ = stream.set_nodelay(true);
        tracing::debug!(addr, connection_id = id, "connected");

        let (read_half, write_half) = stream.into_split();
        let (writer, rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);

        let shared = Arc::new(ConnectionShared {
            id,
            addr: addr.to_string(),
            closed: AtomicBool::new(false),
            slots,
            pending,
        });

        let reader_task = tokio::spawn(read_loop(shared.clone(), read_half, max_body_length));
        let writer_task = tokio::spawn(write_loop(shared.clone(), write_half, rx));

        Ok(Self {
            shared,
            writer,
            reader_task,
            writer_task,
        })
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn addr(&self) -> &str {
        &self.shared.addr
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Open and not backlogged, so fit to go back into the idle set.
    pub fn is_usable(&self) -> bool {
        !self.is_closed() && self.writer.capacity() > 0
    }

    /// Queues one encoded frame for writing.
    pub async fn send(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        self.writer
            .send(bytes)
            .await
            .map_err(|_| self.closed_error())
    }

    pub fn close(&self) {
        self.shared.close(self.closed_error().into());
        self.reader_task.abort();
        self.writer_task.abort();
    }

    fn closed_error(&self) -> TransportError {
        TransportError::ConnectionClosed {
            addr: self.shared.addr.clone(),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

async fn read_loop(shared: Arc<ConnectionShared>, mut read_half: OwnedReadHalf, max_body_length: usize) {
    let mut decoder = FrameStreamDecoder::with_max_body_length(max_body_length);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    let reason: RpcError = loop {
        let n = match read_half.read(&mut buf).await {
            Ok(0) => {
                break TransportError::ConnectionClosed {
                    addr: shared.addr.clone(),
                }
                .into();
            }
            Ok(n) => n,
            Err(e) => {
                tracing::error!(addr = %shared.addr, error = %e, "socket read failed");
                break TransportError::Io {
                    addr: shared.addr.clone(),
                    reason: e.to_string(),
                }
                .into();
            }
        };

        for decoded in decoder.read_bytes(&buf[..n]) {
            match decoded {
                Ok(frame) => {
                    let request_id = frame.header.request_id;
                    let result = ProtocolCodec::decode_frame(frame);
                    if !shared.pending.resolve(request_id, result) {
                        tracing::warn!(addr = %shared.addr, request_id, "dropping response nobody waits for");
                    }
                }
                Err(failure) => match failure.request_id {
                    Some(request_id) => {
                        shared.pending.resolve(request_id, Err(failure.error.into()));
                    }
                    None => {
                        tracing::error!(addr = %shared.addr, error = %failure.error, "undecodable frame");
                    }
                },
            }
        }

        if decoder.is_poisoned() {
            break TransportError::Io {
                addr: shared.addr.clone(),
                reason: "response stream is no longer decodable".to_string(),
            }
            .into();
        }
    };

    shared.close(reason);
}

async fn write_loop(
    shared: Arc<ConnectionShared>,
    mut write_half: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Vec<u8>>,
) {
    while let Some(bytes) = rx.recv().await {
        if let Err(e) = write_half.write_all(&bytes).await {
            tracing::error!(addr = %shared.addr, error = %e, "socket write failed");
            shared.close(
                TransportError::Io {
                    addr: shared.addr.clone(),
                    reason: e.to_string(),
                }
                .into(),
            );
            return;
        }
    }
    let _ = write_half.shutdown().await;
}
