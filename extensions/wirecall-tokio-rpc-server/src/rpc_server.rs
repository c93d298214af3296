//! A plain TCP provider for the wirecall framing.
//!
//! The server carries no authentication; put it on a trusted network.

use crate::{RequestContext, RpcServiceEndpoint};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, watch};
use wirecall::constants::DEFAULT_MAX_BODY_LENGTH;
use wirecall::frame::{Frame, FrameStreamDecoder, MessageStatus, MessageType};
use wirecall::rpc::{MessageBody, ProtocolCodec, ProtocolMessage, RpcResponse};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Accepts connections and answers every request frame on the connection
/// it came in on, in whatever order the handlers finish.
pub struct RpcServer {
    endpoint: Arc<RpcServiceEndpoint>,
    max_body_length: usize,
    shutdown: watch::Sender<bool>,
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServer {
    pub fn new() -> Self {
        Self {
            endpoint: Arc::new(RpcServiceEndpoint::new()),
            max_body_length: DEFAULT_MAX_BODY_LENGTH,
            shutdown: watch::Sender::new(false),
        }
    }

    pub fn with_max_body_length(mut self, max_body_length: usize) -> Self {
        self.max_body_length = max_body_length;
        self
    }

    /// The handler registry. Handlers may be added while the server runs.
    pub fn endpoint(&self) -> Arc<RpcServiceEndpoint> {
        self.endpoint.clone()
    }

    /// Stops accepting and drops every open connection, abandoning replies
    /// that are still being computed.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub async fn serve<A: ToSocketAddrs>(self, addr: A) -> io::Result<SocketAddr> {
        let listener = TcpListener::bind(addr).await?;
        Arc::new(self).serve_with_listener(listener).await
    }

    pub async fn serve_on(self, host: &str, port: u16) -> io::Result<SocketAddr> {
        self.serve(format!("{host}:{port}")).await
    }

    /// Runs the accept loop on an already bound listener until accepting
    /// fails or [`RpcServer::shutdown`] is called.
    pub async fn serve_with_listener(self: Arc<Self>, listener: TcpListener) -> io::Result<SocketAddr> {
        let address = listener.local_addr()?;
        let mut stop = self.shutdown.subscribe();
        tracing::info!(addr = %address, "server listening");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    let server = self.clone();
                    tokio::spawn(async move {
                        server.handle_connection(stream, peer).await;
                    });
                }
                _ = async { let _ = stop.wait_for(|stopped| *stopped).await; } => {
                    tracing::info!(addr = %address, "server stopped");
                    return Ok(address);
                }
            }
        }
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        tracing::info!(peer = %peer, "client connected");
        let _ = stream.set_nodelay(true);

        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let writer = tokio::spawn(Self::writer_task(write_half, rx, peer));
        let mut stop = self.shutdown.subscribe();

        tokio::select! {
            _ = self.reader_task(read_half, tx, peer) => {
                // Once every handler has dropped its sender the writer drains
                // and exits on its own.
                let _ = writer.await;
                tracing::info!(peer = %peer, "client disconnected");
            }
            _ = async { let _ = stop.wait_for(|stopped| *stopped).await; } => {
                writer.abort();
                tracing::info!(peer = %peer, "connection dropped on shutdown");
            }
        }
    }

    async fn writer_task(
        mut write_half: OwnedWriteHalf,
        mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
        peer: SocketAddr,
    ) {
        while let Some(bytes) = rx.recv().await {
            if let Err(e) = write_half.write_all(&bytes).await {
                tracing::error!(peer = %peer, error = %e, "socket write failed");
                return;
            }
        }
        let _ = write_half.shutdown().await;
    }

    async fn reader_task(
        &self,
        mut read_half: OwnedReadHalf,
        tx: mpsc::UnboundedSender<Vec<u8>>,
        peer: SocketAddr,
    ) {
        let mut decoder = FrameStreamDecoder::with_max_body_length(self.max_body_length);
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let n = match read_half.read(&mut buf).await {
                Ok(0) => return,
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(peer = %peer, error = %e, "socket read failed");
                    return;
                }
            };

            for decoded in decoder.read_bytes(&buf[..n]) {
                match decoded {
                    Ok(frame) => self.handle_frame(frame, &tx, peer),
                    Err(failure) => {
                        tracing::warn!(
                            peer = %peer,
                            request_id = ?failure.request_id,
                            error = %failure.error,
                            "skipping undecodable frame"
                        );
                    }
                }
            }

            if decoder.is_poisoned() {
                tracing::error!(peer = %peer, "request stream is no longer decodable; closing");
                return;
            }
        }
    }

    fn handle_frame(&self, frame: Frame, tx: &mpsc::UnboundedSender<Vec<u8>>, peer: SocketAddr) {
        let header = frame.header;

        match header.message_type {
            MessageType::HeartBeat => {
                // Echoed with the incoming header untouched.
                send(
                    tx,
                    &ProtocolMessage {
                        header,
                        body: MessageBody::HeartBeat,
                    },
                );
            }
            MessageType::Request => {
                let request = match ProtocolCodec::decode_frame(frame) {
                    Ok(ProtocolMessage {
                        body: MessageBody::Request(request),
                        ..
                    }) => request,
                    Ok(_) => return,
                    Err(e) => {
                        tracing::warn!(peer = %peer, request_id = header.request_id, error = %e, "bad request body");
                        let reply = ProtocolMessage::reply_to(
                            &header,
                            MessageStatus::BadRequest,
                            RpcResponse::failure("bad request", e.to_string()),
                        );
                        send(tx, &reply);
                        return;
                    }
                };

                let ctx = RequestContext {
                    serializer: header.serializer,
                    peer,
                    request_id: header.request_id,
                };
                let endpoint = self.endpoint.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let (status, response) = endpoint.dispatch(ctx, request).await;
                    send(&tx, &ProtocolMessage::reply_to(&header, status, response));
                });
            }
            other => {
                tracing::warn!(peer = %peer, request_id = header.request_id, message_type = ?other, "ignoring unexpected frame");
            }
        }
    }
}

fn send(tx: &mpsc::UnboundedSender<Vec<u8>>, message: &ProtocolMessage) {
    match ProtocolCodec::encode(message) {
        Ok(bytes) => {
            let _ = tx.send(bytes);
        }
        Err(e) => {
            tracing::error!(request_id = message.request_id(), error = %e, "failed to encode reply");
        }
    }
}
