//! Websocket remote collection
//!
//! `RemoteCollection` implementation backed by a todo document server.
//! Messages are CBOR-encoded and tagged; the connection performs a
//! join/peer handshake and is then owned by a spawned task that multiplexes
//! write commands and server-initiated snapshots.
//!
//! ## Protocol
//!
//! 1. Connect via WebSocket
//! 2. Send `join` with our peer ID, wait for the server's `peer` reply
//! 3. Writes (`add`, `setDone`, `delete`) are one-way; `fetch` and
//!    `subscribe` are answered with `snapshot` messages carrying the
//!    owner's full record set
//!
//! The server re-sends a `snapshot` to every subscribed peer after each
//! change, including changes caused by this client's own writes.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::auth::OwnerId;
use crate::error::{RemoteError, RemoteResult};
use crate::models::RemoteRecord;
use crate::remote::RemoteCollection;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Protocol version
const PROTOCOL_V1: &str = "1";

/// Handshake timeout
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Messages sent to the document server
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientMessage {
    /// Join/handshake message
    #[serde(rename = "join")]
    Join {
        #[serde(rename = "senderId")]
        sender_id: String,
        #[serde(rename = "supportedProtocolVersions")]
        supported_protocol_versions: Vec<String>,
    },

    /// Begin continuous observation of an owner's records
    #[serde(rename = "subscribe")]
    Subscribe {
        #[serde(rename = "senderId")]
        sender_id: String,
        owner: String,
    },

    /// One-shot read of an owner's records
    #[serde(rename = "fetch")]
    Fetch {
        #[serde(rename = "senderId")]
        sender_id: String,
        owner: String,
    },

    /// Add a record; the server assigns the key
    #[serde(rename = "add")]
    Add {
        #[serde(rename = "senderId")]
        sender_id: String,
        owner: String,
        text: String,
        #[serde(rename = "isDone")]
        is_done: bool,
    },

    /// Set a record's done flag
    #[serde(rename = "setDone")]
    SetDone {
        #[serde(rename = "senderId")]
        sender_id: String,
        owner: String,
        id: String,
        #[serde(rename = "isDone")]
        is_done: bool,
    },

    /// Delete a record
    #[serde(rename = "delete")]
    Delete {
        #[serde(rename = "senderId")]
        sender_id: String,
        owner: String,
        id: String,
    },
}

/// Messages received from the document server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ServerMessage {
    /// Peer handshake response
    #[serde(rename = "peer")]
    Peer {
        #[serde(rename = "senderId")]
        sender_id: String,
        #[serde(rename = "targetId")]
        target_id: String,
        #[serde(rename = "selectedProtocolVersion")]
        selected_protocol_version: String,
    },

    /// Full record set for an owner
    #[serde(rename = "snapshot")]
    Snapshot {
        owner: String,
        records: Vec<RemoteRecord>,
    },

    /// Key assigned to a previously sent add
    #[serde(rename = "added")]
    Added { owner: String, id: String },

    /// Error from server
    #[serde(rename = "error")]
    Error { message: String },
}

impl ClientMessage {
    fn join(sender_id: &str) -> Self {
        ClientMessage::Join {
            sender_id: sender_id.to_string(),
            supported_protocol_versions: vec![PROTOCOL_V1.to_string()],
        }
    }

    /// Encode message to CBOR bytes
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).expect("CBOR encoding failed");
        bytes
    }
}

impl ServerMessage {
    /// Decode message from CBOR bytes
    fn decode(bytes: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::from_reader(bytes)
    }
}

/// Commands from the trait surface into the connection task
enum Command {
    Add {
        owner: String,
        text: String,
        done: bool,
        reply: oneshot::Sender<RemoteResult<String>>,
    },
    SetDone {
        owner: String,
        id: String,
        done: bool,
        reply: oneshot::Sender<RemoteResult<()>>,
    },
    Delete {
        owner: String,
        id: String,
        reply: oneshot::Sender<RemoteResult<()>>,
    },
    Fetch {
        owner: String,
        reply: oneshot::Sender<RemoteResult<Vec<RemoteRecord>>>,
    },
    Subscribe {
        owner: String,
        tx: mpsc::UnboundedSender<Vec<RemoteRecord>>,
        reply: oneshot::Sender<RemoteResult<()>>,
    },
}

/// Remote collection backed by a websocket document server
pub struct WsCollection {
    peer_id: String,
    cmd_tx: mpsc::Sender<Command>,
}

impl WsCollection {
    /// Connect to the server and perform the join handshake
    pub async fn connect(url: &str) -> RemoteResult<Self> {
        let peer_id = format!("tido-{}", &uuid::Uuid::new_v4().to_string()[..8]);

        debug!(url, "connecting to document server");
        let (ws_stream, _response) =
            connect_async(url)
                .await
                .map_err(|e| RemoteError::Connect {
                    url: url.to_string(),
                    details: e.to_string(),
                })?;
        let (mut write, mut read) = ws_stream.split();

        let join = ClientMessage::join(&peer_id);
        write
            .send(Message::Binary(join.encode()))
            .await
            .map_err(|e| RemoteError::ConnectionClosed(e.to_string()))?;

        let server_peer = wait_for_peer(&mut read, url).await?;
        info!(url, server_peer, "connected to document server");

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        tokio::spawn(connection_task(peer_id.clone(), write, read, cmd_rx));

        Ok(Self { peer_id, cmd_tx })
    }

    /// Our peer ID on the server
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    async fn send(&self, cmd: Command) -> RemoteResult<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| RemoteError::ConnectionClosed("connection task ended".to_string()))
    }
}

#[async_trait::async_trait]
impl RemoteCollection for WsCollection {
    async fn add(&self, owner: &OwnerId, text: &str, done: bool) -> RemoteResult<String> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Add {
            owner: owner.as_str().to_string(),
            text: text.to_string(),
            done,
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| RemoteError::ConnectionClosed("reply channel closed".to_string()))?
    }

    async fn set_done(&self, owner: &OwnerId, id: &str, done: bool) -> RemoteResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetDone {
            owner: owner.as_str().to_string(),
            id: id.to_string(),
            done,
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| RemoteError::ConnectionClosed("reply channel closed".to_string()))?
    }

    async fn delete(&self, owner: &OwnerId, id: &str) -> RemoteResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Delete {
            owner: owner.as_str().to_string(),
            id: id.to_string(),
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| RemoteError::ConnectionClosed("reply channel closed".to_string()))?
    }

    async fn fetch(&self, owner: &OwnerId) -> RemoteResult<Vec<RemoteRecord>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Fetch {
            owner: owner.as_str().to_string(),
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| RemoteError::ConnectionClosed("reply channel closed".to_string()))?
    }

    async fn subscribe(
        &self,
        owner: &OwnerId,
    ) -> RemoteResult<mpsc::UnboundedReceiver<Vec<RemoteRecord>>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::Subscribe {
            owner: owner.as_str().to_string(),
            tx,
            reply,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RemoteError::ConnectionClosed("reply channel closed".to_string()))??;
        Ok(rx)
    }
}

/// Wait for the server's peer handshake response
async fn wait_for_peer(read: &mut WsSource, url: &str) -> RemoteResult<String> {
    let deadline = tokio::time::Instant::now() + HANDSHAKE_TIMEOUT;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return Err(RemoteError::HandshakeTimeout {
                url: url.to_string(),
            });
        }

        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        match ServerMessage::decode(&data) {
                            Ok(ServerMessage::Peer { sender_id, .. }) => {
                                return Ok(sender_id);
                            }
                            Ok(ServerMessage::Error { message }) => {
                                return Err(RemoteError::Rejected(message));
                            }
                            Ok(_) => {
                                // Ignore other messages during handshake
                            }
                            Err(e) => {
                                warn!(error = %e, "undecodable message during handshake");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(RemoteError::ConnectionClosed(
                            "server closed connection during handshake".to_string(),
                        ));
                    }
                    Some(Err(e)) => {
                        return Err(RemoteError::ConnectionClosed(e.to_string()));
                    }
                    _ => {}
                }
            }
            _ = tokio::time::sleep(remaining) => {
                return Err(RemoteError::HandshakeTimeout { url: url.to_string() });
            }
        }
    }
}

/// State owned by the connection task
#[derive(Default)]
struct TaskState {
    /// Add replies, answered in order by `added` messages
    pending_adds: VecDeque<oneshot::Sender<RemoteResult<String>>>,
    /// Fetch replies per owner, answered by the next `snapshot`
    pending_fetches: HashMap<String, VecDeque<oneshot::Sender<RemoteResult<Vec<RemoteRecord>>>>>,
    /// Continuous subscriptions per owner
    watchers: HashMap<String, Vec<mpsc::UnboundedSender<Vec<RemoteRecord>>>>,
}

impl TaskState {
    fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Snapshot { owner, records } => {
                if let Some(queue) = self.pending_fetches.get_mut(&owner) {
                    if let Some(reply) = queue.pop_front() {
                        let _ = reply.send(Ok(records.clone()));
                    }
                }
                if let Some(watchers) = self.watchers.get_mut(&owner) {
                    watchers.retain(|tx| tx.send(records.clone()).is_ok());
                }
            }
            ServerMessage::Added { id, .. } => {
                if let Some(reply) = self.pending_adds.pop_front() {
                    let _ = reply.send(Ok(id));
                } else {
                    debug!(id, "unsolicited add acknowledgement");
                }
            }
            ServerMessage::Error { message } => {
                // The server does not correlate errors; fail the oldest
                // pending add if there is one, otherwise just log
                warn!(message, "server reported error");
                if let Some(reply) = self.pending_adds.pop_front() {
                    let _ = reply.send(Err(RemoteError::Rejected(message)));
                }
            }
            ServerMessage::Peer { .. } => {}
        }
    }

    /// Fail every pending reply; subscriptions end by channel drop
    fn fail_all(self, reason: &str) {
        for reply in self.pending_adds {
            let _ = reply.send(Err(RemoteError::ConnectionClosed(reason.to_string())));
        }
        for (_, queue) in self.pending_fetches {
            for reply in queue {
                let _ = reply.send(Err(RemoteError::ConnectionClosed(reason.to_string())));
            }
        }
    }
}

/// Own the socket: multiplex write commands and server messages
async fn connection_task(
    peer_id: String,
    mut write: WsSink,
    mut read: WsSource,
    mut cmd_rx: mpsc::Receiver<Command>,
) {
    let mut state = TaskState::default();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    // Collection handle dropped
                    write.close().await.ok();
                    state.fail_all("connection closed");
                    return;
                };
                match cmd {
                    Command::Add { owner, text, done, reply } => {
                        let msg = ClientMessage::Add {
                            sender_id: peer_id.clone(),
                            owner,
                            text,
                            is_done: done,
                        };
                        match write.send(Message::Binary(msg.encode())).await {
                            Ok(()) => state.pending_adds.push_back(reply),
                            Err(e) => {
                                let _ = reply.send(Err(RemoteError::ConnectionClosed(e.to_string())));
                            }
                        }
                    }
                    Command::SetDone { owner, id, done, reply } => {
                        let msg = ClientMessage::SetDone {
                            sender_id: peer_id.clone(),
                            owner,
                            id,
                            is_done: done,
                        };
                        let result = write
                            .send(Message::Binary(msg.encode()))
                            .await
                            .map_err(|e| RemoteError::ConnectionClosed(e.to_string()));
                        let _ = reply.send(result);
                    }
                    Command::Delete { owner, id, reply } => {
                        let msg = ClientMessage::Delete {
                            sender_id: peer_id.clone(),
                            owner,
                            id,
                        };
                        let result = write
                            .send(Message::Binary(msg.encode()))
                            .await
                            .map_err(|e| RemoteError::ConnectionClosed(e.to_string()));
                        let _ = reply.send(result);
                    }
                    Command::Fetch { owner, reply } => {
                        let msg = ClientMessage::Fetch {
                            sender_id: peer_id.clone(),
                            owner: owner.clone(),
                        };
                        match write.send(Message::Binary(msg.encode())).await {
                            Ok(()) => {
                                state.pending_fetches.entry(owner).or_default().push_back(reply);
                            }
                            Err(e) => {
                                let _ = reply.send(Err(RemoteError::ConnectionClosed(e.to_string())));
                            }
                        }
                    }
                    Command::Subscribe { owner, tx, reply } => {
                        let msg = ClientMessage::Subscribe {
                            sender_id: peer_id.clone(),
                            owner: owner.clone(),
                        };
                        match write.send(Message::Binary(msg.encode())).await {
                            Ok(()) => {
                                state.watchers.entry(owner).or_default().push(tx);
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                let _ = reply.send(Err(RemoteError::ConnectionClosed(e.to_string())));
                            }
                        }
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        match ServerMessage::decode(&data) {
                            Ok(msg) => state.handle_server_message(msg),
                            Err(e) => warn!(error = %e, "undecodable server message"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("server closed connection");
                        state.fail_all("server closed connection");
                        return;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket error");
                        state.fail_all("websocket error");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_message_encoding() {
        let msg = ClientMessage::join("tido-12345678");
        let bytes = msg.encode();

        // Should be non-empty CBOR
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_add_message_roundtrip_shape() {
        let msg = ClientMessage::Add {
            sender_id: "tido-1".to_string(),
            owner: "owner-1".to_string(),
            text: "buy milk".to_string(),
            is_done: false,
        };
        assert!(!msg.encode().is_empty());
    }

    #[test]
    fn test_snapshot_message_decoding() {
        let msg = ServerMessage::Snapshot {
            owner: "owner-1".to_string(),
            records: vec![RemoteRecord {
                id: "rec-1".to_string(),
                text: Some("x".to_string()),
                is_done: Some(true),
            }],
        };

        let mut bytes = Vec::new();
        ciborium::into_writer(&msg, &mut bytes).unwrap();
        let decoded = ServerMessage::decode(&bytes).unwrap();

        match decoded {
            ServerMessage::Snapshot { owner, records } => {
                assert_eq!(owner, "owner-1");
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].is_done, Some(true));
            }
            _ => panic!("Expected Snapshot message"),
        }
    }

    #[test]
    fn test_peer_message_decoding() {
        let msg = ServerMessage::Peer {
            sender_id: "server".to_string(),
            target_id: "client".to_string(),
            selected_protocol_version: PROTOCOL_V1.to_string(),
        };

        let mut bytes = Vec::new();
        ciborium::into_writer(&msg, &mut bytes).unwrap();
        let decoded = ServerMessage::decode(&bytes).unwrap();

        match decoded {
            ServerMessage::Peer { sender_id, .. } => assert_eq!(sender_id, "server"),
            _ => panic!("Expected Peer message"),
        }
    }

    #[test]
    fn test_snapshot_dispatch_answers_fetch_then_watchers() {
        let mut state = TaskState::default();
        let (fetch_reply, mut fetch_rx) = oneshot::channel();
        state
            .pending_fetches
            .entry("owner-1".to_string())
            .or_default()
            .push_back(fetch_reply);
        let (watch_tx, mut watch_rx) = mpsc::unbounded_channel();
        state
            .watchers
            .entry("owner-1".to_string())
            .or_default()
            .push(watch_tx);

        state.handle_server_message(ServerMessage::Snapshot {
            owner: "owner-1".to_string(),
            records: vec![],
        });

        assert!(fetch_rx.try_recv().unwrap().is_ok());
        assert_eq!(watch_rx.try_recv().unwrap().len(), 0);
    }

    #[test]
    fn test_added_resolves_oldest_pending_add() {
        let mut state = TaskState::default();
        let (first, mut first_rx) = oneshot::channel();
        let (second, mut second_rx) = oneshot::channel();
        state.pending_adds.push_back(first);
        state.pending_adds.push_back(second);

        state.handle_server_message(ServerMessage::Added {
            owner: "owner-1".to_string(),
            id: "rec-9".to_string(),
        });

        assert_eq!(first_rx.try_recv().unwrap().unwrap(), "rec-9");
        assert!(second_rx.try_recv().is_err());
    }

    #[test]
    fn test_fail_all_rejects_pending_replies() {
        let mut state = TaskState::default();
        let (add_reply, mut add_rx) = oneshot::channel();
        state.pending_adds.push_back(add_reply);

        state.fail_all("server closed connection");
        assert!(matches!(
            add_rx.try_recv().unwrap(),
            Err(RemoteError::ConnectionClosed(_))
        ));
    }
}
