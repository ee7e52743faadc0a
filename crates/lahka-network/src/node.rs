//! Full-mesh WebSocket gossip surface.
//!
//! Grounded on the reference `network/p2p.py`'s `Node` class rather than
//! the teacher's libp2p/Tor stack (SPEC_FULL.md §4.6): every configured
//! peer gets a persistent duplex connection, frames are `{type, payload}`
//! JSON, and a handler registry dispatches by type. The chain engine is
//! never touched directly here — callers wire handlers that forward into
//! `lahka_chain::Chain`'s own public API.

use crate::error::GossipError;
use crate::message::GossipMessage;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use warp::ws::{Message as WarpMessage, WebSocket};
use warp::Filter;

pub type Handler = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

#[derive(Clone)]
pub struct GossipNode {
    handlers: Arc<Mutex<HashMap<String, Handler>>>,
    peers: Arc<Mutex<HashMap<String, UnboundedSender<String>>>>,
}

impl GossipNode {
    pub fn new() -> Self {
        GossipNode {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            peers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a handler for an inbound message type. Only the last
    /// registration for a given type wins, matching `Node.on()` in the
    /// reference implementation.
    pub fn on(&self, kind: impl Into<String>, handler: impl Fn(serde_json::Value) + Send + Sync + 'static) {
        self.handlers
            .lock()
            .expect("handlers lock poisoned")
            .insert(kind.into(), Arc::new(handler));
    }

    /// Sends `{type, payload}` to every currently connected peer, dropping
    /// a peer's send silently (logged at `debug`) on failure.
    pub fn broadcast(&self, kind: &str, payload: serde_json::Value) {
        let msg = GossipMessage::new(kind, payload);
        let text = serde_json::to_string(&msg).expect("GossipMessage always serializes");
        let peers = self.peers.lock().expect("peers lock poisoned");
        for (addr, tx) in peers.iter() {
            if tx.send(text.clone()).is_err() {
                tracing::debug!(peer = %addr, "gossip send failed, dropping silently");
            }
        }
    }

    pub fn peer_count(&self) -> usize {
        self.peers.lock().expect("peers lock poisoned").len()
    }

    fn dispatch(&self, text: &str) {
        let msg: GossipMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed gossip frame");
                return;
            }
        };
        let handler = self
            .handlers
            .lock()
            .expect("handlers lock poisoned")
            .get(&msg.kind)
            .cloned();
        if let Some(handler) = handler {
            handler(msg.payload);
        } else {
            tracing::debug!(kind = %msg.kind, "no handler registered for gossip type");
        }
    }

    /// The `GET /ws` warp filter inbound peers connect to.
    pub fn ws_route(
        self: Arc<Self>,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let node = self;
        warp::path("ws").and(warp::ws()).map(move |ws: warp::ws::Ws| {
            let node = node.clone();
            ws.on_upgrade(move |socket| async move { node.handle_inbound(socket).await })
        })
    }

    async fn handle_inbound(self: Arc<Self>, socket: WebSocket) {
        let peer_id = format!("inbound-{}", uuid_like());
        let (mut sink, mut stream) = socket.split();
        let (tx, mut rx) = unbounded_channel::<String>();
        self.peers.lock().expect("peers lock poisoned").insert(peer_id.clone(), tx);

        let outbound = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if sink.send(WarpMessage::text(text)).await.is_err() {
                    break;
                }
            }
        });

        while let Some(Ok(msg)) = stream.next().await {
            if let Ok(text) = msg.to_str() {
                self.dispatch(text);
            }
        }

        self.peers.lock().expect("peers lock poisoned").remove(&peer_id);
        outbound.abort();
    }

    /// Dials a peer and keeps the connection in the same peer set as
    /// inbound connections — "full mesh" means both directions are
    /// attempted with every configured peer.
    pub async fn connect(self: Arc<Self>, peer_url: &str) -> Result<(), GossipError> {
        let (ws_stream, _) =
            tokio_tungstenite::connect_async(peer_url)
                .await
                .map_err(|source| GossipError::Connect {
                    peer: peer_url.to_string(),
                    source,
                })?;
        let (mut sink, mut stream) = ws_stream.split();
        let (tx, mut rx) = unbounded_channel::<String>();
        self.peers
            .lock()
            .expect("peers lock poisoned")
            .insert(peer_url.to_string(), tx);

        let outbound = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if sink.send(WsMessage::text(text)).await.is_err() {
                    break;
                }
            }
        });

        let node = self.clone();
        let peer_url_owned = peer_url.to_string();
        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                if let WsMessage::Text(text) = msg {
                    node.dispatch(&text);
                }
            }
            node.peers
                .lock()
                .expect("peers lock poisoned")
                .remove(&peer_url_owned);
            outbound.abort();
        });

        Ok(())
    }
}

impl Default for GossipNode {
    fn default() -> Self {
        GossipNode::new()
    }
}

fn uuid_like() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn dispatch_invokes_registered_handler() {
        let node = GossipNode::new();
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        node.on("tx", move |_payload| {
            flag.store(true, Ordering::SeqCst);
        });
        node.dispatch(r#"{"type":"tx","payload":{}}"#);
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn dispatch_ignores_malformed_frame() {
        let node = GossipNode::new();
        node.on("tx", |_| panic!("should not be called"));
        node.dispatch("not json");
    }

    #[test]
    fn broadcast_with_no_peers_is_a_no_op() {
        let node = GossipNode::new();
        node.broadcast("tx", serde_json::json!({}));
        assert_eq!(node.peer_count(), 0);
    }
}
