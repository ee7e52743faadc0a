use thiserror::Error;

#[derive(Debug, Error)]
pub enum GossipError {
    #[error("failed to connect to peer {peer}: {source}")]
    Connect {
        peer: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("malformed gossip frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
}
