// ─────────────────────────────────────────────────────────────────
// LAHKA NODE
//
// Binary: loads configuration, boots the chain engine behind a single
// mutex, exposes the REST API and the gossip WebSocket endpoint, and
// runs the block-production timer.
// ─────────────────────────────────────────────────────────────────

mod api;
mod config;

use clap::Parser;
use lahka_chain::{Chain, ChainConfig};
use lahka_core::{Transaction, TransactionKind};
use lahka_network::GossipNode;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "lahka-node", version)]
struct Args {
    /// Path to a TOML config file. Falls back to defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let node_config = match &args.config {
        Some(path) => config::load_config(path).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to load config, using defaults");
            config::NodeConfig::default()
        }),
        None => config::NodeConfig::default(),
    };

    let now = api::now();
    let chain = Arc::new(Mutex::new(Chain::new(
        ChainConfig::default(),
        node_config.rng_seed,
        now,
    )));

    let gossip = Arc::new(GossipNode::new());
    register_gossip_handlers(gossip.clone(), chain.clone());

    for peer in &node_config.gossip_peers {
        let gossip = gossip.clone();
        let peer = peer.clone();
        tokio::spawn(async move {
            if let Err(e) = gossip.connect(&peer).await {
                tracing::warn!(peer = %peer, error = %e, "failed to dial gossip peer");
            }
        });
    }

    spawn_block_production_timer(chain.clone(), node_config.block_production_interval_secs);

    let rest = api::routes(chain);
    let ws = gossip.ws_route();
    let listen_addr: std::net::SocketAddr = node_config
        .listen_addr
        .parse()
        .expect("listen_addr must be a valid socket address");

    tracing::info!(%listen_addr, "lahka-node listening");
    warp::serve(rest.or(ws)).run(listen_addr).await;
}

fn register_gossip_handlers(gossip: Arc<GossipNode>, chain: Arc<Mutex<Chain>>) {
    let chain_for_tx = chain.clone();
    gossip.on("tx", move |payload| {
        let chain = chain_for_tx.clone();
        tokio::spawn(async move {
            match serde_json::from_value::<GossipTransaction>(payload) {
                Ok(gtx) => {
                    let tx = gtx.into_transaction();
                    let mut chain = chain.lock().await;
                    if let Err(e) = chain.add_transaction(tx) {
                        tracing::debug!(error = %e, "rejected gossiped transaction");
                    }
                }
                Err(e) => tracing::debug!(error = %e, "malformed gossiped transaction"),
            }
        });
    });

    let chain_for_block = chain.clone();
    gossip.on("block", move |payload| {
        let chain = chain_for_block.clone();
        tokio::spawn(async move {
            match serde_json::from_value::<lahka_core::Block>(payload) {
                Ok(block) => {
                    let mut chain = chain.lock().await;
                    let t = api::now();
                    if let Err(e) = chain.add_block(block, t) {
                        tracing::debug!(error = %e, "rejected gossiped block");
                    }
                }
                Err(e) => tracing::debug!(error = %e, "malformed gossiped block"),
            }
        });
    });
}

#[derive(serde::Deserialize)]
struct GossipTransaction {
    from: String,
    to: String,
    amount: u128,
    kind: TransactionKind,
    #[serde(default)]
    data: serde_json::Map<String, serde_json::Value>,
    gas_limit: u64,
    gas_price: u128,
    #[serde(default)]
    signature: String,
}

impl GossipTransaction {
    fn into_transaction(self) -> Transaction {
        Transaction::new(
            self.from,
            self.to,
            self.amount,
            self.kind,
            self.data,
            self.gas_limit,
            self.gas_price,
            api::now(),
            self.signature,
        )
    }
}

fn spawn_block_production_timer(chain: Arc<Mutex<Chain>>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            let mut chain = chain.lock().await;
            match chain.mine_block(api::now()) {
                Ok(true) => tracing::info!(height = chain.blocks.len(), "mined block"),
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "block production failed"),
            }
        }
    });
}
