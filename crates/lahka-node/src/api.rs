//! REST surface. Grounded on the teacher's `los-node` warp handler style:
//! thin functions returning `impl Reply`, shared state behind a single
//! `tokio::sync::Mutex`.

use lahka_chain::Chain;
use lahka_core::{Transaction, TransactionKind};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

pub type SharedChain = Arc<Mutex<Chain>>;

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs()
}

#[derive(Debug, Deserialize)]
pub struct SubmitTransaction {
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub kind: TransactionKind,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    pub gas_limit: u64,
    pub gas_price: u128,
    #[serde(default)]
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterValidator {
    pub address: String,
    pub stake: u128,
}

#[derive(Debug, Deserialize)]
pub struct PeerRatingSubmission {
    pub reviewer: String,
    pub reviewee: String,
    pub rating: i64,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct DeployContract {
    pub from: String,
    pub code: String,
    #[serde(default)]
    pub initial_state: serde_json::Map<String, serde_json::Value>,
    pub gas_limit: u64,
    pub gas_price: u128,
}

#[derive(Debug, Deserialize)]
pub struct CallContract {
    pub from: String,
    pub contract_address: String,
    pub function: String,
    #[serde(default)]
    pub args: serde_json::Value,
    pub gas_limit: u64,
    pub gas_price: u128,
}

pub fn routes(
    chain: SharedChain,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_chain = warp::any().map(move || chain.clone());

    let node_info = warp::path("node-info")
        .and(warp::get())
        .and(with_chain.clone())
        .and_then(node_info);

    let get_chain = warp::path("chain")
        .and(warp::get())
        .and(with_chain.clone())
        .and_then(get_chain);

    let get_account = warp::path!("account" / String)
        .and(warp::get())
        .and(with_chain.clone())
        .and_then(get_account);

    let submit_transaction = warp::path("transaction")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_chain.clone())
        .and_then(submit_transaction);

    let mine = warp::path("mine")
        .and(warp::post())
        .and(with_chain.clone())
        .and_then(mine);

    let get_validators = warp::path("validators")
        .and(warp::get())
        .and(with_chain.clone())
        .and_then(get_validators);

    let get_validator = warp::path!("validator" / String)
        .and(warp::get())
        .and(with_chain.clone())
        .and_then(get_validator);

    let register_validator = warp::path!("validator" / "register")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_chain.clone())
        .and_then(register_validator);

    let peer_rating = warp::path!("governance" / "peer-rating")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_chain.clone())
        .and_then(submit_peer_rating);

    let get_contract = warp::path!("contract" / String)
        .and(warp::get())
        .and(with_chain.clone())
        .and_then(get_contract);

    let deploy_contract = warp::path!("contract" / "deploy")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_chain.clone())
        .and_then(deploy_contract);

    let call_contract = warp::path!("contract" / "call")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_chain.clone())
        .and_then(call_contract);

    node_info
        .or(get_chain)
        .or(get_account)
        .or(submit_transaction)
        .or(mine)
        .or(get_validators)
        .or(get_validator)
        .or(register_validator)
        .or(peer_rating)
        .or(get_contract)
        .or(deploy_contract)
        .or(call_contract)
}

async fn get_contract(address: String, chain: SharedChain) -> Result<impl Reply, Infallible> {
    let chain = chain.lock().await;
    Ok(warp::reply::json(&chain.contracts.contracts.get(&address)))
}

async fn node_info(chain: SharedChain) -> Result<impl Reply, Infallible> {
    let chain = chain.lock().await;
    Ok(warp::reply::json(&serde_json::json!({
        "chain_length": chain.blocks.len(),
        "tip_hash": chain.tip().hash,
        "minimum_stake": chain.config.minimum_stake,
        "block_reward": chain.config.block_reward,
        "gas_price": chain.config.gas_price,
        "max_txs_per_block": chain.config.max_txs_per_block,
        "max_contract_gas": chain.config.max_contract_gas,
        "peer_review_every_n_blocks": chain.config.peer_review_every_n_blocks,
    })))
}

async fn get_chain(chain: SharedChain) -> Result<impl Reply, Infallible> {
    let chain = chain.lock().await;
    Ok(warp::reply::json(&chain.blocks))
}

async fn get_account(address: String, chain: SharedChain) -> Result<impl Reply, Infallible> {
    let chain = chain.lock().await;
    let balance = chain.get_balance(&address);
    let history = chain.ledger.get_account_history(&address, 50);
    Ok(warp::reply::json(&serde_json::json!({
        "address": address,
        "balance": balance,
        "history": history,
    })))
}

async fn submit_transaction(
    body: SubmitTransaction,
    chain: SharedChain,
) -> Result<impl Reply, Infallible> {
    let tx = Transaction::new(
        body.from,
        body.to,
        body.amount,
        body.kind,
        body.data,
        body.gas_limit,
        body.gas_price,
        now(),
        body.signature,
    );
    let mut chain = chain.lock().await;
    match chain.add_transaction(tx.clone()) {
        Ok(()) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "accepted": true, "hash": tx.hash })),
            StatusCode::OK,
        )),
        Err(e) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "accepted": false, "error": e.to_string() })),
            StatusCode::BAD_REQUEST,
        )),
    }
}

async fn mine(chain: SharedChain) -> Result<impl Reply, Infallible> {
    let mut chain = chain.lock().await;
    match chain.mine_block(now()) {
        Ok(mined) => Ok(warp::reply::json(&serde_json::json!({ "mined": mined }))),
        Err(e) => Ok(warp::reply::json(&serde_json::json!({
            "mined": false,
            "error": e.to_string(),
        }))),
    }
}

async fn get_validators(chain: SharedChain) -> Result<impl Reply, Infallible> {
    let chain = chain.lock().await;
    Ok(warp::reply::json(&chain.validators))
}

async fn get_validator(address: String, chain: SharedChain) -> Result<impl Reply, Infallible> {
    let mut chain = chain.lock().await;
    let t = now();
    let score = chain.validators.get_mut(&address).map(|v| v.pocs_score(t));
    Ok(warp::reply::json(&serde_json::json!({
        "validator": chain.validators.get(&address),
        "pocs_score": score,
    })))
}

async fn register_validator(
    body: RegisterValidator,
    chain: SharedChain,
) -> Result<impl Reply, Infallible> {
    let mut chain = chain.lock().await;
    match chain.register_validator(&body.address, body.stake, now()) {
        Ok(()) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "registered": true })),
            StatusCode::OK,
        )),
        Err(e) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "registered": false, "error": e.to_string() })),
            StatusCode::BAD_REQUEST,
        )),
    }
}

/// Wraps the deploy as a `CONTRACT_DEPLOY` transaction and queues it
/// through the normal mempool path — `contracts.deploy` itself only runs
/// once the transaction is applied in `Chain::add_block`.
async fn deploy_contract(
    body: DeployContract,
    chain: SharedChain,
) -> Result<impl Reply, Infallible> {
    let mut data = serde_json::Map::new();
    data.insert("contract_code".to_string(), serde_json::Value::String(body.code));
    data.insert(
        "initial_state".to_string(),
        serde_json::Value::Object(body.initial_state),
    );
    let tx = Transaction::new(
        body.from,
        "",
        0,
        TransactionKind::ContractDeploy,
        data,
        body.gas_limit,
        body.gas_price,
        now(),
        "",
    );
    let mut chain = chain.lock().await;
    match chain.add_transaction(tx.clone()) {
        Ok(()) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "accepted": true, "hash": tx.hash })),
            StatusCode::OK,
        )),
        Err(e) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "accepted": false, "error": e.to_string() })),
            StatusCode::BAD_REQUEST,
        )),
    }
}

/// Wraps the call as a `CONTRACT_CALL` transaction, same mempool path as
/// [`deploy_contract`].
async fn call_contract(body: CallContract, chain: SharedChain) -> Result<impl Reply, Infallible> {
    let mut data = serde_json::Map::new();
    data.insert(
        "contract_address".to_string(),
        serde_json::Value::String(body.contract_address),
    );
    data.insert("function".to_string(), serde_json::Value::String(body.function));
    data.insert("args".to_string(), body.args);
    let tx = Transaction::new(
        body.from,
        "",
        0,
        TransactionKind::ContractCall,
        data,
        body.gas_limit,
        body.gas_price,
        now(),
        "",
    );
    let mut chain = chain.lock().await;
    match chain.add_transaction(tx.clone()) {
        Ok(()) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "accepted": true, "hash": tx.hash })),
            StatusCode::OK,
        )),
        Err(e) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "accepted": false, "error": e.to_string() })),
            StatusCode::BAD_REQUEST,
        )),
    }
}

async fn submit_peer_rating(
    body: PeerRatingSubmission,
    chain: SharedChain,
) -> Result<impl Reply, Infallible> {
    let mut chain = chain.lock().await;
    let t = now();
    let submission = lahka_consensus::governance::PeerRatingSubmission {
        reviewer: body.reviewer,
        reviewee: body.reviewee,
        rating: body.rating,
        reason: body.reason,
    };
    lahka_consensus::governance::process_peer_ratings(&mut chain.validators, &[submission], t);
    Ok(warp::reply::json(&serde_json::json!({ "accepted": true })))
}
