//! Ledger JSON-RPC client
//!
//! Exposes the three logical upstream operations the pipeline consumes as the
//! `LedgerRpc` trait, and a `reqwest`-backed implementation speaking JSON-RPC
//! 2.0 with `jsonParsed` encoding.
//!
//! ## Error classification
//!
//! - HTTP 429, JSON-RPC code 429 / -32429 → `IngestError::RateLimited`
//! - everything else (transport, HTTP status, RPC error, decoding)
//!   → `IngestError::TransientUpstream`

use crate::ingest_core::error_handler::IngestError;
use crate::pipeline::types::{SignatureRef, TokenAccount, TokenBalance, TransactionDetail};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_account_decoder_client_types::token::UiTokenAmount;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
/// Size of an SPL token account
pub const TOKEN_ACCOUNT_SIZE: u64 = 165;
/// Upper bound accepted by getSignaturesForAddress
pub const MAX_SIGNATURE_PAGE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "processed" => Some(Commitment::Processed),
            "confirmed" => Some(Commitment::Confirmed),
            "finalized" => Some(Commitment::Finalized),
            _ => None,
        }
    }
}

/// Logical upstream operations, one call each
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Endpoint label for logging
    fn endpoint(&self) -> &str;

    /// Token accounts of `program` filtered by mint and fixed data size
    async fn scan_program_accounts(
        &self,
        program: &str,
        mint: &str,
        data_size: u64,
    ) -> Result<Vec<TokenAccount>, IngestError>;

    /// One page of signature history, newest first
    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<SignatureRef>, IngestError>;

    /// `Ok(None)` when the node does not know the transaction
    async fn get_transaction_detail(
        &self,
        signature: &str,
        commitment: Commitment,
    ) -> Result<Option<TransactionDetail>, IngestError>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcKeyedAccount {
    pubkey: String,
    account: RpcAccount,
}

#[derive(Debug, Deserialize)]
struct RpcAccount {
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ParsedAccountData {
    parsed: ParsedTokenAccount,
}

#[derive(Debug, Deserialize)]
struct ParsedTokenAccount {
    info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: String,
    #[serde(default)]
    owner: Option<String>,
    token_amount: UiTokenAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureInfo {
    signature: String,
    #[serde(default)]
    block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcConfirmedTransaction {
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    meta: Option<RpcTransactionMeta>,
    transaction: RpcTransactionEnvelope,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransactionMeta {
    #[serde(default)]
    pre_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    post_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    inner_instructions: Option<Vec<RpcInnerInstructions>>,
}

#[derive(Debug, Deserialize)]
struct RpcInnerInstructions {
    #[serde(default)]
    instructions: Vec<RpcInstruction>,
}

#[derive(Debug, Deserialize)]
struct RpcTransactionEnvelope {
    message: RpcMessage,
}

#[derive(Debug, Deserialize)]
struct RpcMessage {
    #[serde(default)]
    instructions: Vec<RpcInstruction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcInstruction {
    #[serde(default)]
    program_id: Option<String>,
}

impl RpcConfirmedTransaction {
    fn into_detail(self, signature: &str) -> TransactionDetail {
        let mut program_ids: Vec<String> = Vec::new();
        let outer = self.transaction.message.instructions.into_iter();

        let (pre, post, inner) = match self.meta {
            Some(meta) => (
                meta.pre_token_balances.unwrap_or_default(),
                meta.post_token_balances.unwrap_or_default(),
                meta.inner_instructions.unwrap_or_default(),
            ),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        let inner = inner.into_iter().flat_map(|set| set.instructions.into_iter());
        for program_id in outer.chain(inner).filter_map(|ix| ix.program_id) {
            if !program_ids.contains(&program_id) {
                program_ids.push(program_id);
            }
        }

        TransactionDetail {
            signature: signature.to_string(),
            block_time: self.block_time,
            pre_token_balances: pre,
            post_token_balances: post,
            program_ids,
        }
    }
}

/// JSON-RPC client for one endpoint
pub struct JsonRpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, IngestError> {
        let url = url.into();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Config(format!("failed to build HTTP client for {}: {}", url, e)))?;

        Ok(Self {
            url,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    fn upstream_error(&self, message: impl Into<String>) -> IngestError {
        IngestError::TransientUpstream {
            endpoint: self.url.clone(),
            message: message.into(),
        }
    }

    fn rate_limited(&self, message: impl Into<String>) -> IngestError {
        IngestError::RateLimited {
            endpoint: self.url.clone(),
            message: message.into(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, IngestError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.upstream_error(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(self.rate_limited(format!("{} returned HTTP 429", method)));
        }
        if !status.is_success() {
            return Err(self.upstream_error(format!("{} returned HTTP {}", method, status)));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| self.upstream_error(format!("{} response decoding failed: {}", method, e)))?;

        if let Some(err) = body.error {
            return Err(classify_rpc_error(&self.url, method, err));
        }

        Ok(body.result)
    }
}

fn classify_rpc_error(endpoint: &str, method: &str, err: RpcErrorObject) -> IngestError {
    let message = format!("{} failed ({}): {}", method, err.code, err.message);
    match err.code {
        429 | -32429 => IngestError::RateLimited {
            endpoint: endpoint.to_string(),
            message,
        },
        _ => IngestError::TransientUpstream {
            endpoint: endpoint.to_string(),
            message,
        },
    }
}

fn keyed_account_to_token_account(keyed: RpcKeyedAccount) -> Option<TokenAccount> {
    match serde_json::from_value::<ParsedAccountData>(keyed.account.data) {
        Ok(parsed) => Some(TokenAccount {
            address: keyed.pubkey,
            mint: parsed.parsed.info.mint,
            owner: parsed.parsed.info.owner,
            amount: parsed.parsed.info.token_amount,
        }),
        Err(e) => {
            log::debug!("Skipping account {}: not a parsed token account ({})", keyed.pubkey, e);
            None
        }
    }
}

#[async_trait]
impl LedgerRpc for JsonRpcClient {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn scan_program_accounts(
        &self,
        program: &str,
        mint: &str,
        data_size: u64,
    ) -> Result<Vec<TokenAccount>, IngestError> {
        let params = json!([
            program,
            {
                "encoding": "jsonParsed",
                "filters": [
                    { "dataSize": data_size },
                    { "memcmp": { "offset": 0, "bytes": mint } }
                ]
            }
        ]);

        let accounts: Vec<RpcKeyedAccount> = self
            .call("getProgramAccounts", params)
            .await?
            .ok_or_else(|| self.upstream_error("getProgramAccounts returned no result"))?;

        Ok(accounts
            .into_iter()
            .filter_map(keyed_account_to_token_account)
            .collect())
    }

    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<SignatureRef>, IngestError> {
        let mut options = json!({ "limit": limit.clamp(1, MAX_SIGNATURE_PAGE) });
        if let Some(cursor) = before {
            options["before"] = json!(cursor);
        }

        let signatures: Vec<RpcSignatureInfo> = self
            .call("getSignaturesForAddress", json!([address, options]))
            .await?
            .ok_or_else(|| self.upstream_error("getSignaturesForAddress returned no result"))?;

        Ok(signatures
            .into_iter()
            .map(|s| SignatureRef {
                signature: s.signature,
                wallet: address.to_string(),
                block_time: s.block_time,
            })
            .collect())
    }

    async fn get_transaction_detail(
        &self,
        signature: &str,
        commitment: Commitment,
    ) -> Result<Option<TransactionDetail>, IngestError> {
        let params = json!([
            signature,
            {
                "encoding": "jsonParsed",
                "commitment": commitment.as_str(),
                "maxSupportedTransactionVersion": 0
            }
        ]);

        let txn: Option<RpcConfirmedTransaction> = self.call("getTransaction", params).await?;
        Ok(txn.map(|t| t.into_detail(signature)))
    }
}
