use super::error::ClientError;
use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::contract::Contract;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, H256, U256};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fixed upper bound on resource consumption for a single post submission.
pub const SUBMIT_GAS_LIMIT: u64 = 3_000_000;

/// A single entry of the append-only post ledger.
///
/// Remote posts carry their 1-based ledger `index`. Optimistic local posts
/// carry no index and a provisional wall-clock timestamp; they are only
/// ever prepended to the feed, never re-sorted into index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub author: Address,
    pub content: String,
    /// Seconds since the unix epoch.
    pub timestamp: u64,
    pub index: Option<u64>,
}

/// Outcome of a submission the provider reported as mined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitReceipt {
    pub transaction_hash: H256,
}

/// Immutable pairing of the deployed contract's address and its method
/// interface. Built once at startup and shared by the read and write paths.
#[derive(Debug, Clone)]
pub struct ContractBinding {
    pub address: Address,
    pub interface: Abi,
}

impl ContractBinding {
    pub fn new(address: Address, interface: Abi) -> Self {
        Self { address, interface }
    }
}

/// Read and write paths against the remote post ledger. All effects are
/// remote; local state is only ever observed through a later read.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Number of posts recorded by the ledger.
    async fn read_count(&self) -> Result<u64, ClientError>;

    /// One post by its 1-based position. `index` must be in `[1, count]`.
    async fn read_post(&self, index: u64) -> Result<Post, ClientError>;

    /// Submits a post as a signed state-changing call and suspends until
    /// the provider reports it mined or rejected. `sequence` must be the
    /// signer's current sequence number, read fresh from the provider.
    async fn submit_post(
        &self,
        content: &str,
        signer: Address,
        sequence: U256,
    ) -> Result<SubmitReceipt, ClientError>;
}

/// Ledger client over the deployed contract.
pub struct EthLedger {
    contract: Contract<Provider<Http>>,
}

impl EthLedger {
    pub fn new(binding: &ContractBinding, client: Arc<Provider<Http>>) -> Self {
        let contract = Contract::new(binding.address, binding.interface.clone(), client);
        Self { contract }
    }
}

/// The original shell matched on the provider's message text to tell a
/// declined signature apart from a real failure; same here.
fn classify_submit_error(text: String) -> ClientError {
    if text.contains("denied") || text.contains("rejected") {
        ClientError::UserRejected
    } else {
        ClientError::SubmissionFailed(text)
    }
}

#[async_trait]
impl Ledger for EthLedger {
    async fn read_count(&self) -> Result<u64, ClientError> {
        let count: U256 = self
            .contract
            .method("postCount", ())
            .map_err(|e| ClientError::RemoteRead(e.to_string()))?
            .call()
            .await
            .map_err(|e| ClientError::RemoteRead(e.to_string()))?;
        Ok(count.as_u64())
    }

    async fn read_post(&self, index: u64) -> Result<Post, ClientError> {
        let (author, content, timestamp): (Address, String, U256) = self
            .contract
            .method("posts", U256::from(index))
            .map_err(|e| ClientError::RemoteRead(e.to_string()))?
            .call()
            .await
            .map_err(|e| ClientError::RemoteRead(e.to_string()))?;
        Ok(Post {
            author,
            content,
            timestamp: timestamp.as_u64(),
            index: Some(index),
        })
    }

    async fn submit_post(
        &self,
        content: &str,
        signer: Address,
        sequence: U256,
    ) -> Result<SubmitReceipt, ClientError> {
        let mut call = self
            .contract
            .method::<_, H256>("createPost", content.to_owned())
            .map_err(|e| ClientError::SubmissionFailed(e.to_string()))?
            .from(signer)
            .gas(SUBMIT_GAS_LIMIT);
        call.tx.set_nonce(sequence);

        debug!(
            "(ledger) submitting post from {:?} with sequence {}",
            signer, sequence
        );

        let pending = call
            .send()
            .await
            .map_err(|e| classify_submit_error(e.to_string()))?;
        let receipt = pending
            .await
            .map_err(|e| ClientError::SubmissionFailed(e.to_string()))?
            .ok_or_else(|| {
                ClientError::SubmissionFailed("transaction dropped before inclusion".to_owned())
            })?;

        if receipt.status == Some(0u64.into()) {
            return Err(ClientError::SubmissionFailed(format!(
                "execution reverted in transaction {:?}",
                receipt.transaction_hash
            )));
        }
        Ok(SubmitReceipt {
            transaction_hash: receipt.transaction_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declined_signature_maps_to_rejection() {
        let err = classify_submit_error("User denied transaction signature".to_owned());
        assert!(matches!(err, ClientError::UserRejected));
    }

    #[test]
    fn other_send_failures_stay_generic() {
        let err = classify_submit_error("insufficient funds for gas".to_owned());
        assert!(matches!(err, ClientError::SubmissionFailed(_)));
    }
}
