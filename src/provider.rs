use super::error::ClientError;
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, U256};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the pushed-event channel. Events are tiny and rare; a
/// lagging receiver only ever misses stale session updates.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Event pushed by the signing provider for the lifetime of the binding.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// The provider switched networks. All derived state is chain-specific
    /// and must be discarded by the receiver.
    ChainChanged(U256),
    /// The authorized account list changed. Empty means disconnected.
    AccountsChanged(Vec<Address>),
}

/// The external signing provider: holds key material, authorizes accounts
/// and signs state-changing operations on the user's behalf.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    /// Requests account authorization. Returns the authorized accounts,
    /// empty when the user declined.
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError>;

    /// Identifier of the network the provider is currently attached to.
    async fn chain_id(&self) -> Result<U256, ClientError>;

    /// Current transaction sequence number for `account`, read from the
    /// provider directly. Callers must not cache this across submissions.
    async fn sequence_number(&self, account: Address) -> Result<U256, ClientError>;

    /// Subscribes to pushed chain/account change events. Dropping the
    /// receiver is the unsubscription.
    fn events(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Signing provider backed by a JSON-RPC endpoint whose node manages the
/// account keys (`eth_accounts` / `eth_sendTransaction` flow). Wallet-pushed
/// events enter through the sender handle exposed by [`event_sender`].
///
/// [`event_sender`]: RpcProvider::event_sender
pub struct RpcProvider {
    inner: Arc<Provider<Http>>,
    event_sender: broadcast::Sender<ProviderEvent>,
}

impl RpcProvider {
    pub fn connect(url: &str) -> Result<Self, ClientError> {
        let inner = Provider::<Http>::try_from(url)
            .map_err(|e| ClientError::ProviderUnavailable(e.to_string()))?;
        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(inner),
            event_sender,
        })
    }

    /// Shared RPC client, for constructing contract bindings against the
    /// same endpoint.
    pub fn client(&self) -> Arc<Provider<Http>> {
        self.inner.clone()
    }

    /// Handle for the embedder to forward wallet-pushed events
    /// (chain switched, accounts changed) into the binding.
    pub fn event_sender(&self) -> broadcast::Sender<ProviderEvent> {
        self.event_sender.clone()
    }
}

#[async_trait]
impl SigningProvider for RpcProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        self.inner
            .get_accounts()
            .await
            .map_err(|e| ClientError::ProviderUnavailable(e.to_string()))
    }

    async fn chain_id(&self) -> Result<U256, ClientError> {
        self.inner
            .get_chainid()
            .await
            .map_err(|e| ClientError::ProviderUnavailable(e.to_string()))
    }

    async fn sequence_number(&self, account: Address) -> Result<U256, ClientError> {
        self.inner
            .get_transaction_count(account, None)
            .await
            .map_err(|e| ClientError::RemoteRead(e.to_string()))
    }

    fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.event_sender.subscribe()
    }
}
