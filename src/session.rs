use super::error::ClientError;
use super::provider::{ProviderEvent, SigningProvider};
use ethers::types::{Address, U256};
use log::{info, warn};
use std::sync::Arc;

/// What a provider-pushed event means for the rest of the client.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    /// The chain switched. All derived state (feed, pending submissions)
    /// is chain-specific and must be discarded; restart from `connect`.
    Reset,
    /// A different account is now active. The feed is attributable to the
    /// ledger, not the viewer, so it stays.
    AccountSwitched(Address),
    /// The provider reported no authorized accounts. Writes must fail fast
    /// until the user reconnects.
    Disconnected,
}

/// Owns the binding to the external signing provider: the active account,
/// the chain the provider is attached to, and the event subscription that
/// keeps both current.
pub struct Session {
    provider: Arc<dyn SigningProvider>,
    account: Option<Address>,
    chain: Option<U256>,
}

impl Session {
    pub fn new(provider: Arc<dyn SigningProvider>) -> Self {
        Self {
            provider,
            account: None,
            chain: None,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn chain(&self) -> Option<U256> {
        self.chain
    }

    /// Subscription to the provider's pushed events, held by the caller for
    /// the lifetime of its event loop. Dropping it is the unsubscription.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ProviderEvent> {
        self.provider.events()
    }

    /// Requests account authorization from the provider and records the
    /// first authorized account and the current chain. Idempotent when
    /// already authorized.
    pub async fn connect(&mut self) -> Result<Address, ClientError> {
        let accounts = self.provider.request_accounts().await?;
        let account = accounts.first().copied().ok_or(ClientError::UserRejected)?;
        let chain = self.provider.chain_id().await?;
        self.account = Some(account);
        self.chain = Some(chain);
        info!("(session) connected account {:?} on chain {}", account, chain);
        Ok(account)
    }

    /// Current sequence number of the active account, read from the
    /// provider directly. Never cached, so a stale number cannot replay.
    pub async fn sequence_number(&self) -> Result<U256, ClientError> {
        let account = self.account.ok_or(ClientError::NoActiveAccount)?;
        self.provider.sequence_number(account).await
    }

    /// Applies one provider-pushed event and reports what changed. Pure
    /// transition; acting on the change is the caller's concern.
    pub fn apply_event(&mut self, event: &ProviderEvent) -> SessionChange {
        match event {
            ProviderEvent::ChainChanged(chain) => {
                info!("(session) chain changed to {}", chain);
                self.chain = Some(*chain);
                SessionChange::Reset
            }
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(account) => {
                    info!("(session) active account switched to {:?}", account);
                    self.account = Some(*account);
                    SessionChange::AccountSwitched(*account)
                }
                None => {
                    warn!("(session) provider reports no authorized accounts");
                    self.account = None;
                    SessionChange::Disconnected
                }
            },
        }
    }
}
